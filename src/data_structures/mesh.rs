//! CPU geometry and its GPU counterpart.
//!
//! Generators in [`crate::primitives`] and [`crate::fractal`] produce
//! [`MeshData`]; [`Mesh::new`] uploads it once and the buffers are shared by
//! every object that draws it.

use std::ops::Range;

use cgmath::{InnerSpace, Vector3};
use wgpu::util::DeviceExt;

/// Describes how a `#[repr(C)]` struct maps onto shader locations.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
    /// Only read by the textured pipeline; `(0, 0)` is the top-left texel.
    pub tex_coords: [f32; 2],
}

impl ModelVertex {
    pub fn new(position: impl Into<[f32; 3]>, normal: impl Into<[f32; 3]>) -> Self {
        Self::coloured(position, normal, [1.0; 3])
    }

    pub fn coloured(position: impl Into<[f32; 3]>, normal: impl Into<[f32; 3]>, color: [f32; 3]) -> Self {
        Self {
            position: position.into(),
            normal: normal.into(),
            color,
            tex_coords: [0.0; 2],
        }
    }

    pub fn with_tex_coords(mut self, tex_coords: [f32; 2]) -> Self {
        self.tex_coords = tex_coords;
        self
    }
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 9]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Indexed triangle list on the CPU.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn next_index(&self) -> u32 {
        self.vertices.len() as u32
    }

    /// Adds a triangle with per-vertex normals.
    pub fn push_triangle(&mut self, verts: [ModelVertex; 3]) {
        let base = self.next_index();
        self.vertices.extend_from_slice(&verts);
        self.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }

    /// Adds a flat-shaded triangle; the normal follows the counter-clockwise winding.
    pub fn push_flat_triangle(&mut self, p: [Vector3<f32>; 3], color: [f32; 3]) {
        let n = face_normal(p[0], p[1], p[2]);
        self.push_triangle([
            ModelVertex::coloured(p[0], n, color),
            ModelVertex::coloured(p[1], n, color),
            ModelVertex::coloured(p[2], n, color),
        ]);
    }

    /// Adds the quad `a b c d` (counter-clockwise) as two triangles sharing four vertices.
    pub fn push_quad(&mut self, verts: [ModelVertex; 4]) {
        let base = self.next_index();
        self.vertices.extend_from_slice(&verts);
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    pub fn push_flat_quad(&mut self, p: [Vector3<f32>; 4], color: [f32; 3]) {
        let n = face_normal(p[0], p[1], p[2]);
        self.push_quad([
            ModelVertex::coloured(p[0], n, color),
            ModelVertex::coloured(p[1], n, color),
            ModelVertex::coloured(p[2], n, color),
            ModelVertex::coloured(p[3], n, color),
        ]);
    }

    /// Concatenates `other`, re-basing its indices.
    pub fn append(&mut self, other: MeshData) {
        let base = self.next_index();
        self.vertices.extend(other.vertices);
        self.indices.extend(other.indices.into_iter().map(|i| i + base));
    }

    /// Paints every vertex with `color`.
    pub fn with_color(mut self, color: [f32; 3]) -> Self {
        self.vertices.iter_mut().for_each(|v| v.color = color);
        self
    }

    /// Iterates triangles as vertex triples.
    pub fn triangles(&self) -> impl Iterator<Item = [&ModelVertex; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                &self.vertices[tri[0] as usize],
                &self.vertices[tri[1] as usize],
                &self.vertices[tri[2] as usize],
            ]
        })
    }
}

/// Unit normal of the counter-clockwise triangle `a b c`. Zero for degenerate input.
pub fn face_normal(a: Vector3<f32>, b: Vector3<f32>, c: Vector3<f32>) -> Vector3<f32> {
    let n = (b - a).cross(c - a);
    if n.magnitude2() < f32::EPSILON * f32::EPSILON {
        Vector3::new(0.0, 0.0, 0.0)
    } else {
        n.normalize()
    }
}

/// Vertex and index buffers of an uploaded [`MeshData`].
#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_vertices: u32,
    pub num_elements: u32,
}

impl Mesh {
    pub fn new(device: &wgpu::Device, name: &str, data: &MeshData) -> Self {
        if data.is_empty() {
            log::warn!("mesh '{}' has no triangles", name);
        }
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", name)),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            num_vertices: data.vertices.len() as u32,
            num_elements: data.indices.len() as u32,
        }
    }

    /// Overwrites the vertices in place when `data` has the same vertex and
    /// index counts as the uploaded mesh. The indices are assumed unchanged.
    /// Returns `false` and writes nothing otherwise.
    pub fn write_vertices(&self, queue: &wgpu::Queue, data: &MeshData) -> bool {
        if data.vertices.len() as u32 != self.num_vertices || data.indices.len() as u32 != self.num_elements {
            return false;
        }
        queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&data.vertices));
        true
    }
}

/// Draw helpers on a render pass. The caller sets the pipeline and the
/// instance buffer in slot 1; `bind_groups` are bound from group 0 upwards.
pub trait DrawMesh {
    fn draw_mesh_instanced(&mut self, mesh: &Mesh, instances: Range<u32>, bind_groups: &[&wgpu::BindGroup]);
}

impl DrawMesh for wgpu::RenderPass<'_> {
    fn draw_mesh_instanced(&mut self, mesh: &Mesh, instances: Range<u32>, bind_groups: &[&wgpu::BindGroup]) {
        if mesh.num_elements == 0 {
            return;
        }
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        for (idx, group) in bind_groups.iter().enumerate() {
            self.set_bind_group(idx as u32, *group, &[]);
        }
        self.draw_indexed(0..mesh.num_elements, 0, instances);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_rebases_indices() {
        let mut a = MeshData::new();
        a.push_flat_triangle(
            [Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0)],
            [1.0; 3],
        );
        let b = a.clone();
        a.append(b);
        assert_eq!(a.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(a.triangle_count(), 2);
    }

    #[test]
    fn flat_triangle_normal_follows_winding() {
        let mut m = MeshData::new();
        m.push_flat_triangle(
            [Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0)],
            [1.0; 3],
        );
        assert_eq!(m.vertices[0].normal, [0.0, 0.0, 1.0]);
    }
}
