//! Renderable scene objects.
//!
//! A [`RenderObject`] ties a shared mesh to a scene graph node and a material.
//! Giving it a non-zero pick id makes it pickable: it is then drawn into the
//! pick buffer as well and clicks on it reach the owning flow. A textured
//! object ignores its material and shows a sampled texture instead.

use std::sync::Arc;

use cgmath::{Matrix4, SquareMatrix};
use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        material::{Material, MaterialResources},
        mesh::Mesh,
        scene_graph::{NodeId, SceneGraph},
        transform::TransformRaw,
    },
    error::SceneError,
    render::{Drawable, Render},
};

#[derive(Debug)]
pub struct RenderObject {
    pub mesh: Arc<Mesh>,
    pub node: NodeId,
    pub material: MaterialResources,
    pub pick_id: u32,
    pub lit: bool,
    pub visible: bool,
    pub texture: Option<wgpu::BindGroup>,
    instance_buffer: wgpu::Buffer,
}

impl RenderObject {
    pub fn new(
        device: &wgpu::Device,
        material_layout: &wgpu::BindGroupLayout,
        mesh: Arc<Mesh>,
        node: NodeId,
        material: Material,
    ) -> Self {
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Instance Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&[TransformRaw::from_matrix(&Matrix4::identity())]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            mesh,
            node,
            material: MaterialResources::new(device, material_layout, material),
            pick_id: 0,
            lit: true,
            visible: true,
            texture: None,
            instance_buffer,
        }
    }

    /// Makes the object pickable under `id`.
    pub fn pickable(mut self, id: u32) -> Self {
        self.pick_id = id;
        self
    }

    pub fn unlit(mut self) -> Self {
        self.lit = false;
        self
    }

    /// Draws the object through the textured pipeline with `bind_group`,
    /// built by [`crate::pipelines::textured::mk_texture_bind_group`].
    pub fn textured(mut self, bind_group: wgpu::BindGroup) -> Self {
        self.texture = Some(bind_group);
        self
    }

    pub fn is_pickable(&self) -> bool {
        self.pick_id != 0
    }

    /// Uploads the node's cached world matrix. Call after
    /// [`SceneGraph::update_world_transforms`].
    pub fn write_to_buffer(&self, queue: &wgpu::Queue, graph: &SceneGraph) -> Result<(), SceneError> {
        let world = graph.world_matrix(self.node)?;
        queue.write_buffer(
            &self.instance_buffer,
            0,
            bytemuck::cast_slice(&[TransformRaw::from_matrix(&world)]),
        );
        Ok(())
    }

    pub fn set_material(&mut self, queue: &wgpu::Queue, material: Material) {
        self.material.set(queue, material);
    }

    pub fn drawable(&self) -> Drawable<'_> {
        Drawable {
            mesh: &self.mesh,
            instance: &self.instance_buffer,
            amount: 1,
            material: self.texture.as_ref().unwrap_or(&self.material.bind_group),
            id: self.pick_id,
        }
    }

    pub fn to_render<'a, 'pass>(&'a self) -> Render<'a, 'pass> {
        if !self.visible {
            Render::None
        } else if self.texture.is_some() {
            Render::Textured(vec![self.drawable()])
        } else if self.lit {
            Render::Lit(self.drawable())
        } else {
            Render::Unlit(self.drawable())
        }
    }
}

/// Uploads the world matrices of all `objects`. Objects whose node was removed
/// are logged and skipped.
pub fn write_all(queue: &wgpu::Queue, graph: &SceneGraph, objects: &[RenderObject]) {
    for object in objects {
        if let Err(e) = object.write_to_buffer(queue, graph) {
            log::warn!("skipping upload of '{}': {}", object.mesh.name, e);
        }
    }
}

/// Lit, unlit and textured renders for all visible `objects`.
pub fn render_all<'a, 'pass>(objects: &'a [RenderObject]) -> Render<'a, 'pass> {
    let mut lits = Vec::new();
    let mut unlits = Vec::new();
    let mut textured = Vec::new();
    for object in objects.iter().filter(|o| o.visible) {
        if object.texture.is_some() {
            textured.push(object.drawable());
        } else if object.lit {
            lits.push(object.drawable());
        } else {
            unlits.push(object.drawable());
        }
    }
    Render::Composed(vec![Render::Lits(lits), Render::Unlits(unlits), Render::Textured(textured)])
}
