//! Local transforms and their GPU representation.
//!
//! A [`Transform`] is the position/rotation/scale triple attached to every scene
//! graph node. Composition happens on matrices (see
//! [`crate::data_structures::scene_graph`]) because TRS triples are not closed
//! under non-uniform scale.

use cgmath::{EuclideanSpace, InnerSpace, Matrix, Matrix3, Matrix4, One, Quaternion, Rotation, SquareMatrix, Vector3};

use crate::{animation::quat_from_euler_deg, data_structures::mesh::Vertex};

/// Position, rotation (unit quaternion) and scale relative to the parent node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Transform {
    /// Identity transform: no translation, no rotation, unit scale.
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn from_position(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            ..Self::new()
        }
    }

    /// Rotation given as Euler angles in degrees (x, then y, then z).
    pub fn from_euler_deg(x: f32, y: f32, z: f32) -> Self {
        Self {
            rotation: quat_from_euler_deg(x, y, z),
            ..Self::new()
        }
    }

    pub fn with_position(mut self, position: impl Into<Vector3<f32>>) -> Self {
        self.position = position.into();
        self
    }

    pub fn with_rotation(mut self, rotation: Quaternion<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: impl Into<Vector3<f32>>) -> Self {
        self.scale = scale.into();
        self
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// The local -Z axis after rotation. Cameras and lights look along it.
    pub fn forward(&self) -> Vector3<f32> {
        self.rotation.rotate_vector(-Vector3::unit_z())
    }

    /// Rotates so that the local -Z axis points at `target`.
    ///
    /// Leaves the rotation untouched when `target` coincides with the position
    /// or the view direction is parallel to `up`.
    pub fn look_at(&mut self, target: impl Into<Vector3<f32>>, up: impl Into<Vector3<f32>>) {
        let dir = target.into() - self.position;
        let up = up.into();
        if dir.magnitude2() < f32::EPSILON || dir.normalize().cross(up).magnitude2() < f32::EPSILON {
            log::warn!("look_at ignored: degenerate direction {:?}", dir);
            return;
        }
        // `look_to_rh` builds the view matrix; the rotation of the object is its inverse.
        let view = Matrix4::look_to_rh(cgmath::Point3::origin(), dir.normalize(), up);
        let rot3 = Matrix3::from_cols(view.x.truncate(), view.y.truncate(), view.z.truncate());
        self.rotation = Quaternion::from(rot3.transpose()).normalize();
    }

    /// Decomposes `matrix` assuming it holds no shear.
    pub fn from_matrix(matrix: &Matrix4<f32>) -> Self {
        let position = matrix.w.truncate();
        let cols = [matrix.x.truncate(), matrix.y.truncate(), matrix.z.truncate()];
        let mut scale = Vector3::new(cols[0].magnitude(), cols[1].magnitude(), cols[2].magnitude());
        if Matrix3::from_cols(cols[0], cols[1], cols[2]).determinant() < 0.0 {
            scale.x = -scale.x;
        }
        let safe = |v: f32| if v.abs() < f32::EPSILON { 1.0 } else { v };
        let rot = Matrix3::from_cols(cols[0] / safe(scale.x), cols[1] / safe(scale.y), cols[2] / safe(scale.z));
        Self {
            position,
            rotation: Quaternion::from(rot).normalize(),
            scale,
        }
    }

    pub fn to_raw(&self) -> TransformRaw {
        TransformRaw::from_matrix(&self.to_matrix())
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vector3<f32>> for Transform {
    fn from(position: Vector3<f32>) -> Self {
        Transform {
            position,
            ..Default::default()
        }
    }
}

/**
 * The raw transform is what ends up in the per-object vertex buffer.
 * The normal matrix is the inverse-transpose of the model matrix so that
 * non-uniform scale keeps normals perpendicular to the surface.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformRaw {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 3]; 3],
}

impl TransformRaw {
    pub fn from_matrix(model: &Matrix4<f32>) -> Self {
        let upper = Matrix3::from_cols(model.x.truncate(), model.y.truncate(), model.z.truncate());
        let normal = upper.invert().map(|m| m.transpose()).unwrap_or(upper);
        Self {
            model: (*model).into(),
            normal: normal.into(),
        }
    }
}

/**
 * A mat4 takes four vertex slots and the mat3 another three.
 * Locations 0..=2 belong to [`crate::data_structures::mesh::ModelVertex`].
 */
impl Vertex for TransformRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<TransformRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 22]>() as wgpu::BufferAddress,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < 1e-4
    }

    #[test]
    fn identity_matrix_for_default_transform() {
        assert_eq!(Transform::default().to_matrix(), Matrix4::identity());
    }

    #[test]
    fn look_at_points_forward_at_target() {
        let mut t = Transform::from_position(5.0, 10.0, 0.0);
        t.look_at([4.0, 10.0, 0.0], Vector3::unit_y());
        assert!(approx(t.forward(), Vector3::new(-1.0, 0.0, 0.0)));
    }

    #[test]
    fn look_at_ignores_degenerate_target() {
        let mut t = Transform::from_position(1.0, 1.0, 1.0);
        t.look_at([1.0, 1.0, 1.0], Vector3::unit_y());
        assert_eq!(t.rotation, Quaternion::one());
    }

    #[test]
    fn matrix_decomposition_recovers_trs() {
        let t = Transform::from_euler_deg(30.0, -20.0, 10.0)
            .with_position([1.0, 2.0, 3.0])
            .with_scale([2.0, 0.5, 1.5]);
        let back = Transform::from_matrix(&t.to_matrix());
        assert!(approx(back.position, t.position));
        assert!(approx(back.scale, t.scale));
        assert!(back.rotation.dot(t.rotation).abs() > 0.9999);
    }
}
