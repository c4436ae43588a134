//! Camera, projection, orbit controls and arcball helpers.
//!
//! The camera is described by its world matrix so a flow can hang it anywhere
//! in a [`SceneGraph`](crate::data_structures::scene_graph::SceneGraph) and copy
//! the node's world matrix over each frame.

use cgmath::{InnerSpace, Matrix4, One, Quaternion, Rad, Rotation3, SquareMatrix, Vector3};
use wgpu::util::DeviceExt;
use winit::event::{MouseScrollDelta, WindowEvent};

use crate::data_structures::transform::Transform;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Centre of the arcball in canvas pixels.
pub const ARCBALL_CENTER: f64 = 400.0;
/// Radius of the arcball in canvas pixels.
pub const ARCBALL_RADIUS: f64 = 300.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub world: Matrix4<f32>,
}

impl Camera {
    pub fn new(transform: &Transform) -> Self {
        Self {
            world: transform.to_matrix(),
        }
    }

    pub fn set_transform(&mut self, transform: &Transform) {
        self.world = transform.to_matrix();
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.world.invert().unwrap_or_else(|| {
            log::warn!("camera world matrix is singular, using identity view");
            Matrix4::identity()
        })
    }

    pub fn position(&self) -> Vector3<f32> {
        self.world.w.truncate()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(&Transform::from_position(0.0, 0.0, 15.0))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    Perspective {
        fovy: Rad<f32>,
        aspect: f32,
        znear: f32,
        zfar: f32,
    },
    /// Box of `2 * half_height * aspect` by `2 * half_height` around the view axis.
    Orthographic {
        half_height: f32,
        aspect: f32,
        znear: f32,
        zfar: f32,
    },
}

impl Projection {
    pub fn perspective<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Projection::Perspective {
            fovy: fovy.into(),
            aspect: width.max(1) as f32 / height.max(1) as f32,
            znear,
            zfar,
        }
    }

    pub fn orthographic(width: u32, height: u32, half_height: f32, znear: f32, zfar: f32) -> Self {
        Projection::Orthographic {
            half_height,
            aspect: width.max(1) as f32 / height.max(1) as f32,
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        match self {
            Projection::Perspective { aspect, .. } | Projection::Orthographic { aspect, .. } => {
                *aspect = width.max(1) as f32 / height.max(1) as f32;
            }
        }
    }

    pub fn aspect(&self) -> f32 {
        match *self {
            Projection::Perspective { aspect, .. } | Projection::Orthographic { aspect, .. } => aspect,
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        match *self {
            Projection::Perspective {
                fovy,
                aspect,
                znear,
                zfar,
            } => OPENGL_TO_WGPU_MATRIX * cgmath::perspective(fovy, aspect, znear, zfar),
            Projection::Orthographic {
                half_height,
                aspect,
                znear,
                zfar,
            } => {
                let half_width = half_height * aspect;
                OPENGL_TO_WGPU_MATRIX * cgmath::ortho(-half_width, half_width, -half_height, half_height, znear, zfar)
            }
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_proj: [[f32; 4]; 4],
    view_position: [f32; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_proj: Matrix4::identity().into(),
            view_position: [0.0; 4],
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position().extend(1.0).into();
        self.view_proj = (projection.calc_matrix() * camera.view_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Right-drag orbits the camera around `target`, the wheel dollies it.
///
/// Disabled controllers ignore input; scenes that drive the camera themselves
/// (pose animation, re-parenting) keep it off.
#[derive(Clone, Debug)]
pub struct OrbitController {
    pub enabled: bool,
    pub target: Vector3<f32>,
    pub sensitivity: f32,
    pub zoom_speed: f32,
    rotate: (f32, f32),
    scroll: f32,
}

impl OrbitController {
    pub fn new(sensitivity: f32, zoom_speed: f32) -> Self {
        Self {
            enabled: false,
            target: Vector3::new(0.0, 0.0, 0.0),
            sensitivity,
            zoom_speed,
            rotate: (0.0, 0.0),
            scroll: 0.0,
        }
    }

    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        if self.enabled {
            self.rotate.0 += dx as f32;
            self.rotate.1 += dy as f32;
        }
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        if !self.enabled {
            return;
        }
        if let WindowEvent::MouseWheel { delta, .. } = event {
            self.scroll += match delta {
                MouseScrollDelta::LineDelta(_, y) => *y,
                MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
            };
        }
    }

    pub fn update(&mut self, camera: &mut Camera, dt: instant::Duration) {
        let (dx, dy) = std::mem::take(&mut self.rotate);
        let scroll = std::mem::take(&mut self.scroll);
        if !self.enabled || (dx == 0.0 && dy == 0.0 && scroll == 0.0) {
            return;
        }
        let dt = dt.as_secs_f32();
        let mut offset = camera.position() - self.target;
        if offset.magnitude2() < 1e-9 {
            offset = Vector3::unit_z();
        }

        let yaw = Quaternion::from_axis_angle(Vector3::unit_y(), Rad(-dx * self.sensitivity * dt));
        offset = yaw * offset;

        let right = (-offset).normalize().cross(Vector3::unit_y());
        if right.magnitude2() > 1e-9 {
            let pitch = Quaternion::from_axis_angle(right.normalize(), Rad(-dy * self.sensitivity * dt));
            let candidate = pitch * offset;
            // Stop short of the poles so the up vector stays valid.
            if candidate.normalize().dot(Vector3::unit_y()).abs() < 0.995 {
                offset = candidate;
            }
        }

        let distance = (offset.magnitude() * (1.0 - scroll * self.zoom_speed)).clamp(0.5, 500.0);
        let mut transform = Transform::from(self.target + offset.normalize() * distance);
        transform.look_at(self.target, Vector3::unit_y());
        camera.set_transform(&transform);
    }
}

/// Camera state plus its GPU uniform.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: OrbitController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

pub fn mk_camera_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("camera_bind_group_layout"),
    })
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, camera: Camera, projection: &Projection) -> Self {
        let layout = mk_camera_bind_group_layout(device);
        Self::with_layout(device, camera, projection, layout)
    }

    /// Camera bound through an existing layout, so it can replace the main
    /// camera at group 0 of every pipeline.
    pub fn with_layout(
        device: &wgpu::Device,
        camera: Camera,
        projection: &Projection,
        bind_group_layout: wgpu::BindGroupLayout,
    ) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            camera,
            controller: OrbitController::new(0.4, 0.1),
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write_to_buffer(&mut self, queue: &wgpu::Queue, projection: &Projection) {
        self.uniform.update_view_proj(&self.camera, projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

/// Maps a cursor position (origin top-left) onto arcball coordinates.
///
/// The ball is centred at pixel `(400, 400)` counted from the bottom-left and
/// has a radius of 300 pixels.
pub fn normalized_arcball_coords(px: f64, py: f64, height: f64) -> (f32, f32) {
    let x = (px - ARCBALL_CENTER) / ARCBALL_RADIUS;
    let y = (height - py - ARCBALL_CENTER) / ARCBALL_RADIUS;
    (x as f32, y as f32)
}

/// Unit vector on the arcball under `(x, y)`.
///
/// Points outside the ball are pulled inside by `1 / (x² + y²)` and land on
/// the back hemisphere.
pub fn arcball_vector(x: f32, y: f32) -> Vector3<f32> {
    let d2 = x * x + y * y;
    let v = if d2 >= 1.0 {
        let (x, y) = (x / d2, y / d2);
        Vector3::new(x, y, -(1.0 - x * x - y * y).max(0.0).sqrt())
    } else {
        Vector3::new(x, y, (1.0 - d2).sqrt())
    };
    v.normalize()
}

/// Rotation carrying `v0` onto `v1` around their common normal.
/// Parallel inputs give the identity.
pub fn arcball_rotation(v0: Vector3<f32>, v1: Vector3<f32>) -> Quaternion<f32> {
    let axis = v0.cross(v1);
    if axis.magnitude2() < 1e-12 {
        return Quaternion::one();
    }
    Quaternion::from_axis_angle(axis.normalize(), v0.angle(v1))
}

/// Drag state of an arcball rotation.
///
/// `begin` remembers the vector under the cursor; each `drag` returns the
/// rotation from the previous vector to the current one, to be pre-multiplied
/// onto the target's local rotation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Arcball {
    prev: Option<Vector3<f32>>,
}

impl Arcball {
    pub fn begin(&mut self, px: f64, py: f64, height: f64) {
        let (x, y) = normalized_arcball_coords(px, py, height);
        self.prev = Some(arcball_vector(x, y));
    }

    pub fn drag(&mut self, px: f64, py: f64, height: f64) -> Option<Quaternion<f32>> {
        let v0 = self.prev?;
        let (x, y) = normalized_arcball_coords(px, py, height);
        let v1 = arcball_vector(x, y);
        self.prev = Some(v1);
        Some(arcball_rotation(v0, v1))
    }

    pub fn end(&mut self) {
        self.prev = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.prev.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_looks_down_negative_z() {
        let camera = Camera::default();
        let view = camera.view_matrix();
        let origin = view * cgmath::Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!((origin.z + 15.0).abs() < 1e-5);
    }

    #[test]
    fn projection_resize_updates_aspect() {
        let mut projection = Projection::perspective(800, 800, cgmath::Deg(45.0), 0.01, 100.0);
        projection.resize(1600, 800);
        assert_eq!(projection.aspect(), 2.0);
    }

    #[test]
    fn orthographic_box_maps_to_clip_space() {
        let projection = Projection::orthographic(512, 512, 2.0, 0.1, 10.0);
        let m = projection.calc_matrix();
        let corner = m * cgmath::Vector4::new(2.0, -2.0, -0.1, 1.0);
        assert!((corner.x - 1.0).abs() < 1e-5 && (corner.y + 1.0).abs() < 1e-5);
        assert!(corner.z.abs() < 1e-5);
        let far = m * cgmath::Vector4::new(0.0, 0.0, -10.0, 1.0);
        assert!((far.z - 1.0).abs() < 1e-5);
        assert_eq!(far.w, 1.0);
    }

    #[test]
    fn arcball_drag_needs_begin() {
        let mut ball = Arcball::default();
        assert!(ball.drag(400.0, 400.0, 800.0).is_none());
        ball.begin(400.0, 400.0, 800.0);
        let q = ball.drag(400.0, 400.0, 800.0).unwrap();
        assert!((q.s - 1.0).abs() < 1e-6);
        ball.end();
        assert!(!ball.is_dragging());
    }

    #[test]
    fn disabled_controller_keeps_camera() {
        let mut controller = OrbitController::new(1.0, 0.1);
        let mut camera = Camera::default();
        controller.handle_mouse(10.0, 5.0);
        controller.update(&mut camera, instant::Duration::from_millis(16));
        assert_eq!(camera, Camera::default());
    }
}
