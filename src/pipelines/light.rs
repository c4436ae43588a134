//! Light descriptors and the Blinn-Phong lighting model.
//!
//! Lights are uploaded as one uniform array of at most [`MAX_LIGHTS`] entries.
//! [`shade`] evaluates the same model as `phong.wgsl` on the CPU; it backs the
//! tests and documents what the shader computes.

use cgmath::{InnerSpace, Vector3};
use wgpu::util::DeviceExt;

use crate::data_structures::{material::Material, transform::Transform};

pub const MAX_LIGHTS: usize = 10;
/// Number of diffuse bands when toon shading is on.
pub const TOON_BANDS: f32 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum LightType {
    Ambient = 0,
    Directional = 1,
    Point = 2,
    Spotlight = 3,
}

/// A light source. Position and direction come from `transform`; the light
/// shines along the transform's forward (-Z) axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub kind: LightType,
    pub enabled: bool,
    pub illuminance: [f32; 3],
    pub transform: Transform,
    /// Half angle of the spotlight cone in degrees.
    pub angle_deg: f32,
    /// Fraction of the cone used to fade out towards its rim.
    pub smoothness: f32,
}

impl Light {
    pub fn new(kind: LightType, illuminance: [f32; 3]) -> Self {
        Self {
            kind,
            enabled: true,
            illuminance,
            transform: Transform::default(),
            angle_deg: 30.0,
            smoothness: 0.2,
        }
    }

    pub fn ambient(illuminance: [f32; 3]) -> Self {
        Self::new(LightType::Ambient, illuminance)
    }

    /// Directional light travelling along `direction`.
    pub fn directional(illuminance: [f32; 3], direction: [f32; 3]) -> Self {
        let mut light = Self::new(LightType::Directional, illuminance);
        light.transform.look_at(direction, up_for(direction.into()));
        light
    }

    pub fn point(illuminance: [f32; 3], position: [f32; 3]) -> Self {
        let mut light = Self::new(LightType::Point, illuminance);
        light.transform.position = position.into();
        light
    }

    /// Spotlight at `position` aimed at `target`.
    pub fn spotlight(illuminance: [f32; 3], position: [f32; 3], target: [f32; 3]) -> Self {
        let mut light = Self::new(LightType::Spotlight, illuminance);
        light.transform.position = position.into();
        let dir = Vector3::from(target) - Vector3::from(position);
        light.transform.look_at(target, up_for(dir));
        light
    }

    pub fn with_cone(mut self, angle_deg: f32, smoothness: f32) -> Self {
        self.angle_deg = angle_deg;
        self.smoothness = smoothness;
        self
    }

    pub fn position(&self) -> Vector3<f32> {
        self.transform.position
    }

    pub fn direction(&self) -> Vector3<f32> {
        self.transform.forward()
    }

    fn cone_cos(&self) -> (f32, f32) {
        let outer = self.angle_deg.clamp(0.0, 90.0).to_radians();
        let inner = outer * (1.0 - self.smoothness.clamp(0.0, 1.0));
        (outer.cos(), inner.cos())
    }

    pub fn to_raw(&self) -> LightRaw {
        let (cos_outer, cos_inner) = self.cone_cos();
        LightRaw {
            position: self.position().into(),
            kind: self.kind as u32,
            direction: self.direction().into(),
            cos_outer,
            illuminance: self.illuminance,
            cos_inner,
        }
    }
}

fn up_for(direction: Vector3<f32>) -> Vector3<f32> {
    if direction.normalize().y.abs() > 0.99 {
        Vector3::unit_z()
    } else {
        Vector3::unit_y()
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightRaw {
    position: [f32; 3],
    kind: u32,
    direction: [f32; 3],
    cos_outer: f32,
    illuminance: [f32; 3],
    cos_inner: f32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightsUniform {
    lights: [LightRaw; MAX_LIGHTS],
    count: u32,
    // Uniform structs are padded to 16 bytes
    _padding: [u32; 3],
}

impl LightsUniform {
    /// Packs the enabled lights; anything past [`MAX_LIGHTS`] is dropped.
    pub fn from_lights(lights: &[Light]) -> Self {
        let mut uniform = Self {
            lights: [LightRaw::default(); MAX_LIGHTS],
            count: 0,
            _padding: [0; 3],
        };
        let enabled: Vec<_> = lights.iter().filter(|l| l.enabled).collect();
        if enabled.len() > MAX_LIGHTS {
            log::warn!(
                "{} lights enabled, only the first {} are used",
                enabled.len(),
                MAX_LIGHTS
            );
        }
        for (slot, light) in uniform.lights.iter_mut().zip(enabled) {
            *slot = light.to_raw();
            uniform.count += 1;
        }
        uniform
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

/// Hermite step between `low` and `high`. A zero-width band is a hard step.
fn smoothstep(low: f32, high: f32, x: f32) -> f32 {
    if high - low <= f32::EPSILON {
        return if x >= low { 1.0 } else { 0.0 };
    }
    let t = ((x - low) / (high - low)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn mul3(a: [f32; 3], b: [f32; 3]) -> Vector3<f32> {
    Vector3::new(a[0] * b[0], a[1] * b[1], a[2] * b[2])
}

/// What the fragment shader knows about the point being lit.
#[derive(Debug, Clone, Copy)]
pub struct Fragment {
    pub position: Vector3<f32>,
    pub normal: Vector3<f32>,
    /// Vertex colour; tints the ambient and diffuse terms.
    pub color: [f32; 3],
    /// Back faces are lit with the flipped normal.
    pub front_facing: bool,
}

impl Fragment {
    pub fn new(position: Vector3<f32>, normal: Vector3<f32>) -> Self {
        Self {
            position,
            normal,
            color: [1.0; 3],
            front_facing: true,
        }
    }

    pub fn with_color(mut self, color: [f32; 3]) -> Self {
        self.color = color;
        self
    }

    pub fn back_facing(mut self) -> Self {
        self.front_facing = false;
        self
    }
}

/// Blinn-Phong colour of a white, front-facing surface point.
pub fn shade(
    material: &Material,
    normal: Vector3<f32>,
    position: Vector3<f32>,
    eye: Vector3<f32>,
    lights: &[Light],
) -> [f32; 3] {
    shade_fragment(material, &Fragment::new(position, normal), eye, lights)
}

/// CPU version of the `phong.wgsl` fragment stage.
///
/// Point and spot lights fall off with the inverse square of the distance;
/// spotlights additionally fade between the inner and outer cone.
pub fn shade_fragment(material: &Material, fragment: &Fragment, eye: Vector3<f32>, lights: &[Light]) -> [f32; 3] {
    let position = fragment.position;
    let n = if fragment.front_facing {
        fragment.normal.normalize()
    } else {
        -fragment.normal.normalize()
    };
    let v = (eye - position).normalize();
    let ambient = mul3(material.ambient, fragment.color);
    let diffuse_color = mul3(material.diffuse, fragment.color);
    let mut color = Vector3::new(0.0, 0.0, 0.0);

    for light in lights.iter().filter(|l| l.enabled).take(MAX_LIGHTS) {
        let (l, attenuation) = match light.kind {
            LightType::Ambient => {
                color += mul3(ambient.into(), light.illuminance);
                continue;
            }
            LightType::Directional => (-light.direction().normalize(), 1.0),
            LightType::Point | LightType::Spotlight => {
                let d = light.position() - position;
                let mut attenuation = 1.0 / d.magnitude2().max(1e-4);
                if light.kind == LightType::Spotlight {
                    let (cos_outer, cos_inner) = light.cone_cos();
                    let along = light.direction().normalize().dot(-d.normalize());
                    attenuation *= smoothstep(cos_outer, cos_inner, along);
                }
                (d.normalize(), attenuation)
            }
        };

        let mut diffuse = n.dot(l).max(0.0);
        let mut specular = if diffuse > 0.0 {
            n.dot((l + v).normalize()).max(0.0).powf(material.shininess)
        } else {
            0.0
        };
        if material.toon {
            diffuse = (diffuse * TOON_BANDS).ceil() / TOON_BANDS;
            specular = if specular >= 0.5 { 1.0 } else { 0.0 };
        }

        let term = mul3(diffuse_color.into(), light.illuminance) * diffuse
            + mul3(material.specular, light.illuminance) * specular;
        color += term * attenuation;
    }

    color.into()
}

/// GPU side of the light list.
#[derive(Debug)]
pub struct LightResources {
    pub lights: Vec<Light>,
    pub uniform: LightsUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(device: &wgpu::Device, lights: Vec<Light>) -> Self {
        let uniform = LightsUniform::from_lights(&lights);
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);
        Self {
            lights,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn set_lights(&mut self, lights: Vec<Light>) {
        self.lights = lights;
        self.uniform = LightsUniform::from_lights(&self.lights);
    }

    pub fn write_to_buffer(&mut self, queue: &wgpu::Queue) {
        self.uniform = LightsUniform::from_lights(&self.lights);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

pub fn mk_buffer(device: &wgpu::Device, uniform: LightsUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Buffer"),
        contents: bytemuck::cast_slice(&[uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("light_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("light_bind_group"),
    })
}
