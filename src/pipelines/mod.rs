//! Render pipelines and their bind group layouts.
//!
//! - `basic` holds the lit (Blinn-Phong) and unlit colour pipelines
//! - `light` holds light descriptors, their uniform and the CPU shading model
//! - `pick` holds the colour-id pipeline used for object picking
//! - `textured` samples a render texture onto a mesh

pub mod basic;
pub mod light;
pub mod pick;
pub mod textured;

/// Bind group layouts shared by every pipeline.
#[derive(Debug, Clone)]
pub struct Layouts {
    pub camera: wgpu::BindGroupLayout,
    pub lights: wgpu::BindGroupLayout,
    pub material: wgpu::BindGroupLayout,
    pub pick: wgpu::BindGroupLayout,
    pub texture: wgpu::BindGroupLayout,
}

#[derive(Debug)]
pub struct Pipelines {
    pub phong: wgpu::RenderPipeline,
    pub unlit: wgpu::RenderPipeline,
    pub pick: wgpu::RenderPipeline,
    pub textured: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(device: &wgpu::Device, color_format: wgpu::TextureFormat, layouts: &Layouts) -> Self {
        Self {
            phong: basic::mk_phong_pipeline(
                device,
                color_format,
                &layouts.camera,
                &layouts.lights,
                &layouts.material,
            ),
            unlit: basic::mk_unlit_pipeline(
                device,
                color_format,
                &layouts.camera,
                &layouts.lights,
                &layouts.material,
            ),
            pick: pick::mk_pick_pipeline(device, &layouts.camera, &layouts.pick),
            textured: textured::mk_textured_pipeline(
                device,
                color_format,
                &layouts.camera,
                &layouts.lights,
                &layouts.texture,
            ),
        }
    }
}
