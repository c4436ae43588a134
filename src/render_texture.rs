//! Render-to-texture.
//!
//! A [`RenderTexture`] draws a set of objects through its own camera into a
//! colour target each frame. Other objects then show the result by sampling
//! it through the textured pipeline, see [`RenderObject::textured`].

use std::iter;

use crate::{
    camera::{Camera, CameraResources, Projection},
    context::{Context, InitContext},
    data_structures::{
        object::{self, RenderObject},
        texture::Texture,
    },
    flow::{begin_pass, draw_render},
    pipelines::textured::mk_texture_bind_group,
};

#[derive(Debug)]
pub struct RenderTexture {
    pub color: Texture,
    pub depth: Texture,
    pub camera: CameraResources,
    pub projection: Projection,
    pub clear_colour: wgpu::Color,
    label: String,
}

impl RenderTexture {
    /// Colour target in the surface format, so the shared pipelines can draw
    /// into it unchanged.
    pub fn new(ctx: &InitContext, size: [u32; 2], camera: Camera, projection: Projection, label: &str) -> Self {
        let color = Texture::create_render_texture(&ctx.device, size, ctx.surface_format, label);
        let depth = Texture::create_depth_texture(&ctx.device, size, &format!("{label} depth"));
        let camera = CameraResources::with_layout(&ctx.device, camera, &projection, ctx.layouts.camera.clone());
        log::debug!("render texture '{}': {}x{} {:?}", label, size[0], size[1], ctx.surface_format);
        Self {
            color,
            depth,
            camera,
            projection,
            clear_colour: wgpu::Color::BLACK,
            label: label.to_string(),
        }
    }

    /// Bind group for [`RenderObject::textured`].
    pub fn bind_group(&self, ctx: &InitContext) -> wgpu::BindGroup {
        mk_texture_bind_group(&ctx.device, &ctx.layouts.texture, &self.color)
    }

    /// Draws `objects` into the texture and submits the pass. Their instance
    /// buffers must already hold this frame's world matrices.
    pub fn render(&mut self, ctx: &Context, objects: &[RenderObject]) {
        self.camera.write_to_buffer(&ctx.queue, &self.projection);
        let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Texture Encoder"),
        });
        {
            let mut render_pass = begin_pass(
                &mut encoder,
                &self.label,
                &self.color.view,
                &self.depth.view,
                self.clear_colour,
            );
            draw_render(ctx, &mut render_pass, object::render_all(objects), &self.camera.bind_group);
        }
        ctx.queue.submit(iter::once(encoder.finish()));
    }
}
