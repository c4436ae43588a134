//! Object picking and selection.
//!
//! Picking renders every pickable object with its id packed into an RGBA8
//! colour, copies the off-screen target into a mappable buffer and reads the
//! pixel under the cursor:
//! 1. Render all flows' pickables into an `Rgba8Unorm` target, cleared to 0
//! 2. Copy the target into a buffer with rows padded to 256 bytes
//! 3. Map the buffer and decode the pixel under the cursor
//! 4. Map the id back to the flows that rendered it
//!
//! Step 4 makes sure only the flows responsible for the object are invoked.

use std::{
    collections::{HashMap, HashSet},
    iter,
};

use wgpu::util::DeviceExt;

use crate::{
    context::{Context, MouseState},
    data_structures::{mesh::DrawMesh, texture::Texture},
    error::PickError,
    flow::GraphicsFlow,
    render::Drawable,
};

#[cfg(target_arch = "wasm32")]
use crate::flow::FlowEvent;

pub const PICK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const BYTES_PER_PIXEL: u32 = 4;

/// Little-endian bytes of `id`: red holds the lowest byte, alpha the highest.
pub fn encode_id(id: u32) -> [u8; 4] {
    id.to_le_bytes()
}

pub fn decode_id(rgba: [u8; 4]) -> u32 {
    u32::from_le_bytes(rgba)
}

/// `encode_id` normalised to `[0, 1]` for the fragment shader. Unorm targets
/// round `b / 255` back to exactly `b`.
pub fn id_to_colour(id: u32) -> [f32; 4] {
    encode_id(id).map(|b| f32::from(b) / 255.0)
}

/// Row pitch of a `width` pixel RGBA8 copy, rounded up to
/// `COPY_BYTES_PER_ROW_ALIGNMENT`.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * BYTES_PER_PIXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Byte offset of pixel `(x, y)` in a padded readback buffer, `None` when the
/// pixel lies outside the `width` x `height` target.
pub fn pixel_offset(x: u32, y: u32, width: u32, height: u32, padded_bpr: u32) -> Option<usize> {
    if x >= width || y >= height {
        return None;
    }
    Some(y as usize * padded_bpr as usize + (x * BYTES_PER_PIXEL) as usize)
}

/// Pixel under a cursor position, `None` for negative or non-finite positions.
pub fn cursor_pixel(x: f64, y: f64) -> Option<(u32, u32)> {
    if !(x.is_finite() && y.is_finite()) || x < 0.0 || y < 0.0 {
        return None;
    }
    Some((x.floor() as u32, y.floor() as u32))
}

/// Reads the id stored at `(x, y)` of a padded RGBA8 readback.
pub fn id_at(data: &[u8], x: u32, y: u32, width: u32, height: u32) -> Option<u32> {
    let offset = pixel_offset(x, y, width, height, padded_bytes_per_row(width))?;
    let bytes = data.get(offset..offset + BYTES_PER_PIXEL as usize)?;
    Some(decode_id([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Uniform bind group carrying the id colour of one object.
pub fn pick_bind_group(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, id: u32) -> wgpu::BindGroup {
    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Pick color buffer"),
        contents: bytemuck::cast_slice(&id_to_colour(id)),
        usage: wgpu::BufferUsages::UNIFORM,
    });
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
        label: Some("pick_bind_group"),
    })
}

/// Render all flows to the pick target and determine which object was clicked.
///
/// # Arguments
///
/// * `async_runtime` resolves the buffer mapping on native targets
/// * `flows` are all active flows; their renders decide what is pickable
/// * `ctx` is the rendering context
/// * `mouse_state` holds the cursor position at the time of the click
/// * `proxy` on the web the result arrives later as a `FlowEvent::Id`
///
/// # Returns
///
/// `Some((pick_id, flow_ids))` if an object was hit. Always `None` on the web.
pub fn draw_to_pick_buffer<State, Event>(
    #[cfg(not(target_arch = "wasm32"))] async_runtime: &tokio::runtime::Runtime,
    flows: &mut [Box<dyn GraphicsFlow<State, Event>>],
    ctx: &Context,
    mouse_state: &MouseState,
    #[cfg(target_arch = "wasm32")] proxy: winit::event_loop::EventLoopProxy<FlowEvent<State, Event>>,
) -> Option<(u32, HashSet<usize>)> {
    let width = ctx.config.width;
    let height = ctx.config.height;
    let (x, y) = match cursor_pixel(mouse_state.coords.x, mouse_state.coords.y) {
        Some(pixel) if pixel.0 < width && pixel.1 < height => pixel,
        _ => {
            let err = PickError::OutOfBounds {
                x: mouse_state.coords.x,
                y: mouse_state.coords.y,
                width,
                height,
            };
            log::warn!("{}", err);
            return None;
        }
    };

    let pick_texture = Texture::create_readback_target(&ctx.device, [width, height], PICK_FORMAT, "Pick texture");
    let pick_depth_texture = Texture::create_depth_texture(&ctx.device, [width, height], "Pick depth texture");

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Pick Encoder"),
        });
    let mut translation: HashMap<u32, HashSet<usize>> = HashMap::new();

    {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Pick Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &pick_texture.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &pick_depth_texture.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
            multiview_mask: None,
        });

        let mut pickables: Vec<Drawable> = Vec::new();
        /*
           Flows may share pick ids. We remember which flow index rendered which
           id so that only those flows get the click.

           flow 0 renders [1, 2, 3], flow 1 renders [3, 4]
           hit 2 -> flow 0; hit 3 -> flow 0 and flow 1.
        */
        flows.iter().enumerate().for_each(|(idx, flow)| {
            let render = flow.on_render();
            render.map_ids(idx, &mut translation);
            render.set_pick_pipelines(&mut pickables);
        });

        let pick_groups: Vec<wgpu::BindGroup> = pickables
            .iter()
            .map(|d| pick_bind_group(&ctx.device, &ctx.layouts.pick, d.id))
            .collect();

        render_pass.set_pipeline(&ctx.pipelines.pick);
        for (drawable, group) in pickables.iter().zip(pick_groups.iter()) {
            if drawable.amount == 0 {
                continue;
            }
            render_pass.set_vertex_buffer(1, drawable.instance.slice(..));
            render_pass.draw_mesh_instanced(drawable.mesh, 0..drawable.amount, &[&ctx.camera.bind_group, group]);
        }
    }

    let padded_bpr = padded_bytes_per_row(width);
    let output_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        size: (padded_bpr * height) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST
                    // this tells wpgu that we want to read this buffer from the cpu
                    | wgpu::BufferUsages::MAP_READ,
        label: Some("Pick readback buffer"),
        mapped_at_creation: false,
    });

    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture: &pick_texture.texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &output_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bpr),
                rows_per_image: Some(height),
            },
        },
        pick_texture.size(),
    );

    ctx.queue.submit(iter::once(encoder.finish()));
    let device = ctx.device.clone();

    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen_futures::spawn_local(async move {
            match read_texture_buffer(&output_buffer, &device, x, y, width, height).await {
                Ok(id) => {
                    if let Some(flow_ids) = translation.get(&id) {
                        if proxy.send_event(FlowEvent::Id((id, flow_ids.clone()))).is_err() {
                            log::error!("event loop closed before pick result {} arrived", id);
                        }
                    }
                }
                Err(e) => log::error!("picking failed: {}", e),
            }
        });
        None
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        match async_runtime.block_on(read_texture_buffer(&output_buffer, &device, x, y, width, height)) {
            Ok(id) => translation.get(&id).map(|flow_ids| (id, flow_ids.clone())),
            Err(e) => {
                log::error!("picking failed: {}", e);
                None
            }
        }
    }
}

/// Maps `buffer` for reading and waits for the GPU.
///
/// The mapping has to be requested before polling, otherwise the wait never
/// finishes.
pub(crate) async fn map_buffer(buffer: &wgpu::Buffer, device: &wgpu::Device) -> Result<(), PickError> {
    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    buffer.slice(..).map_async(wgpu::MapMode::Read, move |result| {
        // The receiver only disappears if the caller gave up waiting.
        let _ = tx.send(result);
    });
    #[cfg(target_arch = "wasm32")]
    device.poll(wgpu::PollType::Poll)?;
    #[cfg(not(target_arch = "wasm32"))]
    device.poll(wgpu::PollType::Wait {
        submission_index: None,
        timeout: None,
    })?;
    rx.receive().await.ok_or(PickError::ChannelClosed)??;
    Ok(())
}

async fn read_texture_buffer(
    buffer: &wgpu::Buffer,
    device: &wgpu::Device,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> Result<u32, PickError> {
    map_buffer(buffer, device).await?;
    let id = {
        let data = buffer.slice(..).get_mapped_range();
        id_at(&data, x, y, width, height)
    };
    buffer.unmap();
    let id = id.ok_or(PickError::OutOfBounds {
        x: f64::from(x),
        y: f64::from(y),
        width,
        height,
    })?;
    log::info!("Selected obj with id {}", id);
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_to_the_copy_alignment() {
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(800), 3328);
    }

    #[test]
    fn negative_cursor_has_no_pixel() {
        assert_eq!(cursor_pixel(-1.0, 3.0), None);
        assert_eq!(cursor_pixel(f64::NAN, 3.0), None);
        assert_eq!(cursor_pixel(2.7, 3.2), Some((2, 3)));
    }
}
