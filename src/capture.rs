//! Screenshots of the rendered frame.
//!
//! The frame is rendered a second time into an off-screen target of the
//! surface format, copied into a mappable buffer and written as PNG.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    data_structures::texture::Texture,
    pick::{map_buffer, padded_bytes_per_row},
};

/// Drops the per-row padding of a GPU readback, keeping `width * 4` bytes
/// of each of the `height` rows.
pub fn unpad_rows(data: &[u8], width: u32, height: u32, padded_bpr: u32) -> Vec<u8> {
    let row = (width * 4) as usize;
    let mut out = Vec::with_capacity(row * height as usize);
    for chunk in data.chunks(padded_bpr as usize).take(height as usize) {
        out.extend_from_slice(&chunk[..row.min(chunk.len())]);
    }
    out
}

/// Swaps the red and blue channel of every pixel in place.
pub fn bgra_to_rgba(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(4) {
        px.swap(0, 2);
    }
}

pub fn is_bgra(format: wgpu::TextureFormat) -> bool {
    matches!(
        format,
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
    )
}

/// `dir/frame_0007.png` for `index` 7.
pub fn capture_path(dir: &Path, index: u32) -> PathBuf {
    dir.join(format!("frame_{index:04}.png"))
}

/// Off-screen colour and depth targets plus the readback buffer of one capture.
#[derive(Debug)]
pub struct Capture {
    pub target: Texture,
    pub depth: Texture,
    buffer: wgpu::Buffer,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
}

impl Capture {
    pub fn new(device: &wgpu::Device, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        let target = Texture::create_readback_target(device, [width, height], format, "Capture texture");
        let depth = Texture::create_depth_texture(device, [width, height], "Capture depth texture");
        let size = target.size();
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Capture readback buffer"),
            size: (padded_bytes_per_row(size.width) * size.height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        Self {
            target,
            depth,
            buffer,
            format,
            width: size.width,
            height: size.height,
        }
    }

    /// Records the copy of the rendered target into the readback buffer.
    pub fn copy_to_buffer(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &self.target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row(self.width)),
                    rows_per_image: Some(self.height),
                },
            },
            self.target.size(),
        );
    }

    /// Reads the buffer back and writes it to `path`. The copy must have been
    /// submitted.
    pub async fn save(self, device: &wgpu::Device, path: &Path) -> anyhow::Result<()> {
        map_buffer(&self.buffer, device)
            .await
            .context("reading back the captured frame")?;
        let mut pixels = {
            let data = self.buffer.slice(..).get_mapped_range();
            unpad_rows(&data, self.width, self.height, padded_bytes_per_row(self.width))
        };
        self.buffer.unmap();
        if is_bgra(self.format) {
            bgra_to_rgba(&mut pixels);
        }

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        let image = image::RgbaImage::from_raw(self.width, self.height, pixels)
            .context("captured frame has an unexpected size")?;
        image
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!("captured frame to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpadding_keeps_visible_bytes_only() {
        // 2x2 image, rows padded to 12 bytes.
        let data: Vec<u8> = (0..24).collect();
        let out = unpad_rows(&data, 2, 2, 12);
        assert_eq!(out, vec![0, 1, 2, 3, 4, 5, 6, 7, 12, 13, 14, 15, 16, 17, 18, 19]);
    }

    #[test]
    fn bgra_swap() {
        let mut px = [1, 2, 3, 4, 5, 6, 7, 8];
        bgra_to_rgba(&mut px);
        assert_eq!(px, [3, 2, 1, 4, 7, 6, 5, 8]);
    }

    #[test]
    fn capture_names_are_zero_padded() {
        assert_eq!(capture_path(Path::new("out"), 7), PathBuf::from("out/frame_0007.png"));
    }
}
