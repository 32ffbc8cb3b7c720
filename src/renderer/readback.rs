// renderer/readback.rs
// RGBA8 texture readback yielding tightly packed CPU buffers

use super::backend::RenderError;
use std::sync::mpsc;

const BYTES_PER_PIXEL: usize = 4;

/// Rounds a row length up to wgpu's copy alignment (256 bytes).
pub(crate) fn align_bpr(value: usize) -> usize {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize;
    value.div_ceil(align) * align
}

/// Copies `tight_bpr` bytes out of every `padded_bpr`-byte row.
pub(crate) fn depad_rows(data: &[u8], padded_bpr: usize, tight_bpr: usize, height: usize) -> Vec<u8> {
    let mut tight = vec![0u8; tight_bpr * height];
    for row in 0..height {
        let src = row * padded_bpr;
        let dst = row * tight_bpr;
        tight[dst..dst + tight_bpr].copy_from_slice(&data[src..src + tight_bpr]);
    }
    tight
}

pub(crate) fn read_texture_tight(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    src: &wgpu::Texture,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, RenderError> {
    if width == 0 || height == 0 {
        return Err(RenderError::Readback("readback size must be positive".into()));
    }

    let tight_bpr = BYTES_PER_PIXEL * width as usize;
    let padded_bpr = align_bpr(tight_bpr);
    let buffer_size = (padded_bpr * height as usize) as wgpu::BufferAddress;

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("ThumbnailReadbackStaging"),
        size: buffer_size,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("ThumbnailReadbackEncoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: src,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bpr as u32),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (sender, receiver) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });

    device
        .poll(wgpu::PollType::wait_indefinitely())
        .map_err(|e| RenderError::Device(e.to_string()))?;
    receiver
        .recv()
        .map_err(|_| RenderError::Readback("map_async callback channel dropped".into()))?
        .map_err(|e| RenderError::Readback(e.to_string()))?;

    let tight = {
        let data = slice.get_mapped_range();
        depad_rows(&data, padded_bpr, tight_bpr, height as usize)
    };
    staging.unmap();

    Ok(tight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_align_to_256_bytes() {
        assert_eq!(align_bpr(256 * 4), 1024);
        assert_eq!(align_bpr(4), 256);
        assert_eq!(align_bpr(257), 512);
    }

    #[test]
    fn depad_drops_row_padding() {
        // two rows of 3 bytes padded to 5
        let data = [1, 2, 3, 0, 0, 4, 5, 6, 0, 0];
        assert_eq!(depad_rows(&data, 5, 3, 2), vec![1, 2, 3, 4, 5, 6]);
    }
}
