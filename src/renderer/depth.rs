/// Depth attachment for an offscreen target.
pub struct Depth {
    _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub format: wgpu::TextureFormat,
}

impl Depth {
    pub fn new(device: &wgpu::Device, width: u32, height: u32, bits: u32) -> Self {
        let format = depth_format(bits);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("ThumbnailDepth"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
            format,
        }
    }
}

/// Maps a requested precision onto a depth format every adapter supports.
pub fn depth_format(bits: u32) -> wgpu::TextureFormat {
    match bits {
        16 => wgpu::TextureFormat::Depth16Unorm,
        32 => wgpu::TextureFormat::Depth32Float,
        _ => wgpu::TextureFormat::Depth24Plus,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twenty_four_bits_is_depth24plus() {
        // no device needed, runs headless
        assert!(matches!(depth_format(24), wgpu::TextureFormat::Depth24Plus));
        assert!(matches!(depth_format(16), wgpu::TextureFormat::Depth16Unorm));
        assert!(matches!(depth_format(32), wgpu::TextureFormat::Depth32Float));
    }
}
