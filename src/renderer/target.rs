// renderer/target.rs
//
// Offscreen render targets and the CPU images read back from them.

use std::fmt;

/// Opaque id of an offscreen target owned by a render backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(pub(crate) u64);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target#{}", self.0)
    }
}

/// Largest edge length accepted for an offscreen target.
pub const MAX_TARGET_SIZE: u32 = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDescriptor {
    pub width: u32,
    pub height: u32,
    /// Depth buffer precision: 16, 24 or 32 bits.
    pub depth_bits: u32,
}

impl TargetDescriptor {
    pub fn square(size: u32, depth_bits: u32) -> Self {
        Self {
            width: size,
            height: size,
            depth_bits,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("target size {}x{} is empty", self.width, self.height));
        }
        if self.width > MAX_TARGET_SIZE || self.height > MAX_TARGET_SIZE {
            return Err(format!(
                "target size {}x{} exceeds {}",
                self.width, self.height, MAX_TARGET_SIZE
            ));
        }
        if !matches!(self.depth_bits, 16 | 24 | 32) {
            return Err(format!("unsupported depth precision {}", self.depth_bits));
        }
        Ok(())
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Tightly packed RGBA8 image, rows top to bottom, straight alpha.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl fmt::Debug for PixelImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

impl PixelImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, String> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|px| px.checked_mul(4))
            .ok_or_else(|| format!("image dimensions {width}x{height} overflow"))?;
        if pixels.len() != expected {
            return Err(format!(
                "RGBA8 image {}x{} needs {} bytes, got {}",
                width,
                height,
                expected,
                pixels.len()
            ));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    /// Number of pixels with non-zero alpha.
    pub fn coverage(&self) -> usize {
        self.pixels.chunks_exact(4).filter(|px| px[3] != 0).count()
    }

    pub fn into_rgba_image(self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_rejects_bad_depth() {
        assert!(TargetDescriptor::square(256, 24).validate().is_ok());
        assert!(TargetDescriptor::square(256, 8).validate().is_err());
        assert!(TargetDescriptor::square(0, 24).validate().is_err());
        assert!(TargetDescriptor::square(MAX_TARGET_SIZE + 1, 24)
            .validate()
            .is_err());
    }

    #[test]
    fn image_length_is_checked() {
        assert!(PixelImage::new(2, 2, vec![0; 16]).is_ok());
        assert!(PixelImage::new(2, 2, vec![0; 15]).is_err());
    }

    #[test]
    fn pixel_lookup_is_row_major() {
        let mut bytes = vec![0; 2 * 2 * 4];
        bytes[8..12].copy_from_slice(&[1, 2, 3, 4]);
        let img = PixelImage::new(2, 2, bytes).unwrap();
        assert_eq!(img.pixel(0, 1), Some([1, 2, 3, 4]));
        assert_eq!(img.pixel(2, 0), None);
        assert_eq!(img.coverage(), 1);
    }

    #[test]
    fn converts_to_image_buffer_without_touching_alpha() {
        let mut bytes = vec![0; 2 * 2 * 4];
        bytes[4..8].copy_from_slice(&[10, 20, 30, 40]);
        let img = PixelImage::new(2, 2, bytes).unwrap();
        let rgba = img.into_rgba_image().expect("buffer");
        assert_eq!(rgba.dimensions(), (2, 2));
        assert_eq!(rgba.get_pixel(1, 0).0, [10, 20, 30, 40]);
        assert_eq!(rgba.get_pixel(0, 1).0, [0, 0, 0, 0]);
    }
}
