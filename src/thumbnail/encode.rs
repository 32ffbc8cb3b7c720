// thumbnail/encode.rs
use super::error::ThumbnailError;
use crate::renderer::PixelImage;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};
use std::path::Path;

/// PNG bytes for `image`. Alpha is stored straight, never premultiplied.
pub fn encode_png(image: &PixelImage) -> Result<Vec<u8>, image::ImageError> {
    let mut out = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut out, CompressionType::Default, FilterType::Adaptive);
    encoder.write_image(
        image.as_bytes(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(out)
}

/// Encodes and writes `image` to `path`, creating missing directories.
/// Returns the number of bytes written.
pub fn encode_and_write(image: &PixelImage, path: &Path) -> Result<u64, ThumbnailError> {
    let io_err = |source| ThumbnailError::Io {
        path: path.to_path_buf(),
        source,
    };
    let bytes = encode_png(image).map_err(|e| io_err(std::io::Error::other(e)))?;
    crate::io::write_binary(path, &bytes).map_err(io_err)?;
    Ok(bytes.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn half_covered(size: u32) -> PixelImage {
        let mut pixels = vec![0u8; (size * size * 4) as usize];
        for px in pixels.chunks_exact_mut(4).take((size * size / 2) as usize) {
            px.copy_from_slice(&[200, 40, 10, 128]);
        }
        PixelImage::new(size, size, pixels).expect("image")
    }

    #[test]
    fn png_keeps_straight_alpha() {
        let image = half_covered(8);
        let png = encode_png(&image).expect("encode");
        assert_eq!(&png[1..4], b"PNG");

        let decoded = image::load_from_memory(&png).expect("decode").to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0).0, [200, 40, 10, 128]);
        assert_eq!(decoded.get_pixel(7, 7).0, [0, 0, 0, 0]);
    }

    #[test]
    fn write_creates_directories_and_reports_size() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Resources/Thumbnails/cube_thumbnail.png");
        let written = encode_and_write(&half_covered(4), &path).expect("write");
        assert_eq!(std::fs::metadata(&path).expect("meta").len(), written);
    }

    #[test]
    fn unwritable_path_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").expect("blocker");
        let err = encode_and_write(&half_covered(4), &blocker.join("out.png")).unwrap_err();
        assert!(matches!(err, ThumbnailError::Io { .. }));
    }
}
