//! PNG encode/decode helpers

use crate::error::{RenderError, RenderResult};
use image::{DynamicImage, GrayImage, ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::Path;

pub const PNG_MIME: &str = "image/png";

/// Encode an RGBA raster as PNG
pub fn encode_png(img: &RgbaImage) -> RenderResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// Encode a grayscale raster as PNG
pub fn encode_gray_png(img: &GrayImage) -> RenderResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// Decode any supported image format into RGBA
pub fn decode(bytes: &[u8]) -> RenderResult<RgbaImage> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// Load an image asset (logo) from disk
pub fn load(path: &Path) -> RenderResult<RgbaImage> {
    image::open(path)
        .map(|img: DynamicImage| img.to_rgba8())
        .map_err(|e| RenderError::Asset {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgba};

    #[test]
    fn test_png_round_trip_is_lossless() {
        let img = RgbaImage::from_fn(7, 5, |x, y| Rgba([x as u8 * 30, y as u8 * 40, 7, 255]));
        let bytes = encode_png(&img).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(decode(&bytes).unwrap(), img);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let img = GrayImage::from_fn(9, 9, |x, y| Luma([((x + y) % 2 * 255) as u8]));
        assert_eq!(encode_gray_png(&img).unwrap(), encode_gray_png(&img).unwrap());
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(decode(b"nope"), Err(RenderError::Image(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, RenderError::Asset { .. }));
    }
}
