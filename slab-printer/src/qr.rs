//! Code generator
//!
//! Encodes a verification URL as a QR code bitmap. Output depends only on
//! the URL and the requested size, so re-rendering a label reproduces the
//! same pixels.

use crate::error::{CodeError, CodeResult};
use image::{GrayImage, Luma};
use qrcode::{Color, EcLevel, QrCode};

/// Error correction level used for every printed code
pub const EC_LEVEL: EcLevel = EcLevel::M;

/// Light modules around the symbol, in modules
pub const QUIET_ZONE: u32 = 4;

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// Encode `url` into a `target_px` x `target_px` bitmap.
///
/// Modules are drawn at the largest whole-pixel size that fits; leftover
/// pixels widen the quiet zone evenly so the symbol stays centred.
pub fn encode(url: &str, target_px: u32) -> CodeResult<GrayImage> {
    validate_url(url)?;

    let code = QrCode::with_error_correction_level(url.as_bytes(), EC_LEVEL)
        .map_err(|e| CodeError::Encode(e.to_string()))?;
    let modules = code.width() as u32;
    let min_px = modules + 2 * QUIET_ZONE;
    if target_px < min_px {
        return Err(CodeError::SizeTooSmall { target_px, min_px });
    }

    let module_px = target_px / min_px;
    let offset = (target_px - modules * module_px) / 2;
    let colors = code.to_colors();

    Ok(GrayImage::from_fn(target_px, target_px, |x, y| {
        if x < offset || y < offset {
            return LIGHT;
        }
        let mx = (x - offset) / module_px;
        let my = (y - offset) / module_px;
        if mx >= modules || my >= modules {
            return LIGHT;
        }
        match colors[(my * modules + mx) as usize] {
            Color::Dark => DARK,
            Color::Light => LIGHT,
        }
    }))
}

/// Smallest bitmap size that can carry `url`
pub fn min_size(url: &str) -> CodeResult<u32> {
    validate_url(url)?;
    let code = QrCode::with_error_correction_level(url.as_bytes(), EC_LEVEL)
        .map_err(|e| CodeError::Encode(e.to_string()))?;
    Ok(code.width() as u32 + 2 * QUIET_ZONE)
}

fn validate_url(url: &str) -> CodeResult<()> {
    let uri: http::Uri = url
        .parse()
        .map_err(|e: http::uri::InvalidUri| CodeError::InvalidUrl(format!("{}: {}", url, e)))?;
    if uri.scheme().is_none() || uri.authority().is_none() {
        return Err(CodeError::InvalidUrl(format!(
            "{}: scheme and host are required",
            url
        )));
    }
    Ok(())
}
