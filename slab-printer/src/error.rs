//! Error types for the rendering and printing library

use thiserror::Error;

/// Code generator errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    /// Payload is not an absolute URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Payload does not fit any code version
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// Requested bitmap cannot hold one pixel per module plus the quiet zone
    #[error("Code needs at least {min_px}px, requested {target_px}px")]
    SizeTooSmall { target_px: u32, min_px: u32 },
}

/// Result type for code generation
pub type CodeResult<T> = Result<T, CodeError>;

/// Label compositor and raster errors
#[derive(Debug, Error)]
pub enum RenderError {
    /// Code bitmap is larger than the code cell of the label
    #[error("Code bitmap of {code_px}px does not fit a {cell_px}px cell")]
    CodeDoesNotFit { code_px: u32, cell_px: u32 },

    /// PNG encode/decode failure
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Logo or badge asset could not be loaded
    #[error("Asset {path}: {reason}")]
    Asset { path: String, reason: String },
}

/// Result type for rendering
pub type RenderResult<T> = Result<T, RenderError>;

/// Print formatter errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// Page dimensions leave no printable area
    #[error("Invalid page: {0}")]
    InvalidPage(String),

    /// A label is larger than the printable area of the page
    #[error("Label {label_w}x{label_h}px exceeds printable area {area_w}x{area_h}px")]
    LabelExceedsPage {
        label_w: u32,
        label_h: u32,
        area_w: u32,
        area_h: u32,
    },
}

/// Result type for page layout
pub type LayoutResult<T> = Result<T, LayoutError>;

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// IO error during printing
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Print command exited unsuccessfully
    #[error("Print command failed ({status}): {stderr}")]
    CommandFailed { status: String, stderr: String },

    /// Printer is offline or unreachable
    #[error("Printer offline: {0}")]
    Offline(String),

    /// Invalid printer configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Page could not be encoded for the device
    #[error("Encode failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
