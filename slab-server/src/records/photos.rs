//! Reference photographs
//!
//! Front/back photos are validated, stored under `cards/{id}_{side}` and
//! linked from the record. They are independent of label artifacts.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{ArtifactKey, ArtifactKind};
use std::sync::Arc;

use crate::store::{ArtifactStore, PhotoSide, RecordStore};

/// Maximum file size (5MB)
pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// One photo to attach
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub side: PhotoSide,
    pub bytes: Vec<u8>,
}

/// Validate image bytes and return their MIME type
pub fn validate_image(data: &[u8]) -> AppResult<&'static str> {
    if data.is_empty() {
        return Err(AppError::with_message(ErrorCode::InvalidImage, "Empty file provided"));
    }

    // Check file size
    if data.len() > MAX_FILE_SIZE {
        return Err(AppError::with_message(
            ErrorCode::ImageTooLarge,
            format!(
                "File too large. Maximum size is {} bytes ({}MB)",
                MAX_FILE_SIZE,
                MAX_FILE_SIZE / 1024 / 1024
            ),
        ));
    }

    let format = image::guess_format(data).map_err(|e| {
        AppError::with_message(ErrorCode::InvalidImage, format!("Unknown image format: {e}"))
    })?;
    let mime = match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::WebP => "image/webp",
        other => {
            return Err(AppError::with_message(
                ErrorCode::InvalidImage,
                format!("Unsupported image format {other:?}. Supported: png, jpeg, webp"),
            ));
        }
    };

    // Verify it's actually an image by trying to load it
    if let Err(e) = image::load_from_memory_with_format(data, format) {
        return Err(AppError::with_message(
            ErrorCode::InvalidImage,
            format!("Invalid image file: {e}"),
        ));
    }

    Ok(mime)
}

/// Decode a base64 payload, with or without a `data:<mime>;base64,` prefix
pub fn decode_data_uri(data: &str) -> AppResult<Vec<u8>> {
    let payload = match data.split_once(";base64,") {
        Some((prefix, payload)) if prefix.starts_with("data:") => payload,
        _ => data,
    };
    STANDARD
        .decode(payload.trim())
        .map_err(|e| AppError::with_message(ErrorCode::InvalidFormat, format!("Invalid base64: {e}")))
}

pub fn artifact_kind(side: PhotoSide) -> ArtifactKind {
    match side {
        PhotoSide::Front => ArtifactKind::Front,
        PhotoSide::Back => ArtifactKind::Back,
    }
}

#[derive(Clone)]
pub struct PhotoService {
    records: Arc<dyn RecordStore>,
    artifacts: Arc<dyn ArtifactStore>,
}

impl PhotoService {
    pub fn new(records: Arc<dyn RecordStore>, artifacts: Arc<dyn ArtifactStore>) -> Self {
        Self { records, artifacts }
    }

    /// Store a photo and link it from the record; returns the photo URL
    pub async fn attach(&self, record_id: &str, side: PhotoSide, bytes: &[u8]) -> AppResult<String> {
        let mime = validate_image(bytes)?;
        // Existence check before writing any blob
        self.records.get(record_id).await?;

        let key = ArtifactKey::new(record_id, artifact_kind(side));
        let url = self.artifacts.put(&key, bytes, mime).await?;
        self.records.set_photo(record_id, side, &url).await?;

        tracing::info!(record_id = %record_id, side = %side, url = %url, "Photo attached");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryArtifactStore, MemoryRecordStore};
    use image::{Rgba, RgbaImage};
    use shared::models::{Grade, RecordFields};

    fn png() -> Vec<u8> {
        slab_printer::raster::encode_png(&RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255])))
            .unwrap()
    }

    #[test]
    fn test_validate_image() {
        assert_eq!(validate_image(&png()).unwrap(), "image/png");

        let err = validate_image(b"not an image").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidImage);

        let err = validate_image(&[]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidImage);

        let mut big = png();
        big.resize(MAX_FILE_SIZE + 1, 0);
        assert_eq!(validate_image(&big).unwrap_err().code, ErrorCode::ImageTooLarge);
    }

    #[test]
    fn test_decode_data_uri() {
        let raw = png();
        let encoded = STANDARD.encode(&raw);
        assert_eq!(decode_data_uri(&encoded).unwrap(), raw);
        assert_eq!(
            decode_data_uri(&format!("data:image/png;base64,{encoded}")).unwrap(),
            raw
        );
        assert_eq!(
            decode_data_uri("data:image/png;base64,@@@").unwrap_err().code,
            ErrorCode::InvalidFormat
        );
    }

    #[tokio::test]
    async fn test_attach_links_record() {
        let records = Arc::new(MemoryRecordStore::new());
        let artifacts = Arc::new(MemoryArtifactStore::new("http://a"));
        let service = PhotoService::new(records.clone(), artifacts.clone());

        let fields = RecordFields {
            grade: Grade::from("9"),
            ..Default::default()
        };
        let id = records.create(&fields).await.unwrap();

        let url = service.attach(&id, PhotoSide::Front, &png()).await.unwrap();
        assert_eq!(url, format!("http://a/cards/{id}_front.png"));
        assert_eq!(records.get(&id).await.unwrap().image_front, Some(url));
        assert!(artifacts.contains(&ArtifactKey::new(id.as_str(), ArtifactKind::Front)));
    }

    #[tokio::test]
    async fn test_attach_unknown_record() {
        let artifacts = Arc::new(MemoryArtifactStore::default());
        let service = PhotoService::new(Arc::new(MemoryRecordStore::new()), artifacts.clone());

        let err = service.attach("missing", PhotoSide::Back, &png()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RecordNotFound);
        assert!(artifacts.is_empty());
    }
}
