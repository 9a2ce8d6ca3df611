//! Card API Handlers

use axum::extract::{Json, Path, State};
use serde::{Deserialize, Serialize};
use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::{RecordFields, VerificationUrl};
use shared::util::is_valid_record_id;

use crate::batch::BatchItem;
use crate::core::ServerState;
use crate::issuance::{IssuanceStage, IssueRequest, IssuedLabel, PhotoOutcome};
use crate::records::DeleteOutcome;
use crate::records::photos::{PhotoUpload, decode_data_uri};
use crate::store::PhotoSide;

/// Upper bound of a single batch request
const MAX_BATCH_COUNT: usize = 500;

fn check_id(id: &str) -> AppResult<()> {
    if is_valid_record_id(id) {
        Ok(())
    } else {
        Err(AppError::with_message(
            ErrorCode::RecordIdInvalid,
            format!("Invalid record id: {id:?}"),
        ))
    }
}

#[derive(Debug, Deserialize)]
pub struct IssueCardRequest {
    #[serde(flatten)]
    pub fields: RecordFields,
    /// base64 or data URI
    #[serde(default, rename = "imageFront")]
    pub image_front: Option<String>,
    #[serde(default, rename = "imageBack")]
    pub image_back: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PhotoResult {
    pub side: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<PhotoOutcome> for PhotoResult {
    fn from(outcome: PhotoOutcome) -> Self {
        let (url, error) = match outcome.result {
            Ok(url) => (Some(url), None),
            Err(e) => (None, Some(e.message)),
        };
        Self {
            side: outcome.side.to_string(),
            url,
            error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IssueCardResponse {
    pub record_id: String,
    pub stage: IssuanceStage,
    pub verification_url: VerificationUrl,
    pub label_url: String,
    pub code_url: String,
    pub photos: Vec<PhotoResult>,
}

/// POST /api/cards - Issue one label
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<IssueCardRequest>,
) -> AppResult<ApiResponse<IssueCardResponse>> {
    let mut photos = Vec::new();
    for (side, data) in [
        (PhotoSide::Front, &payload.image_front),
        (PhotoSide::Back, &payload.image_back),
    ] {
        if let Some(data) = data.as_deref().filter(|d| !d.trim().is_empty()) {
            let bytes = decode_data_uri(data).map_err(|e| e.with_detail("side", side.as_str()))?;
            photos.push(PhotoUpload { side, bytes });
        }
    }

    let report = state
        .issuance
        .issue(IssueRequest {
            fields: payload.fields,
            photos,
        })
        .await?;

    let photos: Vec<PhotoResult> = report.photos.into_iter().map(PhotoResult::from).collect();
    match report.label {
        Ok(IssuedLabel {
            record_id,
            verification_url,
            label_url,
            code_url,
            ..
        }) => Ok(ApiResponse::success(IssueCardResponse {
            record_id,
            stage: IssuanceStage::Complete,
            verification_url,
            label_url,
            code_url,
            photos,
        })),
        Err(e) => {
            let photos = serde_json::to_value(&photos).unwrap_or_default();
            Err(AppError::from(e).with_detail("photos", photos))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub template: RecordFields,
    pub count: usize,
    /// Print the sheet once every label is persisted
    #[serde(default)]
    pub print: bool,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub items: Vec<BatchItem>,
    pub succeeded: usize,
    pub failed: usize,
    pub sheet_pages: usize,
    pub printed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print_job: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print_error: Option<String>,
}

/// POST /api/cards/batch - Issue `count` labels from one template
pub async fn batch(
    State(state): State<ServerState>,
    Json(payload): Json<BatchRequest>,
) -> AppResult<ApiResponse<BatchResponse>> {
    if payload.count > MAX_BATCH_COUNT {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("count must be at most {MAX_BATCH_COUNT}"),
        )
        .with_detail("field", "count"));
    }

    let report = state.batch.run(payload.template, payload.count).await?;

    let mut print_job = None;
    let mut print_error = None;
    if payload.print && !report.sheet.is_empty() {
        // Labels are already persisted; a print failure does not fail the batch
        match state.printing.print_pages("batch", &report.sheet).await {
            Ok(job) => print_job = Some(job),
            Err(e) => {
                tracing::warn!(error = %e, "Batch sheet print failed");
                print_error = Some(e.to_string());
            }
        }
    }

    Ok(ApiResponse::success(BatchResponse {
        succeeded: report.succeeded(),
        failed: report.failed(),
        sheet_pages: report.sheet.len(),
        items: report.items,
        printed: print_job.is_some(),
        print_job,
        print_error,
    }))
}

/// PUT /api/cards/{id} - Replace fields and re-render
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(fields): Json<RecordFields>,
) -> AppResult<ApiResponse<IssuedLabel>> {
    check_id(&id)?;
    let issued = state.record_service.update(&id, fields).await?;
    Ok(ApiResponse::success(issued))
}

/// DELETE /api/cards/{id} - Delete record and artifacts
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<DeleteOutcome>> {
    check_id(&id)?;
    let outcome = state.record_service.delete(&id).await?;
    Ok(ApiResponse::success(outcome))
}

#[derive(Debug, Deserialize)]
pub struct PhotoRequest {
    /// base64 or data URI
    pub data: String,
}

#[derive(Debug, Serialize)]
pub struct PhotoResponse {
    pub url: String,
}

/// POST /api/cards/{id}/photos/{side} - Attach a reference photo
pub async fn attach_photo(
    State(state): State<ServerState>,
    Path((id, side)): Path<(String, String)>,
    Json(payload): Json<PhotoRequest>,
) -> AppResult<ApiResponse<PhotoResponse>> {
    check_id(&id)?;
    let side: PhotoSide = side.parse().map_err(AppError::invalid_request)?;
    let bytes = decode_data_uri(&payload.data)?;
    let url = state.record_service.attach_photo(&id, side, &bytes).await?;
    Ok(ApiResponse::success(PhotoResponse { url }))
}

#[derive(Debug, Serialize)]
pub struct PrintResponse {
    pub job: String,
}

/// POST /api/cards/{id}/print - Print the stored label
pub async fn print(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PrintResponse>> {
    check_id(&id)?;
    let job = state.printing.print_record(&id).await?;
    Ok(ApiResponse::success(PrintResponse { job }))
}
