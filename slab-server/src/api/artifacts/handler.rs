use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use http::header;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::ArtifactKey;

use crate::core::ServerState;

/// GET /artifacts/{namespace}/{file} - Stored artifact bytes
pub async fn download(
    State(state): State<ServerState>,
    Path((namespace, file)): Path<(String, String)>,
) -> AppResult<Response> {
    let key = ArtifactKey::from_parts(&namespace, &file)
        .map_err(|e| AppError::with_message(ErrorCode::ArtifactKeyInvalid, e.to_string()))?;
    let stored = state.artifacts.load(&key).await?;

    Ok((
        [
            (header::CONTENT_TYPE, stored.mime),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        stored.bytes,
    )
        .into_response())
}
