use axum::extract::{Path, State};
use shared::error::{ApiResponse, AppError, AppResult};
use shared::util::is_valid_record_id;

use crate::core::ServerState;
use crate::records::VerificationView;

/// GET /card/{id} - Read-only record view
pub async fn verify(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<VerificationView>> {
    // Malformed ids cannot exist, report them like unknown ones
    if !is_valid_record_id(&id) {
        return Err(AppError::record_not_found(id));
    }
    let view = state.record_service.verification_view(&id).await?;
    Ok(ApiResponse::success(view))
}
