//! Print API Handlers

use axum::extract::{Json, State};
use serde::Deserialize;
use shared::error::{ApiResponse, AppResult};
use shared::models::SelectionSet;

use crate::core::ServerState;
use crate::printing::MassPrintReport;

#[derive(Debug, Deserialize)]
pub struct MassPrintRequest {
    pub ids: SelectionSet,
}

/// POST /api/print/mass - Print the stored labels of a selection
pub async fn mass_print(
    State(state): State<ServerState>,
    Json(payload): Json<MassPrintRequest>,
) -> AppResult<ApiResponse<MassPrintReport>> {
    let report = state.printing.mass_print(&payload.ids).await?;
    Ok(ApiResponse::success(report))
}
