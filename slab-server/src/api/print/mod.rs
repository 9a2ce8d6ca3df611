//! Print API Module

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

/// Print router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/print", routes())
}

fn routes() -> Router<ServerState> {
    Router::new().route("/mass", post(handler::mass_print))
}
