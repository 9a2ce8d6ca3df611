//! Artifact download
//!
//! Serves stored blobs at the URLs the artifact store hands out.

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/artifacts/{namespace}/{file}", get(handler::download))
}
