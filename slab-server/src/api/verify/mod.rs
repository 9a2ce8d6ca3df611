//! Public verification page data
//!
//! `GET /card/{id}` is what the printed code resolves to.

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/card/{id}", get(handler::verify))
}
