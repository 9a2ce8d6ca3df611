//! HTTP surface
//!
//! Thin axum layer over the services in [`ServerState`]. No authentication;
//! callers are trusted administrative tools.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware as axum_middleware;
use http::HeaderName;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

pub mod artifacts;
pub mod cards;
pub mod health;
pub mod middleware;
pub mod print;
pub mod verify;

/// Two base64 photos of the maximum size plus fields
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(cards::router())
        .merge(print::router())
        .merge(verify::router())
        .merge(artifacts::router())
        .merge(health::router())
}

/// Build the application with all middleware
///
/// Used by the HTTP server and by in-process tests.
pub fn build_app() -> Router<ServerState> {
    let request_id = HeaderName::from_static("x-request-id");

    build_router()
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        // CORS - Handle cross-origin requests
        .layer(CorsLayer::permissive())
        // Compression - Gzip compress responses
        .layer(CompressionLayer::new())
        // Request logging
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        // Trace - Request tracing
        .layer(TraceLayer::new_for_http())
        // Propagate request ID to response
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        // Request ID - outermost so every layer above sees it
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}
