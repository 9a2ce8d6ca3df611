//! Shared types for the slab label pipeline
//!
//! Record and artifact models, the unified error system and small utilities
//! used by both slab-printer and slab-server.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
