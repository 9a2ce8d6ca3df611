//! Data models
//!
//! Shared between slab-printer, slab-server and API clients.

pub mod artifact;
pub mod record;
pub mod selection;
pub mod verification;

// Re-exports
pub use artifact::*;
pub use record::*;
pub use selection::*;
pub use verification::*;
