//! Single-record issuance
//!
//! `Draft → Created → CodeReady → LabelRendered → Persisted → Complete`.
//! No transition is retried automatically; callers decide.

mod controller;
mod error;
mod stage;

pub use controller::{
    CodeReadyLabel, CreatedRecord, IssuanceController, IssuanceReport, IssueRequest,
    IssuedLabel, PhotoOutcome, RenderedLabel,
};
pub use error::{IssuanceError, IssuanceResult};
pub use stage::IssuanceStage;
