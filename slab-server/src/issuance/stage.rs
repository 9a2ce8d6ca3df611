use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one issuance
///
/// `Draft → Created → CodeReady → LabelRendered → Persisted → Complete`;
/// `Failed` is reachable from every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssuanceStage {
    Draft,
    Created,
    CodeReady,
    LabelRendered,
    Persisted,
    Complete,
    Failed,
}

impl IssuanceStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Created => "created",
            Self::CodeReady => "code_ready",
            Self::LabelRendered => "label_rendered",
            Self::Persisted => "persisted",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for IssuanceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
