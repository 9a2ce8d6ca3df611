//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// - 0xxx: General errors
/// - 4xxx: Record errors
/// - 5xxx: Artifact errors
/// - 6xxx: Label errors
/// - 7xxx: Print errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Record errors (4xxx)
    Record,
    /// Artifact errors (5xxx)
    Artifact,
    /// Label errors (6xxx)
    Label,
    /// Print errors (7xxx)
    Print,
    /// System errors (9xxx and anything unassigned)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            4000..5000 => Self::Record,
            5000..6000 => Self::Artifact,
            6000..7000 => Self::Label,
            7000..8000 => Self::Print,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Record => "record",
            Self::Artifact => "artifact",
            Self::Label => "label",
            Self::Print => "print",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
