use shared::error::{AppError, ErrorCode};
use shared::models::ArtifactKey;
use slab_printer::{CodeError, RenderError};
use thiserror::Error;

use super::IssuanceStage;
use crate::store::{ArtifactStoreError, RecordStoreError};

/// Failure of one issuance, tagged with the transition that failed
#[derive(Debug, Error)]
pub enum IssuanceError {
    /// Input rejected before any store call
    #[error("Validation failed: {0}")]
    Validation(AppError),

    /// Draft → Created
    #[error("Record creation failed: {0}")]
    Create(#[source] RecordStoreError),

    /// Field update of an existing record
    #[error("Record {record_id} update failed: {source}")]
    Update {
        record_id: String,
        #[source]
        source: RecordStoreError,
    },

    /// Created → CodeReady
    #[error("Code generation failed for {record_id}: {source}")]
    Code {
        record_id: String,
        #[source]
        source: CodeError,
    },

    /// CodeReady → LabelRendered
    #[error("Label rendering failed for {record_id}: {source}")]
    Render {
        record_id: String,
        #[source]
        source: RenderError,
    },

    /// LabelRendered → Persisted
    #[error("Persisting {key} failed: {source}")]
    Persist {
        record_id: String,
        key: String,
        #[source]
        source: ArtifactStoreError,
    },
}

pub type IssuanceResult<T> = Result<T, IssuanceError>;

impl IssuanceError {
    pub(crate) fn persist(key: &ArtifactKey, source: ArtifactStoreError) -> Self {
        Self::Persist {
            record_id: key.record_id().to_string(),
            key: key.to_string(),
            source,
        }
    }

    /// Stage the failed transition was heading for
    pub fn stage(&self) -> IssuanceStage {
        match self {
            Self::Validation(_) => IssuanceStage::Draft,
            Self::Create(_) | Self::Update { .. } => IssuanceStage::Created,
            Self::Code { .. } => IssuanceStage::CodeReady,
            Self::Render { .. } => IssuanceStage::LabelRendered,
            Self::Persist { .. } => IssuanceStage::Persisted,
        }
    }

    /// Id of the record, when one exists
    pub fn record_id(&self) -> Option<&str> {
        match self {
            Self::Validation(_) | Self::Create(_) => None,
            Self::Update { record_id, .. }
            | Self::Code { record_id, .. }
            | Self::Render { record_id, .. }
            | Self::Persist { record_id, .. } => Some(record_id),
        }
    }
}

impl From<IssuanceError> for AppError {
    fn from(err: IssuanceError) -> Self {
        let stage = err.stage();
        let record_id = err.record_id().map(str::to_string);
        let message = err.to_string();

        let base = match err {
            IssuanceError::Validation(app) => return app,
            IssuanceError::Create(source) | IssuanceError::Update { source, .. } => {
                let mut app = AppError::from(source);
                if app.code != ErrorCode::RecordNotFound {
                    app.message = message;
                }
                app
            }
            IssuanceError::Code { .. } => {
                AppError::with_message(ErrorCode::CodeGenerationFailed, message)
            }
            IssuanceError::Render { .. } => {
                AppError::with_message(ErrorCode::LabelRenderFailed, message)
            }
            IssuanceError::Persist { .. } => AppError::storage(message),
        };

        let app = base.with_detail("stage", stage.as_str());
        match record_id {
            Some(id) => app.with_detail("record_id", id),
            None => app,
        }
    }
}
