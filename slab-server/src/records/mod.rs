//! Record service
//!
//! Everything a caller does to an existing record: read it, show its public
//! verification view, change its fields (re-rendering the artifacts) and
//! delete it together with every artifact it owns.

pub mod photos;

use serde::Serialize;
use shared::error::AppResult;
use shared::models::{ArtifactKey, Record, RecordFields, VerificationUrl};
use std::sync::Arc;
use tracing::{info, warn};

use crate::issuance::{IssuanceController, IssuedLabel};
use crate::store::{ArtifactStore, ArtifactStoreError, PhotoSide, RecordStore};
pub use photos::{PhotoService, PhotoUpload};

/// Read-only public view behind the verification URL
#[derive(Debug, Clone, Serialize)]
pub struct VerificationView {
    #[serde(flatten)]
    pub record: Record,
    pub verification_url: VerificationUrl,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_url: Option<String>,
}

/// Artifact that could not be removed during a delete
#[derive(Debug, Clone, Serialize)]
pub struct CleanupFailure {
    pub key: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    pub record_id: String,
    /// Keys whose removal succeeded (or that were already absent)
    pub removed: Vec<String>,
    pub failed: Vec<CleanupFailure>,
}

#[derive(Clone)]
pub struct RecordService {
    records: Arc<dyn RecordStore>,
    artifacts: Arc<dyn ArtifactStore>,
    issuance: IssuanceController,
    photos: PhotoService,
}

impl RecordService {
    pub fn new(
        records: Arc<dyn RecordStore>,
        artifacts: Arc<dyn ArtifactStore>,
        issuance: IssuanceController,
    ) -> Self {
        let photos = PhotoService::new(records.clone(), artifacts.clone());
        Self {
            records,
            artifacts,
            issuance,
            photos,
        }
    }

    pub async fn get(&self, id: &str) -> AppResult<Record> {
        Ok(self.records.get(id).await?)
    }

    pub async fn verification_view(&self, id: &str) -> AppResult<VerificationView> {
        let record = self.records.get(id).await?;
        let verification_url = self.issuance.labels().verification_url(&record.id);
        let label_url = self.optional_url(&ArtifactKey::label(id)).await?;
        let code_url = self.optional_url(&ArtifactKey::qr_code(id)).await?;

        Ok(VerificationView {
            record,
            verification_url,
            label_url,
            code_url,
        })
    }

    async fn optional_url(&self, key: &ArtifactKey) -> AppResult<Option<String>> {
        match self.artifacts.get(key).await {
            Ok(url) => Ok(Some(url)),
            Err(ArtifactStoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write new fields and re-render the record's label and code
    pub async fn update(&self, id: &str, fields: RecordFields) -> AppResult<IssuedLabel> {
        Ok(self.issuance.reissue(id, fields).await?)
    }

    pub async fn attach_photo(&self, id: &str, side: PhotoSide, bytes: &[u8]) -> AppResult<String> {
        self.photos.attach(id, side, bytes).await
    }

    /// Delete the record, then every artifact it can own.
    ///
    /// Missing artifacts count as removed; other cleanup failures are
    /// reported without undoing the record delete.
    pub async fn delete(&self, id: &str) -> AppResult<DeleteOutcome> {
        self.records.delete(id).await?;
        info!(record_id = %id, "Record deleted");

        let mut removed = Vec::new();
        let mut failed = Vec::new();
        for key in ArtifactKey::all_for(id) {
            match self.artifacts.delete(&key).await {
                Ok(()) => removed.push(key.to_string()),
                Err(e) => {
                    warn!(record_id = %id, key = %key, error = %e, "Artifact cleanup failed");
                    failed.push(CleanupFailure {
                        key: key.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(DeleteOutcome {
            record_id: id.to_string(),
            removed,
            failed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LabelFactory;
    use crate::store::{MemoryArtifactStore, MemoryRecordStore};
    use shared::error::ErrorCode;
    use shared::models::{ArtifactKind, Grade};
    use slab_printer::LabelSpec;

    fn service() -> (RecordService, Arc<MemoryArtifactStore>) {
        let records: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let artifacts = Arc::new(MemoryArtifactStore::new("http://a"));
        let labels = Arc::new(LabelFactory::builtin(LabelSpec::default(), "https://v.test"));
        let issuance = IssuanceController::new(records.clone(), artifacts.clone(), labels);
        (RecordService::new(records, artifacts.clone(), issuance.clone()), artifacts)
    }

    fn fields() -> RecordFields {
        RecordFields {
            player: Some("J. Doe".into()),
            grade: Grade::from("10"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_verification_view() {
        let (service, _) = service();
        let issued = service.issuance.issue_fields(fields()).await.unwrap();

        let view = service.verification_view(&issued.record_id).await.unwrap();
        assert_eq!(view.verification_url, issued.verification_url);
        assert_eq!(view.label_url.as_deref(), Some(issued.label_url.as_str()));
        assert_eq!(view.record.fields.grade_description.as_deref(), Some("Gem Mint"));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["player"], "J. Doe");
        assert_eq!(json["id"], issued.record_id.as_str());

        let err = service.verification_view("missing").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RecordNotFound);
    }

    #[tokio::test]
    async fn test_delete_removes_every_artifact() {
        let (service, artifacts) = service();
        let issued = service.issuance.issue_fields(fields()).await.unwrap();
        let id = issued.record_id.as_str();
        artifacts
            .put(&ArtifactKey::new(id, ArtifactKind::Front), b"f", "image/png")
            .await
            .unwrap();
        assert_eq!(artifacts.len(), 3);

        let outcome = service.delete(id).await.unwrap();
        assert_eq!(outcome.removed.len(), 4);
        assert!(outcome.failed.is_empty());
        assert!(artifacts.is_empty());
        assert_eq!(service.get(id).await.unwrap_err().code, ErrorCode::RecordNotFound);

        let err = service.delete(id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RecordNotFound);
    }
}
