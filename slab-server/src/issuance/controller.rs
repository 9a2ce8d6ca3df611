//! Issuance controller
//!
//! Each transition is its own method and consumes the value produced by the
//! previous one, so steps cannot run out of order. `issue` chains them for
//! the common case.

use futures::future::join_all;
use image::{GrayImage, RgbaImage};
use serde::Serialize;
use shared::error::AppError;
use shared::models::{ArtifactKey, RecordFields, RecordSnapshot, VerificationUrl};
use slab_printer::raster::{self, PNG_MIME};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::{IssuanceError, IssuanceResult, IssuanceStage};
use crate::labels::LabelFactory;
use crate::records::photos::{PhotoService, PhotoUpload, validate_image};
use crate::store::{ArtifactStore, PhotoSide, RecordStore};
use crate::utils::validation::validate_record_fields;

/// Record written to the store (`Created`)
#[derive(Debug, Clone)]
pub struct CreatedRecord {
    pub snapshot: RecordSnapshot,
}

impl CreatedRecord {
    pub fn id(&self) -> &str {
        &self.snapshot.id
    }
}

/// Verification URL encoded (`CodeReady`)
#[derive(Debug, Clone)]
pub struct CodeReadyLabel {
    pub snapshot: RecordSnapshot,
    pub verification_url: VerificationUrl,
    pub code: GrayImage,
}

/// Label composed and encoded (`LabelRendered`)
#[derive(Debug, Clone)]
pub struct RenderedLabel {
    pub snapshot: RecordSnapshot,
    pub verification_url: VerificationUrl,
    pub image: RgbaImage,
    pub label_png: Vec<u8>,
    pub code_png: Vec<u8>,
}

/// Label and code stored (`Persisted`, returned on `Complete`)
#[derive(Debug, Clone, Serialize)]
pub struct IssuedLabel {
    pub record_id: String,
    pub verification_url: VerificationUrl,
    pub label_url: String,
    pub code_url: String,
    #[serde(skip)]
    pub image: RgbaImage,
}

/// Single issuance input
#[derive(Debug, Clone, Default)]
pub struct IssueRequest {
    pub fields: RecordFields,
    pub photos: Vec<PhotoUpload>,
}

/// Outcome of one photo upload
#[derive(Debug)]
pub struct PhotoOutcome {
    pub side: PhotoSide,
    pub result: Result<String, AppError>,
}

/// Outcome of a single issuance after the record exists
#[derive(Debug)]
pub struct IssuanceReport {
    pub record_id: String,
    pub label: IssuanceResult<IssuedLabel>,
    pub photos: Vec<PhotoOutcome>,
}

impl IssuanceReport {
    pub fn stage(&self) -> IssuanceStage {
        match &self.label {
            Ok(_) => IssuanceStage::Complete,
            Err(_) => IssuanceStage::Failed,
        }
    }
}

#[derive(Clone)]
pub struct IssuanceController {
    records: Arc<dyn RecordStore>,
    artifacts: Arc<dyn ArtifactStore>,
    labels: Arc<LabelFactory>,
    photos: PhotoService,
}

impl IssuanceController {
    pub fn new(
        records: Arc<dyn RecordStore>,
        artifacts: Arc<dyn ArtifactStore>,
        labels: Arc<LabelFactory>,
    ) -> Self {
        let photos = PhotoService::new(records.clone(), artifacts.clone());
        Self {
            records,
            artifacts,
            labels,
            photos,
        }
    }

    pub fn labels(&self) -> &Arc<LabelFactory> {
        &self.labels
    }

    /// Normalize and validate fields without touching any store
    pub fn validate(&self, fields: RecordFields) -> IssuanceResult<RecordFields> {
        let fields = fields.normalized();
        validate_record_fields(&fields).map_err(IssuanceError::Validation)?;
        Ok(fields)
    }

    /// Draft → Created
    ///
    /// Never retried here: a second call mints a second record.
    pub async fn create(&self, fields: RecordFields) -> IssuanceResult<CreatedRecord> {
        let fields = self.validate(fields)?;
        let id = self.records.create(&fields).await.map_err(|e| {
            error!(stage = %IssuanceStage::Created, error = %e, "Record creation failed");
            IssuanceError::Create(e)
        })?;

        info!(record_id = %id, stage = %IssuanceStage::Created, "Record created");
        Ok(CreatedRecord {
            snapshot: RecordSnapshot { id, fields },
        })
    }

    /// Created → CodeReady
    pub fn prepare_code(&self, created: CreatedRecord) -> IssuanceResult<CodeReadyLabel> {
        let verification_url = self.labels.verification_url(created.id());
        let code = self
            .labels
            .encode_code(&verification_url)
            .map_err(|source| IssuanceError::Code {
                record_id: created.id().to_string(),
                source,
            })?;

        info!(record_id = %created.id(), stage = %IssuanceStage::CodeReady, "Code generated");
        Ok(CodeReadyLabel {
            snapshot: created.snapshot,
            verification_url,
            code,
        })
    }

    /// CodeReady → LabelRendered
    pub fn render(&self, ready: CodeReadyLabel) -> IssuanceResult<RenderedLabel> {
        let record_id = ready.snapshot.id.clone();
        let render_err = |source| IssuanceError::Render {
            record_id: record_id.clone(),
            source,
        };

        let image = self
            .labels
            .render(&ready.snapshot, &ready.code)
            .map_err(render_err)?;
        let label_png = raster::encode_png(&image).map_err(render_err)?;
        let code_png = raster::encode_gray_png(&ready.code).map_err(render_err)?;

        info!(record_id = %record_id, stage = %IssuanceStage::LabelRendered, "Label rendered");
        Ok(RenderedLabel {
            snapshot: ready.snapshot,
            verification_url: ready.verification_url,
            image,
            label_png,
            code_png,
        })
    }

    /// LabelRendered → Persisted
    ///
    /// Safe to call again with the same label after a failure.
    pub async fn persist(&self, rendered: &RenderedLabel) -> IssuanceResult<IssuedLabel> {
        let record_id = rendered.snapshot.id.as_str();

        let code_key = ArtifactKey::qr_code(record_id);
        let code_url = self.put(&code_key, &rendered.code_png).await?;

        let label_key = ArtifactKey::label(record_id);
        let label_url = self.put(&label_key, &rendered.label_png).await?;

        info!(record_id = %record_id, stage = %IssuanceStage::Persisted, label_url = %label_url, "Artifacts persisted");
        Ok(IssuedLabel {
            record_id: record_id.to_string(),
            verification_url: rendered.verification_url.clone(),
            label_url,
            code_url,
            image: rendered.image.clone(),
        })
    }

    async fn put(&self, key: &ArtifactKey, bytes: &[u8]) -> IssuanceResult<String> {
        self.artifacts.put(key, bytes, PNG_MIME).await.map_err(|e| {
            error!(key = %key, stage = %IssuanceStage::Persisted, error = %e, "Artifact write failed");
            IssuanceError::persist(key, e)
        })
    }

    /// CodeReady → Persisted for a record that already exists
    pub async fn complete(&self, ready: CodeReadyLabel) -> IssuanceResult<IssuedLabel> {
        let rendered = self.render(ready)?;
        let issued = self.persist(&rendered).await?;
        info!(record_id = %issued.record_id, stage = %IssuanceStage::Complete, "Issuance complete");
        Ok(issued)
    }

    /// Create a record and issue its label
    pub async fn issue_fields(&self, fields: RecordFields) -> IssuanceResult<IssuedLabel> {
        let created = self.create(fields).await?;
        let ready = self.prepare_code(created)?;
        self.complete(ready).await
    }

    /// Single issuance with optional photos.
    ///
    /// `Err` means no record was created. Once the record exists the label
    /// path and the photo uploads run concurrently and are reported
    /// separately.
    pub async fn issue(&self, request: IssueRequest) -> IssuanceResult<IssuanceReport> {
        for photo in &request.photos {
            validate_image(&photo.bytes)
                .map_err(|e| IssuanceError::Validation(e.with_detail("side", photo.side.as_str())))?;
        }

        let created = self.create(request.fields).await?;
        let record_id = created.id().to_string();

        let label = async {
            match self.prepare_code(created) {
                Ok(ready) => self.complete(ready).await,
                Err(e) => Err(e),
            }
        };
        let id = record_id.as_str();
        let photos = join_all(request.photos.iter().map(|photo| async move {
            let result = self.photos.attach(id, photo.side, &photo.bytes).await;
            if let Err(e) = &result {
                warn!(record_id = %id, side = %photo.side, error = %e, "Photo upload failed");
            }
            PhotoOutcome {
                side: photo.side,
                result,
            }
        }));

        let (label, photos) = tokio::join!(label, photos);
        if let Err(e) = &label {
            error!(record_id = %record_id, stage = %e.stage(), error = %e, "Issuance failed");
        }

        Ok(IssuanceReport {
            record_id,
            label,
            photos,
        })
    }

    /// Replace a record's fields and re-render its artifacts in place
    pub async fn reissue(&self, record_id: &str, fields: RecordFields) -> IssuanceResult<IssuedLabel> {
        let fields = self.validate(fields)?;
        self.records
            .update(record_id, &fields)
            .await
            .map_err(|source| IssuanceError::Update {
                record_id: record_id.to_string(),
                source,
            })?;
        info!(record_id = %record_id, "Record fields updated");

        let created = CreatedRecord {
            snapshot: RecordSnapshot {
                id: record_id.to_string(),
                fields,
            },
        };
        let ready = self.prepare_code(created)?;
        self.complete(ready).await
    }
}
