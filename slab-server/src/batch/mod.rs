//! Batch issuance
//!
//! Issues `n` labels from one template. Record creation is a hard barrier:
//! every creation finishes before any label is rendered, and any creation
//! failure aborts the batch before rendering. Render and persist then run
//! per label under a concurrency cap and are reported per id.

use futures::{StreamExt, stream};
use image::RgbaImage;
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::RecordFields;
use slab_printer::{Page, PageSpec, layout};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::issuance::{
    CodeReadyLabel, CreatedRecord, IssuanceController, IssuanceError, IssuanceStage, IssuedLabel,
};

/// One record creation that failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreationFailure {
    /// 1-based position in the batch
    pub index: usize,
    pub error: String,
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Batch count must be at least 1")]
    Empty,

    #[error("Validation failed: {0}")]
    Validation(AppError),

    /// Records in `created` stay in the store.
    #[error("{} of {count} record creations failed", .failures.len())]
    CreationFailed {
        count: usize,
        failures: Vec<CreationFailure>,
        created: Vec<String>,
    },
}

pub type BatchResult<T> = Result<T, BatchError>;

impl From<BatchError> for AppError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::Empty => AppError::new(ErrorCode::BatchEmpty),
            BatchError::Validation(app) => app,
            BatchError::CreationFailed {
                count,
                failures,
                created,
            } => {
                let message = format!("{} of {} record creations failed", failures.len(), count);
                AppError::with_message(ErrorCode::BatchCreationFailed, message)
                    .with_detail("failures", serde_json::to_value(&failures).unwrap_or_default())
                    .with_detail("created", created)
            }
        }
    }
}

/// Per-label result
#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    /// 1-based position in the batch
    pub index: usize,
    pub record_id: String,
    pub stage: IssuanceStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchItem {
    fn from_result(index: usize, record_id: String, result: &Result<IssuedLabel, IssuanceError>) -> Self {
        match result {
            Ok(issued) => Self {
                index,
                record_id,
                stage: IssuanceStage::Complete,
                label_url: Some(issued.label_url.clone()),
                code_url: Some(issued.code_url.clone()),
                error: None,
            },
            Err(e) => Self {
                index,
                record_id,
                stage: e.stage(),
                label_url: None,
                code_url: None,
                error: Some(e.to_string()),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a batch whose records were all created
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
    /// Successfully persisted labels, in batch order
    pub labels: Vec<RgbaImage>,
    /// `labels` laid out on the configured sheet
    pub sheet: Vec<Page>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }
}

#[derive(Clone)]
pub struct BatchController {
    issuance: IssuanceController,
    concurrency: usize,
    sheet: PageSpec,
}

impl BatchController {
    pub fn new(issuance: IssuanceController, concurrency: usize, sheet: PageSpec) -> Self {
        Self {
            issuance,
            concurrency: concurrency.max(1),
            sheet,
        }
    }

    /// Issue `count` labels from `template`
    pub async fn run(&self, template: RecordFields, count: usize) -> BatchResult<BatchReport> {
        if count == 0 {
            return Err(BatchError::Empty);
        }
        let fields = self
            .issuance
            .validate(template)
            .map_err(|e| match e {
                IssuanceError::Validation(app) => BatchError::Validation(app),
                other => BatchError::Validation(AppError::from(other)),
            })?;

        info!(count, "Batch started");
        let created = self.create_all(&fields, count).await?;
        info!(count, "Batch records created");

        // Code generation is pure; failures stay per id.
        let mut items: Vec<Option<BatchItem>> = vec![None; count];
        let mut ready: Vec<(usize, CodeReadyLabel)> = Vec::with_capacity(count);
        for (i, record) in created.into_iter().enumerate() {
            let record_id = record.id().to_string();
            match self.issuance.prepare_code(record) {
                Ok(label) => ready.push((i, label)),
                Err(e) => items[i] = Some(BatchItem::from_result(i + 1, record_id, &Err(e))),
            }
        }

        let mut results: Vec<(usize, String, Result<IssuedLabel, IssuanceError>)> =
            stream::iter(ready)
                .map(|(i, label)| async move {
                    let record_id = label.snapshot.id.clone();
                    (i, record_id, self.issuance.complete(label).await)
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;
        results.sort_by_key(|(i, _, _)| *i);

        let mut labels = Vec::new();
        for (i, record_id, result) in results {
            if let Err(e) = &result {
                warn!(record_id = %record_id, stage = %e.stage(), error = %e, "Batch label failed");
            }
            items[i] = Some(BatchItem::from_result(i + 1, record_id, &result));
            if let Ok(issued) = result {
                labels.push(issued.image);
            }
        }
        let items: Vec<BatchItem> = items.into_iter().flatten().collect();

        let sheet = match layout(&labels, &self.sheet) {
            Ok(pages) => pages,
            Err(e) => {
                warn!(error = %e, "Batch sheet layout failed");
                Vec::new()
            }
        };

        let report = BatchReport { items, labels, sheet };
        info!(
            count,
            succeeded = report.succeeded(),
            failed = report.failed(),
            pages = report.sheet.len(),
            "Batch finished"
        );
        Ok(report)
    }

    /// Create every record before anything is rendered
    async fn create_all(&self, fields: &RecordFields, count: usize) -> BatchResult<Vec<CreatedRecord>> {
        let outcomes: Vec<_> = stream::iter(1..=count)
            .map(|index| async move { (index, self.issuance.create(fields.clone()).await) })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut created = Vec::with_capacity(count);
        let mut failures = Vec::new();
        for (index, outcome) in outcomes {
            match outcome {
                Ok(record) => created.push(record),
                Err(e) => failures.push(CreationFailure {
                    index,
                    error: e.to_string(),
                }),
            }
        }

        if failures.is_empty() {
            return Ok(created);
        }

        let created: Vec<String> = created.iter().map(|r| r.id().to_string()).collect();
        error!(
            count,
            failed = failures.len(),
            orphaned = created.len(),
            "Batch aborted before rendering"
        );
        Err(BatchError::CreationFailed {
            count,
            failures,
            created,
        })
    }
}
