//! Print service
//!
//! Direct print of one label right after issuance, and deferred mass print
//! of stored labels for a selection set. Mass print looks labels up in the
//! artifact store; it never re-renders them.

use futures::{StreamExt, stream};
use image::RgbaImage;
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{ArtifactKey, SelectionSet};
use shared::util::now_millis;
use slab_printer::{AnyPrinter, LayoutError, Page, PageSpec, PrintError, Printer, RenderError, layout, raster};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::{info, warn};

use crate::store::{ArtifactStore, ArtifactStoreError};

#[derive(Debug, Error)]
pub enum PrintServiceError {
    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactStoreError),

    #[error("Stored label is not a readable image: {0}")]
    Decode(#[from] RenderError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Printer error: {0}")]
    Print(#[from] PrintError),

    #[error("Printer is offline")]
    Offline,

    #[error("Nothing to print")]
    Empty,
}

pub type PrintServiceResult<T> = Result<T, PrintServiceError>;

impl From<PrintServiceError> for AppError {
    fn from(err: PrintServiceError) -> Self {
        match err {
            PrintServiceError::Artifact(e) => e.into(),
            PrintServiceError::Offline => AppError::new(ErrorCode::PrinterNotAvailable),
            PrintServiceError::Empty => AppError::new(ErrorCode::NothingToPrint),
            other => AppError::print_failed(other.to_string()),
        }
    }
}

/// A selected id that was left out of a mass print
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLabel {
    pub id: String,
    pub reason: String,
}

/// Pages composed from a selection set, ready to print
#[derive(Debug, Clone)]
pub struct MassPrintJob {
    /// Ids whose labels are on the pages, in selection order
    pub included: Vec<String>,
    pub skipped: Vec<SkippedLabel>,
    pub pages: Vec<Page>,
}

/// Summary returned to the caller of a mass print
#[derive(Debug, Clone, Serialize)]
pub struct MassPrintReport {
    /// Job name the pages were sent under; `None` when nothing was printed
    pub job: Option<String>,
    pub printed: Vec<String>,
    pub skipped: Vec<SkippedLabel>,
    pub page_count: usize,
    pub labels_per_page: Vec<usize>,
}

impl From<&MassPrintJob> for MassPrintReport {
    fn from(job: &MassPrintJob) -> Self {
        Self {
            job: None,
            printed: job.included.clone(),
            skipped: job.skipped.clone(),
            page_count: job.pages.len(),
            labels_per_page: job.pages.iter().map(Page::label_count).collect(),
        }
    }
}

#[derive(Clone)]
pub struct PrintService {
    artifacts: Arc<dyn ArtifactStore>,
    printer: Arc<AnyPrinter>,
    /// Page sized exactly to one label
    label_page: PageSpec,
    /// Label stock sheet for mass and batch print
    sheet: PageSpec,
    concurrency: usize,
    job_seq: Arc<AtomicU64>,
}

impl PrintService {
    pub fn new(
        artifacts: Arc<dyn ArtifactStore>,
        printer: Arc<AnyPrinter>,
        label_page: PageSpec,
        sheet: PageSpec,
        concurrency: usize,
    ) -> Self {
        Self {
            artifacts,
            printer,
            label_page,
            sheet,
            concurrency: concurrency.max(1),
            job_seq: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn sheet(&self) -> &PageSpec {
        &self.sheet
    }

    pub fn printer(&self) -> &AnyPrinter {
        &self.printer
    }

    /// Unique job name: `{prefix}-{millis}-{seq}`
    fn job_name(&self, prefix: &str) -> String {
        let seq = self.job_seq.fetch_add(1, Ordering::Relaxed);
        format!("{prefix}-{}-{seq}", now_millis())
    }

    /// Send pages to the printer under a fresh job name, which is returned
    pub async fn print_pages(&self, prefix: &str, pages: &[Page]) -> PrintServiceResult<String> {
        if pages.is_empty() {
            return Err(PrintServiceError::Empty);
        }
        if !self.printer.is_online().await {
            return Err(PrintServiceError::Offline);
        }
        let job = self.job_name(prefix);
        self.printer.print(&job, pages).await?;
        info!(job = %job, pages = pages.len(), "Print job sent");
        Ok(job)
    }

    /// Print one label on a label-sized page
    pub async fn print_label(&self, prefix: &str, label: &RgbaImage) -> PrintServiceResult<String> {
        let pages = layout(std::slice::from_ref(label), &self.label_page)?;
        self.print_pages(prefix, &pages).await
    }

    /// Print the stored label of one record
    pub async fn print_record(&self, record_id: &str) -> PrintServiceResult<String> {
        let label = self.load_label(record_id).await?;
        self.print_label(record_id, &label).await
    }

    async fn load_label(&self, record_id: &str) -> PrintServiceResult<RgbaImage> {
        let stored = self.artifacts.load(&ArtifactKey::label(record_id)).await?;
        Ok(raster::decode(&stored.bytes)?)
    }

    /// Fetch the stored labels of a selection and lay them out.
    ///
    /// Ids without a readable label are skipped, not fatal.
    pub async fn prepare_mass_print(&self, selection: &SelectionSet) -> PrintServiceResult<MassPrintJob> {
        let fetched: Vec<(String, PrintServiceResult<RgbaImage>)> = stream::iter(selection.ids().to_vec())
            .map(|id| async move {
                let result = self.load_label(&id).await;
                (id, result)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut included = Vec::new();
        let mut labels = Vec::new();
        let mut skipped = Vec::new();
        for (id, result) in fetched {
            match result {
                Ok(label) => {
                    included.push(id);
                    labels.push(label);
                }
                Err(e) => {
                    warn!(record_id = %id, error = %e, "Label skipped in mass print");
                    let reason = match e {
                        PrintServiceError::Artifact(ArtifactStoreError::NotFound(_)) => {
                            "label artifact not found".to_string()
                        }
                        other => other.to_string(),
                    };
                    skipped.push(SkippedLabel { id, reason });
                }
            }
        }

        let pages = layout(&labels, &self.sheet)?;
        Ok(MassPrintJob {
            included,
            skipped,
            pages,
        })
    }

    /// Mass print a selection set; an all-skipped selection prints nothing
    pub async fn mass_print(&self, selection: &SelectionSet) -> PrintServiceResult<MassPrintReport> {
        if selection.is_empty() {
            return Err(PrintServiceError::Empty);
        }
        let job = self.prepare_mass_print(selection).await?;
        let mut report = MassPrintReport::from(&job);
        if !job.pages.is_empty() {
            report.job = Some(self.print_pages("mass-print", &job.pages).await?);
        }

        info!(
            printed = report.printed.len(),
            skipped = report.skipped.len(),
            pages = report.page_count,
            "Mass print finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryArtifactStore;
    use image::Rgba;
    use slab_printer::{LabelSpec, SpoolPrinter};

    fn spooled(dir: &std::path::Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn service(artifacts: Arc<MemoryArtifactStore>, spool: &std::path::Path) -> PrintService {
        let spec = LabelSpec::default();
        PrintService::new(
            artifacts,
            Arc::new(AnyPrinter::Spool(SpoolPrinter::new(spool))),
            PageSpec::single_label(&spec),
            PageSpec::new(148.0, 210.0, 1.0, 4.0, &spec),
            2,
        )
    }

    fn label() -> RgbaImage {
        let spec = LabelSpec::default();
        RgbaImage::from_pixel(spec.width_px(), spec.height_px(), Rgba([0, 0x47, 0xAB, 255]))
    }

    async fn store_label(artifacts: &MemoryArtifactStore, id: &str) {
        let png = raster::encode_png(&label()).unwrap();
        artifacts.put(&ArtifactKey::label(id), &png, raster::PNG_MIME).await.unwrap();
    }

    #[tokio::test]
    async fn test_print_record_spools_one_label_page() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = Arc::new(MemoryArtifactStore::default());
        store_label(&artifacts, "r1").await;

        let job = service(artifacts, dir.path()).print_record("r1").await.unwrap();
        assert!(job.starts_with("r1-"));

        let page = image::open(dir.path().join(format!("{job}_001.png"))).unwrap().to_rgba8();
        assert_eq!(page.dimensions(), label().dimensions());
    }

    #[tokio::test]
    async fn test_print_record_without_label() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(Arc::new(MemoryArtifactStore::default()), dir.path());
        let app: AppError = svc.print_record("nope").await.unwrap_err().into();
        assert_eq!(app.code, ErrorCode::ArtifactNotFound);
    }

    #[tokio::test]
    async fn test_mass_print_skips_missing_and_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = Arc::new(MemoryArtifactStore::default());
        store_label(&artifacts, "a").await;
        store_label(&artifacts, "c").await;
        artifacts
            .put(&ArtifactKey::label("d"), b"not a png", raster::PNG_MIME)
            .await
            .unwrap();

        let selection: SelectionSet = ["a", "b", "c", "d"].into_iter().map(String::from).collect();
        let report = service(artifacts, dir.path()).mass_print(&selection).await.unwrap();

        assert_eq!(report.printed, vec!["a".to_string(), "c".to_string()]);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].id, "b");
        assert_eq!(report.skipped[0].reason, "label artifact not found");
        assert_eq!(report.skipped[1].id, "d");
        assert_eq!(report.labels_per_page, vec![2]);
        let job = report.job.unwrap();
        assert!(job.starts_with("mass-print-"));
        assert_eq!(spooled(dir.path()), vec![format!("{job}_001.png")]);
    }

    #[tokio::test]
    async fn test_mass_print_all_missing_prints_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(Arc::new(MemoryArtifactStore::default()), dir.path());
        let selection: SelectionSet = ["x", "y"].into_iter().map(String::from).collect();

        let report = svc.mass_print(&selection).await.unwrap();
        assert_eq!(report.page_count, 0);
        assert_eq!(report.skipped.len(), 2);
        assert!(report.job.is_none());
        assert!(spooled(dir.path()).is_empty());

        let err = svc.mass_print(&SelectionSet::new()).await.unwrap_err();
        assert!(matches!(err, PrintServiceError::Empty));
    }

    #[tokio::test]
    async fn test_consecutive_mass_prints_keep_their_own_pages() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = Arc::new(MemoryArtifactStore::default());
        let ids: Vec<String> = (0..19).map(|i| format!("r{i}")).collect();
        for id in &ids {
            store_label(&artifacts, id).await;
        }
        let svc = service(artifacts, dir.path());

        // an A5 sheet holds 18 labels, so the first job needs two pages
        let large: SelectionSet = ids.iter().cloned().collect();
        let first = svc.mass_print(&large).await.unwrap();
        assert_eq!(first.page_count, 2);

        let small: SelectionSet = ["r0"].into_iter().map(String::from).collect();
        let second = svc.mass_print(&small).await.unwrap();

        let (first, second) = (first.job.unwrap(), second.job.unwrap());
        assert_ne!(first, second);
        let mut expected = vec![
            format!("{first}_001.png"),
            format!("{first}_002.png"),
            format!("{second}_001.png"),
        ];
        expected.sort();
        assert_eq!(spooled(dir.path()), expected);
    }
}
