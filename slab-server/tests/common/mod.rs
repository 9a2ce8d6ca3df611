//! Shared fixtures: in-memory state and fault-injecting stores
#![allow(dead_code)]

use async_trait::async_trait;
use image::{GrayImage, RgbaImage};
use shared::models::{Grade, Record, RecordFields};
use slab_printer::{AnyPrinter, LabelSpec, Rect, SpoolPrinter};
use slab_server::labels::LabelFactory;
use slab_server::store::{
    ArtifactStore, ArtifactStoreError, ArtifactStoreResult, MemoryArtifactStore,
    MemoryRecordStore, PhotoSide, RecordStore, RecordStoreError, RecordStoreResult,
    StoredArtifact,
};
use slab_server::{Config, ServerState};
use shared::models::ArtifactKey;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

pub const PUBLIC_BASE_URL: &str = "https://spagrading.com";
pub const ARTIFACT_BASE_URL: &str = "http://localhost:3000/artifacts";

pub struct TestApp {
    pub state: ServerState,
    pub spool: TempDir,
}

impl TestApp {
    /// Files written by the spool printer
    pub fn spooled(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.spool.path())
            .map(|dir| {
                dir.filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().to_string())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}

pub fn app_with(records: Arc<dyn RecordStore>, artifacts: Arc<dyn ArtifactStore>) -> TestApp {
    let spool = tempfile::tempdir().unwrap();
    let mut config = Config::with_overrides(spool.path().to_string_lossy(), 3000);
    config.artifact_concurrency = 2;
    config.page_width_mm = 148.0;
    config.page_height_mm = 210.0;
    config.page_gap_mm = 1.0;
    config.page_margin_mm = 4.0;

    let labels = LabelFactory::builtin(LabelSpec::default(), PUBLIC_BASE_URL);
    let printer = AnyPrinter::Spool(SpoolPrinter::new(spool.path()));
    let state = ServerState::new(config, records, artifacts, labels, printer).unwrap();
    TestApp { state, spool }
}

pub fn memory_app() -> (TestApp, Arc<MemoryRecordStore>, Arc<MemoryArtifactStore>) {
    let records = Arc::new(MemoryRecordStore::new());
    let artifacts = Arc::new(MemoryArtifactStore::new(ARTIFACT_BASE_URL));
    (app_with(records.clone(), artifacts.clone()), records, artifacts)
}

pub fn jdoe_fields() -> RecordFields {
    RecordFields {
        player: Some("J. Doe".into()),
        year: Some("2024".into()),
        brand: Some("Acme".into()),
        card_number: Some("12".into()),
        grade: Grade::from("10"),
        ..Default::default()
    }
}

pub fn crop_gray(img: &RgbaImage, rect: Rect) -> GrayImage {
    GrayImage::from_fn(rect.w, rect.h, |x, y| {
        let p = img.get_pixel(rect.x + x, rect.y + y);
        image::Luma([p[0]])
    })
}

/// Decode the single QR code in `img`
pub fn decode_qr(img: &GrayImage) -> String {
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        img.width() as usize,
        img.height() as usize,
        |x, y| img.get_pixel(x as u32, y as u32)[0],
    );
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1, "expected exactly one code");
    let (_, content) = grids[0].decode().unwrap();
    content
}

/// Record store whose `create` fails on the given 1-based calls
pub struct FlakyRecordStore {
    pub inner: MemoryRecordStore,
    calls: AtomicUsize,
    fail_on: HashSet<usize>,
}

impl FlakyRecordStore {
    pub fn failing_on(calls: impl IntoIterator<Item = usize>) -> Self {
        Self {
            inner: MemoryRecordStore::new(),
            calls: AtomicUsize::new(0),
            fail_on: calls.into_iter().collect(),
        }
    }

    pub fn create_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for FlakyRecordStore {
    async fn create(&self, fields: &RecordFields) -> RecordStoreResult<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on.contains(&n) {
            return Err(RecordStoreError::Unavailable(format!(
                "injected failure on create #{n}"
            )));
        }
        self.inner.create(fields).await
    }

    async fn get(&self, id: &str) -> RecordStoreResult<Record> {
        self.inner.get(id).await
    }

    async fn update(&self, id: &str, fields: &RecordFields) -> RecordStoreResult<()> {
        self.inner.update(id, fields).await
    }

    async fn set_photo(&self, id: &str, side: PhotoSide, url: &str) -> RecordStoreResult<()> {
        self.inner.set_photo(id, side, url).await
    }

    async fn delete(&self, id: &str) -> RecordStoreResult<()> {
        self.inner.delete(id).await
    }
}

/// Artifact store that rejects writes for chosen record ids and counts puts
pub struct FlakyArtifactStore {
    pub inner: MemoryArtifactStore,
    pub puts: AtomicUsize,
    reject: std::sync::Mutex<HashSet<String>>,
    fail_puts: HashSet<usize>,
}

impl FlakyArtifactStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryArtifactStore::new(ARTIFACT_BASE_URL),
            puts: AtomicUsize::new(0),
            reject: std::sync::Mutex::new(HashSet::new()),
            fail_puts: HashSet::new(),
        }
    }

    /// Fail the given 1-based `put` calls regardless of key
    pub fn failing_puts(calls: impl IntoIterator<Item = usize>) -> Self {
        Self {
            fail_puts: calls.into_iter().collect(),
            ..Self::new()
        }
    }

    pub fn reject(&self, record_id: &str) {
        self.reject.lock().unwrap().insert(record_id.to_string());
    }

    pub fn heal(&self) {
        self.reject.lock().unwrap().clear();
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactStore for FlakyArtifactStore {
    async fn put(&self, key: &ArtifactKey, bytes: &[u8], mime: &str) -> ArtifactStoreResult<String> {
        let n = self.puts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_puts.contains(&n) {
            return Err(ArtifactStoreError::Unavailable(format!("injected failure on put #{n}")));
        }
        if self.reject.lock().unwrap().contains(key.record_id()) {
            return Err(ArtifactStoreError::Unavailable(format!("injected failure on {key}")));
        }
        self.inner.put(key, bytes, mime).await
    }

    async fn get(&self, key: &ArtifactKey) -> ArtifactStoreResult<String> {
        self.inner.get(key).await
    }

    async fn load(&self, key: &ArtifactKey) -> ArtifactStoreResult<StoredArtifact> {
        self.inner.load(key).await
    }

    async fn delete(&self, key: &ArtifactKey) -> ArtifactStoreResult<()> {
        self.inner.delete(key).await
    }
}
