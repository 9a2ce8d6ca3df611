//! Record Store
//!
//! Persists record metadata keyed by a generated id. The redb-backed store is
//! the production implementation; [`MemoryRecordStore`] backs tests and
//! ephemeral runs.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use shared::error::AppError;
use shared::models::{Record, RecordFields};
use shared::util::{now_millis, record_id};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Records table: key = record id, value = JSON
const RECORDS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("records");

#[derive(Debug, Error)]
pub enum RecordStoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Blocking task failed: {0}")]
    Task(String),

    #[error("Record store unavailable: {0}")]
    Unavailable(String),
}

pub type RecordStoreResult<T> = Result<T, RecordStoreError>;

impl From<RecordStoreError> for AppError {
    fn from(err: RecordStoreError) -> Self {
        match err {
            RecordStoreError::NotFound(id) => AppError::record_not_found(id),
            other => AppError::database(other.to_string()),
        }
    }
}

/// Side of a reference photograph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhotoSide {
    Front,
    Back,
}

impl PhotoSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Back => "back",
        }
    }
}

impl fmt::Display for PhotoSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhotoSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "front" => Ok(Self::Front),
            "back" => Ok(Self::Back),
            other => Err(format!("unknown photo side: {other}")),
        }
    }
}

/// Record persistence seam
///
/// `create` is the only operation that mints ids; it must never be retried
/// implicitly by callers.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist fields under a fresh id and return the id
    async fn create(&self, fields: &RecordFields) -> RecordStoreResult<String>;

    async fn get(&self, id: &str) -> RecordStoreResult<Record>;

    /// Replace the fields of an existing record
    async fn update(&self, id: &str, fields: &RecordFields) -> RecordStoreResult<()>;

    /// Set the photo URL of one side
    async fn set_photo(&self, id: &str, side: PhotoSide, url: &str) -> RecordStoreResult<()>;

    async fn delete(&self, id: &str) -> RecordStoreResult<()>;
}

fn new_record(id: String, fields: &RecordFields) -> Record {
    let now = now_millis();
    Record {
        id,
        fields: fields.clone(),
        image_front: None,
        image_back: None,
        created_at: now,
        updated_at: now,
    }
}

fn apply_photo(record: &mut Record, side: PhotoSide, url: &str) {
    match side {
        PhotoSide::Front => record.image_front = Some(url.to_string()),
        PhotoSide::Back => record.image_back = Some(url.to_string()),
    }
}

// ========== redb ==========

/// redb-backed record store
#[derive(Clone)]
pub struct RedbRecordStore {
    db: Arc<Database>,
}

impl RedbRecordStore {
    /// Open or create database
    pub fn open(path: impl AsRef<Path>) -> RecordStoreResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> RecordStoreResult<Self> {
        let db =
            Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> RecordStoreResult<Self> {
        // Initialize tables
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(RECORDS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    fn insert_new(&self, fields: &RecordFields) -> RecordStoreResult<String> {
        let write_txn = self.db.begin_write()?;
        let id = {
            let mut table = write_txn.open_table(RECORDS_TABLE)?;
            let mut id = record_id();
            while table.get(id.as_str())?.is_some() {
                id = record_id();
            }
            let value = serde_json::to_vec(&new_record(id.clone(), fields))?;
            table.insert(id.as_str(), value.as_slice())?;
            id
        };
        write_txn.commit()?;
        Ok(id)
    }

    fn read(&self, id: &str) -> RecordStoreResult<Record> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RECORDS_TABLE)?;

        match table.get(id)? {
            Some(guard) => Ok(serde_json::from_slice(guard.value())?),
            None => Err(RecordStoreError::NotFound(id.to_string())),
        }
    }

    fn modify(&self, id: &str, apply: impl FnOnce(&mut Record)) -> RecordStoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(RECORDS_TABLE)?;

            // Read first
            let bytes = {
                let value = table
                    .get(id)?
                    .ok_or_else(|| RecordStoreError::NotFound(id.to_string()))?;
                value.value().to_vec()
            };

            let mut record: Record = serde_json::from_slice(&bytes)?;
            apply(&mut record);
            record.updated_at = now_millis();

            let value = serde_json::to_vec(&record)?;
            table.insert(id, value.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn remove(&self, id: &str) -> RecordStoreResult<()> {
        let write_txn = self.db.begin_write()?;
        let existed = {
            let mut table = write_txn.open_table(RECORDS_TABLE)?;
            table.remove(id)?.is_some()
        };
        if !existed {
            return Err(RecordStoreError::NotFound(id.to_string()));
        }
        write_txn.commit()?;
        Ok(())
    }

    async fn blocking<T, F>(&self, op: F) -> RecordStoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Self) -> RecordStoreResult<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| RecordStoreError::Task(e.to_string()))?
    }
}

#[async_trait]
impl RecordStore for RedbRecordStore {
    async fn create(&self, fields: &RecordFields) -> RecordStoreResult<String> {
        let fields = fields.clone();
        self.blocking(move |store| store.insert_new(&fields)).await
    }

    async fn get(&self, id: &str) -> RecordStoreResult<Record> {
        let id = id.to_string();
        self.blocking(move |store| store.read(&id)).await
    }

    async fn update(&self, id: &str, fields: &RecordFields) -> RecordStoreResult<()> {
        let id = id.to_string();
        let fields = fields.clone();
        self.blocking(move |store| store.modify(&id, |record| record.fields = fields))
            .await
    }

    async fn set_photo(&self, id: &str, side: PhotoSide, url: &str) -> RecordStoreResult<()> {
        let id = id.to_string();
        let url = url.to_string();
        self.blocking(move |store| store.modify(&id, |record| apply_photo(record, side, &url)))
            .await
    }

    async fn delete(&self, id: &str) -> RecordStoreResult<()> {
        let id = id.to_string();
        self.blocking(move |store| store.remove(&id)).await
    }
}

// ========== In-memory ==========

/// DashMap-backed record store
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: DashMap<String, Record>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create(&self, fields: &RecordFields) -> RecordStoreResult<String> {
        loop {
            let id = record_id();
            if let Entry::Vacant(slot) = self.records.entry(id.clone()) {
                slot.insert(new_record(id.clone(), fields));
                return Ok(id);
            }
        }
    }

    async fn get(&self, id: &str) -> RecordStoreResult<Record> {
        self.records
            .get(id)
            .map(|r| r.value().clone())
            .ok_or_else(|| RecordStoreError::NotFound(id.to_string()))
    }

    async fn update(&self, id: &str, fields: &RecordFields) -> RecordStoreResult<()> {
        let mut record = self
            .records
            .get_mut(id)
            .ok_or_else(|| RecordStoreError::NotFound(id.to_string()))?;
        record.fields = fields.clone();
        record.updated_at = now_millis();
        Ok(())
    }

    async fn set_photo(&self, id: &str, side: PhotoSide, url: &str) -> RecordStoreResult<()> {
        let mut record = self
            .records
            .get_mut(id)
            .ok_or_else(|| RecordStoreError::NotFound(id.to_string()))?;
        apply_photo(&mut record, side, url);
        record.updated_at = now_millis();
        Ok(())
    }

    async fn delete(&self, id: &str) -> RecordStoreResult<()> {
        self.records
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RecordStoreError::NotFound(id.to_string()))
    }
}
