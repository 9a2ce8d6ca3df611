//! Record and artifact persistence
//!
//! The only shared mutable resources of the pipeline.

mod artifact;
mod record;

pub use artifact::{
    ArtifactStore, ArtifactStoreError, ArtifactStoreResult, FsArtifactStore,
    MemoryArtifactStore, StoredArtifact, extension_for,
};
pub use record::{
    MemoryRecordStore, PhotoSide, RecordStore, RecordStoreError, RecordStoreResult,
    RedbRecordStore,
};
