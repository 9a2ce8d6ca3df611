//! Artifact Store
//!
//! Blob storage for label images, code images and reference photographs,
//! keyed by [`ArtifactKey`] (`{namespace}/{id}_{kind}`). `put` overwrites; an
//! identical overwrite leaves the stored bytes untouched.

use async_trait::async_trait;
use dashmap::DashMap;
use shared::error::{AppError, ErrorCode};
use shared::models::ArtifactKey;
use shared::util::is_valid_record_id;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File extensions the store writes, in lookup order
const EXTENSIONS: &[&str] = &["png", "jpg", "webp", "bin"];

#[derive(Debug, Error)]
pub enum ArtifactStoreError {
    #[error("Artifact not found: {0}")]
    NotFound(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Artifact store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid artifact key: {0}")]
    InvalidKey(String),
}

pub type ArtifactStoreResult<T> = Result<T, ArtifactStoreError>;

impl ArtifactStoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<ArtifactStoreError> for AppError {
    fn from(err: ArtifactStoreError) -> Self {
        match err {
            ArtifactStoreError::NotFound(key) => AppError::artifact_not_found(key),
            ArtifactStoreError::InvalidKey(key) => {
                AppError::new(ErrorCode::ArtifactKeyInvalid).with_detail("key", key)
            }
            other => AppError::storage(other.to_string()),
        }
    }
}

/// Bytes of one stored artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub url: String,
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store `bytes` under `key`, replacing any previous content; returns the URL
    async fn put(&self, key: &ArtifactKey, bytes: &[u8], mime: &str) -> ArtifactStoreResult<String>;

    /// URL of a stored artifact
    async fn get(&self, key: &ArtifactKey) -> ArtifactStoreResult<String>;

    /// Content of a stored artifact
    async fn load(&self, key: &ArtifactKey) -> ArtifactStoreResult<StoredArtifact>;

    /// Remove an artifact; removing a missing artifact succeeds
    async fn delete(&self, key: &ArtifactKey) -> ArtifactStoreResult<()>;
}

/// File extension used for a MIME type
pub fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        _ => "bin",
    }
}

fn artifact_url(base_url: &str, key: &ArtifactKey, ext: &str) -> String {
    format!(
        "{}/{}/{}.{}",
        base_url.trim_end_matches('/'),
        key.namespace(),
        key.file_stem(),
        ext
    )
}

// ========== Filesystem ==========

/// Stores artifacts as `{root}/{namespace}/{id}_{kind}.{ext}`
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
    base_url: String,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Only keys with a plain record id map to a path, so a key never
    /// resolves outside its namespace directory
    fn path(&self, key: &ArtifactKey, ext: &str) -> ArtifactStoreResult<PathBuf> {
        if !is_valid_record_id(key.record_id()) {
            return Err(ArtifactStoreError::InvalidKey(key.to_string()));
        }
        Ok(self
            .root
            .join(key.namespace().as_str())
            .join(format!("{}.{}", key.file_stem(), ext)))
    }

    async fn find(&self, key: &ArtifactKey) -> ArtifactStoreResult<Option<(PathBuf, &'static str)>> {
        for ext in EXTENSIONS {
            let path = self.path(key, ext)?;
            match tokio::fs::try_exists(&path).await {
                Ok(true) => return Ok(Some((path, ext))),
                Ok(false) => {}
                Err(e) => return Err(ArtifactStoreError::io(&path, e)),
            }
        }
        Ok(None)
    }

    async fn remove_if_present(path: &Path) -> ArtifactStoreResult<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ArtifactStoreError::io(path, e)),
        }
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put(&self, key: &ArtifactKey, bytes: &[u8], mime: &str) -> ArtifactStoreResult<String> {
        let ext = extension_for(mime);
        let target = self.path(key, ext)?;
        let dir = self.root.join(key.namespace().as_str());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ArtifactStoreError::io(&dir, e))?;

        let unchanged = match tokio::fs::read(&target).await {
            Ok(existing) => existing == bytes,
            Err(_) => false,
        };

        if unchanged {
            tracing::debug!(key = %key, "Artifact unchanged, skipping write");
        } else {
            // Write then rename so readers never observe a partial file
            let tmp = target.with_extension(format!("{ext}.{:08x}.tmp", rand::random::<u32>()));
            tokio::fs::write(&tmp, bytes)
                .await
                .map_err(|e| ArtifactStoreError::io(&tmp, e))?;
            if let Err(e) = tokio::fs::rename(&tmp, &target).await {
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(ArtifactStoreError::io(&target, e));
            }
        }

        // A key maps to exactly one file
        for other in EXTENSIONS.iter().filter(|other| **other != ext) {
            Self::remove_if_present(&self.path(key, other)?).await?;
        }

        Ok(artifact_url(&self.base_url, key, ext))
    }

    async fn get(&self, key: &ArtifactKey) -> ArtifactStoreResult<String> {
        match self.find(key).await? {
            Some((_, ext)) => Ok(artifact_url(&self.base_url, key, ext)),
            None => Err(ArtifactStoreError::NotFound(key.to_string())),
        }
    }

    async fn load(&self, key: &ArtifactKey) -> ArtifactStoreResult<StoredArtifact> {
        let (path, ext) = self
            .find(key)
            .await?
            .ok_or_else(|| ArtifactStoreError::NotFound(key.to_string()))?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| ArtifactStoreError::io(&path, e))?;
        let mime = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .to_string();

        Ok(StoredArtifact {
            bytes,
            mime,
            url: artifact_url(&self.base_url, key, ext),
        })
    }

    async fn delete(&self, key: &ArtifactKey) -> ArtifactStoreResult<()> {
        for ext in EXTENSIONS {
            Self::remove_if_present(&self.path(key, ext)?).await?;
        }
        Ok(())
    }
}

// ========== In-memory ==========

/// DashMap-backed artifact store
#[derive(Debug)]
pub struct MemoryArtifactStore {
    base_url: String,
    blobs: DashMap<ArtifactKey, (Vec<u8>, String)>,
}

impl MemoryArtifactStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            blobs: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn contains(&self, key: &ArtifactKey) -> bool {
        self.blobs.contains_key(key)
    }
}

impl Default for MemoryArtifactStore {
    fn default() -> Self {
        Self::new("memory://artifacts")
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn put(&self, key: &ArtifactKey, bytes: &[u8], mime: &str) -> ArtifactStoreResult<String> {
        self.blobs
            .insert(key.clone(), (bytes.to_vec(), mime.to_string()));
        Ok(artifact_url(&self.base_url, key, extension_for(mime)))
    }

    async fn get(&self, key: &ArtifactKey) -> ArtifactStoreResult<String> {
        self.blobs
            .get(key)
            .map(|entry| artifact_url(&self.base_url, key, extension_for(&entry.1)))
            .ok_or_else(|| ArtifactStoreError::NotFound(key.to_string()))
    }

    async fn load(&self, key: &ArtifactKey) -> ArtifactStoreResult<StoredArtifact> {
        self.blobs
            .get(key)
            .map(|entry| {
                let (bytes, mime) = entry.value();
                StoredArtifact {
                    bytes: bytes.clone(),
                    mime: mime.clone(),
                    url: artifact_url(&self.base_url, key, extension_for(mime)),
                }
            })
            .ok_or_else(|| ArtifactStoreError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &ArtifactKey) -> ArtifactStoreResult<()> {
        self.blobs.remove(key);
        Ok(())
    }
}
