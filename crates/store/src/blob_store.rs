//! Blob storage for raw artifact bytes (local filesystem or memory).
//!
//! Every blob lives directly under the store root at `<name>.<type>`.
//! The store knows nothing about the catalog.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Configuration for the blob storage backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlobStoreConfig {
    /// In-memory storage (for testing)
    #[default]
    Memory,

    /// Local filesystem storage
    Local {
        /// Root directory for all blobs
        path: PathBuf,
    },
}

/// Deterministic location of a blob, relative to the store root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobPath(String);

impl BlobPath {
    /// `(name, type)` -> `name.type`.
    pub fn derive(name: &str, file_type: &str) -> Self {
        Self(format!("{}.{}", name, file_type))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The key this path is stored under, as reported by [`BlobStore::list`].
    pub fn key(&self) -> String {
        self.location().to_string()
    }

    /// Always a single path segment. Ordinary names are stored literally;
    /// a name with a separator, a control character, or one that is `.` or
    /// `..` is percent-encoded instead so it never leaves the root.
    fn location(&self) -> ObjectPath {
        let raw = self.0.as_str();
        if !raw.contains(['/', '\\']) {
            if let Ok(path) = ObjectPath::parse(raw) {
                return path;
            }
        }
        ObjectPath::from_iter([raw])
    }
}

impl std::fmt::Display for BlobPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw byte storage keyed by [`BlobPath`].
#[async_trait]
pub trait BlobStore: std::fmt::Debug + Send + Sync {
    /// Create or overwrite the blob at `path`.
    async fn write(&self, path: &BlobPath, data: Bytes) -> Result<(), StorageError>;

    /// Read the whole blob. Missing blobs are an error.
    async fn read(&self, path: &BlobPath) -> Result<Bytes, StorageError>;

    /// Remove the blob. Missing blobs are an error.
    async fn delete(&self, path: &BlobPath) -> Result<(), StorageError>;

    async fn exists(&self, path: &BlobPath) -> Result<bool, StorageError>;

    /// Every blob key currently stored.
    async fn list(&self) -> Result<Vec<String>, StorageError>;
}

pub type DynBlobStore = Arc<dyn BlobStore>;

/// [`BlobStore`] over an `object_store` backend.
#[derive(Debug, Clone)]
pub struct ObjectBlobStore {
    inner: Arc<dyn ObjectStore>,
}

impl ObjectBlobStore {
    /// Create a new storage backend from configuration.
    pub async fn new(config: &BlobStoreConfig) -> Result<Self, StorageError> {
        let inner: Arc<dyn ObjectStore> = match config {
            BlobStoreConfig::Memory => Arc::new(InMemory::new()),

            BlobStoreConfig::Local { path } => {
                // Ensure directory exists
                tokio::fs::create_dir_all(path).await?;
                Arc::new(
                    LocalFileSystem::new_with_prefix(path)
                        .map_err(|e| StorageError::InvalidConfig(e.to_string()))?,
                )
            }
        };

        Ok(Self { inner })
    }

    pub fn memory() -> Self {
        Self {
            inner: Arc::new(InMemory::new()),
        }
    }

    fn map_err(path: &BlobPath, err: object_store::Error) -> StorageError {
        match err {
            object_store::Error::NotFound { .. } => StorageError::Missing(path.clone()),
            source => StorageError::ObjectStore {
                path: path.clone(),
                source,
            },
        }
    }
}

#[async_trait]
impl BlobStore for ObjectBlobStore {
    async fn write(&self, path: &BlobPath, data: Bytes) -> Result<(), StorageError> {
        tracing::debug!(path = %path, size = data.len(), "writing blob");
        self.inner
            .put(&path.location(), data.into())
            .await
            .map_err(|e| Self::map_err(path, e))?;
        Ok(())
    }

    async fn read(&self, path: &BlobPath) -> Result<Bytes, StorageError> {
        let result = self
            .inner
            .get(&path.location())
            .await
            .map_err(|e| Self::map_err(path, e))?;
        result.bytes().await.map_err(|e| Self::map_err(path, e))
    }

    async fn delete(&self, path: &BlobPath) -> Result<(), StorageError> {
        // Backends differ on deleting a missing object; check first so a
        // missing blob is always an error.
        if !self.exists(path).await? {
            return Err(StorageError::Missing(path.clone()));
        }
        tracing::debug!(path = %path, "deleting blob");
        self.inner
            .delete(&path.location())
            .await
            .map_err(|e| Self::map_err(path, e))
    }

    async fn exists(&self, path: &BlobPath) -> Result<bool, StorageError> {
        match self.inner.head(&path.location()).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(Self::map_err(path, e)),
        }
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        use futures::TryStreamExt;

        let items: Vec<_> = self
            .inner
            .list(None)
            .try_collect()
            .await
            .map_err(StorageError::List)?;

        Ok(items
            .into_iter()
            .map(|meta| meta.location.to_string())
            .collect())
    }
}
