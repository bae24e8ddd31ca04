//! Shared fixtures: a coordinator over a temp directory, with switches to
//! make individual store calls fail.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tempfile::TempDir;

use depot_store::{
    ArtifactId, ArtifactMeta, ArtifactRecord, BlobPath, BlobStore, BlobStoreConfig, Catalog,
    Database, Intent, IntentId, IntentOperation, Journal, ObjectBlobStore, Result, SqliteCatalog,
    SqliteJournal, StorageError, TableName, UploadCoordinator, UploadError,
};

fn injected(what: &str) -> std::io::Error {
    std::io::Error::other(format!("injected {what} failure"))
}

#[derive(Debug)]
pub struct FaultyBlobStore {
    inner: ObjectBlobStore,
    pub fail_write: AtomicBool,
    pub fail_delete: AtomicBool,
}

#[async_trait]
impl BlobStore for FaultyBlobStore {
    async fn write(&self, path: &BlobPath, data: Bytes) -> std::result::Result<(), StorageError> {
        if self.fail_write.load(Ordering::SeqCst) {
            return Err(injected("write").into());
        }
        self.inner.write(path, data).await
    }

    async fn read(&self, path: &BlobPath) -> std::result::Result<Bytes, StorageError> {
        self.inner.read(path).await
    }

    async fn delete(&self, path: &BlobPath) -> std::result::Result<(), StorageError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(injected("delete").into());
        }
        self.inner.delete(path).await
    }

    async fn exists(&self, path: &BlobPath) -> std::result::Result<bool, StorageError> {
        self.inner.exists(path).await
    }

    async fn list(&self) -> std::result::Result<Vec<String>, StorageError> {
        self.inner.list().await
    }
}

#[derive(Debug)]
pub struct FaultyCatalog {
    inner: SqliteCatalog,
    pub fail_create: AtomicBool,
    pub fail_delete: AtomicBool,
}

#[async_trait]
impl Catalog for FaultyCatalog {
    async fn list_all(&self) -> Result<Vec<ArtifactRecord>> {
        self.inner.list_all().await
    }

    async fn get_by_id(&self, id: &ArtifactId) -> Result<Option<ArtifactRecord>> {
        self.inner.get_by_id(id).await
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<ArtifactRecord>> {
        self.inner.get_by_name(name).await
    }

    async fn create(&self, meta: &ArtifactMeta) -> Result<ArtifactRecord> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(UploadError::from(sqlx::Error::PoolTimedOut));
        }
        self.inner.create(meta).await
    }

    async fn delete_by_id(&self, id: &ArtifactId) -> Result<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(UploadError::from(sqlx::Error::PoolTimedOut));
        }
        self.inner.delete_by_id(id).await
    }
}

#[derive(Debug)]
pub struct FaultyJournal {
    inner: SqliteJournal,
    pub fail_begin: AtomicBool,
}

#[async_trait]
impl Journal for FaultyJournal {
    async fn begin(
        &self,
        operation: IntentOperation,
        artifact_id: Option<ArtifactId>,
        meta: &ArtifactMeta,
    ) -> Result<IntentId> {
        if self.fail_begin.load(Ordering::SeqCst) {
            return Err(UploadError::from(sqlx::Error::PoolTimedOut));
        }
        self.inner.begin(operation, artifact_id, meta).await
    }

    async fn attach(&self, intent: &IntentId, artifact_id: &ArtifactId) -> Result<()> {
        self.inner.attach(intent, artifact_id).await
    }

    async fn complete(&self, intent: &IntentId) -> Result<()> {
        self.inner.complete(intent).await
    }

    async fn pending(&self) -> Result<Vec<Intent>> {
        self.inner.pending().await
    }
}

pub struct Harness {
    pub coordinator: UploadCoordinator,
    pub catalog: Arc<FaultyCatalog>,
    pub blobs: Arc<FaultyBlobStore>,
    pub journal: Arc<FaultyJournal>,
    pub root: PathBuf,
    _temp_dir: TempDir,
}

impl Harness {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("uploads");

        let db_url = url::Url::parse("sqlite::memory:").unwrap();
        let db = Database::connect(&db_url).await.unwrap();
        let table = TableName::default();

        let catalog = Arc::new(FaultyCatalog {
            inner: SqliteCatalog::open(db.clone(), table.clone()).await.unwrap(),
            fail_create: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
        });
        let blobs = Arc::new(FaultyBlobStore {
            inner: ObjectBlobStore::new(&BlobStoreConfig::Local { path: root.clone() })
                .await
                .unwrap(),
            fail_write: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
        });
        let journal = Arc::new(FaultyJournal {
            inner: SqliteJournal::open(db, &table).await.unwrap(),
            fail_begin: AtomicBool::new(false),
        });

        let coordinator = UploadCoordinator::new(catalog.clone(), blobs.clone(), journal.clone());

        Self {
            coordinator,
            catalog,
            blobs,
            journal,
            root,
            _temp_dir: temp_dir,
        }
    }

    pub fn blob_file(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    pub fn stored_files(&self) -> Vec<String> {
        stored_files(&self.root)
    }
}

pub fn stored_files(root: &Path) -> Vec<String> {
    let mut names: Vec<_> = std::fs::read_dir(root)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

pub fn set(flag: &AtomicBool, value: bool) {
    flag.store(value, Ordering::SeqCst);
}
