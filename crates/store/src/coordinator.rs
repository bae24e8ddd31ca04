//! The only component that touches both the catalog and the blob store.

use bytes::Bytes;

use crate::artifact::{ArtifactId, ArtifactMeta, ArtifactRecord, NewArtifact};
use crate::blob_store::{BlobPath, DynBlobStore};
use crate::catalog::DynCatalog;
use crate::error::{ConsistencyError, ConsistencyGap, Result, StorageError, UploadError};
use crate::journal::{DynJournal, IntentId, IntentOperation};
use crate::validator;

/// Drives create, delete and retrieval across the two stores.
///
/// Stateless apart from its handles; clone it freely and call it from
/// any number of tasks.
#[derive(Debug, Clone)]
pub struct UploadCoordinator {
    pub(crate) catalog: DynCatalog,
    pub(crate) blobs: DynBlobStore,
    pub(crate) journal: DynJournal,
}

impl UploadCoordinator {
    pub fn new(catalog: DynCatalog, blobs: DynBlobStore, journal: DynJournal) -> Self {
        Self {
            catalog,
            blobs,
            journal,
        }
    }

    pub fn catalog(&self) -> &DynCatalog {
        &self.catalog
    }

    pub fn blobs(&self) -> &DynBlobStore {
        &self.blobs
    }

    /// Validate, insert the catalog row, then write the blob.
    ///
    /// A blob write failure after the insert is returned as
    /// [`ConsistencyGap::MissingBlobAfterCreate`]; the row is left in place
    /// and its intent stays pending.
    pub async fn create(&self, artifact: NewArtifact) -> Result<ArtifactRecord> {
        let NewArtifact { meta, data } = artifact;

        if let Err(e) = validator::validate(&meta, self.catalog.as_ref()).await {
            tracing::warn!(name = %meta.name, file_type = %meta.file_type, "upload rejected: {e}");
            return Err(e);
        }

        let intent = self
            .journal
            .begin(IntentOperation::Create, None, &meta)
            .await?;

        let record = match self.catalog.create(&meta).await {
            Ok(record) => record,
            Err(e) => {
                self.settle(&intent).await;
                return Err(e);
            }
        };
        if let Err(e) = self.journal.attach(&intent, &record.id).await {
            tracing::warn!(intent = %intent, id = %record.id, "failed to attach id to intent: {e}");
        }

        let path = record.blob_path();
        if let Err(e) = self.blobs.write(&path, data).await {
            tracing::error!(id = %record.id, path = %path, "blob write failed after catalog insert: {e}");
            return Err(ConsistencyError {
                id: record.id,
                path,
                gap: ConsistencyGap::MissingBlobAfterCreate,
                source: Box::new(e.into()),
            }
            .into());
        }

        self.settle(&intent).await;
        tracing::info!(id = %record.id, path = %path, size = record.size, "upload created");
        Ok(record)
    }

    /// Record for `id`, or `NotFound`.
    pub async fn get(&self, id: &ArtifactId) -> Result<ArtifactRecord> {
        self.catalog
            .get_by_id(id)
            .await?
            .ok_or(UploadError::NotFound(*id))
    }

    /// Record plus its bytes. A record whose blob is gone is a
    /// consistency error, never an empty body.
    pub async fn fetch(&self, id: &ArtifactId) -> Result<(ArtifactRecord, Bytes)> {
        let record = self.get(id).await?;
        let path = record.blob_path();

        match self.blobs.read(&path).await {
            Ok(data) => Ok((record, data)),
            Err(e @ StorageError::Missing(_)) => {
                tracing::error!(id = %record.id, path = %path, "cataloged upload has no blob");
                Err(ConsistencyError {
                    id: record.id,
                    path,
                    gap: ConsistencyGap::MissingBlob,
                    source: Box::new(e.into()),
                }
                .into())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list(&self) -> Result<Vec<ArtifactRecord>> {
        self.catalog.list_all().await
    }

    /// Remove the blob, then the catalog row.
    ///
    /// A catalog failure after the blob is gone is returned as
    /// [`ConsistencyGap::OrphanRecordAfterDelete`].
    pub async fn delete(&self, id: &ArtifactId) -> Result<()> {
        let record = self.get(id).await?;
        let meta = ArtifactMeta::new(&record.name, record.size.unsigned_abs(), &record.file_type);
        let path = record.blob_path();

        let intent = self
            .journal
            .begin(IntentOperation::Delete, Some(record.id), &meta)
            .await?;

        if let Err(e) = self.blobs.delete(&path).await {
            tracing::warn!(id = %record.id, path = %path, "blob delete failed, record kept: {e}");
            self.settle(&intent).await;
            return Err(e.into());
        }

        if let Err(e) = self.catalog.delete_by_id(&record.id).await {
            tracing::error!(id = %record.id, path = %path, "catalog delete failed after blob removal: {e}");
            return Err(ConsistencyError {
                id: record.id,
                path,
                gap: ConsistencyGap::OrphanRecordAfterDelete,
                source: Box::new(e),
            }
            .into());
        }

        self.settle(&intent).await;
        tracing::info!(id = %record.id, path = %path, "upload deleted");
        Ok(())
    }

    pub(crate) async fn blob_exists(&self, path: &BlobPath) -> Result<bool> {
        Ok(self.blobs.exists(path).await?)
    }

    /// Close out an intent. Failures are left for the start-up sweep.
    pub(crate) async fn settle(&self, intent: &IntentId) {
        if let Err(e) = self.journal.complete(intent).await {
            tracing::warn!(intent = %intent, "failed to complete intent, leaving it for reconcile: {e}");
        }
    }
}
