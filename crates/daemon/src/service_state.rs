use std::sync::Arc;

use depot_store::{
    Database, DatabaseSetupError, ObjectBlobStore, SqliteCatalog, SqliteJournal, StorageError,
    TableName, UploadCoordinator, UploadError,
};

use super::service_config::Config;

/// Main service state, shared by every request handler.
#[derive(Debug, Clone)]
pub struct State {
    database: Database,
    uploads: UploadCoordinator,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        // 1. Setup database
        let database = match config.sqlite_path {
            Some(ref path) => {
                tracing::info!(path = %path.display(), "opening database");
                Database::new(path).await?
            }
            // otherwise just set up an in-memory database
            None => {
                tracing::info!("using in-memory database");
                Database::in_memory().await?
            }
        };

        // 2. Catalog and intent journal on the configured table
        let table = TableName::new(&config.table_name)?;
        let catalog = SqliteCatalog::open(database.clone(), table.clone()).await?;
        let journal = SqliteJournal::open(database.clone(), &table).await?;
        tracing::debug!(table = %table, journal = journal.table(), "catalog schema ready");

        // 3. Setup blob store
        let blobs = ObjectBlobStore::new(&config.blob_store).await?;
        tracing::debug!(blob_store = ?config.blob_store, "blob store loaded");

        let uploads = UploadCoordinator::new(Arc::new(catalog), Arc::new(blobs), Arc::new(journal));

        // 4. Settle anything a previous run left half-done, before serving
        let report = uploads
            .reconcile()
            .await
            .map_err(StateSetupError::Reconcile)?;
        if report.is_clean() {
            tracing::debug!("no pending intents");
        } else {
            tracing::info!(
                examined = report.examined,
                completed = report.completed,
                compensated = report.compensated,
                finished = report.finished,
                blobs_removed = report.blobs_removed,
                failed = report.failed,
                "reconciled pending intents"
            );
        }

        Ok(Self { database, uploads })
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn uploads(&self) -> &UploadCoordinator {
        &self.uploads
    }
}

impl AsRef<Database> for State {
    fn as_ref(&self) -> &Database {
        &self.database
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("Database setup error: {0}")]
    DatabaseSetupError(#[from] DatabaseSetupError),
    #[error("Blob store error: {0}")]
    BlobStoreError(#[from] StorageError),
    #[error("Failed to reconcile pending intents: {0}")]
    Reconcile(UploadError),
}
