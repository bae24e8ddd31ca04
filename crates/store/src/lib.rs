//! Upload lifecycle manager
//!
//! Validates uploaded artifacts, catalogs their metadata in SQLite and
//! keeps their bytes in a blob store (local filesystem or memory), with
//! create, get, delete and list keeping both stores in step.
//!
//! # Features
//!
//! - Fixed-order acceptance rules (name, type, accepted set, size, uniqueness)
//! - Catalog table name chosen at start-up, all values bound as parameters
//! - Intent journal plus a start-up sweep that settles interrupted operations
//! - Audit of records without blobs and blobs without records
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use bytes::Bytes;
//! use depot_store::{
//!     Database, NewArtifact, ObjectBlobStore, SqliteCatalog, SqliteJournal, TableName,
//!     UploadCoordinator,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::in_memory().await?;
//! let table = TableName::default();
//! let catalog = SqliteCatalog::open(db.clone(), table.clone()).await?;
//! let journal = SqliteJournal::open(db, &table).await?;
//! let coordinator = UploadCoordinator::new(
//!     Arc::new(catalog),
//!     Arc::new(ObjectBlobStore::memory()),
//!     Arc::new(journal),
//! );
//!
//! let artifact = NewArtifact::from_filename("report.pdf", Bytes::from_static(b"%PDF-1.7"))?;
//! let record = coordinator.create(artifact).await?;
//! let (_, bytes) = coordinator.fetch(&record.id).await?;
//! assert_eq!(&bytes[..], b"%PDF-1.7");
//! # Ok(())
//! # }
//! ```

mod artifact;
mod blob_store;
mod catalog;
mod coordinator;
mod database;
mod error;
mod journal;
mod reconcile;
pub mod validator;

pub use artifact::{ArtifactId, ArtifactMeta, ArtifactRecord, NewArtifact};
pub use blob_store::{BlobPath, BlobStore, BlobStoreConfig, DynBlobStore, ObjectBlobStore};
pub use catalog::{Catalog, DynCatalog, SqliteCatalog};
pub use coordinator::UploadCoordinator;
pub use database::{Database, DatabaseSetupError, TableName, DEFAULT_TABLE_NAME};
pub use error::{
    ConsistencyError, ConsistencyGap, ErrorKind, PersistenceError, Result, StorageError,
    UploadError, ValidationError,
};
pub use journal::{DynJournal, Intent, IntentId, IntentOperation, Journal, SqliteJournal};
pub use reconcile::{AuditReport, ReconcileReport};
