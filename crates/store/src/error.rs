//! Error types for the upload lifecycle.
//!
//! Every failure is reported as an [`UploadError`]. Callers match on
//! [`UploadError::kind`] rather than on message text.

use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactId;
use crate::blob_store::BlobPath;

/// Errors that can occur while creating, reading or deleting an artifact.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Candidate failed an acceptance rule. Nothing was mutated.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// No record with this identifier.
    #[error("upload not found: {0}")]
    NotFound(ArtifactId),

    /// A record with this name already exists.
    #[error("an upload named '{0}' already exists")]
    Conflict(String),

    /// Filesystem failure with no catalog mutation involved.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Relational failure.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// The catalog and the blob store have diverged.
    #[error("consistency error: {0}")]
    Consistency(#[from] ConsistencyError),

    /// Identifier string could not be parsed.
    #[error("invalid upload id '{0}'")]
    InvalidId(String),
}

impl UploadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UploadError::Validation(_) => ErrorKind::Validation,
            UploadError::NotFound(_) => ErrorKind::NotFound,
            UploadError::Conflict(_) => ErrorKind::Conflict,
            UploadError::Storage(_) => ErrorKind::Storage,
            UploadError::Persistence(_) => ErrorKind::Persistence,
            UploadError::Consistency(_) => ErrorKind::Consistency,
            UploadError::InvalidId(_) => ErrorKind::InvalidId,
        }
    }
}

impl From<sqlx::Error> for UploadError {
    fn from(err: sqlx::Error) -> Self {
        UploadError::Persistence(PersistenceError::Database(err))
    }
}

/// Discriminant of [`UploadError`], serialized as snake_case for API bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Storage,
    Persistence,
    Consistency,
    InvalidId,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Storage => "storage",
            ErrorKind::Persistence => "persistence",
            ErrorKind::Consistency => "consistency",
            ErrorKind::InvalidId => "invalid_id",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Acceptance rules, reported in the order they are checked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("file name must not exceed {max} characters (got {len})")]
    NameTooLong { len: usize, max: usize },

    #[error("file type must not exceed {max} characters (got {len})")]
    TypeTooLong { len: usize, max: usize },

    #[error("file extension '{0}' is not accepted")]
    UnsupportedType(String),

    #[error("file is too large: {size} bytes (must not exceed {max})")]
    TooLarge { size: u64, max: u64 },

    #[error("file is empty")]
    Empty,

    #[error("file must have a name and an extension (got '{0}')")]
    MissingExtension(String),
}

/// Failures of the blob store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("blob not found at {0}")]
    Missing(BlobPath),

    #[error("object storage error at {path}: {source}")]
    ObjectStore {
        path: BlobPath,
        #[source]
        source: object_store::Error,
    },

    #[error("failed to list blobs: {0}")]
    List(#[source] object_store::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid storage configuration: {0}")]
    InvalidConfig(String),
}

/// Failures of the relational catalog.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A write that was expected to touch one row touched none.
    #[error("{0} affected no rows")]
    NoRowsAffected(&'static str),

    #[error("corrupt row in catalog: {0}")]
    CorruptRow(String),
}

/// Which half of a two-step operation committed before the other failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyGap {
    /// Catalog row written, blob write failed.
    MissingBlobAfterCreate,
    /// Blob removed, catalog delete failed.
    OrphanRecordAfterDelete,
    /// Catalog row exists but its blob is gone.
    MissingBlob,
}

impl std::fmt::Display for ConsistencyGap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsistencyGap::MissingBlobAfterCreate => {
                f.write_str("record created but blob write failed")
            }
            ConsistencyGap::OrphanRecordAfterDelete => {
                f.write_str("blob removed but record delete failed")
            }
            ConsistencyGap::MissingBlob => f.write_str("record exists but blob is missing"),
        }
    }
}

/// The two stores disagree about an artifact. Carries the identifiers
/// needed to reconcile it.
#[derive(Debug, thiserror::Error)]
#[error("{gap} (id: {id}, path: {path}): {source}")]
pub struct ConsistencyError {
    pub id: ArtifactId,
    pub path: BlobPath,
    pub gap: ConsistencyGap,
    #[source]
    pub source: Box<UploadError>,
}

/// Result type alias for upload operations.
pub type Result<T> = std::result::Result<T, UploadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::NotFound).unwrap();
        assert_eq!(json, "\"not_found\"");
        assert_eq!(ErrorKind::InvalidId.to_string(), "invalid_id");
    }

    #[test]
    fn test_consistency_message_names_id_and_path() {
        let id = ArtifactId::new();
        let path = BlobPath::derive("report", "pdf");
        let err = UploadError::from(ConsistencyError {
            id,
            path: path.clone(),
            gap: ConsistencyGap::MissingBlobAfterCreate,
            source: Box::new(StorageError::Missing(path).into()),
        });

        assert_eq!(err.kind(), ErrorKind::Consistency);
        let msg = err.to_string();
        assert!(msg.contains(&id.to_string()));
        assert!(msg.contains("report.pdf"));
    }
}
