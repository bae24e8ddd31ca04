//! Intent journal for two-store operations.
//!
//! An intent is written before the first mutation of a create or delete
//! and removed once both stores agree again. Anything still pending at
//! start-up is settled by [`crate::UploadCoordinator::reconcile`].

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::artifact::{ArtifactId, ArtifactMeta};
use crate::blob_store::BlobPath;
use crate::database::{Database, DatabaseSetupError, TableName};
use crate::error::{PersistenceError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntentId(Uuid);

impl IntentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for IntentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for IntentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentOperation {
    Create,
    Delete,
}

impl IntentOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentOperation::Create => "create",
            IntentOperation::Delete => "delete",
        }
    }
}

impl FromStr for IntentOperation {
    type Err = PersistenceError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "create" => Ok(IntentOperation::Create),
            "delete" => Ok(IntentOperation::Delete),
            other => Err(PersistenceError::CorruptRow(format!(
                "unknown intent operation '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for IntentOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A create or delete that has started and not yet been settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    pub id: IntentId,
    pub operation: IntentOperation,
    /// Unknown for a create until the catalog row exists.
    pub artifact_id: Option<ArtifactId>,
    pub name: String,
    pub file_type: String,
    pub created_at: OffsetDateTime,
}

impl Intent {
    pub fn blob_path(&self) -> BlobPath {
        BlobPath::derive(&self.name, &self.file_type)
    }
}

#[async_trait]
pub trait Journal: std::fmt::Debug + Send + Sync {
    /// Record that `operation` is about to touch `meta`.
    async fn begin(
        &self,
        operation: IntentOperation,
        artifact_id: Option<ArtifactId>,
        meta: &ArtifactMeta,
    ) -> Result<IntentId>;

    /// Remember which catalog row a create produced.
    async fn attach(&self, intent: &IntentId, artifact_id: &ArtifactId) -> Result<()>;

    /// Settle the intent. It no longer shows up in [`Journal::pending`].
    async fn complete(&self, intent: &IntentId) -> Result<()>;

    /// Unsettled intents, oldest first.
    async fn pending(&self) -> Result<Vec<Intent>>;
}

pub type DynJournal = Arc<dyn Journal>;

#[derive(FromRow)]
struct IntentRow {
    intent_id: String,
    operation: String,
    artifact_id: Option<ArtifactId>,
    filename: String,
    filetype: String,
    #[sqlx(rename = "createdAt")]
    created_at: OffsetDateTime,
}

impl TryFrom<IntentRow> for Intent {
    type Error = PersistenceError;

    fn try_from(row: IntentRow) -> std::result::Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.intent_id)
            .map(IntentId)
            .map_err(|_| PersistenceError::CorruptRow(format!("bad intent id '{}'", row.intent_id)))?;
        Ok(Intent {
            id,
            operation: row.operation.parse()?,
            artifact_id: row.artifact_id,
            name: row.filename,
            file_type: row.filetype,
            created_at: row.created_at,
        })
    }
}

/// [`Journal`] stored next to the catalog in `<table>_intents`.
#[derive(Debug, Clone)]
pub struct SqliteJournal {
    db: Database,
    table: String,
}

impl SqliteJournal {
    pub async fn open(db: Database, catalog_table: &TableName) -> std::result::Result<Self, DatabaseSetupError> {
        let journal = Self {
            db,
            table: format!("{catalog_table}_intents"),
        };
        let create = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                intent_id TEXT PRIMARY KEY NOT NULL,
                operation TEXT NOT NULL,
                artifact_id TEXT,
                filename TEXT NOT NULL,
                filetype TEXT NOT NULL,
                createdAt TEXT NOT NULL
            )
            "#,
            journal.table
        );
        sqlx::query(&create)
            .execute(&*journal.db)
            .await
            .map_err(DatabaseSetupError::Schema)?;
        Ok(journal)
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

#[async_trait]
impl Journal for SqliteJournal {
    async fn begin(
        &self,
        operation: IntentOperation,
        artifact_id: Option<ArtifactId>,
        meta: &ArtifactMeta,
    ) -> Result<IntentId> {
        let id = IntentId::new();
        let sql = format!(
            "INSERT INTO {} (intent_id, operation, artifact_id, filename, filetype, createdAt) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            self.table
        );
        let result = sqlx::query(&sql)
            .bind(id.to_string())
            .bind(operation.as_str())
            .bind(artifact_id)
            .bind(&meta.name)
            .bind(&meta.file_type)
            .bind(OffsetDateTime::now_utc())
            .execute(&*self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::NoRowsAffected("intent insert").into());
        }
        tracing::trace!(intent = %id, %operation, name = %meta.name, "intent recorded");
        Ok(id)
    }

    async fn attach(&self, intent: &IntentId, artifact_id: &ArtifactId) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET artifact_id = ?1 WHERE intent_id = ?2",
            self.table
        );
        let result = sqlx::query(&sql)
            .bind(artifact_id)
            .bind(intent.to_string())
            .execute(&*self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::NoRowsAffected("intent update").into());
        }
        Ok(())
    }

    async fn complete(&self, intent: &IntentId) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE intent_id = ?1", self.table);
        let result = sqlx::query(&sql)
            .bind(intent.to_string())
            .execute(&*self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::NoRowsAffected("intent delete").into());
        }
        tracing::trace!(intent = %intent, "intent completed");
        Ok(())
    }

    async fn pending(&self) -> Result<Vec<Intent>> {
        let sql = format!(
            "SELECT intent_id, operation, artifact_id, filename, filetype, createdAt \
             FROM {} ORDER BY createdAt ASC",
            self.table
        );
        let rows = sqlx::query_as::<_, IntentRow>(&sql)
            .fetch_all(&*self.db)
            .await?;

        rows.into_iter()
            .map(|row| Intent::try_from(row).map_err(Into::into))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UploadError;

    async fn setup_journal() -> SqliteJournal {
        let db = Database::in_memory().await.unwrap();
        SqliteJournal::open(db, &TableName::default()).await.unwrap()
    }

    #[tokio::test]
    async fn test_begin_attach_complete() {
        let journal = setup_journal().await;
        assert_eq!(journal.table(), "uploads_intents");

        let meta = ArtifactMeta::new("report", 3, "pdf");
        let intent = journal
            .begin(IntentOperation::Create, None, &meta)
            .await
            .unwrap();

        let pending = journal.pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, intent);
        assert_eq!(pending[0].operation, IntentOperation::Create);
        assert_eq!(pending[0].artifact_id, None);
        assert_eq!(pending[0].blob_path().as_str(), "report.pdf");

        let artifact = ArtifactId::new();
        journal.attach(&intent, &artifact).await.unwrap();
        assert_eq!(journal.pending().await.unwrap()[0].artifact_id, Some(artifact));

        journal.complete(&intent).await.unwrap();
        assert!(journal.pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_complete_unknown_intent_fails() {
        let journal = setup_journal().await;
        let err = journal.complete(&IntentId::new()).await.unwrap_err();
        assert!(matches!(
            err,
            UploadError::Persistence(PersistenceError::NoRowsAffected(_))
        ));
    }

    #[tokio::test]
    async fn test_pending_keeps_order() {
        let journal = setup_journal().await;
        let id = ArtifactId::new();
        journal
            .begin(IntentOperation::Delete, Some(id), &ArtifactMeta::new("a", 1, "png"))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        journal
            .begin(IntentOperation::Create, None, &ArtifactMeta::new("b", 1, "png"))
            .await
            .unwrap();

        let ops: Vec<_> = journal
            .pending()
            .await
            .unwrap()
            .into_iter()
            .map(|i| (i.operation, i.name))
            .collect();
        assert_eq!(
            ops,
            vec![
                (IntentOperation::Delete, "a".to_string()),
                (IntentOperation::Create, "b".to_string())
            ]
        );
    }

    #[test]
    fn test_unknown_operation_is_corrupt() {
        let err = "rename".parse::<IntentOperation>().unwrap_err();
        assert!(matches!(err, PersistenceError::CorruptRow(_)));
    }
}
