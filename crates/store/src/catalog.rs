//! Relational catalog of artifact records.

use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::artifact::{ArtifactId, ArtifactMeta, ArtifactRecord};
use crate::database::{Database, DatabaseSetupError, TableName};
use crate::error::{PersistenceError, Result, UploadError, ValidationError};
use crate::validator::MAX_SIZE;

/// CRUD access to artifact records. No filesystem knowledge.
#[async_trait]
pub trait Catalog: std::fmt::Debug + Send + Sync {
    /// Every record, newest first.
    async fn list_all(&self) -> Result<Vec<ArtifactRecord>>;

    /// `None` when absent; errors only on I/O failure.
    async fn get_by_id(&self, id: &ArtifactId) -> Result<Option<ArtifactRecord>>;

    /// `None` when absent; errors only on I/O failure.
    async fn get_by_name(&self, name: &str) -> Result<Option<ArtifactRecord>>;

    /// Insert a new row. The id and timestamp are assigned here.
    async fn create(&self, meta: &ArtifactMeta) -> Result<ArtifactRecord>;

    /// Remove a row. `NotFound` when nothing was deleted.
    async fn delete_by_id(&self, id: &ArtifactId) -> Result<()>;
}

pub type DynCatalog = Arc<dyn Catalog>;

/// Statement text, rendered once for the configured table.
#[derive(Debug, Clone)]
struct Statements {
    list_all: String,
    get_by_id: String,
    get_by_name: String,
    insert: String,
    delete_by_id: String,
}

impl Statements {
    fn for_table(table: &TableName) -> Self {
        let columns = "id, filename, filesize, filetype, createdAt";
        Self {
            list_all: format!("SELECT {columns} FROM {table} ORDER BY createdAt DESC, id ASC"),
            get_by_id: format!("SELECT {columns} FROM {table} WHERE id = ?1 LIMIT 1"),
            get_by_name: format!("SELECT {columns} FROM {table} WHERE filename = ?1 LIMIT 1"),
            insert: format!("INSERT INTO {table} ({columns}) VALUES (?1, ?2, ?3, ?4, ?5)"),
            delete_by_id: format!("DELETE FROM {table} WHERE id = ?1"),
        }
    }
}

/// [`Catalog`] backed by a SQLite table.
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    db: Database,
    table: TableName,
    sql: Statements,
}

impl SqliteCatalog {
    /// Bind the catalog to `table`, creating it if needed.
    pub async fn open(db: Database, table: TableName) -> std::result::Result<Self, DatabaseSetupError> {
        let catalog = Self {
            sql: Statements::for_table(&table),
            db,
            table,
        };
        catalog.ensure_schema().await?;
        Ok(catalog)
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    /// The UNIQUE constraint on `filename` is the authoritative guard on
    /// name uniqueness; the validator's lookup only avoids a wasted insert.
    async fn ensure_schema(&self) -> std::result::Result<(), DatabaseSetupError> {
        let table = &self.table;
        let create_table = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id TEXT PRIMARY KEY NOT NULL,
                filename TEXT NOT NULL UNIQUE,
                filesize INTEGER NOT NULL,
                filetype TEXT NOT NULL,
                createdAt TEXT NOT NULL
            )
            "#
        );
        let create_index =
            format!("CREATE INDEX IF NOT EXISTS {table}_created_at_idx ON {table} (createdAt)");

        for statement in [create_table, create_index] {
            sqlx::query(&statement)
                .execute(&*self.db)
                .await
                .map_err(DatabaseSetupError::Schema)?;
        }
        Ok(())
    }
}

#[async_trait]
impl Catalog for SqliteCatalog {
    async fn list_all(&self) -> Result<Vec<ArtifactRecord>> {
        let records = sqlx::query_as::<_, ArtifactRecord>(&self.sql.list_all)
            .fetch_all(&*self.db)
            .await?;
        Ok(records)
    }

    async fn get_by_id(&self, id: &ArtifactId) -> Result<Option<ArtifactRecord>> {
        let record = sqlx::query_as::<_, ArtifactRecord>(&self.sql.get_by_id)
            .bind(id)
            .fetch_optional(&*self.db)
            .await?;
        Ok(record)
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<ArtifactRecord>> {
        let record = sqlx::query_as::<_, ArtifactRecord>(&self.sql.get_by_name)
            .bind(name)
            .fetch_optional(&*self.db)
            .await?;
        Ok(record)
    }

    async fn create(&self, meta: &ArtifactMeta) -> Result<ArtifactRecord> {
        let size = i64::try_from(meta.size).map_err(|_| ValidationError::TooLarge {
            size: meta.size,
            max: MAX_SIZE,
        })?;
        let record = ArtifactRecord {
            id: ArtifactId::new(),
            name: meta.name.clone(),
            size,
            file_type: meta.file_type.clone(),
            created_at: OffsetDateTime::now_utc(),
        };

        let result = sqlx::query(&self.sql.insert)
            .bind(record.id)
            .bind(&record.name)
            .bind(record.size)
            .bind(&record.file_type)
            .bind(record.created_at)
            .execute(&*self.db)
            .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => {
                Err(PersistenceError::NoRowsAffected("insert").into())
            }
            Ok(_) => {
                tracing::debug!(id = %record.id, name = %record.name, "catalog row inserted");
                Ok(record)
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(UploadError::Conflict(record.name))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_by_id(&self, id: &ArtifactId) -> Result<()> {
        let result = sqlx::query(&self.sql.delete_by_id)
            .bind(id)
            .execute(&*self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(UploadError::NotFound(*id));
        }
        tracing::debug!(id = %id, "catalog row deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_catalog() -> SqliteCatalog {
        let db = Database::in_memory().await.unwrap();
        SqliteCatalog::open(db, TableName::default()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_get_list_delete() {
        let catalog = setup_catalog().await;

        let record = catalog
            .create(&ArtifactMeta::new("report", 1024, "pdf"))
            .await
            .unwrap();
        assert_eq!(record.name, "report");
        assert_eq!(record.size, 1024);
        assert_eq!(record.file_type, "pdf");

        let by_id = catalog.get_by_id(&record.id).await.unwrap().unwrap();
        assert_eq!(by_id.id, record.id);
        assert_eq!(by_id.name, "report");

        let by_name = catalog.get_by_name("report").await.unwrap().unwrap();
        assert_eq!(by_name.id, record.id);

        let all = catalog.list_all().await.unwrap();
        assert_eq!(all.len(), 1);

        catalog.delete_by_id(&record.id).await.unwrap();
        assert!(catalog.get_by_id(&record.id).await.unwrap().is_none());
        assert!(catalog.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_absent_is_not_an_error() {
        let catalog = setup_catalog().await;
        assert!(catalog.get_by_id(&ArtifactId::new()).await.unwrap().is_none());
        assert!(catalog.get_by_name("nothing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let catalog = setup_catalog().await;
        let id = ArtifactId::new();
        let err = catalog.delete_by_id(&id).await.unwrap_err();
        assert!(matches!(err, UploadError::NotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn test_unique_constraint_reports_conflict() {
        let catalog = setup_catalog().await;
        catalog
            .create(&ArtifactMeta::new("report", 10, "pdf"))
            .await
            .unwrap();

        // Straight to the insert, no validator lookup in front of it.
        let err = catalog
            .create(&ArtifactMeta::new("report", 20, "png"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Conflict(name) if name == "report"));
        assert_eq!(catalog.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let catalog = setup_catalog().await;
        for name in ["first", "second", "third"] {
            catalog
                .create(&ArtifactMeta::new(name, 1, "png"))
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let names: Vec<_> = catalog
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_tables_are_isolated() {
        let db = Database::in_memory().await.unwrap();
        let uploads = SqliteCatalog::open(db.clone(), TableName::new("uploads").unwrap())
            .await
            .unwrap();
        let staging = SqliteCatalog::open(db, TableName::new("staging_uploads").unwrap())
            .await
            .unwrap();

        uploads
            .create(&ArtifactMeta::new("report", 1, "pdf"))
            .await
            .unwrap();

        assert_eq!(uploads.list_all().await.unwrap().len(), 1);
        assert!(staging.list_all().await.unwrap().is_empty());
        assert_eq!(staging.table().as_str(), "staging_uploads");
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let db = Database::in_memory().await.unwrap();
        let first = SqliteCatalog::open(db.clone(), TableName::default())
            .await
            .unwrap();
        first
            .create(&ArtifactMeta::new("kept", 1, "gif"))
            .await
            .unwrap();

        let second = SqliteCatalog::open(db, TableName::default()).await.unwrap();
        assert!(second.get_by_name("kept").await.unwrap().is_some());
    }
}
