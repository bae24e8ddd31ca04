//! SQLite connection pool and the trusted table name.

use std::ops::Deref;
use std::path::Path;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use url::Url;

/// Shared SQLite pool. Created once at start-up and handed to every
/// component that needs it.
#[derive(Debug, Clone)]
pub struct Database(SqlitePool);

impl Database {
    /// Connect from a `sqlite:` URL (`sqlite::memory:` for an in-memory db).
    pub async fn connect(database_url: &Url) -> Result<Self, DatabaseSetupError> {
        if database_url.scheme() != "sqlite" {
            return Err(DatabaseSetupError::UnknownDbType(
                database_url.scheme().to_string(),
            ));
        }

        if database_url.as_str() == "sqlite::memory:" {
            return Self::in_memory().await;
        }

        let options = SqliteConnectOptions::from_str(database_url.as_str())
            .map_err(DatabaseSetupError::Unavailable)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        Self::open(options, SqlitePoolOptions::new().max_connections(5)).await
    }

    /// Open a file-backed database, creating it and its parent directory.
    pub async fn new(path: &Path) -> Result<Self, DatabaseSetupError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DatabaseSetupError::Unavailable(e.into()))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        Self::open(options, SqlitePoolOptions::new().max_connections(5)).await
    }

    /// Create an in-memory database.
    pub async fn in_memory() -> Result<Self, DatabaseSetupError> {
        // Every new in-memory connection is a fresh db, so keep exactly one
        // and never recycle it.
        let options = SqliteConnectOptions::new().filename(":memory:");
        let pool_options = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
        Self::open(options, pool_options).await
    }

    async fn open(
        options: SqliteConnectOptions,
        pool_options: SqlitePoolOptions,
    ) -> Result<Self, DatabaseSetupError> {
        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(DatabaseSetupError::Unavailable)?;
        Ok(Self(pool))
    }

    /// Cheap liveness query used by readiness checks.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.0).await?;
        Ok(())
    }

    /// Close every pooled connection. Called once at shutdown.
    pub async fn close(&self) {
        self.0.close().await;
    }
}

impl Deref for Database {
    type Target = SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Name of the catalog table.
///
/// Table names cannot be bound as statement parameters, so this is the
/// one value interpolated into SQL. It comes from start-up configuration
/// only and must be a plain identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName(String);

pub const DEFAULT_TABLE_NAME: &str = "uploads";

const MAX_TABLE_NAME_LEN: usize = 63;

impl TableName {
    pub fn new(name: &str) -> Result<Self, DatabaseSetupError> {
        let mut chars = name.chars();
        let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
        let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

        if !valid_start || !valid_rest || name.len() > MAX_TABLE_NAME_LEN {
            return Err(DatabaseSetupError::InvalidTableName(name.to_string()));
        }
        if name.to_ascii_lowercase().starts_with("sqlite_") {
            return Err(DatabaseSetupError::InvalidTableName(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TableName {
    fn default() -> Self {
        Self(DEFAULT_TABLE_NAME.to_string())
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseSetupError {
    #[error("unable to perform initial connection and check of the database: {0}")]
    Unavailable(sqlx::Error),

    #[error("requested database type was not recognized: {0}")]
    UnknownDbType(String),

    #[error("table name '{0}' is not a plain SQL identifier")]
    InvalidTableName(String),

    #[error("failed to create schema: {0}")]
    Schema(sqlx::Error),
}
