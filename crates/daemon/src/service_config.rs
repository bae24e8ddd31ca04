use std::path::PathBuf;

use depot_store::BlobStoreConfig;

/// Resolved process configuration handed to [`crate::spawn_service`].
#[derive(Debug, Clone)]
pub struct Config {
    // http server configuration
    pub port: u16,

    // catalog configuration
    /// Catalog table; validated as a plain identifier at start-up
    pub table_name: String,
    /// a path to a sqlite database, if not set then an
    ///  in-memory database will be used
    pub sqlite_path: Option<PathBuf>,

    // blob store configuration
    pub blob_store: BlobStoreConfig,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    /// Ephemeral everything: in-memory catalog and blobs.
    fn default() -> Self {
        Self {
            port: 8080,
            table_name: depot_store::DEFAULT_TABLE_NAME.to_string(),
            sqlite_path: None,
            blob_store: BlobStoreConfig::Memory,
            log_level: tracing::Level::INFO,
            log_dir: None,
        }
    }
}
