use std::path::PathBuf;

use clap::Args;

use depot_daemon::state::AppState;
use depot_daemon::{spawn_service, BlobStoreConfig, ServiceConfig};

#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Override the HTTP port (default from config)
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Override the catalog table name
    #[arg(long, env = "DEPOT_TABLE_NAME")]
    pub table_name: Option<String>,

    /// Override the blob root
    #[arg(long, env = "DEPOT_UPLOADS_PATH")]
    pub uploads_path: Option<PathBuf>,

    /// Override the SQLite database file
    #[arg(long, env = "DEPOT_DATABASE_PATH")]
    pub database_path: Option<PathBuf>,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long, env = "DEPOT_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("state error: {0}")]
    StateError(#[from] depot_daemon::state::StateError),

    #[error("invalid log level '{0}'")]
    InvalidLogLevel(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Daemon {
    type Error = DaemonError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;

        let log_level = state
            .config
            .log_level
            .parse::<tracing::Level>()
            .map_err(|_| DaemonError::InvalidLogLevel(state.config.log_level.clone()))?;

        let config = ServiceConfig {
            port: self.port.unwrap_or(state.config.port),
            table_name: self
                .table_name
                .clone()
                .unwrap_or_else(|| state.config.table_name.clone()),
            sqlite_path: Some(self.database_path.clone().unwrap_or(state.db_path)),
            blob_store: BlobStoreConfig::Local {
                path: self.uploads_path.clone().unwrap_or(state.uploads_path),
            },
            log_level,
            log_dir: self.log_dir.clone(),
        };

        spawn_service(&config).await;
        Ok("daemon ended".to_string())
    }
}
