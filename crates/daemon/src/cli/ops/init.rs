use std::path::PathBuf;

use clap::Args;

use depot_daemon::state::{AppConfig, AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Port the daemon listens on
    #[arg(long)]
    pub port: Option<u16>,

    /// Catalog table name
    #[arg(long)]
    pub table_name: Option<String>,

    /// Blob root; relative paths are resolved against the depot directory
    #[arg(long)]
    pub uploads_path: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("state error: {0}")]
    StateError(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let defaults = AppConfig::default();
        let config = AppConfig {
            port: self.port.unwrap_or(defaults.port),
            table_name: self.table_name.clone().unwrap_or(defaults.table_name),
            uploads_path: self.uploads_path.clone(),
            log_level: defaults.log_level,
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        Ok(format!(
            "Initialized depot directory at {}\n  config:  {}\n  db:      {}\n  uploads: {}\n  port:    {}",
            state.depot_dir.display(),
            state.config_path.display(),
            state.db_path.display(),
            state.uploads_path.display(),
            state.config.port,
        ))
    }
}
