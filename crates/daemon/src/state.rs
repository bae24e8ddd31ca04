use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};

use depot_store::DEFAULT_TABLE_NAME;

pub const APP_NAME: &str = "depot";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DB_FILE_NAME: &str = "db.sqlite";
pub const UPLOADS_DIR_NAME: &str = "uploads";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port for the HTTP server (API + HTML page)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Name of the catalog table
    #[serde(default = "default_table_name")]
    pub table_name: String,
    /// Blob root (defaults to <depot dir>/uploads)
    #[serde(default)]
    pub uploads_path: Option<PathBuf>,
    /// Default log filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_port() -> u16 {
    8080
}

fn default_table_name() -> String {
    DEFAULT_TABLE_NAME.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            table_name: default_table_name(),
            uploads_path: None,
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the depot directory (~/.depot)
    pub depot_dir: PathBuf,
    /// Path to the SQLite database
    pub db_path: PathBuf,
    /// Blob root, after applying `uploads_path`
    pub uploads_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the depot directory path (custom or default ~/.depot)
    pub fn depot_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new depot state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let depot_dir = Self::depot_dir(custom_path)?;

        if depot_dir.join(CONFIG_FILE_NAME).exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&depot_dir)?;

        let config = config.unwrap_or_default();
        let uploads_path = Self::resolve_uploads_path(&depot_dir, &config);
        fs::create_dir_all(&uploads_path)?;

        let config_path = depot_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        // the service creates the database file on first start
        let db_path = depot_dir.join(DB_FILE_NAME);

        Ok(Self {
            depot_dir,
            db_path,
            uploads_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the depot directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let depot_dir = Self::depot_dir(custom_path)?;

        if !depot_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_path = depot_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            db_path: depot_dir.join(DB_FILE_NAME),
            uploads_path: Self::resolve_uploads_path(&depot_dir, &config),
            depot_dir,
            config_path,
            config,
        })
    }

    fn resolve_uploads_path(depot_dir: &std::path::Path, config: &AppConfig) -> PathBuf {
        match &config.uploads_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => depot_dir.join(path),
            None => depot_dir.join(UPLOADS_DIR_NAME),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("depot directory not initialized. Run 'depot init' first")]
    NotInitialized,

    #[error("depot directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
