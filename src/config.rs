//! Configuration loading
//!
//! Handles loading configuration from embedded defaults, files, and environment.

use crate::logging::LoggingConfig;
use anyhow::{Context, Result};
use carevault_core::StoreConfig;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Embedded default configuration (compiled into the library)
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Environment variable prefix
pub const ENV_PREFIX: &str = "CAREVAULT";

/// Data directory name under the platform data dir
pub const DATA_DIR_NAME: &str = "carevault";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory for the durable scope file; platform default when unset
    #[serde(default)]
    pub data_dir: Option<String>,
    /// File name of the durable scope inside `data_dir`
    #[serde(default = "default_durable_file")]
    pub durable_file: String,
    /// Secure store settings
    #[serde(default)]
    pub store: StoreConfig,
    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_durable_file() -> String {
    "durable.json".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            durable_file: default_durable_file(),
            store: StoreConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration: embedded defaults, then `path` (if given), then
    /// `CAREVAULT_*` environment variables (`.env` is read first).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // prefix_separator("_") makes CAREVAULT_STORE__X work with a single _ after the prefix
        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("store.fingerprint.signals")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let app: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app.store
            .validate()
            .context("Invalid secure store configuration")?;
        Ok(app)
    }

    /// Resolved data directory
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(PathBuf::from(dir));
        }
        dirs::data_dir()
            .or_else(dirs::home_dir)
            .map(|dir| dir.join(DATA_DIR_NAME))
            .context("Cannot determine data directory")
    }

    /// Full path of the durable scope file
    pub fn durable_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(&self.durable_file))
    }
}
