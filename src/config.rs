use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::model::SortOrder;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "READING_LOG_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "reading-log.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    BooksRead,
    Stats,
}

/// Start-up settings, read from JSON. Every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Reading-log export (`.csv`, `.json` or `.parquet`).
    pub books_path: Option<PathBuf>,
    /// CSV of `Dates,Pages`.
    pub page_log_path: Option<PathBuf>,
    pub initial_tab: Tab,
    /// Order of the books table by last date read.
    pub sort_order: SortOrder,
    pub window_size: [f32; 2],
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            books_path: None,
            page_log_path: None,
            initial_tab: Tab::default(),
            sort_order: SortOrder::Ascending,
            window_size: [1280.0, 860.0],
        }
    }
}

impl DashboardConfig {
    /// Read a config file; a file that does not exist gives the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Config from `$READING_LOG_CONFIG` or `./reading-log.json`.
    /// Errors are logged and replaced by the defaults.
    pub fn from_env() -> Self {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        match Self::load(&path) {
            Ok(config) => {
                log::debug!("config from {}: {config:?}", path.display());
                config
            }
            Err(e) => {
                log::error!("{e}; using defaults");
                Self::default()
            }
        }
    }
}
