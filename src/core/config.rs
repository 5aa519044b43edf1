//! Configuration management
//!
//! Settings come from (lowest to highest precedence):
//! 1. Built-in defaults
//! 2. `<config dir>/sta/config.yaml` (or the file named by `STA_CONFIG`)
//! 3. `STA_SERVER_URL`
//!
//! The `--server` flag is applied on top by the CLI.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::aggregator::DEFAULT_PAGE_SIZE;
use crate::core::wafer::GridLayout;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000/api/stdf";

/// Failure to read one config file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML in {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub fetch: FetchConfig,
    pub wafer: GridLayout,
    pub export: ExportConfig,
    pub parse: ParseConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the parsing service API
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER_URL.to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub page_size: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory CSV exports are written into
    pub directory: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    pub poll_interval_ms: u64,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
        }
    }
}

impl Config {
    /// Load configuration with all overrides applied
    ///
    /// An unreadable or malformed file is logged and ignored.
    pub fn load() -> Self {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => match Self::load_from(&path) {
                Ok(config) => {
                    debug!(path = %path.display(), "loaded config");
                    config
                }
                Err(err) => {
                    warn!(path = %path.display(), %err, "ignoring config file");
                    Self::default()
                }
            },
            _ => Self::default(),
        };

        if let Ok(url) = std::env::var("STA_SERVER_URL") {
            if !url.trim().is_empty() {
                config.server.base_url = url.trim().to_string();
            }
        }

        config
    }

    /// Parse one config file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yml::from_str(&contents).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `STA_CONFIG`, else the per-user config file
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("STA_CONFIG") {
            return Some(PathBuf::from(path));
        }
        directories::ProjectDirs::from("", "", "sta").map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Apply the `--server` flag
    pub fn with_server(mut self, server: Option<&str>) -> Self {
        if let Some(url) = server {
            self.server.base_url = url.to_string();
        }
        self
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.parse.poll_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.base_url, DEFAULT_SERVER_URL);
        assert_eq!(config.server.timeout_secs, 60);
        assert_eq!(config.fetch.page_size, 5000);
        assert_eq!(config.wafer.canvas_budget, 420);
        assert_eq!(config.parse.poll_interval_ms, 500);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(
            &path,
            "server:\n  base_url: http://stdf.lab:9000/api/stdf\nwafer:\n  cell_max: 10\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.server.base_url, "http://stdf.lab:9000/api/stdf");
        assert_eq!(config.server.timeout_secs, 60);
        assert_eq!(config.wafer.cell_max, 10);
        assert_eq!(config.wafer.cell_min, 5);
        assert_eq!(config.fetch.page_size, 5000);
    }

    #[test]
    fn test_empty_file_is_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(&path, "\n").unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(&path, "server: [unclosed").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
        assert!(err.to_string().starts_with("Invalid YAML in "));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("absent.yaml");

        match Config::load_from(&path).unwrap_err() {
            ConfigError::Io { path: reported, source } => {
                assert_eq!(reported, path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_server_flag_wins() {
        let config = Config::default().with_server(Some("http://other:1/api/stdf"));
        assert_eq!(config.server.base_url, "http://other:1/api/stdf");
        let config = Config::default().with_server(None);
        assert_eq!(config.server.base_url, DEFAULT_SERVER_URL);
    }
}
