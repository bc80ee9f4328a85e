//! Loads `config.toml`.

use std::path::{Path, PathBuf};
use tokio::fs;

use todos_core::config::AppConfig;
use todos_core::error::{Result, TodoError};

use crate::paths::TodoPaths;

/// Reads the application configuration file.
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    /// Uses the default `config.toml` location from `paths`.
    pub fn new(paths: &TodoPaths) -> Result<Self> {
        let path = paths
            .config_file()
            .map_err(|e| TodoError::config(e.to_string()))?;
        Ok(Self { path })
    }

    /// Uses an explicit config file (e.g. from `--config`).
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the configuration, falling back to defaults when the file does
    /// not exist.
    pub async fn load(&self) -> Result<AppConfig> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {:?}, using defaults", self.path);
                return Ok(AppConfig::default());
            }
            Err(e) => {
                return Err(TodoError::io(format!(
                    "Failed to read config {:?}: {}",
                    self.path, e
                )));
            }
        };

        toml::from_str(&content)
            .map_err(|e| TodoError::config(format!("Invalid config {:?}: {}", self.path, e)))
    }
}
