//! Unified path management for todos files.
//!
//! All locations are derived from one root so tests can redirect
//! everything into a temporary directory.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "todos";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config/data directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for todos.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/todos/             # Config directory
/// ├── config.toml              # Application configuration
/// └── logs/                    # Application logs
///     └── todos.log.YYYY-MM-DD
///
/// ~/.local/share/todos/        # Data directory
/// └── tasks.json               # File-backed task store
/// ```
///
/// With a base directory override both trees collapse into
/// `<base>/config` and `<base>/data`.
#[derive(Debug, Clone, Default)]
pub struct TodoPaths {
    base_dir: Option<PathBuf>,
}

impl TodoPaths {
    pub fn new(base_dir: Option<&Path>) -> Self {
        Self {
            base_dir: base_dir.map(Path::to_path_buf),
        }
    }

    /// Returns the todos configuration directory.
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base_dir {
            Some(base) => Ok(base.join("config")),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    /// Returns the todos data directory.
    pub fn data_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base_dir {
            Some(base) => Ok(base.join("data")),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Default location of the file-backed task store.
    pub fn tasks_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.data_dir()?.join("tasks.json"))
    }

    pub fn logs_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("logs"))
    }
}
