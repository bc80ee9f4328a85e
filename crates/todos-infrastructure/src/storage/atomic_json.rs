//! Atomic JSON file operations.
//!
//! Writes go to a uniquely named sibling temp file which is fsynced and then
//! renamed over the target, so readers see either the old or the new
//! document. Writers that must read-modify-write across processes hold the
//! exclusive [`FileLock`] for the whole cycle.

use serde::{Serialize, de::DeserializeOwned};
use std::fs::{File, OpenOptions};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use todos_core::error::{Result, TodoError};

/// A handle to a JSON file replaced atomically on every save.
pub struct AtomicJsonFile<T> {
    path: PathBuf,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> AtomicJsonFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and deserializes the file.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: Successfully loaded and deserialized
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err`: Failed to read or parse the file
    pub async fn load(&self) -> Result<Option<T>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Serializes `data` and atomically replaces the file.
    ///
    /// On failure the target is untouched and the temp file is removed.
    pub async fn save(&self, data: &T) -> Result<()> {
        self.ensure_parent().await?;

        let json = serde_json::to_string_pretty(data)?;
        let tmp_path = self.temp_path()?;

        let written = async {
            let mut tmp_file = fs::File::create(&tmp_path).await?;
            tmp_file.write_all(json.as_bytes()).await?;
            tmp_file.sync_all().await?;
            drop(tmp_file);
            fs::rename(&tmp_path, &self.path).await
        }
        .await;

        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&tmp_path).await
                && cleanup.kind() != std::io::ErrorKind::NotFound
            {
                tracing::warn!("Failed to remove temp file {:?}: {}", tmp_path, cleanup);
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Acquires the exclusive cross-process lock guarding this file.
    ///
    /// Blocks (on the blocking pool) until any other holder releases it.
    pub async fn lock(&self) -> Result<FileLock> {
        self.ensure_parent().await?;
        let lock_path = self.path.with_extension("lock");
        tokio::task::spawn_blocking(move || FileLock::acquire(lock_path))
            .await
            .map_err(|e| TodoError::internal(format!("lock task failed: {}", e)))?
    }

    pub(crate) async fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| TodoError::io(format!("path has no file name: {:?}", self.path)))?;
        let tmp_name = format!(
            ".{}.{}.tmp",
            file_name.to_string_lossy(),
            uuid::Uuid::new_v4().simple()
        );
        Ok(self.path.with_file_name(tmp_name))
    }
}

/// An exclusive file lock released when dropped.
///
/// The lock file is never unlinked so every process locks the same inode.
pub struct FileLock {
    _file: File,
}

impl FileLock {
    fn acquire(lock_path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| TodoError::io(format!("Failed to open lock file {:?}: {}", lock_path, e)))?;

        fs2::FileExt::lock_exclusive(&file)
            .map_err(|e| TodoError::io(format!("Failed to acquire lock {:?}: {}", lock_path, e)))?;

        Ok(Self { _file: file })
    }
}
