//! Builds the task store selected by `[storage]` config.

use std::sync::Arc;

use todos_core::config::{StorageBackend, StorageConfig};
use todos_core::error::{Result, TodoError};
use todos_core::task::TaskRepository;

use crate::paths::TodoPaths;
use crate::{InMemoryTaskRepository, JsonFileTaskRepository};

pub async fn open_task_repository(
    config: &StorageConfig,
    paths: &TodoPaths,
) -> Result<Arc<dyn TaskRepository>> {
    match config.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory task store");
            Ok(Arc::new(InMemoryTaskRepository::new()))
        }
        StorageBackend::File => {
            let path = match &config.path {
                Some(path) => path.clone(),
                None => paths
                    .tasks_file()
                    .map_err(|e| TodoError::config(e.to_string()))?,
            };
            tracing::info!("Using task store at {:?}", path);
            Ok(Arc::new(JsonFileTaskRepository::open(path).await?))
        }
    }
}
