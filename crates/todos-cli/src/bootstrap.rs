use anyhow::{Context, Result};
use std::path::Path;

use todos_application::{TaskApi, TaskService};
use todos_core::config::AppConfig;
use todos_infrastructure::paths::TodoPaths;
use todos_infrastructure::{ConfigService, authenticator_from_config, open_task_repository};

pub async fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let service = match path {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new(&TodoPaths::default())?,
    };
    service
        .load()
        .await
        .with_context(|| format!("Failed to load config from {}", service.path().display()))
}

/// Wires store, authenticator and service into a [`TaskApi`].
pub async fn build_api(config: &AppConfig) -> Result<TaskApi> {
    let paths = TodoPaths::default();
    let repository = open_task_repository(&config.storage, &paths)
        .await
        .context("Failed to open task store")?;
    let authenticator = authenticator_from_config(&config.auth);
    let service =
        TaskService::new(repository).with_anonymous_access(config.auth.allows_anonymous());

    tracing::debug!(
        "Bootstrapped with {:?} storage and {:?} auth",
        config.storage.backend,
        config.auth.mode
    );
    Ok(TaskApi::new(service, authenticator))
}
