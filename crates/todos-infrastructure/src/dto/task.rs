//! Task DTOs and migrations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use version_migrate::{FromDomain, IntoDomain, Migrator, Versioned};

use todos_core::error::{Result, TodoError};
use todos_core::identity::OwnerId;
use todos_core::task::Task;

/// Entity name the task migration path is registered under.
pub const TASK_ENTITY_NAME: &str = "task";

/// V1.0.0: Initial task schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
#[serde(rename_all = "camelCase")]
pub struct TaskV1_0_0 {
    /// Unique task identifier (UUID format).
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_completed: bool,
    /// Creation timestamp (RFC 3339).
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl IntoDomain<Task> for TaskV1_0_0 {
    fn into_domain(self) -> Task {
        Task {
            id: self.id.into(),
            title: self.title,
            description: self.description,
            is_completed: self.is_completed,
            created_at: self.created_at,
            user_id: self.user_id.map(OwnerId::from),
        }
    }
}

impl FromDomain<Task> for TaskV1_0_0 {
    fn from_domain(task: Task) -> Self {
        TaskV1_0_0 {
            id: task.id.to_string(),
            title: task.title,
            description: task.description,
            is_completed: task.is_completed,
            created_at: task.created_at,
            user_id: task.user_id.map(|owner| owner.to_string()),
        }
    }
}

/// Creates the Migrator for task records.
///
/// # Migration Path
///
/// - V1.0.0 → Task
pub fn create_task_migrator() -> Result<Migrator> {
    let mut migrator = Migrator::builder().build();

    let task_path = Migrator::define(TASK_ENTITY_NAME)
        .from::<TaskV1_0_0>()
        .into_with_save::<Task>();

    migrator
        .register(task_path)
        .map_err(|e| TodoError::migration(format!("Failed to register task migration path: {}", e)))?;

    Ok(migrator)
}

/// Versions with a registered migration path.
const KNOWN_VERSIONS: &[&str] = &[TaskV1_0_0::VERSION];

fn is_known_version(version: &str) -> bool {
    KNOWN_VERSIONS.contains(&version)
}

/// On-disk document: `{ "tasks": [ { "version": "1.0.0", ... }, ... ] }`.
///
/// Each record carries its own schema version so the migrator can upgrade
/// records independently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskDocument {
    #[serde(default)]
    pub tasks: Vec<serde_json::Value>,
}

impl TaskDocument {
    /// Encodes domain tasks at the latest schema version.
    pub fn from_tasks(migrator: &Migrator, tasks: Vec<Task>) -> Result<Self> {
        let dtos: Vec<TaskV1_0_0> = tasks.into_iter().map(TaskV1_0_0::from_domain).collect();
        let json = migrator
            .save_vec_flat(dtos)
            .map_err(|e| TodoError::migration(format!("Failed to serialize tasks: {}", e)))?;
        Ok(Self {
            tasks: serde_json::from_str(&json)?,
        })
    }

    /// Migrates every record to the domain model.
    ///
    /// # Errors
    ///
    /// `TodoError::Migration` if a record has an unknown version or does not
    /// match its schema.
    pub fn into_tasks(self, migrator: &Migrator) -> Result<Vec<Task>> {
        if self.tasks.is_empty() {
            return Ok(Vec::new());
        }
        // The flat loader finalizes records whose version has no registered
        // step instead of failing, so unknown versions are rejected here.
        for record in &self.tasks {
            let version = record.get("version").and_then(|v| v.as_str());
            if !version.is_some_and(is_known_version) {
                return Err(TodoError::migration(format!(
                    "Unsupported task version {:?} (latest known: {:?})",
                    version,
                    migrator.get_latest_version(TASK_ENTITY_NAME)
                )));
            }
        }
        migrator
            .load_vec_flat_from(TASK_ENTITY_NAME, self.tasks)
            .map_err(|e| TodoError::migration(format!("Failed to migrate tasks: {}", e)))
    }
}
