//! Task domain model.
//!
//! This module contains the Task entity and the value objects used to create
//! and patch it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{Result, TodoError};
use crate::identity::{OwnerId, Scope};

/// Entity name used in error messages and logs.
pub const TASK_ENTITY: &str = "task";

/// Opaque, store-assigned task identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A single to-do item.
///
/// Serialized in the camelCase shape clients consume:
/// `{ id, title, description, isCompleted, createdAt, userId? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier, assigned by the store and never reused.
    pub id: TaskId,
    /// Display title, never empty once persisted.
    pub title: String,
    /// Free-form description, may be empty.
    pub description: String,
    /// Completion flag, `false` at creation.
    pub is_completed: bool,
    /// Creation timestamp assigned by the store.
    pub created_at: DateTime<Utc>,
    /// Owning user in the multi-user variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<OwnerId>,
}

impl Task {
    /// Returns true if this task is visible under `scope`.
    pub fn is_visible_to(&self, scope: &Scope) -> bool {
        match scope {
            Scope::Unscoped => true,
            Scope::Owner(owner) => self.user_id.as_ref() == Some(owner),
        }
    }
}

/// Trims a title and rejects it if nothing is left.
pub fn normalize_title(raw: &str) -> Result<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(TodoError::validation("title", "title must not be empty"));
    }
    Ok(title.to_string())
}

/// Validated input for creating a task. The store fills in id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub user_id: Option<OwnerId>,
}

impl NewTask {
    /// Builds a new task input, trimming both fields.
    ///
    /// # Errors
    ///
    /// Returns `TodoError::Validation` if the title is blank.
    pub fn new(title: &str, description: &str, user_id: Option<OwnerId>) -> Result<Self> {
        Ok(Self {
            title: normalize_title(title)?,
            description: description.trim().to_string(),
            user_id,
        })
    }

    /// Materializes the record the store will persist.
    pub fn into_task(self, id: TaskId, created_at: DateTime<Utc>) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            is_completed: false,
            created_at,
            user_id: self.user_id,
        }
    }
}

/// Explicit set of fields to change on an existing task.
///
/// `None` means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn completed(mut self, is_completed: bool) -> Self {
        self.is_completed = Some(is_completed);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.is_completed.is_none()
    }

    /// Trims supplied text fields and rejects a blank title.
    pub fn normalized(self) -> Result<Self> {
        Ok(Self {
            title: self.title.as_deref().map(normalize_title).transpose()?,
            description: self.description.map(|d| d.trim().to_string()),
            is_completed: self.is_completed,
        })
    }

    /// Applies the supplied fields to `task`. Returns true if anything changed.
    pub fn apply_to(&self, task: &mut Task) -> bool {
        let mut changed = false;
        if let Some(title) = &self.title
            && task.title != *title
        {
            task.title = title.clone();
            changed = true;
        }
        if let Some(description) = &self.description
            && task.description != *description
        {
            task.description = description.clone();
            changed = true;
        }
        if let Some(is_completed) = self.is_completed
            && task.is_completed != is_completed
        {
            task.is_completed = is_completed;
            changed = true;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        NewTask::new("Buy milk", "2%", None)
            .unwrap()
            .into_task(TaskId::from("t-1"), Utc::now())
    }

    #[test]
    fn test_new_task_trims_and_defaults_incomplete() {
        let task = NewTask::new("  Buy milk ", " 2% ", None)
            .unwrap()
            .into_task(TaskId::generate(), Utc::now());
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.description, "2%");
        assert!(!task.is_completed);
    }

    #[test]
    fn test_blank_title_is_rejected() {
        let err = NewTask::new("   ", "desc", None).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_empty_description_is_allowed() {
        let input = NewTask::new("Title", "", None).unwrap();
        assert_eq!(input.description, "");
    }

    #[test]
    fn test_patch_only_touches_supplied_fields() {
        let mut task = sample_task();
        let changed = TaskPatch::new().title("X").apply_to(&mut task);
        assert!(changed);
        assert_eq!(task.title, "X");
        assert_eq!(task.description, "2%");
        assert!(!task.is_completed);
    }

    #[test]
    fn test_patch_reports_unchanged() {
        let mut task = sample_task();
        assert!(!TaskPatch::new().title("Buy milk").apply_to(&mut task));
        assert!(!TaskPatch::new().apply_to(&mut task));
    }

    #[test]
    fn test_normalized_patch_rejects_blank_title() {
        let err = TaskPatch::new().title(" ").normalized().unwrap_err();
        assert!(err.is_validation());
        let ok = TaskPatch::new().description(" d ").normalized().unwrap();
        assert_eq!(ok.description.as_deref(), Some("d"));
    }

    #[test]
    fn test_visibility_by_scope() {
        let mut task = sample_task();
        assert!(task.is_visible_to(&Scope::Unscoped));
        assert!(!task.is_visible_to(&Scope::Owner(OwnerId::from("alice"))));

        task.user_id = Some(OwnerId::from("alice"));
        assert!(task.is_visible_to(&Scope::Owner(OwnerId::from("alice"))));
        assert!(!task.is_visible_to(&Scope::Owner(OwnerId::from("bob"))));
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let mut task = sample_task();
        task.user_id = Some(OwnerId::from("alice"));
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["id"], "t-1");
        assert_eq!(json["isCompleted"], false);
        assert_eq!(json["userId"], "alice");
        assert!(json.get("createdAt").is_some());
    }
}
