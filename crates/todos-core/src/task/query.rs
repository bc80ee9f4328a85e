//! Query descriptions evaluated by task stores.

use serde::{Deserialize, Serialize};

use super::model::Task;

/// Which completion states a query matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionFilter {
    #[default]
    Any,
    Completed,
    Incomplete,
}

impl CompletionFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::Any => true,
            Self::Completed => task.is_completed,
            Self::Incomplete => !task.is_completed,
        }
    }
}

/// Result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOrder {
    /// Store-native order: creation order, oldest first.
    #[default]
    Native,
    /// `created_at` descending.
    NewestFirst,
}

/// A filter plus an ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskQuery {
    pub filter: CompletionFilter,
    pub order: TaskOrder,
}

impl TaskQuery {
    pub const fn new(filter: CompletionFilter, order: TaskOrder) -> Self {
        Self { filter, order }
    }

    pub const fn all() -> Self {
        Self::new(CompletionFilter::Any, TaskOrder::Native)
    }

    pub const fn completed() -> Self {
        Self::new(CompletionFilter::Completed, TaskOrder::Native)
    }

    pub const fn incomplete() -> Self {
        Self::new(CompletionFilter::Incomplete, TaskOrder::Native)
    }

    pub const fn all_newest() -> Self {
        Self::new(CompletionFilter::Any, TaskOrder::NewestFirst)
    }

    pub const fn incomplete_newest() -> Self {
        Self::new(CompletionFilter::Incomplete, TaskOrder::NewestFirst)
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.filter.matches(task)
    }

    /// Sorts `tasks` in place. Ties on `created_at` fall back to id so the
    /// result is deterministic.
    pub fn sort(&self, tasks: &mut [Task]) {
        match self.order {
            TaskOrder::Native => tasks.sort_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            }),
            TaskOrder::NewestFirst => tasks.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| b.id.cmp(&a.id))
            }),
        }
    }
}
