//! Task Service
//!
//! Read and write operations over task records. Storage, atomicity and
//! change propagation are delegated to the [`TaskRepository`]; this layer
//! resolves the caller scope, shapes arguments and maps store outcomes onto
//! the operation contract.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use todos_core::error::{Result, TodoError};
use todos_core::identity::{RequestContext, Scope};
use todos_core::task::{NewTask, TASK_ENTITY, Task, TaskId, TaskPatch, TaskQuery, TaskRepository};

use crate::live_query::LiveQuery;

/// Success acknowledgment returned by `toggle` and `delete_todo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub const OK: Ack = Ack { success: true };
}

/// Stateless service over a shared task store.
#[derive(Clone)]
pub struct TaskService {
    repository: Arc<dyn TaskRepository>,
    allow_anonymous: bool,
}

impl TaskService {
    /// Creates a service in single-user mode (anonymous callers allowed).
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self {
            repository,
            allow_anonymous: true,
        }
    }

    /// Sets whether unauthenticated callers may use the shared list.
    pub fn with_anonymous_access(mut self, allow: bool) -> Self {
        self.allow_anonymous = allow;
        self
    }

    fn scope(&self, ctx: &RequestContext) -> Result<Scope> {
        ctx.resolve_scope(self.allow_anonymous).inspect_err(|e| {
            tracing::warn!("[TaskService] Rejected caller {:?}: {}", ctx.identity, e);
        })
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// One-shot evaluation of `query` in the caller's scope.
    pub async fn snapshot(&self, ctx: &RequestContext, query: TaskQuery) -> Result<Vec<Task>> {
        let scope = self.scope(ctx)?;
        self.repository.list(&scope, &query).await
    }

    /// Live-updating evaluation of `query` in the caller's scope.
    pub fn live(&self, ctx: &RequestContext, query: TaskQuery) -> Result<LiveQuery> {
        let scope = self.scope(ctx)?;
        tracing::debug!("[TaskService] Live query {:?} in {:?}", query, scope);
        Ok(LiveQuery::new(self.repository.clone(), scope, query))
    }

    /// Every task, creation order.
    pub fn get_all(&self, ctx: &RequestContext) -> Result<LiveQuery> {
        self.live(ctx, TaskQuery::all())
    }

    /// Completed tasks, creation order.
    pub fn get_completed(&self, ctx: &RequestContext) -> Result<LiveQuery> {
        self.live(ctx, TaskQuery::completed())
    }

    /// Incomplete tasks, creation order.
    pub fn get_incomplete(&self, ctx: &RequestContext) -> Result<LiveQuery> {
        self.live(ctx, TaskQuery::incomplete())
    }

    /// Every task, newest first.
    pub fn get_all_newest(&self, ctx: &RequestContext) -> Result<LiveQuery> {
        self.live(ctx, TaskQuery::all_newest())
    }

    /// Incomplete tasks, newest first.
    pub fn get_incomplete_newest(&self, ctx: &RequestContext) -> Result<LiveQuery> {
        self.live(ctx, TaskQuery::incomplete_newest())
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Creates an incomplete task owned by the caller's scope.
    ///
    /// # Errors
    ///
    /// `Validation` if `title` is blank after trimming.
    pub async fn create(&self, ctx: &RequestContext, title: &str, description: &str) -> Result<Task> {
        let scope = self.scope(ctx)?;
        let new_task = NewTask::new(title, description, scope.owner().cloned())?;
        let task = self.repository.insert(new_task).await?;
        tracing::info!("[TaskService] Created task {}", task.id);
        Ok(task)
    }

    /// Applies a title/description patch.
    ///
    /// An empty patch leaves the record untouched and returns it.
    ///
    /// # Errors
    ///
    /// - `Validation` if a supplied title is blank, or the patch tries to
    ///   set completion (use [`TaskService::toggle`])
    /// - `NotFound` if no such task is visible to the caller
    pub async fn update_todo(
        &self,
        ctx: &RequestContext,
        id: &TaskId,
        patch: TaskPatch,
    ) -> Result<Task> {
        let scope = self.scope(ctx)?;
        if patch.is_completed.is_some() {
            return Err(TodoError::validation(
                "isCompleted",
                "completion is changed with toggle, not updateTodo",
            ));
        }
        let patch = patch.normalized()?;

        let updated = if patch.is_empty() {
            self.repository.find_by_id(&scope, id).await?
        } else {
            self.repository.patch(&scope, id, &patch).await?
        };

        let task = updated.ok_or_else(|| TodoError::not_found(TASK_ENTITY, id.as_str()))?;
        tracing::info!("[TaskService] Updated task {}", task.id);
        Ok(task)
    }

    /// Sets the completion flag to exactly `is_completed`.
    ///
    /// # Errors
    ///
    /// `NotFound` if no such task is visible to the caller.
    pub async fn toggle(&self, ctx: &RequestContext, id: &TaskId, is_completed: bool) -> Result<Ack> {
        let scope = self.scope(ctx)?;
        let patch = TaskPatch::new().completed(is_completed);
        match self.repository.patch(&scope, id, &patch).await? {
            Some(_) => {
                tracing::info!("[TaskService] Set task {} completed={}", id, is_completed);
                Ok(Ack::OK)
            }
            None => Err(TodoError::not_found(TASK_ENTITY, id.as_str())),
        }
    }

    /// Deletes a task permanently. Deleting a task that does not exist (or
    /// is not visible to the caller) succeeds without effect.
    pub async fn delete_todo(&self, ctx: &RequestContext, id: &TaskId) -> Result<Ack> {
        let scope = self.scope(ctx)?;
        if self.repository.delete(&scope, id).await? {
            tracing::info!("[TaskService] Deleted task {}", id);
        } else {
            tracing::debug!("[TaskService] Delete of absent task {} ignored", id);
        }
        Ok(Ack::OK)
    }
}
