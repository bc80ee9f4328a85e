//! Task repository trait.
//!
//! Defines the interface the Task Service expects from its store.

use async_trait::async_trait;
use tokio::sync::watch;

use super::model::{NewTask, Task, TaskId, TaskPatch};
use super::query::TaskQuery;
use crate::error::Result;
use crate::identity::Scope;

/// Receiver of the store revision. The value increases whenever a mutation
/// changes stored data; subscribers only care that it changed.
pub type ChangeReceiver = watch::Receiver<u64>;

/// An abstract store of task records.
///
/// This trait decouples the service from the storage mechanism (memory,
/// JSON file, remote database).
///
/// # Implementation Notes
///
/// Implementations must:
/// - Apply each mutation atomically with respect to other mutations
/// - Bump the revision seen by [`TaskRepository::changes`] after a mutation
///   that changed stored data has been committed
/// - Hide records outside the supplied [`Scope`]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Persists a new task, assigning its id and creation timestamp.
    ///
    /// Creation timestamps are strictly increasing within one store.
    async fn insert(&self, new_task: NewTask) -> Result<Task>;

    /// Finds a task by its ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Task))`: Task found within `scope`
    /// - `Ok(None)`: Task not found or owned by someone else
    /// - `Err(_)`: Error occurred during retrieval
    async fn find_by_id(&self, scope: &Scope, id: &TaskId) -> Result<Option<Task>>;

    /// Applies `patch` to a task in one atomic step.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Task))`: The post-write record
    /// - `Ok(None)`: No such task within `scope`
    async fn patch(&self, scope: &Scope, id: &TaskId, patch: &TaskPatch) -> Result<Option<Task>>;

    /// Removes a task permanently.
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: Task deleted
    /// - `Ok(false)`: Nothing to delete within `scope`
    async fn delete(&self, scope: &Scope, id: &TaskId) -> Result<bool>;

    /// Evaluates `query` against the tasks visible in `scope`.
    async fn list(&self, scope: &Scope, query: &TaskQuery) -> Result<Vec<Task>>;

    /// Subscribes to the store revision.
    fn changes(&self) -> ChangeReceiver;
}
