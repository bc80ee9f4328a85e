//! Task domain module.
//!
//! # Module Structure
//!
//! - `model`: the `Task` entity plus `NewTask` and `TaskPatch` inputs
//! - `query`: filter/order descriptions evaluated by stores
//! - `repository`: the `TaskRepository` trait implemented by stores
//!
//! # Usage
//!
//! ```ignore
//! use todos_core::task::{NewTask, Task, TaskPatch, TaskQuery, TaskRepository};
//! ```

mod model;
mod query;
pub mod repository;

pub use model::{NewTask, TASK_ENTITY, Task, TaskId, TaskPatch, normalize_title};
pub use query::{CompletionFilter, TaskOrder, TaskQuery};
pub use repository::{ChangeReceiver, TaskRepository};
