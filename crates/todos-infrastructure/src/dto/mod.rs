//! Versioned persistence DTOs.

pub mod task;

pub use task::{TASK_ENTITY_NAME, TaskDocument, TaskV1_0_0, create_task_migrator};
