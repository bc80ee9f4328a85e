//! In-process task table shared by the store implementations.
//!
//! The table is plain data; callers wrap it in a lock and decide when to
//! persist and notify.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use todos_core::error::{Result, TodoError};
use todos_core::identity::Scope;
use todos_core::task::{NewTask, Task, TaskId, TaskPatch, TaskQuery};

#[derive(Debug, Clone, Default)]
pub struct TaskTable {
    tasks: HashMap<TaskId, Task>,
    last_created_at: Option<DateTime<Utc>>,
}

impl TaskTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a table from persisted records.
    ///
    /// # Errors
    ///
    /// Returns `TodoError::DataAccess` on duplicate ids or blank titles.
    pub fn from_tasks(tasks: Vec<Task>) -> Result<Self> {
        let mut table = Self::new();
        for task in tasks {
            if task.title.trim().is_empty() {
                return Err(TodoError::data_access(format!(
                    "stored task '{}' has an empty title",
                    task.id
                )));
            }
            if table.last_created_at.is_none_or(|last| task.created_at > last) {
                table.last_created_at = Some(task.created_at);
            }
            if let Some(previous) = table.tasks.insert(task.id.clone(), task) {
                return Err(TodoError::data_access(format!(
                    "duplicate task id '{}' in store",
                    previous.id
                )));
            }
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Rebuilds the table from records persisted by another writer, keeping
    /// the creation clock at least where this table left it.
    pub fn reloaded(&self, tasks: Vec<Task>) -> Result<Self> {
        let mut table = Self::from_tasks(tasks)?;
        table.last_created_at = table.last_created_at.max(self.last_created_at);
        Ok(table)
    }

    /// True if both tables hold exactly the same records.
    pub fn same_records(&self, other: &TaskTable) -> bool {
        self.tasks == other.tasks
    }

    /// Next creation timestamp, strictly after every previous one even if
    /// the wall clock stalls or steps back.
    fn next_created_at(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let created_at = match self.last_created_at {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_created_at = Some(created_at);
        created_at
    }

    fn fresh_id(&self) -> TaskId {
        loop {
            let id = TaskId::generate();
            if !self.tasks.contains_key(&id) {
                return id;
            }
        }
    }

    pub fn insert(&mut self, new_task: NewTask) -> Task {
        let id = self.fresh_id();
        let created_at = self.next_created_at();
        let task = new_task.into_task(id, created_at);
        self.tasks.insert(task.id.clone(), task.clone());
        task
    }

    pub fn get(&self, scope: &Scope, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id).filter(|task| task.is_visible_to(scope))
    }

    /// Applies `patch` and returns the post-write record plus whether
    /// anything changed. `None` if the task is absent from `scope`.
    pub fn patch(&mut self, scope: &Scope, id: &TaskId, patch: &TaskPatch) -> Option<(Task, bool)> {
        let task = self
            .tasks
            .get_mut(id)
            .filter(|task| task.is_visible_to(scope))?;
        let changed = patch.apply_to(task);
        Some((task.clone(), changed))
    }

    pub fn remove(&mut self, scope: &Scope, id: &TaskId) -> bool {
        if self.get(scope, id).is_none() {
            return false;
        }
        self.tasks.remove(id).is_some()
    }

    pub fn query(&self, scope: &Scope, query: &TaskQuery) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .values()
            .filter(|task| task.is_visible_to(scope) && query.matches(task))
            .cloned()
            .collect();
        query.sort(&mut tasks);
        tasks
    }

    /// Every record in creation order, for persistence.
    pub fn to_vec(&self) -> Vec<Task> {
        self.query(&Scope::Unscoped, &TaskQuery::all())
    }
}
