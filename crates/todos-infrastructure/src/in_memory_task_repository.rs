//! In-memory TaskRepository implementation

use async_trait::async_trait;
use tokio::sync::RwLock;
use todos_core::{
    error::Result,
    identity::Scope,
    task::{ChangeReceiver, NewTask, Task, TaskId, TaskPatch, TaskQuery, TaskRepository},
};

use crate::change_notifier::ChangeNotifier;
use crate::task_table::TaskTable;

/// Volatile task store. Contents live as long as the process.
#[derive(Default)]
pub struct InMemoryTaskRepository {
    table: RwLock<TaskTable>,
    notifier: ChangeNotifier,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn insert(&self, new_task: NewTask) -> Result<Task> {
        let task = self.table.write().await.insert(new_task);
        self.notifier.bump();
        Ok(task)
    }

    async fn find_by_id(&self, scope: &Scope, id: &TaskId) -> Result<Option<Task>> {
        Ok(self.table.read().await.get(scope, id).cloned())
    }

    async fn patch(&self, scope: &Scope, id: &TaskId, patch: &TaskPatch) -> Result<Option<Task>> {
        let result = self.table.write().await.patch(scope, id, patch);
        Ok(result.map(|(task, changed)| {
            if changed {
                self.notifier.bump();
            }
            task
        }))
    }

    async fn delete(&self, scope: &Scope, id: &TaskId) -> Result<bool> {
        let removed = self.table.write().await.remove(scope, id);
        if removed {
            self.notifier.bump();
        }
        Ok(removed)
    }

    async fn list(&self, scope: &Scope, query: &TaskQuery) -> Result<Vec<Task>> {
        Ok(self.table.read().await.query(scope, query))
    }

    fn changes(&self) -> ChangeReceiver {
        self.notifier.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use todos_core::identity::OwnerId;

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = InMemoryTaskRepository::new();
        let task = repo
            .insert(NewTask::new("Buy milk", "2%", None).unwrap())
            .await
            .unwrap();

        let found = repo.find_by_id(&Scope::Unscoped, &task.id).await.unwrap();
        assert_eq!(found, Some(task));
    }

    #[tokio::test]
    async fn test_mutations_bump_revision_only_on_change() {
        let repo = InMemoryTaskRepository::new();
        let mut changes = repo.changes();

        let task = repo
            .insert(NewTask::new("a", "", None).unwrap())
            .await
            .unwrap();
        assert!(changes.has_changed().unwrap());
        changes.borrow_and_update();

        // Setting the flag to its current value is not a change
        repo.patch(&Scope::Unscoped, &task.id, &TaskPatch::new().completed(false))
            .await
            .unwrap();
        assert!(!changes.has_changed().unwrap());

        repo.delete(&Scope::Unscoped, &task.id).await.unwrap();
        assert!(changes.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_delete_missing_is_false() {
        let repo = InMemoryTaskRepository::new();
        let removed = repo
            .delete(&Scope::Unscoped, &TaskId::from("missing"))
            .await
            .unwrap();
        assert!(!removed);
    }

    #[tokio::test]
    async fn test_list_by_owner() {
        let repo = InMemoryTaskRepository::new();
        let alice = OwnerId::from("alice");
        let bob = OwnerId::from("bob");

        repo.insert(NewTask::new("a1", "", Some(alice.clone())).unwrap())
            .await
            .unwrap();
        repo.insert(NewTask::new("a2", "", Some(alice.clone())).unwrap())
            .await
            .unwrap();
        repo.insert(NewTask::new("b1", "", Some(bob.clone())).unwrap())
            .await
            .unwrap();

        let alice_tasks = repo
            .list(&Scope::Owner(alice.clone()), &TaskQuery::all())
            .await
            .unwrap();
        assert_eq!(alice_tasks.len(), 2);
        assert!(alice_tasks.iter().all(|t| t.user_id.as_ref() == Some(&alice)));

        let bob_tasks = repo.list(&Scope::Owner(bob), &TaskQuery::all()).await.unwrap();
        assert_eq!(bob_tasks.len(), 1);
        assert_eq!(bob_tasks[0].title, "b1");
    }
}
