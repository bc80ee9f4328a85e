//! JSON-file-backed TaskRepository implementation

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use todos_core::{
    error::Result,
    identity::Scope,
    task::{ChangeReceiver, NewTask, Task, TaskId, TaskPatch, TaskQuery, TaskRepository},
};
use version_migrate::Migrator;

use crate::change_notifier::ChangeNotifier;
use crate::dto::{TaskDocument, create_task_migrator};
use crate::file_watcher::TaskFileWatcher;
use crate::storage::AtomicJsonFile;
use crate::task_table::TaskTable;

/// Task store persisted to a single JSON document.
///
/// File layout:
/// ```text
/// <data_dir>/todos/
/// ├── tasks.json      { "tasks": [ { "version": "1.0.0", ... } ] }
/// └── tasks.lock      exclusive writer lock
/// ```
///
/// Several processes may share one file. Every mutation holds the writer
/// lock, re-reads the document, applies the change and rewrites it, so no
/// committed write is lost. A watcher on the data directory wakes live
/// subscribers when another process rewrites the file, and the next read
/// adopts its records. A failed write leaves both the file and the
/// in-memory table unchanged.
pub struct JsonFileTaskRepository {
    table: RwLock<TaskTable>,
    file: AtomicJsonFile<TaskDocument>,
    migrator: Migrator,
    notifier: ChangeNotifier,
    _watcher: Option<TaskFileWatcher>,
}

impl JsonFileTaskRepository {
    /// Opens the store at `path`, loading any existing document.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed, or
    /// migrated.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let file: AtomicJsonFile<TaskDocument> = AtomicJsonFile::new(path.into());
        let migrator = create_task_migrator()?;
        let table = TaskTable::from_tasks(Self::read_tasks(&file, &migrator).await?)?;

        let notifier = ChangeNotifier::new();
        file.ensure_parent().await?;
        let watcher = match TaskFileWatcher::start(file.path(), notifier.clone()) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!(
                    "External changes to {:?} will only be seen on read: {}",
                    file.path(),
                    e
                );
                None
            }
        };

        tracing::debug!(
            "Opened task store at {:?} ({} tasks)",
            file.path(),
            table.len()
        );

        Ok(Self {
            table: RwLock::new(table),
            file,
            migrator,
            notifier,
            _watcher: watcher,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    async fn read_tasks(
        file: &AtomicJsonFile<TaskDocument>,
        migrator: &Migrator,
    ) -> Result<Vec<Task>> {
        match file.load().await? {
            Some(document) => document.into_tasks(migrator),
            None => Ok(Vec::new()),
        }
    }

    /// Current on-disk state, rebased on `table`'s creation clock.
    async fn reload(&self, table: &TaskTable) -> Result<TaskTable> {
        table.reloaded(Self::read_tasks(&self.file, &self.migrator).await?)
    }

    /// Adopts records written by other processes and notifies subscribers
    /// if anything differs.
    async fn refresh(&self) -> Result<()> {
        let mut table = self.table.write().await;
        let disk = self.reload(&table).await?;
        if !disk.same_records(&table) {
            tracing::debug!("Task store at {:?} changed on disk", self.file.path());
            *table = disk;
            drop(table);
            self.notifier.bump();
        }
        Ok(())
    }

    /// Runs `f` against the freshly loaded document under the writer lock
    /// and, if it reports a change, persists the result before swapping it
    /// in.
    async fn commit<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut TaskTable) -> (R, bool) + Send,
        R: Send,
    {
        let mut table = self.table.write().await;
        let _lock = self.file.lock().await?;

        let mut next = self.reload(&table).await?;
        let external = !next.same_records(&table);
        let (result, changed) = f(&mut next);

        if changed {
            let document = TaskDocument::from_tasks(&self.migrator, next.to_vec())?;
            if let Err(e) = self.file.save(&document).await {
                tracing::error!("Failed to persist tasks to {:?}: {}", self.file.path(), e);
                return Err(e);
            }
        }

        if changed || external {
            *table = next;
            drop(table);
            self.notifier.bump();
        }

        Ok(result)
    }
}

#[async_trait]
impl TaskRepository for JsonFileTaskRepository {
    async fn insert(&self, new_task: NewTask) -> Result<Task> {
        self.commit(|table| (table.insert(new_task), true)).await
    }

    async fn find_by_id(&self, scope: &Scope, id: &TaskId) -> Result<Option<Task>> {
        self.refresh().await?;
        Ok(self.table.read().await.get(scope, id).cloned())
    }

    async fn patch(&self, scope: &Scope, id: &TaskId, patch: &TaskPatch) -> Result<Option<Task>> {
        self.commit(|table| match table.patch(scope, id, patch) {
            Some((task, changed)) => (Some(task), changed),
            None => (None, false),
        })
        .await
    }

    async fn delete(&self, scope: &Scope, id: &TaskId) -> Result<bool> {
        self.commit(|table| {
            let removed = table.remove(scope, id);
            (removed, removed)
        })
        .await
    }

    async fn list(&self, scope: &Scope, query: &TaskQuery) -> Result<Vec<Task>> {
        self.refresh().await?;
        Ok(self.table.read().await.query(scope, query))
    }

    fn changes(&self) -> ChangeReceiver {
        self.notifier.subscribe()
    }
}
