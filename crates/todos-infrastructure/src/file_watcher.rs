//! Wakes subscribers when another process rewrites the task file.

use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::Path;

use todos_core::error::{Result, TodoError};

use crate::change_notifier::ChangeNotifier;

/// Watches the directory holding a task file and bumps `notifier` whenever
/// the file itself is created, rewritten or renamed into place.
///
/// The bump only tells live queries to re-read; the store adopts the new
/// records on that read. Our own writes produce events too, which live
/// queries discard because the snapshot is unchanged.
///
/// Watching stops when the value is dropped.
pub struct TaskFileWatcher {
    _watcher: RecommendedWatcher,
}

impl TaskFileWatcher {
    pub fn start(path: &Path, notifier: ChangeNotifier) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| TodoError::io(format!("path has no file name: {:?}", path)))?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => Path::new(".").to_path_buf(),
        };

        // Saves rename a temp file over the target, which replaces its
        // inode, so the directory is watched rather than the file.
        let mut watcher = RecommendedWatcher::new(
            move |res: std::result::Result<Event, notify::Error>| match res {
                Ok(event) => {
                    if touches_file(&event, &file_name) {
                        notifier.bump();
                    }
                }
                Err(e) => tracing::warn!("Task file watch error: {}", e),
            },
            Config::default(),
        )
        .map_err(|e| TodoError::io(format!("Failed to create file watcher: {}", e)))?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| TodoError::io(format!("Failed to watch {:?}: {}", dir, e)))?;

        tracing::debug!("Watching {:?} for external task changes", dir);
        Ok(Self { _watcher: watcher })
    }
}

fn touches_file(event: &Event, file_name: &OsString) -> bool {
    let relevant = matches!(
        event.kind,
        EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Any)
            | EventKind::Modify(ModifyKind::Name(RenameMode::To))
            | EventKind::Modify(ModifyKind::Name(RenameMode::Both))
            | EventKind::Modify(ModifyKind::Name(RenameMode::Any))
            | EventKind::Create(CreateKind::File)
            | EventKind::Create(CreateKind::Any)
            | EventKind::Remove(_)
    );
    relevant
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_only_target_file_events_count() {
        let name = OsString::from("tasks.json");

        assert!(touches_file(
            &event(
                EventKind::Modify(ModifyKind::Name(RenameMode::To)),
                "/data/tasks.json"
            ),
            &name
        ));
        assert!(touches_file(
            &event(EventKind::Create(CreateKind::File), "/data/tasks.json"),
            &name
        ));
        assert!(!touches_file(
            &event(
                EventKind::Create(CreateKind::File),
                "/data/.tasks.json.abc.tmp"
            ),
            &name
        ));
        assert!(!touches_file(
            &event(EventKind::Create(CreateKind::File), "/data/tasks.lock"),
            &name
        ));
        assert!(!touches_file(
            &event(
                EventKind::Access(notify::event::AccessKind::Any),
                "/data/tasks.json"
            ),
            &name
        ));
    }
}
