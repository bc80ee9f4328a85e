//! Live queries: re-delivered snapshots driven by store revisions.

use futures::Stream;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use todos_core::error::Result;
use todos_core::identity::Scope;
use todos_core::task::{ChangeReceiver, Task, TaskQuery, TaskRepository};

/// A query bound to a scope that yields a fresh full snapshot each time its
/// result changes.
///
/// Dropping the value releases the subscription; the store keeps no
/// per-subscriber state.
pub struct LiveQuery {
    repository: Arc<dyn TaskRepository>,
    scope: Scope,
    query: TaskQuery,
    changes: ChangeReceiver,
    last: Option<Vec<Task>>,
}

impl LiveQuery {
    pub(crate) fn new(repository: Arc<dyn TaskRepository>, scope: Scope, query: TaskQuery) -> Self {
        let changes = repository.changes();
        Self {
            repository,
            scope,
            query,
            changes,
            last: None,
        }
    }

    pub fn query(&self) -> &TaskQuery {
        &self.query
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Evaluates the query now without affecting delivery state.
    pub async fn snapshot(&self) -> Result<Vec<Task>> {
        self.repository.list(&self.scope, &self.query).await
    }

    /// Waits for the next snapshot.
    ///
    /// The first call returns immediately with the current result. Later
    /// calls suspend until the store changes in a way that alters the
    /// result. `Ok(None)` means the change feed closed, which cannot happen
    /// while this live query holds the store, so callers may treat it as the
    /// end of the stream.
    pub async fn next(&mut self) -> Result<Option<Vec<Task>>> {
        if self.last.is_none() {
            // Mark the current revision seen before reading so a write that
            // lands after the read still wakes us.
            self.changes.borrow_and_update();
            let snapshot = self.snapshot().await?;
            self.last = Some(snapshot.clone());
            return Ok(Some(snapshot));
        }

        loop {
            if self.changes.changed().await.is_err() {
                return Ok(None);
            }
            let snapshot = self.snapshot().await?;
            if self.last.as_ref() != Some(&snapshot) {
                self.last = Some(snapshot.clone());
                return Ok(Some(snapshot));
            }
        }
    }

    /// Adapts the live query into a stream of snapshots. The stream ends
    /// after the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<Task>>> + Send {
        futures::stream::unfold(Some(self), |state| async move {
            let mut live = state?;
            match live.next().await {
                Ok(Some(snapshot)) => Some((Ok(snapshot), Some(live))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    /// Spawns a task that invokes `callback` with every snapshot until the
    /// returned [`Subscription`] is cancelled or dropped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe<F>(mut self, mut callback: F) -> Subscription
    where
        F: FnMut(Vec<Task>) + Send + 'static,
    {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    next = self.next() => match next {
                        Ok(Some(snapshot)) => callback(snapshot),
                        Ok(None) => break,
                        Err(e) => {
                            tracing::warn!("Live query failed, ending subscription: {}", e);
                            break;
                        }
                    },
                }
            }
            tracing::debug!("Subscription for {:?} ended", self.query);
        });

        Subscription { token }
    }
}

/// Handle to a running callback subscription. Cancels on drop.
pub struct Subscription {
    token: CancellationToken,
}

impl Subscription {
    /// Stops delivery. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::time::Duration;
    use todos_core::task::{NewTask, TaskPatch};
    use todos_infrastructure::InMemoryTaskRepository;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    fn repo() -> Arc<dyn TaskRepository> {
        Arc::new(InMemoryTaskRepository::new())
    }

    async fn add(repo: &Arc<dyn TaskRepository>, title: &str) -> Task {
        repo.insert(NewTask::new(title, "", None).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_first_next_is_immediate_snapshot() {
        let repo = repo();
        add(&repo, "a").await;

        let mut live = LiveQuery::new(repo, Scope::Unscoped, TaskQuery::all());
        let snapshot = live.next().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
    }

    #[tokio::test]
    async fn test_next_waits_for_relevant_change() {
        let repo = repo();
        let task = add(&repo, "a").await;

        let mut live = LiveQuery::new(repo.clone(), Scope::Unscoped, TaskQuery::completed());
        assert!(live.next().await.unwrap().unwrap().is_empty());

        // Adding an incomplete task does not change the completed view
        add(&repo, "b").await;
        assert!(
            timeout(Duration::from_millis(50), live.next())
                .await
                .is_err()
        );

        repo.patch(&Scope::Unscoped, &task.id, &TaskPatch::new().completed(true))
            .await
            .unwrap();
        let snapshot = timeout(Duration::from_secs(1), live.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, task.id);
    }

    #[tokio::test]
    async fn test_stream_yields_each_change() {
        let repo = repo();
        let live = LiveQuery::new(repo.clone(), Scope::Unscoped, TaskQuery::all());
        let mut stream = Box::pin(live.into_stream());

        assert!(stream.next().await.unwrap().unwrap().is_empty());
        add(&repo, "a").await;
        assert_eq!(stream.next().await.unwrap().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_subscription_delivers_until_cancelled() {
        let repo = repo();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let subscription = LiveQuery::new(repo.clone(), Scope::Unscoped, TaskQuery::all())
            .subscribe(move |snapshot| {
                let _ = tx.send(snapshot);
            });

        assert!(rx.recv().await.unwrap().is_empty());
        add(&repo, "a").await;
        assert_eq!(rx.recv().await.unwrap().len(), 1);

        subscription.cancel();
        assert!(subscription.is_cancelled());
        // The callback (and its sender) is dropped once the task exits
        assert!(rx.recv().await.is_none());

        add(&repo, "b").await;
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_dropping_subscription_cancels() {
        let repo = repo();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let subscription = LiveQuery::new(repo, Scope::Unscoped, TaskQuery::all())
            .subscribe(move |snapshot| {
                let _ = tx.send(snapshot);
            });
        rx.recv().await.unwrap();

        drop(subscription);
        assert!(rx.recv().await.is_none());
    }
}
