//! Store revision broadcast.

use std::sync::Arc;
use tokio::sync::watch;
use todos_core::task::ChangeReceiver;

/// Publishes a monotonically increasing revision to live subscribers.
///
/// Subscribers always observe the latest revision; intermediate bumps may be
/// coalesced. Clones share one revision counter.
#[derive(Clone)]
pub struct ChangeNotifier {
    sender: Arc<watch::Sender<u64>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(0);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Records one committed change and wakes every subscriber.
    pub fn bump(&self) {
        // send_modify succeeds even with no live receivers
        self.sender.send_modify(|revision| *revision += 1);
    }

    pub fn subscribe(&self) -> ChangeReceiver {
        self.sender.subscribe()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}
