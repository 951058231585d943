//! Broadcast bus for user-facing session notices.
//!
//! Built on `tokio::sync::broadcast`. The quota gate, pool manager, and
//! slot controllers publish; the UI layer subscribes. Publishing with no
//! active subscribers is a no-op.

use chorus_types::notice::SessionNotice;
use tokio::sync::broadcast;

/// Multi-consumer bus for [`SessionNotice`]s.
///
/// Cloning the bus clones the sender, allowing multiple producers and
/// consumers over one channel.
#[derive(Clone)]
pub struct NoticeBus {
    sender: broadcast::Sender<SessionNotice>,
}

impl NoticeBus {
    /// Create a new bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a new subscriber that will receive all future notices.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionNotice> {
        self.sender.subscribe()
    }

    /// Publish a notice to all current subscribers.
    ///
    /// If there are no subscribers, the notice is silently dropped.
    pub fn publish(&self, notice: SessionNotice) {
        let _ = self.sender.send(notice);
    }
}

impl Default for NoticeBus {
    fn default() -> Self {
        Self::new(64)
    }
}

impl std::fmt::Debug for NoticeBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoticeBus")
            .field("receiver_count", &self.sender.receiver_count())
            .finish()
    }
}
