// ── Snapshot store ──
//
// Holds the single most-recently-accepted DeviceSnapshot. Wholesale
// replacement only: there is deliberately no upsert or field merge, the
// board is authoritative and the next poll wins.

use std::sync::Arc;

use tokio::sync::watch;

use crate::model::DeviceSnapshot;

/// Process-wide owner of the current snapshot.
///
/// Built on a `watch` channel: a single writer (the active refresh flow)
/// replaces the value, any number of subscribers observe changes. `None`
/// until the first successful poll.
pub struct SnapshotStore {
    snapshot: watch::Sender<Option<Arc<DeviceSnapshot>>>,
}

impl SnapshotStore {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(None);
        Self { snapshot }
    }

    /// Replace the current snapshot wholesale.
    pub(crate) fn replace(&self, snapshot: Arc<DeviceSnapshot>) {
        // `send` refuses to store when no receiver exists yet;
        // `send_replace` stores unconditionally.
        self.snapshot.send_replace(Some(snapshot));
    }

    /// The current snapshot, if any poll has succeeded yet.
    pub fn current(&self) -> Option<Arc<DeviceSnapshot>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot replacements.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<DeviceSnapshot>>> {
        self.snapshot.subscribe()
    }
}
