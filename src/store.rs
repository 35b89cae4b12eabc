use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::models::Snapshot;

/// Holds the most recently published [`Snapshot`].
///
/// Reads are lock-free pointer loads and publishing is a single pointer
/// store, so a reader always gets either the whole old snapshot or the whole
/// new one. Cloning the store shares the same slot.
#[derive(Clone)]
pub struct SnapshotStore {
    current: Arc<ArcSwap<Snapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(Snapshot::placeholder())),
        }
    }

    /// Latest published snapshot, or the placeholder before the first cycle.
    pub fn read(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Swap in a freshly built snapshot. Only the scheduler calls this.
    pub(crate) fn publish(&self, snapshot: Snapshot) {
        self.current.store(Arc::new(snapshot));
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
