//! The snapshot store: the single shared view of dashboard state.
//!
//! The store owns the latest reconciled [`DashboardState`] and replaces it
//! wholesale on each successful join cycle. Readers always see one
//! consistent value, never a mixture of fields from different cycles.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::data::DashboardState;

#[derive(Debug, Default)]
struct Inner {
    state: DashboardState,
    sequence: u64,
}

/// Atomically-replaced holder of the latest dashboard state.
///
/// Cloning the store clones a handle; all clones share the same state.
/// Writes carry a cycle sequence number, and the store rejects any write
/// older than what it already holds, so a slow cycle that resolves late
/// can never overwrite a newer snapshot.
///
/// # Example
///
/// ```
/// use tunneldash::{DashboardState, SnapshotStore};
///
/// let store = SnapshotStore::new();
/// assert!(!store.current().ready);
///
/// let mut state = DashboardState::loading();
/// state.ready = true;
/// assert!(store.replace(1, state));
/// assert!(store.current().ready);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    inner: Arc<Mutex<Inner>>,
}

impl SnapshotStore {
    /// Create a store in the empty loading state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the latest state. Synchronous and non-blocking beyond the
    /// internal mutex; the caller gets an owned clone and cannot mutate
    /// the store through it.
    pub fn current(&self) -> DashboardState {
        self.inner.lock().state.clone()
    }

    /// Atomically replace the whole state.
    ///
    /// Returns `false` and leaves the store untouched if `sequence` is
    /// lower than the store's high-water mark (a stale cycle resolving
    /// after a newer one).
    pub fn replace(&self, sequence: u64, state: DashboardState) -> bool {
        let mut inner = self.inner.lock();
        if sequence < inner.sequence {
            return false;
        }
        inner.sequence = sequence;
        inner.state = state;
        true
    }

    /// The sequence number of the last accepted write (0 if none).
    pub fn sequence(&self) -> u64 {
        self.inner.lock().sequence
    }
}
