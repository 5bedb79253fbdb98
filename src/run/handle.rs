//! Shared active flag used for cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Handle to a harvester's active flag.
///
/// Clones share the flag. [`RunHandle::cancel`] flips it to false and the
/// scroll loop notices at its next checkpoint.
#[derive(Debug, Clone, Default)]
pub struct RunHandle {
    active: Arc<AtomicBool>,
}

impl RunHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the current run to stop. Posts collected so far are kept.
    pub fn cancel(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Mark a run as started. False if one is already active.
    pub(crate) fn try_activate(&self) -> bool {
        self.active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(crate) fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}
