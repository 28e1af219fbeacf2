use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Callback run on the watcher's background thread when the store went from
/// clean to dirty. Should only wake the consumer (e.g. request a repaint). It runs
/// outside the gate's state lock, so it may arm suppression or swap the listener.
pub type ChangeListener = Arc<dyn Fn() + Send + Sync>;

/// Single-slot dirty flag handed from the background watcher to the consumer's
/// update loop.
///
/// Any number of raised changes collapse into one pending flag until the consumer
/// takes it.
#[derive(Debug, Clone, Default)]
pub struct ChangeSignal {
    dirty: Arc<AtomicBool>,
}

impl ChangeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the store dirty. Returns true only for the clean to dirty transition.
    pub fn raise(&self) -> bool {
        !self.dirty.swap(true, Ordering::AcqRel)
    }

    /// Clear the flag, returning whether a change was pending.
    pub fn take(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }
}
