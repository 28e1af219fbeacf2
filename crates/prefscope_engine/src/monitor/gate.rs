use std::thread::{self, ThreadId};

use parking_lot::Mutex;
use tracing::debug;

use super::signal::{ChangeListener, ChangeSignal};

/// One-shot slot for swallowing the notification caused by the caller's own write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppression {
    /// The next detected change is swallowed.
    Armed,
    /// Detected changes are delivered.
    Consumed,
}

/// What happened to one detected change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Monitoring is stopped; the change was dropped.
    Closed,
    /// The suppression slot was armed and is now consumed.
    Suppressed,
    /// The signal went dirty and the listener ran.
    Notified,
    /// The signal was already dirty; nothing new to report.
    Coalesced,
}

struct GateState {
    watching: bool,
    suppression: Suppression,
    listener: Option<ChangeListener>,
    delivering_on: Option<ThreadId>,
}

/// Single point through which every detected change passes.
///
/// Deliveries are serialized by their own lock. The state lock is released before
/// the listener runs, so a listener may arm the suppression slot, swap listeners or
/// format the gate. Closing waits for an in-flight delivery unless it is called from
/// inside the listener itself.
pub struct ChangeGate {
    state: Mutex<GateState>,
    delivery: Mutex<()>,
    signal: ChangeSignal,
}

impl ChangeGate {
    pub fn new(signal: ChangeSignal) -> Self {
        Self {
            state: Mutex::new(GateState {
                watching: false,
                suppression: Suppression::Consumed,
                listener: None,
                delivering_on: None,
            }),
            delivery: Mutex::new(()),
            signal,
        }
    }

    /// Start letting changes through with a clear suppression slot.
    pub fn open(&self) {
        let mut state = self.state.lock();
        state.watching = true;
        state.suppression = Suppression::Consumed;
    }

    /// Stop letting changes through. On return no listener call is running.
    pub fn close(&self) {
        let from_listener = {
            let mut state = self.state.lock();
            state.watching = false;
            state.delivering_on == Some(thread::current().id())
        };
        if !from_listener {
            drop(self.delivery.lock());
        }
    }

    pub fn arm(&self) {
        self.state.lock().suppression = Suppression::Armed;
    }

    pub fn suppression(&self) -> Suppression {
        self.state.lock().suppression
    }

    pub fn set_listener(&self, listener: Option<ChangeListener>) {
        self.state.lock().listener = listener;
    }

    /// Route one debounced change.
    pub fn deliver(&self) -> Delivery {
        let _delivering = self.delivery.lock();
        let listener = {
            let mut state = self.state.lock();
            if !state.watching {
                return Delivery::Closed;
            }
            if state.suppression == Suppression::Armed {
                state.suppression = Suppression::Consumed;
                debug!("change suppressed");
                return Delivery::Suppressed;
            }
            if !self.signal.raise() {
                return Delivery::Coalesced;
            }
            state.delivering_on = Some(thread::current().id());
            state.listener.clone()
        };
        if let Some(listener) = listener {
            listener();
        }
        self.state.lock().delivering_on = None;
        Delivery::Notified
    }
}

impl std::fmt::Debug for ChangeGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ChangeGate")
            .field("watching", &state.watching)
            .field("delivering", &state.delivering_on.is_some())
            .field("suppression", &state.suppression)
            .field("has_listener", &state.listener.is_some())
            .field("signal", &self.signal)
            .finish()
    }
}
