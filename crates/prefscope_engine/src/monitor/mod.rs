/* 📖 # How does a store change reach the UI thread?

Detection runs on a background thread: the notify debouncer for file stores,
a poll loop for the registry. That thread never touches consumer state. Every
debounced change goes through the `ChangeGate`, which

- drops it if monitoring was stopped,
- swallows it if the suppression slot is armed (the caller announced its own
  write with `ignore_next_change`), and
- otherwise raises the `ChangeSignal`, invoking the listener only when the
  signal goes from clean to dirty.

The consumer polls the signal once per update tick and reloads on its own thread.
Raw changes arriving while the signal is still dirty collapse into that one
pending flag, so there is never more than one notification in flight.

Deliveries are serialized, and the listener runs after the gate has released its
state lock. `stop()` closes the gate, waits for a listener call that is already
running, then tears the watcher down. Once it returns no listener call can happen.
*/

mod gate;
mod signal;
mod strategy;

use std::sync::Arc;

use tracing::{debug, info, warn};

use prefscope_base::{PalHandle, WatchHandle};

pub use gate::{ChangeGate, Delivery, Suppression};
pub use signal::{ChangeListener, ChangeSignal};
pub use strategy::{FileWatchStrategy, RegistryPollStrategy, WatchStrategy, watch_strategy_for};

/// Whether a monitor is currently watching its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Watching,
}

/// Watches one store for external modification.
#[derive(Debug)]
pub struct StoreMonitor {
    pal: PalHandle,
    strategy: Option<Box<dyn WatchStrategy>>,
    gate: Arc<ChangeGate>,
    signal: ChangeSignal,
    watch: Option<WatchHandle>,
}

impl StoreMonitor {
    /// Create an idle monitor. Without a strategy the store cannot be watched and
    /// `start` always fails softly.
    pub fn new(pal: PalHandle, strategy: Option<Box<dyn WatchStrategy>>) -> Self {
        let signal = ChangeSignal::new();
        Self {
            pal,
            strategy,
            gate: Arc::new(ChangeGate::new(signal.clone())),
            signal,
            watch: None,
        }
    }

    /// Start watching. Idempotent.
    ///
    /// Returns whether the monitor is watching afterwards. Failing to install the
    /// watch is logged and leaves the monitor idle.
    pub fn start(&mut self) -> bool {
        if self.watch.is_some() {
            return true;
        }
        let Some(strategy) = &self.strategy else {
            debug!("store cannot be watched on this platform");
            return false;
        };
        self.gate.open();
        match strategy.watch(&self.pal, self.gate.clone()) {
            Ok(handle) => {
                info!(strategy = strategy.name(), "monitoring started");
                self.watch = Some(handle);
                true
            }
            Err(error) => {
                self.gate.close();
                warn!(strategy = strategy.name(), %error, "could not start monitoring");
                false
            }
        }
    }

    /// Stop watching. Idempotent. No listener call happens after this returns.
    pub fn stop(&mut self) {
        if let Some(handle) = self.watch.take() {
            self.gate.close();
            handle.stop();
            info!("monitoring stopped");
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.watch.is_some()
    }

    pub fn state(&self) -> MonitorState {
        if self.is_monitoring() {
            MonitorState::Watching
        } else {
            MonitorState::Idle
        }
    }

    /// Swallow the next detected change. Has no lasting effect while idle, as
    /// `start` clears the slot.
    pub fn ignore_next_change(&self) {
        self.gate.arm();
    }

    pub fn suppression(&self) -> Suppression {
        self.gate.suppression()
    }

    /// Register the wakeup run when the store goes dirty, replacing any earlier one.
    pub fn set_listener(&self, listener: Option<ChangeListener>) {
        self.gate.set_listener(listener);
    }

    /// The dirty flag the consumer polls once per tick.
    pub fn signal(&self) -> &ChangeSignal {
        &self.signal
    }
}

impl Drop for StoreMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
