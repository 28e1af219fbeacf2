use std::collections::hash_map::DefaultHasher;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use tracing::{debug, instrument, warn};

use prefscope_base::pal::FileChangeEvent;
use prefscope_base::{FilePath, PalHandle, PrefsError, PrefsResult, RegistryValue, WatchHandle};

use super::gate::ChangeGate;
use crate::config::AccessorConfig;
use crate::locator::StoreDescriptor;

/// Platform specific way of noticing that a store changed.
///
/// `watch` installs the detection and routes every debounced change through the
/// gate. Stopping the returned handle must not return before the detection has
/// fully stopped.
pub trait WatchStrategy: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn watch(&self, pal: &PalHandle, gate: Arc<ChangeGate>) -> PrefsResult<WatchHandle>;
}

/// Native file notifications through the PAL, debounced there.
#[derive(Debug)]
pub struct FileWatchStrategy {
    path: FilePath,
    debounce: Duration,
}

impl FileWatchStrategy {
    pub fn new(path: FilePath, debounce: Duration) -> Self {
        Self { path, debounce }
    }
}

impl WatchStrategy for FileWatchStrategy {
    fn name(&self) -> &'static str {
        "file-watch"
    }

    #[instrument(skip(self, pal, gate), fields(path = %self.path))]
    fn watch(&self, pal: &PalHandle, gate: Arc<ChangeGate>) -> PrefsResult<WatchHandle> {
        let callback = Box::new(move |event: FileChangeEvent| {
            let delivery = gate.deliver();
            debug!(files = ?event.changed_files, ?delivery, "store file changed");
        });
        pal.watch_file(&self.path, self.debounce, callback)
    }
}

/// Polls a fingerprint of the registry key on a background thread.
///
/// The registry offers no notification the PAL exposes, so a change is whatever
/// makes two consecutive polls differ. Bursts within one interval collapse into
/// one change.
#[derive(Debug)]
pub struct RegistryPollStrategy {
    key_path: String,
    interval: Duration,
}

impl RegistryPollStrategy {
    pub fn new(key_path: String, interval: Duration) -> Self {
        Self { key_path, interval }
    }
}

impl WatchStrategy for RegistryPollStrategy {
    fn name(&self) -> &'static str {
        "registry-poll"
    }

    #[instrument(skip(self, pal, gate), fields(key = %self.key_path))]
    fn watch(&self, pal: &PalHandle, gate: Arc<ChangeGate>) -> PrefsResult<WatchHandle> {
        // Reading once up front makes start fail where the registry is unavailable.
        let mut last = fingerprint(pal.read_registry_values(&self.key_path)?.as_deref());

        let (stop_sender, stop_receiver) = crossbeam_channel::bounded::<()>(0);
        let pal = pal.clone();
        let key_path = self.key_path.clone();
        let interval = self.interval;
        let thread = thread::Builder::new()
            .name("prefscope-registry-poll".to_string())
            .spawn(move || {
                loop {
                    match stop_receiver.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    match pal.read_registry_values(&key_path) {
                        Ok(values) => {
                            let current = fingerprint(values.as_deref());
                            if current != last {
                                last = current;
                                let delivery = gate.deliver();
                                debug!(key = %key_path, ?delivery, "registry key changed");
                            }
                        }
                        Err(error) => warn!(key = %key_path, %error, "registry poll failed"),
                    }
                }
                debug!(key = %key_path, "registry poll stopped");
            })
            .map_err(|e| {
                Box::new(PrefsError::message(format!(
                    "Failed to spawn registry poll thread: {}",
                    e
                )))
            })?;

        Ok(WatchHandle::new(move || {
            drop(stop_sender);
            if thread.join().is_err() {
                warn!("registry poll thread panicked");
            }
        }))
    }
}

fn fingerprint(values: Option<&[RegistryValue]>) -> u64 {
    let mut hasher = DefaultHasher::new();
    values.hash(&mut hasher);
    hasher.finish()
}

/// Select how to watch a store. `None` for stores that cannot be watched.
pub fn watch_strategy_for(
    descriptor: &StoreDescriptor,
    config: &AccessorConfig,
) -> Option<Box<dyn WatchStrategy>> {
    match descriptor {
        StoreDescriptor::Registry { key_path } => Some(Box::new(RegistryPollStrategy::new(
            key_path.clone(),
            config.poll_interval(),
        ))),
        StoreDescriptor::PropertyList { path } | StoreDescriptor::FlatFile { path } => {
            Some(Box::new(FileWatchStrategy::new(path.clone(), config.debounce())))
        }
        StoreDescriptor::Unsupported { .. } => None,
    }
}
