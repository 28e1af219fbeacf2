use std::collections::BTreeSet;

use tracing::{debug, info, instrument};

use prefscope_base::PalHandle;

use crate::config::AccessorConfig;
use crate::locator::{StoreDescriptor, locate_store};
use crate::monitor::{ChangeListener, ChangeSignal, StoreMonitor, watch_strategy_for};
use crate::partition::{KeyOrigin, key_origin};
use crate::probe;
use crate::reader::{StoreReader, backend_for};
use crate::value::{PreferenceKey, PreferenceValue};

/// A classified preference, ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceEntry {
    pub key: PreferenceKey,
    pub value: PreferenceValue,
    pub origin: KeyOrigin,
}

/// Read-only access to one application's preference store plus change monitoring.
///
/// Nothing here returns an error: a missing or unsupported store reads as empty,
/// a store caught mid-write reads as its last good snapshot, and a store that cannot
/// be watched leaves monitoring off.
#[derive(Debug)]
pub struct PreferenceAccessor {
    descriptor: StoreDescriptor,
    reader: StoreReader,
    monitor: StoreMonitor,
}

impl PreferenceAccessor {
    /// Locate the store, enumerate it once and, if configured, start monitoring.
    #[instrument(skip_all, fields(organization = %config.organization, product = %config.product, platform = %config.platform))]
    pub fn new(pal: PalHandle, config: &AccessorConfig) -> Self {
        let descriptor = locate_store(
            &config.organization,
            &config.product,
            &config.platform,
            config.scope,
        );
        info!(location = %descriptor.display_location(), "preference store located");

        let mut reader = StoreReader::new(pal.clone(), backend_for(&descriptor));
        let key_count = reader.list_keys(true).len();
        debug!(keys = key_count, "initial enumeration");

        let monitor = StoreMonitor::new(pal, watch_strategy_for(&descriptor, config));
        let mut accessor = Self {
            descriptor,
            reader,
            monitor,
        };
        if config.watch_on_start {
            accessor.start_monitoring();
        }
        accessor
    }

    pub fn descriptor(&self) -> &StoreDescriptor {
        &self.descriptor
    }

    /// Key names in the store; `reload` re-reads the store first.
    pub fn list_keys(&mut self, reload: bool) -> BTreeSet<PreferenceKey> {
        self.reader.list_keys(reload).clone()
    }

    /// Classify a key against the snapshot from the last enumeration.
    pub fn classify_and_read(&self, key: &str) -> Option<PreferenceValue> {
        probe::classify_and_read(self.reader.snapshot(), key)
    }

    /// Every classifiable key with its value and origin, in key order.
    pub fn entries(&mut self, reload: bool) -> Vec<PreferenceEntry> {
        let keys = self.list_keys(reload);
        keys.into_iter()
            .filter_map(|key| {
                let value = self.classify_and_read(key.as_str())?;
                let origin = key_origin(key.as_str());
                Some(PreferenceEntry { key, value, origin })
            })
            .collect()
    }

    /// Whether the last reload failed and the data shown is an older snapshot.
    pub fn is_stale(&self) -> bool {
        self.reader.is_stale()
    }

    /// Returns whether monitoring is active afterwards.
    pub fn start_monitoring(&mut self) -> bool {
        self.monitor.start()
    }

    pub fn stop_monitoring(&mut self) {
        self.monitor.stop();
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor.is_monitoring()
    }

    /// Call right before writing through the host preference API.
    pub fn ignore_next_change(&self) {
        self.monitor.ignore_next_change();
    }

    /// Register a wakeup for the consumer's loop. It runs on a background thread.
    pub fn on_change(&self, listener: ChangeListener) {
        self.monitor.set_listener(Some(listener));
    }

    pub fn clear_listener(&self) {
        self.monitor.set_listener(None);
    }

    pub fn change_signal(&self) -> ChangeSignal {
        self.monitor.signal().clone()
    }

    /// Clear and return the pending change flag. Call once per update tick.
    pub fn take_pending_change(&self) -> bool {
        self.monitor.signal().take()
    }
}
