/* 📖 # How does the store reader tolerate a store it does not own?

The store is written by the host application (and possibly other processes) at
any time. The reader therefore never fails outward:

- a missing store (no file, no registry key) is an empty store
- a store that cannot be parsed, typically because it is caught mid-write, keeps
  the last snapshot that did parse and marks the reader stale until the next
  successful reload

Platform differences are confined to `StoreBackend::load`. Caching, the stale flag
and the typed getters are shared by all backends.
*/

mod flat_file;
mod property_list;
mod registry;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use tracing::{debug, instrument, warn};

use prefscope_base::{PalHandle, PrefsResult};

use crate::locator::StoreDescriptor;
use crate::probe::PreferenceLookup;
use crate::value::{PreferenceKey, StoredValue};

pub use flat_file::FlatFileBackend;
pub use property_list::PropertyListBackend;
pub use registry::RegistryBackend;

/// Parsed contents of a store at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    entries: BTreeMap<PreferenceKey, StoredValue>,
}

impl StoreSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry. A later entry with the same key replaces an earlier one.
    pub fn insert(&mut self, key: impl Into<PreferenceKey>, value: StoredValue) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&StoredValue> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &PreferenceKey> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(PreferenceKey, StoredValue)> for StoreSnapshot {
    fn from_iter<I: IntoIterator<Item = (PreferenceKey, StoredValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Typed getters with host semantics: the default comes back when the key is
/// absent or holds a different type.
impl PreferenceLookup for StoreSnapshot {
    fn get_string(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Some(StoredValue::String(s)) => s.clone(),
            _ => default.to_string(),
        }
    }

    fn get_float(&self, key: &str, default: f32) -> f32 {
        match self.get(key) {
            Some(StoredValue::Float(f)) => *f,
            _ => default,
        }
    }

    fn get_int(&self, key: &str, default: i32) -> i32 {
        match self.get(key) {
            Some(StoredValue::Int(i)) => *i,
            _ => default,
        }
    }
}

/// Platform specific parsing of one store.
pub trait StoreBackend: Debug + Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Read and parse the store.
    ///
    /// Returns `Ok(None)` if the store does not exist and an error if it exists but
    /// cannot be read or parsed.
    fn load(&self, pal: &PalHandle) -> PrefsResult<Option<StoreSnapshot>>;
}

/// Backend for platforms without a known store. Always empty.
#[derive(Debug)]
pub struct UnsupportedBackend;

impl StoreBackend for UnsupportedBackend {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn load(&self, _pal: &PalHandle) -> PrefsResult<Option<StoreSnapshot>> {
        Ok(None)
    }
}

/// Select the backend matching a store descriptor.
pub fn backend_for(descriptor: &StoreDescriptor) -> Box<dyn StoreBackend> {
    match descriptor {
        StoreDescriptor::Registry { key_path } => Box::new(RegistryBackend::new(key_path.clone())),
        StoreDescriptor::PropertyList { path } => Box::new(PropertyListBackend::new(path.clone())),
        StoreDescriptor::FlatFile { path } => Box::new(FlatFileBackend::new(path.clone())),
        StoreDescriptor::Unsupported { .. } => Box::new(UnsupportedBackend),
    }
}

/// Read-only, caching view of one preference store.
#[derive(Debug)]
pub struct StoreReader {
    pal: PalHandle,
    backend: Box<dyn StoreBackend>,
    snapshot: StoreSnapshot,
    keys: BTreeSet<PreferenceKey>,
    stale: bool,
}

impl StoreReader {
    /// Create a reader. The cache starts empty until the first reload.
    pub fn new(pal: PalHandle, backend: Box<dyn StoreBackend>) -> Self {
        Self {
            pal,
            backend,
            snapshot: StoreSnapshot::new(),
            keys: BTreeSet::new(),
            stale: false,
        }
    }

    /// Key names in the store.
    ///
    /// With `reload == false` the cached set from the last successful enumeration is
    /// returned untouched. With `reload == true` the store is parsed again first.
    pub fn list_keys(&mut self, reload: bool) -> &BTreeSet<PreferenceKey> {
        if reload {
            self.reload();
        }
        &self.keys
    }

    /// Whether the last reload failed and the cache holds an older snapshot.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// The cached snapshot the probe reads values from.
    pub fn snapshot(&self) -> &StoreSnapshot {
        &self.snapshot
    }

    #[instrument(skip(self), fields(backend = self.backend.name()))]
    fn reload(&mut self) {
        match self.backend.load(&self.pal) {
            Ok(Some(snapshot)) => {
                debug!(keys = snapshot.len(), "store loaded");
                self.replace(snapshot);
            }
            Ok(None) => {
                debug!("store does not exist, treating as empty");
                self.replace(StoreSnapshot::new());
            }
            Err(error) => {
                warn!(%error, keys = self.keys.len(), "store could not be read, keeping last snapshot");
                self.stale = true;
            }
        }
    }

    fn replace(&mut self, snapshot: StoreSnapshot) {
        self.keys = snapshot.keys().cloned().collect();
        self.snapshot = snapshot;
        self.stale = false;
    }
}
