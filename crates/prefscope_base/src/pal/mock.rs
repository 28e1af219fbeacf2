use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::{PrefsError, PrefsResult};

use super::FilePath;
use super::registry::RegistryValue;
use super::traits::{FileChangeCallback, FileChangeEvent, Pal, ReadSeek, WatchHandle};

/* 📖 # How does MockPal simulate change notifications?

Every `watch_file` call registers its callback under a fresh id and returns a
WatchHandle whose stop closure removes that id again. `trigger_change` plays the
role of the OS: it invokes every live callback for the path, synchronously and
exactly once, i.e. as if a burst of raw events had already been debounced.
Tests therefore decide precisely when an "external write" is observed.
*/

type WatchRegistry = Arc<Mutex<HashMap<u64, (FilePath, Arc<FileChangeCallback>)>>>;

/// In-memory PAL implementation for testing.
///
/// # Examples
///
/// ```
/// use prefscope_base::{MockPal, Pal, FilePath};
///
/// let mock = MockPal::new();
/// mock.add_file(FilePath::from("prefs"), b"content".to_vec());
/// let content = mock.read_file_to_string(&FilePath::from("prefs")).unwrap();
/// assert_eq!(content, "content");
/// ```
#[derive(Clone)]
pub struct MockPal {
    files: Arc<Mutex<HashMap<FilePath, Vec<u8>>>>,
    registry: Arc<Mutex<HashMap<String, Vec<RegistryValue>>>>,
    watches: WatchRegistry,
    next_watch_id: Arc<AtomicU64>,
    deny_watches: Arc<AtomicBool>,
}

impl MockPal {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            registry: Arc::new(Mutex::new(HashMap::new())),
            watches: Arc::new(Mutex::new(HashMap::new())),
            next_watch_id: Arc::new(AtomicU64::new(1)),
            deny_watches: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Add or replace a file in the mock storage.
    pub fn add_file(&self, path: FilePath, content: impl Into<Vec<u8>>) {
        self.files.lock().insert(path, content.into());
    }

    pub fn remove_file(&self, path: &FilePath) {
        self.files.lock().remove(path);
    }

    /// Create or replace a registry key with the given values.
    pub fn set_registry_values(&self, key_path: impl Into<String>, values: Vec<RegistryValue>) {
        self.registry.lock().insert(key_path.into(), values);
    }

    pub fn remove_registry_key(&self, key_path: &str) {
        self.registry.lock().remove(key_path);
    }

    /// Make every subsequent `watch_file` call fail, as on a platform without
    /// permission to watch.
    pub fn deny_watches(&self, deny: bool) {
        self.deny_watches.store(deny, Ordering::SeqCst);
    }

    /// Deliver one change notification to every live watch on `path`.
    ///
    /// Returns the number of callbacks invoked.
    pub fn trigger_change(&self, path: &FilePath) -> usize {
        // Callbacks run outside the lock so they may stop their own watch.
        let callbacks: Vec<Arc<FileChangeCallback>> = self
            .watches
            .lock()
            .values()
            .filter(|(watched, _)| watched == path)
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in &callbacks {
            callback(FileChangeEvent {
                changed_files: vec![path.clone()],
            });
        }
        callbacks.len()
    }

    pub fn active_watch_count(&self) -> usize {
        self.watches.lock().len()
    }
}

impl std::fmt::Debug for MockPal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPal")
            .field("files", &self.files.lock().len())
            .field("registry_keys", &self.registry.lock().len())
            .field("watches", &self.watches.lock().len())
            .finish()
    }
}

impl Default for MockPal {
    fn default() -> Self {
        Self::new()
    }
}

impl Pal for MockPal {
    fn read_file(&self, path: &FilePath) -> PrefsResult<Box<dyn ReadSeek + 'static>> {
        let content = self
            .files
            .lock()
            .get(path)
            .ok_or_else(|| {
                Box::new(PrefsError::file(
                    path.as_path(),
                    std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("File not found: {}", path),
                    ),
                ))
            })?
            .clone();
        Ok(Box::new(Cursor::new(content)))
    }

    fn read_registry_values(&self, key_path: &str) -> PrefsResult<Option<Vec<RegistryValue>>> {
        Ok(self.registry.lock().get(key_path).cloned())
    }

    fn watch_file(
        &self,
        path: &FilePath,
        _debounce: Duration,
        callback: FileChangeCallback,
    ) -> PrefsResult<WatchHandle> {
        if self.deny_watches.load(Ordering::SeqCst) {
            return Err(Box::new(PrefsError::file(
                path.as_path(),
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "watch denied"),
            )));
        }
        let id = self.next_watch_id.fetch_add(1, Ordering::SeqCst);
        self.watches
            .lock()
            .insert(id, (path.clone(), Arc::new(callback)));
        let watches = Arc::clone(&self.watches);
        Ok(WatchHandle::new(move || {
            watches.lock().remove(&id);
        }))
    }
}
