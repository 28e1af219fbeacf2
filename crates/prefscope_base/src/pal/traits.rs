use std::io::{Read, Seek};
use std::sync::Arc;
use std::time::Duration;

use crate::PrefsResult;

use super::file_path::FilePath;
use super::registry::RegistryValue;

/// Trait combining Read + Seek, so readers can be real files or in-memory buffers.
pub trait ReadSeek: Read + Seek + Send {}
impl<T: Read + Seek + Send> ReadSeek for T {}

/// File change event delivered to watch callbacks.
#[derive(Debug, Clone)]
pub struct FileChangeEvent {
    /// The watched paths that changed. Bursts are already coalesced by the PAL.
    pub changed_files: Vec<FilePath>,
}

/// Callback invoked when a watched file changes.
pub type FileChangeCallback = Box<dyn Fn(FileChangeEvent) + Send + Sync>;

/// Platform Abstraction Layer (PAL) trait covering every OS interaction prefscope needs.
///
/// Two implementations are provided:
/// - `RealPal`: std::fs, notify and the Windows registry
/// - `MockPal`: in-memory implementation for testing
pub trait Pal: std::fmt::Debug + Send + Sync + 'static {
    /// Open a file for reading.
    fn read_file(&self, path: &FilePath) -> PrefsResult<Box<dyn ReadSeek + 'static>>;

    /// Read entire file contents as a UTF-8 string.
    fn read_file_to_string(&self, path: &FilePath) -> PrefsResult<String> {
        let mut reader = self.read_file(path)?;
        let mut contents = Vec::new();
        reader
            .read_to_end(&mut contents)
            .map_err(|e| Box::new(crate::PrefsError::file(path.as_path(), e)))?;
        String::from_utf8(contents).map_err(|_e| crate::err!("File is not valid UTF-8: {}", path))
    }

    /// Read all values of a registry key below the current user's hive.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    fn read_registry_values(&self, key_path: &str) -> PrefsResult<Option<Vec<RegistryValue>>>;

    /// Watch a single file for content changes.
    ///
    /// Events arriving within `debounce` of each other are delivered as one callback.
    /// The watch stays active until the returned handle is stopped or dropped.
    fn watch_file(
        &self,
        path: &FilePath,
        debounce: Duration,
        callback: FileChangeCallback,
    ) -> PrefsResult<WatchHandle>;
}

/* 📖 # Why does watching return an owning handle?

Stopping a watch must be synchronous: once `stop()` returns, the background
thread that delivers events is gone. Tying that teardown to a handle (and to its
Drop) means a forgotten watch cannot outlive its owner.
*/

/// Guard for an active watch. Stopping or dropping it tears the watch down and
/// joins any background thread before returning.
pub struct WatchHandle {
    stop: Option<Box<dyn FnOnce() + Send>>,
}

impl WatchHandle {
    pub fn new(stop: impl FnOnce() + Send + 'static) -> Self {
        Self {
            stop: Some(Box::new(stop)),
        }
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("active", &self.stop.is_some())
            .finish()
    }
}

/// Handle to a PAL implementation, enabling shared ownership.
///
/// # Examples
///
/// ```no_run
/// use prefscope_base::{RealPal, PalHandle};
///
/// let pal = PalHandle::new(RealPal::new("/home/user".into()));
/// let pal_clone = pal.clone(); // Cheap clone, shares the same implementation
/// ```
#[derive(Debug, Clone)]
pub struct PalHandle(Arc<dyn Pal>);

impl PalHandle {
    pub fn new(pal: impl Pal + 'static) -> Self {
        Self(Arc::new(pal))
    }
}

impl std::ops::Deref for PalHandle {
    type Target = dyn Pal;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}
