use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use notify_debouncer_full::notify::event::{AccessKind, AccessMode, MetadataKind, ModifyKind};
use notify_debouncer_full::notify::{EventKind, RecursiveMode};
use notify_debouncer_full::{DebounceEventResult, new_debouncer};
use tracing::{debug, instrument, warn};

use crate::{PrefsError, PrefsResult};

use super::FilePath;
use super::registry::RegistryValue;
use super::traits::{FileChangeCallback, FileChangeEvent, Pal, ReadSeek, WatchHandle};

/// Concrete PAL implementation using the real operating system.
///
/// All file paths are resolved relative to a configured base directory, which is
/// the user's home directory in normal use.
#[derive(Debug)]
pub struct RealPal {
    base_dir: PathBuf,
}

impl RealPal {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// A RealPal rooted at the current user's home directory.
    pub fn for_home_dir() -> PrefsResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Box::new(PrefsError::unsupported("locating the home directory")))?;
        Ok(Self::new(home))
    }

    fn resolve_path(&self, path: &FilePath) -> PathBuf {
        self.base_dir.join(path.as_path())
    }
}

impl Pal for RealPal {
    #[instrument(skip(self), fields(path = %path))]
    fn read_file(&self, path: &FilePath) -> PrefsResult<Box<dyn ReadSeek + 'static>> {
        let resolved = self.resolve_path(path);
        debug!(resolved = %resolved.display(), "opening file for reading");
        let file = fs::File::open(&resolved).map_err(|e| {
            debug!(error = %e, "failed to open file");
            Box::new(PrefsError::file(resolved, e))
        })?;
        Ok(Box::new(file))
    }

    #[instrument(skip(self))]
    fn read_registry_values(&self, key_path: &str) -> PrefsResult<Option<Vec<RegistryValue>>> {
        registry::read_values(key_path)
    }

    #[instrument(skip(self, callback), fields(path = %path, debounce_ms = debounce.as_millis() as u64))]
    fn watch_file(
        &self,
        path: &FilePath,
        debounce: Duration,
        callback: FileChangeCallback,
    ) -> PrefsResult<WatchHandle> {
        let resolved = self.resolve_path(path);
        let directory = resolved
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| self.base_dir.clone());
        let file_name = resolved
            .file_name()
            .map(|name| name.to_os_string())
            .ok_or_else(|| crate::err!("Cannot watch a path without file name: {}", path))?;

        if !directory.is_dir() {
            debug!(directory = %directory.display(), "directory not found");
            return Err(Box::new(PrefsError::file(
                directory,
                std::io::Error::new(std::io::ErrorKind::NotFound, "directory not found"),
            )));
        }

        // Stores are often rewritten through a temporary file and a rename, so the
        // directory is watched and events are narrowed down to the one file name.
        let watched = path.clone();
        let mut debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    let relevant = events.iter().any(|event| {
                        is_content_change(&event.kind)
                            && event
                                .paths
                                .iter()
                                .any(|p| p.file_name() == Some(file_name.as_os_str()))
                    });
                    if relevant {
                        callback(FileChangeEvent {
                            changed_files: vec![watched.clone()],
                        });
                    }
                }
                Err(errors) => {
                    for error in errors {
                        warn!(error = %error, "file watch error");
                    }
                }
            }
        })
        .map_err(|e| crate::err!("Failed to create file watcher: {}", e))?;

        debouncer
            .watch(&directory, RecursiveMode::NonRecursive)
            .map_err(|e| {
                crate::err!(
                    "Failed to watch directory {}: {}",
                    directory.display(),
                    e
                )
            })?;
        debug!(directory = %directory.display(), "file watch installed");

        Ok(WatchHandle::new(move || {
            debouncer.stop();
            debug!("file watch stopped");
        }))
    }
}

/// Whether an event may have changed the file's contents. Opening and reading the
/// store (which the reader itself does on every reload) must not count.
fn is_content_change(kind: &EventKind) -> bool {
    match kind {
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::AccessTime)) => false,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => true,
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => true,
        _ => false,
    }
}

#[cfg(windows)]
mod registry {
    use tracing::debug;
    use winreg::RegKey;
    use winreg::enums::{HKEY_CURRENT_USER, RegType};
    use winreg::types::FromRegValue;

    use crate::pal::registry::{RegistryData, RegistryValue};
    use crate::{PrefsError, PrefsResult};

    pub(super) fn read_values(key_path: &str) -> PrefsResult<Option<Vec<RegistryValue>>> {
        let key = match RegKey::predef(HKEY_CURRENT_USER).open_subkey(key_path) {
            Ok(key) => key,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Box::new(PrefsError::file(
                    format!("HKEY_CURRENT_USER\\{}", key_path),
                    e,
                )));
            }
        };

        let mut values = Vec::new();
        for entry in key.enum_values() {
            let (name, value) = entry.map_err(|e| {
                Box::new(PrefsError::file(format!("HKEY_CURRENT_USER\\{}", key_path), e))
            })?;
            let bytes = &value.bytes[..];
            let data = match value.vtype {
                RegType::REG_DWORD | RegType::REG_QWORD if bytes.len() == 4 => {
                    <[u8; 4]>::try_from(bytes)
                        .ok()
                        .map(|b| RegistryData::Dword(u32::from_le_bytes(b)))
                }
                RegType::REG_DWORD | RegType::REG_QWORD if bytes.len() == 8 => {
                    <[u8; 8]>::try_from(bytes)
                        .ok()
                        .map(|b| RegistryData::Qword(u64::from_le_bytes(b)))
                }
                RegType::REG_BINARY => Some(RegistryData::Binary(bytes.to_vec())),
                RegType::REG_SZ | RegType::REG_EXPAND_SZ => {
                    String::from_reg_value(&value).ok().map(RegistryData::String)
                }
                _ => None,
            };
            match data {
                Some(data) => values.push(RegistryValue::new(name, data)),
                None => debug!(name = %name, vtype = ?value.vtype, "skipping registry value"),
            }
        }
        Ok(Some(values))
    }
}

#[cfg(not(windows))]
mod registry {
    use crate::pal::registry::RegistryValue;
    use crate::{PrefsError, PrefsResult};

    pub(super) fn read_values(_key_path: &str) -> PrefsResult<Option<Vec<RegistryValue>>> {
        Err(Box::new(PrefsError::unsupported(format!(
            "registry access on {}",
            std::env::consts::OS
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::time::Instant;
    use tempfile::TempDir;

    fn setup_test_dir() -> (TempDir, RealPal) {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let pal = RealPal::new(temp_dir.path().to_path_buf());
        (temp_dir, pal)
    }

    #[test]
    fn test_read_file_to_string() {
        let (temp_dir, pal) = setup_test_dir();
        fs::create_dir_all(temp_dir.path().join("a/b")).unwrap();
        fs::write(temp_dir.path().join("a/b/prefs"), "<unity_prefs/>").unwrap();

        let content = pal.read_file_to_string(&FilePath::from("a/b/prefs")).unwrap();
        assert_eq!(content, "<unity_prefs/>");
    }

    #[test]
    fn test_read_file_not_found() {
        let (_temp_dir, pal) = setup_test_dir();
        let result = pal.read_file(&FilePath::from("nonexistent"));
        assert!(matches!(
            result.err().map(|e| e.kind().is_not_found()),
            Some(true)
        ));
    }

    #[test]
    fn test_watch_file_missing_directory() {
        let (_temp_dir, pal) = setup_test_dir();
        let callback: FileChangeCallback = Box::new(|_event| {});
        let result = pal.watch_file(
            &FilePath::from("missing/prefs"),
            Duration::from_millis(50),
            callback,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_watch_file_reports_write_and_ignores_siblings() {
        let (temp_dir, pal) = setup_test_dir();
        fs::write(temp_dir.path().join("prefs"), "one").unwrap();

        let (tx, rx) = unbounded();
        let callback: FileChangeCallback = Box::new(move |event| {
            let _ = tx.send(event);
        });
        let handle = pal
            .watch_file(&FilePath::from("prefs"), Duration::from_millis(50), callback)
            .unwrap();

        fs::write(temp_dir.path().join("other"), "noise").unwrap();
        fs::write(temp_dir.path().join("prefs"), "two").unwrap();

        let event = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("no change event received");
        assert_eq!(event.changed_files, vec![FilePath::from("prefs")]);

        handle.stop();
        while rx.try_recv().is_ok() {}
        fs::write(temp_dir.path().join("prefs"), "three").unwrap();
        let deadline = Instant::now() + Duration::from_millis(300);
        while Instant::now() < deadline {
            assert!(rx.try_recv().is_err(), "event delivered after stop");
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    #[test]
    fn test_watch_file_coalesces_burst_into_one_callback() {
        let (temp_dir, pal) = setup_test_dir();
        fs::write(temp_dir.path().join("prefs"), "0").unwrap();

        let (tx, rx) = unbounded();
        let callback: FileChangeCallback = Box::new(move |event| {
            let _ = tx.send(event);
        });
        let debounce = Duration::from_millis(500);
        let handle = pal
            .watch_file(&FilePath::from("prefs"), debounce, callback)
            .unwrap();

        for round in 1..=5 {
            fs::write(temp_dir.path().join("prefs"), round.to_string()).unwrap();
            std::thread::sleep(Duration::from_millis(10));
        }

        let event = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("no change event received");
        assert_eq!(event.changed_files, vec![FilePath::from("prefs")]);
        assert!(
            rx.recv_timeout(debounce * 2).is_err(),
            "burst of writes produced more than one callback"
        );
        handle.stop();
    }

    #[cfg(not(windows))]
    #[test]
    fn test_registry_unsupported_off_windows() {
        let (_temp_dir, pal) = setup_test_dir();
        let result = pal.read_registry_values("SOFTWARE\\Unity\\UnityEditor\\Acme\\Game");
        assert!(matches!(
            result.unwrap_err().kind(),
            crate::ErrorKind::Unsupported { .. }
        ));
    }
}
