use tracing::{debug, instrument};

use prefscope_base::{PalHandle, PrefsResult, RegistryData, RegistryValue, ResultExt};

use super::{StoreBackend, StoreSnapshot};
use crate::value::StoredValue;

/// Reads the registry key the host keeps on Windows.
///
/// The host appends a hash of the key name to every value name (`volume_h3627519402`)
/// and writes strings as NUL terminated UTF-8 binary blobs, ints as DWORDs and
/// floats as the 8 raw bytes of a double.
#[derive(Debug)]
pub struct RegistryBackend {
    key_path: String,
}

impl RegistryBackend {
    pub fn new(key_path: String) -> Self {
        Self { key_path }
    }
}

impl StoreBackend for RegistryBackend {
    fn name(&self) -> &'static str {
        "registry"
    }

    #[instrument(skip(self, pal), fields(key = %self.key_path))]
    fn load(&self, pal: &PalHandle) -> PrefsResult<Option<StoreSnapshot>> {
        let Some(values) = pal
            .read_registry_values(&self.key_path)
            .with_context(|| format!("reading registry key {}", self.key_path))?
        else {
            return Ok(None);
        };
        let mut snapshot = StoreSnapshot::new();
        for value in &values {
            let key = preference_name(&value.name);
            let stored = stored_value(value);
            debug!(%key, ?stored, "registry value");
            snapshot.insert(key, stored);
        }
        Ok(Some(snapshot))
    }
}

/// Strip the `_h<digits>` hash suffix from a value name.
fn preference_name(value_name: &str) -> &str {
    match value_name.rfind("_h") {
        Some(index) => {
            let digits = &value_name[index + 2..];
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                &value_name[..index]
            } else {
                value_name
            }
        }
        None => value_name,
    }
}

fn stored_value(value: &RegistryValue) -> StoredValue {
    match &value.data {
        RegistryData::String(s) => StoredValue::String(s.clone()),
        RegistryData::Binary(bytes) => {
            let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
            match std::str::from_utf8(&bytes[..end]) {
                Ok(s) => StoredValue::String(s.to_string()),
                Err(_) => StoredValue::Other {
                    type_name: "binary".to_string(),
                },
            }
        }
        RegistryData::Dword(dword) => StoredValue::Int(*dword as i32),
        RegistryData::Qword(bits) => StoredValue::Float(f64::from_bits(*bits) as f32),
    }
}
