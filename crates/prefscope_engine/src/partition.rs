use crate::value::PreferenceKey;

/// Key prefixes reserved by the host framework for its own settings.
pub const HOST_KEY_PREFIXES: &[&str] = &["unity.", "UnityGraphicsQuality"];

/// Who owns a key: the host framework or the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyOrigin {
    HostOwned,
    UserDefined,
}

pub fn key_origin(key: &str) -> KeyOrigin {
    if HOST_KEY_PREFIXES.iter().any(|prefix| key.starts_with(prefix)) {
        KeyOrigin::HostOwned
    } else {
        KeyOrigin::UserDefined
    }
}

/// Keys split by [`KeyOrigin`], each side keeping the input order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KeyPartition {
    pub user_defined: Vec<PreferenceKey>,
    pub host_owned: Vec<PreferenceKey>,
}

pub fn partition_keys<'a>(keys: impl IntoIterator<Item = &'a PreferenceKey>) -> KeyPartition {
    let mut partition = KeyPartition::default();
    for key in keys {
        match key_origin(key.as_str()) {
            KeyOrigin::HostOwned => partition.host_owned.push(key.clone()),
            KeyOrigin::UserDefined => partition.user_defined.push(key.clone()),
        }
    }
    partition
}
