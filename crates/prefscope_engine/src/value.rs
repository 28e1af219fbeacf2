use std::borrow::Borrow;
use std::fmt;

/// Name of a preference, unique within one store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PreferenceKey(String);

impl PreferenceKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PreferenceKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PreferenceKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for PreferenceKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A classified preference value. Exactly one variant applies per key.
///
/// Floats are single precision, as the host preference API exposes them.
#[derive(Debug, Clone, PartialEq)]
pub enum PreferenceValue {
    String(String),
    Int(i32),
    Float(f32),
}

impl PreferenceValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            PreferenceValue::String(_) => "string",
            PreferenceValue::Int(_) => "int",
            PreferenceValue::Float(_) => "float",
        }
    }
}

impl fmt::Display for PreferenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreferenceValue::String(s) => write!(f, "{:?}", s),
            PreferenceValue::Int(i) => write!(f, "{}", i),
            PreferenceValue::Float(v) => write!(f, "{}", v),
        }
    }
}

/// A value as a backend found it in the store, before any classification.
///
/// `Other` covers records the host API cannot read back through any of its typed
/// getters (booleans, arrays, out-of-range integers, ...).
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    String(String),
    Int(i32),
    Float(f32),
    Other { type_name: String },
}
