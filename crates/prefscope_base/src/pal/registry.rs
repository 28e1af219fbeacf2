/// Raw data of a single registry value, as far as preference stores use them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegistryData {
    /// `REG_SZ`
    String(String),
    /// `REG_BINARY`
    Binary(Vec<u8>),
    /// A 4-byte `REG_DWORD`
    Dword(u32),
    /// 8 bytes of data, stored either as `REG_QWORD` or as an oversized `REG_DWORD`
    Qword(u64),
}

/// A named value inside a registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryValue {
    pub name: String,
    pub data: RegistryData,
}

impl RegistryValue {
    pub fn new(name: impl Into<String>, data: RegistryData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}
