/* 📖 # Where does each platform keep its preference store?

The location is a pure function of organization, product and OS family:

- Windows: registry key `HKEY_CURRENT_USER\SOFTWARE\Unity\UnityEditor\<org>\<product>`
  (`SOFTWARE\<org>\<product>` for standalone players)
- macOS: property list `~/Library/Preferences/unity.<org>.<product>.plist`
- Linux: flat prefs file `~/.config/unity3d/<org>/<product>/prefs`

File locations are produced relative to the home directory; resolving the home
directory is the PAL's job. Any other OS family yields `StoreDescriptor::Unsupported`,
which every other component treats as an empty store that cannot be watched.
*/

use std::fmt;

use serde::Deserialize;

use prefscope_base::FilePath;

/// OS family whose store layout should be used.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
    Unsupported(String),
}

impl Platform {
    /// The OS family this process runs on.
    pub fn detect() -> Self {
        Self::from_os_family(std::env::consts::OS)
    }

    /// Map an OS family name (as in `std::env::consts::OS`) to a platform.
    pub fn from_os_family(os: &str) -> Self {
        match os.to_ascii_lowercase().as_str() {
            "windows" => Platform::Windows,
            "macos" | "osx" => Platform::MacOs,
            "linux" => Platform::Linux,
            _ => Platform::Unsupported(os.to_string()),
        }
    }
}

impl From<String> for Platform {
    fn from(os: String) -> Self {
        Self::from_os_family(&os)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Windows => f.write_str("windows"),
            Platform::MacOs => f.write_str("macos"),
            Platform::Linux => f.write_str("linux"),
            Platform::Unsupported(os) => write!(f, "{} (unsupported)", os),
        }
    }
}

/// Whose preferences to inspect. Only the Windows registry path differs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreScope {
    #[default]
    Editor,
    Player,
}

/// Immutable description of where a store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreDescriptor {
    /// Registry key below `HKEY_CURRENT_USER`.
    Registry { key_path: String },
    /// Property list file, relative to the home directory.
    PropertyList { path: FilePath },
    /// Flat prefs file, relative to the home directory.
    FlatFile { path: FilePath },
    /// No known store layout for this OS family.
    Unsupported { platform: String },
}

impl StoreDescriptor {
    pub fn is_supported(&self) -> bool {
        !matches!(self, StoreDescriptor::Unsupported { .. })
    }

    /// Human readable location, e.g. `~/.config/unity3d/Acme/Game/prefs`.
    pub fn display_location(&self) -> String {
        match self {
            StoreDescriptor::Registry { key_path } => format!("<CurrentUser>\\{}", key_path),
            StoreDescriptor::PropertyList { path } | StoreDescriptor::FlatFile { path } => {
                format!("~/{}", path)
            }
            StoreDescriptor::Unsupported { platform } => {
                format!("<no preference store on {}>", platform)
            }
        }
    }
}

/// Resolve the store location for an application. Performs no I/O.
pub fn locate_store(
    organization: &str,
    product: &str,
    platform: &Platform,
    scope: StoreScope,
) -> StoreDescriptor {
    match platform {
        Platform::Windows => {
            let key_path = match scope {
                StoreScope::Editor => {
                    format!("SOFTWARE\\Unity\\UnityEditor\\{}\\{}", organization, product)
                }
                StoreScope::Player => format!("SOFTWARE\\{}\\{}", organization, product),
            };
            StoreDescriptor::Registry { key_path }
        }
        Platform::MacOs => StoreDescriptor::PropertyList {
            path: FilePath::from(format!(
                "Library/Preferences/unity.{}.{}.plist",
                organization, product
            )),
        },
        Platform::Linux => StoreDescriptor::FlatFile {
            path: FilePath::from(".config/unity3d")
                .join(organization)
                .join(product)
                .join("prefs"),
        },
        Platform::Unsupported(os) => StoreDescriptor::Unsupported {
            platform: os.clone(),
        },
    }
}
