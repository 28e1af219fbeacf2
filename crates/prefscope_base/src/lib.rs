/* 📖 # Why have prefscope_base as a core library?
prefscope_base holds the error type, the tracing setup and the Platform Abstraction
Layer. The engine never touches std::fs, notify or the registry directly, which keeps
every store backend testable against the in-memory PAL.
*/

pub mod error;
pub mod pal;
pub mod tracing;

// Re-export commonly used types for convenience
pub use error::{ErrorKind, PrefsError, PrefsResult, ResultExt};
pub use pal::{FilePath, MockPal, Pal, PalHandle, RealPal, RegistryData, RegistryValue, WatchHandle};
