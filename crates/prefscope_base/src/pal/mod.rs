/* 📖 # What is the Platform Abstraction Layer?

The PAL is the single seam between prefscope and the operating system: file reads,
registry reads and change notifications all go through the `Pal` trait.
RealPal talks to std::fs, notify and (on Windows) the registry. MockPal keeps files
and registry subtrees in memory and lets tests fire change notifications by hand.
*/

mod file_path;
pub mod mock;
pub mod real_pal;
mod registry;
mod traits;

pub use file_path::FilePath;
pub use mock::MockPal;
pub use real_pal::RealPal;
pub use registry::{RegistryData, RegistryValue};
pub use traits::{FileChangeCallback, FileChangeEvent, Pal, PalHandle, ReadSeek, WatchHandle};
