/* 📖 # What lives in prefscope_engine?

Everything between "organization + product + OS" and "classified entries plus a
dirty flag":

- `locator` resolves where the store lives, without I/O
- `reader` parses registry, property list and flat file stores into snapshots
- `probe` recovers each value's type by sentinel probing
- `monitor` watches the store and hands changes to the consumer's thread
- `accessor` composes them into the one facade a UI talks to

All I/O goes through the PAL from prefscope_base.
*/

pub mod accessor;
mod accessor_tests;
pub mod config;
pub mod locator;
pub mod monitor;
pub mod partition;
pub mod probe;
pub mod reader;
pub mod value;

pub use accessor::{PreferenceAccessor, PreferenceEntry};
pub use config::{AccessorConfig, load_config, parse_config};
pub use locator::{Platform, StoreDescriptor, StoreScope, locate_store};
pub use monitor::{ChangeListener, ChangeSignal, MonitorState, StoreMonitor, Suppression};
pub use partition::{HOST_KEY_PREFIXES, KeyOrigin, KeyPartition, key_origin, partition_keys};
pub use probe::{INT_SENTINEL, PreferenceLookup, STRING_SENTINEL, classify_and_read};
pub use reader::{StoreBackend, StoreReader, StoreSnapshot};
pub use value::{PreferenceKey, PreferenceValue, StoredValue};
