/* 📖 # Why is the CLI minimal and hardcoded?

There is no argument parsing. `prefscope` reads `prefscope.toml` from the current
directory, locates the store below the home directory and prints every classified
entry, user-defined keys first.

With `watch_on_start = true` it keeps running and reprints the listing whenever the
store changes, polling the change flag every 200 ms the way a UI would once per
frame. Stop it with Ctrl-C.

Exit codes:
- 0: Listing printed
- 1: Configuration missing or invalid, or no home directory
*/

use std::env;
use std::process;
use std::thread;
use std::time::Duration;

use prefscope_base::tracing::init_tracing;
use prefscope_base::{FilePath, PalHandle, RealPal};
use prefscope_engine::{PreferenceAccessor, PreferenceKey, PreferenceValue, load_config, partition_keys};
use tracing::debug;

const TICK: Duration = Duration::from_millis(200);

fn main() {
    if let Err(e) = init_tracing() {
        eprintln!("Warning: {}", e);
    }

    let current_dir = env::current_dir().unwrap_or_else(|e| {
        eprintln!("Error: Failed to get current directory: {}", e);
        process::exit(1);
    });
    let config_pal = PalHandle::new(RealPal::new(current_dir));
    let config = match load_config(&config_pal, &FilePath::from("prefscope.toml")) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config from prefscope.toml: {}", e);
            process::exit(1);
        }
    };

    let store_pal = match RealPal::for_home_dir() {
        Ok(pal) => PalHandle::new(pal),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let mut accessor = PreferenceAccessor::new(store_pal, &config);
    println!(
        "{} / {} on {}: {}",
        config.organization,
        config.product,
        config.platform,
        accessor.descriptor().display_location()
    );
    print_store(&mut accessor, false);

    if !accessor.is_monitoring() {
        if config.watch_on_start {
            eprintln!("Warning: the store cannot be watched, exiting");
        }
        return;
    }

    println!("\nWatching for changes (Ctrl-C to stop)");
    loop {
        thread::sleep(TICK);
        if accessor.take_pending_change() {
            debug!("store changed, reloading");
            println!("\n--- store changed ---");
            print_store(&mut accessor, true);
        }
    }
}

fn print_store(accessor: &mut PreferenceAccessor, reload: bool) {
    let keys = accessor.list_keys(reload);
    if accessor.is_stale() {
        println!("(store could not be read, showing last good snapshot)");
    }
    if keys.is_empty() {
        println!("No preferences found.");
        return;
    }
    let partition = partition_keys(&keys);
    for (title, group) in [
        ("User-defined", &partition.user_defined),
        ("Host-owned", &partition.host_owned),
    ] {
        let values: Vec<(&PreferenceKey, PreferenceValue)> = group
            .iter()
            .filter_map(|key| Some((key, accessor.classify_and_read(key.as_str())?)))
            .collect();
        if values.is_empty() {
            continue;
        }
        println!("\n{} ({}):", title, values.len());
        for (key, value) in values {
            println!("  {} [{}] = {}", key, value.type_name(), value);
        }
    }
}
