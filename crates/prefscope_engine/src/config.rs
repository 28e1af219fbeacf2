use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, instrument};

use prefscope_base::{FilePath, PalHandle, PrefsError, PrefsResult, ResultExt};

use crate::locator::{Platform, StoreScope};

/// Everything needed to construct a [`crate::PreferenceAccessor`].
///
/// Passed once into the accessor; changing any field means building a new accessor.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessorConfig {
    /// Organization (company) name of the application.
    pub organization: String,
    /// Product name of the application.
    pub product: String,
    /// OS family whose store layout is used. Defaults to the running OS.
    #[serde(default = "Platform::detect")]
    pub platform: Platform,
    #[serde(default)]
    pub scope: StoreScope,
    /// Quiet period used to coalesce bursts of file events.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Interval between registry polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Start monitoring as soon as the accessor is constructed.
    #[serde(default)]
    pub watch_on_start: bool,
}

fn default_debounce_ms() -> u64 {
    250
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl AccessorConfig {
    /// Config for the running OS with default timings.
    pub fn new(organization: impl Into<String>, product: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            product: product.into(),
            platform: Platform::detect(),
            scope: StoreScope::default(),
            debounce_ms: default_debounce_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            watch_on_start: false,
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_watch_on_start(mut self, watch_on_start: bool) -> Self {
        self.watch_on_start = watch_on_start;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Parse an [`AccessorConfig`] from TOML text.
pub fn parse_config(text: &str) -> PrefsResult<AccessorConfig> {
    let config: AccessorConfig = toml::from_str(text)
        .map_err(|e| Box::new(PrefsError::parse("configuration", e.to_string())))?;
    if config.organization.trim().is_empty() || config.product.trim().is_empty() {
        prefscope_base::bail!("organization and product must not be empty");
    }
    Ok(config)
}

/// Load an [`AccessorConfig`] from a TOML file read through the PAL.
#[instrument(skip(pal), fields(path = %path))]
pub fn load_config(pal: &PalHandle, path: &FilePath) -> PrefsResult<AccessorConfig> {
    let text = pal
        .read_file_to_string(path)
        .with_context(|| format!("reading configuration {}", path))?;
    let config = parse_config(&text).with_context(|| format!("loading configuration {}", path))?;
    debug!(organization = %config.organization, product = %config.product, platform = %config.platform, "configuration loaded");
    Ok(config)
}
