//! Configuration loading and typed config structures for Warden.
//!
//! The canonical configuration lives in `warden-config.yaml` at the project
//! root. Every section and field has a default, so an empty file (or no
//! file at all) yields a working configuration with no regions.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;
use warden_query::RegionQuery;
use warden_regions::{RegionDefinition, RegionError, RegionIndex, WorldRegions};
use warden_session::SessionSettings;
use warden_types::FlagRegistry;

/// Environment variable overriding [`DriverConfig::tick_interval_ms`].
pub const TICK_INTERVAL_ENV: &str = "WARDEN_TICK_INTERVAL_MS";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A world's region definitions are inconsistent.
    #[error("invalid regions in world {world}: {source}")]
    Regions {
        /// The world being built.
        world: String,
        /// What was wrong with its regions.
        source: RegionError,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `warden-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WardenConfig {
    /// Session and bypass cache tuning.
    #[serde(default)]
    pub sessions: SessionsConfig,

    /// Tick driver settings.
    #[serde(default)]
    pub driver: DriverConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Region definitions keyed by world name.
    #[serde(default)]
    pub worlds: BTreeMap<String, WorldConfig>,
}

impl WardenConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `WARDEN_TICK_INTERVAL_MS` overrides `driver.tick_interval_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, applying environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in
    /// production).
    ///
    /// Values that do not parse are logged and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = lookup(TICK_INTERVAL_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.driver.tick_interval_ms = ms,
                Err(error) => {
                    warn!(variable = TICK_INTERVAL_ENV, value = %raw, %error, "ignoring invalid override");
                }
            }
        }
    }

    /// Build the region index for every configured world.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Regions`] naming the first world whose
    /// definitions are inconsistent.
    pub fn build_index(&self, registry: &FlagRegistry) -> Result<RegionIndex, ConfigError> {
        let mut index = RegionIndex::new();
        for (name, world) in &self.worlds {
            let regions = WorldRegions::from_definitions(&world.regions, registry).map_err(|source| {
                ConfigError::Regions {
                    world: name.clone(),
                    source,
                }
            })?;
            index.insert_world(name, regions);
        }
        Ok(index)
    }

    /// Build a region query over every configured world.
    ///
    /// # Errors
    ///
    /// See [`WardenConfig::build_index`].
    pub fn build_query(&self, registry: &FlagRegistry) -> Result<RegionQuery, ConfigError> {
        Ok(RegionQuery::new(std::sync::Arc::new(self.build_index(registry)?)))
    }

    /// Cache tuning for the session manager.
    pub const fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            session_idle_timeout: Duration::from_secs(self.sessions.idle_timeout_secs),
            bypass_ttl: Duration::from_millis(self.sessions.bypass_ttl_ms),
            bypass_max_entries: self.sessions.bypass_max_entries,
        }
    }
}

/// Session and bypass cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionsConfig {
    /// Seconds an unused session is kept.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Milliseconds a bypass answer is served before asking again.
    #[serde(default = "default_bypass_ttl_ms")]
    pub bypass_ttl_ms: u64,

    /// Upper bound on cached bypass answers.
    #[serde(default = "default_bypass_max_entries")]
    pub bypass_max_entries: usize,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout_secs(),
            bypass_ttl_ms: default_bypass_ttl_ms(),
            bypass_max_entries: default_bypass_max_entries(),
        }
    }
}

/// Tick driver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DriverConfig {
    /// Real-time milliseconds between session ticks (20 game ticks).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Stop after this many ticks (0 = run until stopped).
    #[serde(default)]
    pub max_ticks: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: 0,
        }
    }
}

impl DriverConfig {
    /// The tick interval as a [`Duration`].
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// The regions of one world.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Region definitions, including an optional `__global__` entry.
    #[serde(default)]
    pub regions: Vec<RegionDefinition>,
}

const fn default_idle_timeout_secs() -> u64 {
    600
}

const fn default_bypass_ttl_ms() -> u64 {
    2000
}

const fn default_bypass_max_entries() -> usize {
    1000
}

const fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    String::from("info")
}
