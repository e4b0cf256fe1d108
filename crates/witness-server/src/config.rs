//! Server configuration.
//!
//! Settings come from built-in defaults, then an optional TOML file, then
//! command-line overrides.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use clap::Parser;
use serde::Deserialize;
use uuid::Uuid;
use witness_core::StorageConfig;
use witness_lang::QueryConfig;
use witness_proto::parse_duration;

use crate::error::Error;

/// Default bound on one search, compile included, in seconds.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

/// Default interval between write-queue flushes, in milliseconds.
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 1000;

/// Witness server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Document store and record handler settings.
    pub storage: StorageConfig,

    /// Search compiler settings.
    pub query: QueryConfig,

    /// Upper bound on one search at the command boundary.
    pub query_timeout: Duration,

    /// Cadence of the write-queue flush task.
    pub flush_interval: Duration,

    /// Time zone used to bucket grouped results.
    pub time_zone: FixedOffset,

    /// Known players, by name.
    pub players: BTreeMap<String, Uuid>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            query: QueryConfig::default(),
            query_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
            flush_interval: Duration::from_millis(DEFAULT_FLUSH_INTERVAL_MS),
            time_zone: utc(),
            players: BTreeMap::new(),
        }
    }
}

impl ServerConfig {
    /// Create a configuration storing data under `data_path`.
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            storage: StorageConfig::new(data_path),
            ..Default::default()
        }
    }

    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_query(mut self, query: QueryConfig) -> Self {
        self.query = query;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    pub fn with_time_zone(mut self, time_zone: FixedOffset) -> Self {
        self.time_zone = time_zone;
        self
    }

    /// Register a known player.
    pub fn with_player(mut self, name: impl Into<String>, id: Uuid) -> Self {
        self.players.insert(name.into(), id);
        self
    }

    /// Load `path` and layer it over the defaults.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Parse a TOML document and layer it over the defaults.
    pub fn from_toml(text: &str) -> Result<Self, Error> {
        let file: FileConfig =
            toml::from_str(text).map_err(|e| Error::Config(e.message().to_string()))?;
        let mut config = Self::default();
        file.apply(&mut config)?;
        Ok(config)
    }

    /// Check settings that are only parsed on use.
    pub fn validate(&self) -> Result<(), Error> {
        self.storage.expiry()?;
        if parse_duration(&self.query.default_search_time).is_none() {
            return Err(Error::Config(format!(
                "invalid default search time '{}'",
                self.query.default_search_time
            )));
        }
        if self.flush_interval.is_zero() {
            return Err(Error::Config("flush interval must be positive".into()));
        }
        Ok(())
    }
}

/// On-disk layout of the TOML configuration file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    storage: StorageSection,
    query: QuerySection,
    server: ServerSection,
    players: BTreeMap<String, Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StorageSection {
    handler: Option<String>,
    path: Option<PathBuf>,
    collection: Option<String>,
    record_expiry: Option<String>,
    cache_capacity: Option<u64>,
    compression: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct QuerySection {
    defaults_enabled: Option<bool>,
    default_radius: Option<u32>,
    radius_limit: Option<u32>,
    default_search_time: Option<String>,
    search_limit: Option<usize>,
    compile_timeout_secs: Option<u64>,
    selection_integration: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ServerSection {
    query_timeout_secs: Option<u64>,
    flush_interval_ms: Option<u64>,
    utc_offset_minutes: Option<i32>,
}

impl FileConfig {
    fn apply(self, config: &mut ServerConfig) -> Result<(), Error> {
        let storage = &mut config.storage;
        if let Some(handler) = self.storage.handler {
            storage.handler = handler;
        }
        if let Some(path) = self.storage.path {
            storage.path = path;
        }
        if let Some(collection) = self.storage.collection {
            storage.collection = collection;
        }
        if let Some(expiry) = self.storage.record_expiry {
            storage.record_expiry = expiry;
        }
        if let Some(capacity) = self.storage.cache_capacity {
            storage.cache_capacity = capacity;
        }
        if let Some(compression) = self.storage.compression {
            storage.compression = compression;
        }

        let query = &mut config.query;
        if let Some(enabled) = self.query.defaults_enabled {
            query.defaults_enabled = enabled;
        }
        if let Some(radius) = self.query.default_radius {
            query.default_radius = radius;
        }
        if let Some(limit) = self.query.radius_limit {
            query.radius_limit = limit;
        }
        if let Some(time) = self.query.default_search_time {
            query.default_search_time = time;
        }
        if let Some(limit) = self.query.search_limit {
            query.search_limit = limit;
        }
        if let Some(secs) = self.query.compile_timeout_secs {
            query.compile_timeout = Duration::from_secs(secs);
        }
        if let Some(enabled) = self.query.selection_integration {
            query.selection_integration = enabled;
        }

        if let Some(secs) = self.server.query_timeout_secs {
            config.query_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = self.server.flush_interval_ms {
            config.flush_interval = Duration::from_millis(ms);
        }
        if let Some(minutes) = self.server.utc_offset_minutes {
            config.time_zone = minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or_else(|| Error::Config(format!("invalid UTC offset {minutes}m")))?;
        }

        config.players.extend(self.players);
        Ok(())
    }
}

fn utc() -> FixedOffset {
    Utc.fix()
}

/// Command-line arguments for the server.
#[derive(Parser, Debug)]
#[command(name = "witness")]
#[command(version, about = "Witness audit search server", long_about = None)]
pub struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to the database storage directory.
    #[arg(short, long)]
    pub data_path: Option<PathBuf>,

    /// How long records are kept (e.g. "4w", "30d").
    #[arg(long)]
    pub record_expiry: Option<String>,

    /// Search timeout in seconds.
    #[arg(long)]
    pub query_timeout: Option<u64>,

    /// Disable default search parameters.
    #[arg(long)]
    pub no_defaults: bool,
}

impl Args {
    /// Build the effective configuration.
    pub fn into_config(self) -> Result<ServerConfig, Error> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };

        if let Some(path) = self.data_path {
            config.storage.path = path;
        }
        if let Some(expiry) = self.record_expiry {
            config.storage.record_expiry = expiry;
        }
        if let Some(secs) = self.query_timeout {
            config.query_timeout = Duration::from_secs(secs);
        }
        if self.no_defaults {
            config.query.defaults_enabled = false;
        }

        config.validate()?;
        Ok(config)
    }
}
