//! Storage configuration.

use std::path::PathBuf;

use chrono::{Duration, Utc};
use witness_proto::parse_duration;

use crate::error::Error;

/// Configuration for the document store and record handler.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Record handler implementation to use.
    pub handler: String,

    /// Path to the database directory.
    pub path: PathBuf,

    /// Name of the tree holding records.
    pub collection: String,

    /// Page cache capacity in bytes.
    pub cache_capacity: u64,

    /// Flush interval in milliseconds. None means flush on every write.
    pub flush_every_ms: Option<u64>,

    /// Enable zstd compression.
    pub compression: bool,

    /// Temporary database (deleted on drop).
    pub temporary: bool,

    /// How long records are kept, as a duration string such as `4w`.
    pub record_expiry: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            handler: "sled".to_string(),
            path: PathBuf::from("./witness_data"),
            collection: "records".to_string(),
            cache_capacity: 256 * 1024 * 1024,
            flush_every_ms: Some(1000),
            compression: true,
            temporary: false,
            record_expiry: "4w".to_string(),
        }
    }
}

impl StorageConfig {
    /// Create a new configuration with the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Create a temporary configuration for testing.
    pub fn temporary() -> Self {
        Self {
            path: PathBuf::from(""),
            temporary: true,
            ..Default::default()
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_record_expiry(mut self, expiry: impl Into<String>) -> Self {
        self.record_expiry = expiry.into();
        self
    }

    pub fn with_cache_capacity(mut self, bytes: u64) -> Self {
        self.cache_capacity = bytes;
        self
    }

    /// Parsed [`record_expiry`](Self::record_expiry).
    ///
    /// An expiry that cannot be added to the current time is rejected.
    pub fn expiry(&self) -> Result<Duration, Error> {
        parse_duration(&self.record_expiry)
            .filter(|expiry| Utc::now().checked_add_signed(*expiry).is_some())
            .ok_or_else(|| {
                Error::Config(format!("invalid record expiry '{}'", self.record_expiry))
            })
    }

    /// Convert to sled configuration.
    pub(crate) fn to_sled_config(&self) -> sled::Config {
        let mut config = sled::Config::new()
            .cache_capacity(self.cache_capacity)
            .use_compression(self.compression);

        if self.temporary {
            config = config.temporary(true);
        } else {
            config = config.path(&self.path);
        }

        if let Some(ms) = self.flush_every_ms {
            config = config.flush_every_ms(Some(ms));
        }

        config
    }
}
