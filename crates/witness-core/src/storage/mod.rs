//! Storage layer for witness.
//!
//! A sled-based document store. Records are kept in creation order and carry
//! an optional expiry.

mod config;
mod engine;
mod record;

pub mod key;

pub use config::StorageConfig;
pub use engine::DocumentStore;
pub use key::RecordKey;
pub use record::StoredRecord;
