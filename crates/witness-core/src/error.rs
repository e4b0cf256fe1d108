//! Core error types.

use thiserror::Error;

/// Storage and execution errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Data model error.
    #[error("protocol error: {0}")]
    Protocol(#[from] witness_proto::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Key decoding error.
    #[error("invalid key format")]
    InvalidKey,

    /// A condition or stored row that cannot be translated.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Some records of an unordered batch could not be written. The rest were.
    #[error("{failed} of {total} records could not be written")]
    BatchWrite { failed: usize, total: usize },

    /// Invalid storage configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A blocking storage task panicked or was cancelled.
    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
