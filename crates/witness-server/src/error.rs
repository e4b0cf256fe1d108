//! Server error types.

use std::time::Duration;

use thiserror::Error;

/// Server errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] witness_core::Error),

    /// Data model error.
    #[error("protocol error: {0}")]
    Protocol(#[from] witness_proto::Error),

    /// Search argument error. The message is safe to show to the requester.
    #[error(transparent)]
    Parameter(#[from] witness_lang::ParameterError),

    /// Handler registration error.
    #[error("registry error: {0}")]
    Registry(#[from] witness_lang::RegistryError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A search ran longer than the configured query timeout.
    #[error("search timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
