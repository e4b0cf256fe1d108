//! Data model error types.

use thiserror::Error;

/// Errors raised while building data model values.
///
/// These signal programmer errors (an invalid condition shape), not user input
/// problems; user input is validated by the handlers before anything here runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A condition was constructed with a value that does not fit its rule.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A key with no segments was used where a field path is required.
    #[error("empty data key")]
    EmptyKey,
}
