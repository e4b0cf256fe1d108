//! Error types for search compilation and handler registration.

use std::time::Duration;

use thiserror::Error;

/// A search could not be compiled.
///
/// Messages are user-facing and are relayed to the requester verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("'{0}' is not a valid flag. No handler was found.")]
    UnknownFlag(String),

    #[error("'{0}' cannot be used by this command source.")]
    FlagNotAllowed(String),

    #[error("Invalid value '{value}' for parameter '{alias}'")]
    InvalidValue { alias: String, value: String },

    #[error("Flag '{0}' requires a value")]
    MissingFlagValue(String),

    #[error("Invalid empty value for parameter '{0}'")]
    EmptyValue(String),

    #[error("'{0}' is not a valid parameter. No handler was found.")]
    UnknownParameter(String),

    #[error("'{0}' cannot be run as the current command source")]
    NotAllowed(String),

    #[error("Parameter '{alias}:{value}' conflicts with other parameter: '{other_alias}:{other_value}'")]
    Conflict {
        alias: String,
        value: String,
        other_alias: String,
        other_value: String,
    },

    /// A handler could not resolve its value, e.g. an unknown player name.
    #[error("{0}")]
    Resolution(String),

    #[error("Timed out after {}s while resolving search parameters", .0.as_secs())]
    Timeout(Duration),

    #[error("invalid condition: {0}")]
    Condition(#[from] witness_proto::Error),
}

impl ParameterError {
    pub fn invalid_value(alias: impl Into<String>, value: impl Into<String>) -> Self {
        ParameterError::InvalidValue {
            alias: alias.into(),
            value: value.into(),
        }
    }

    pub fn resolution(message: impl Into<String>) -> Self {
        ParameterError::Resolution(message.into())
    }
}

/// A handler could not be registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("alias '{alias}' of handler '{handler}' is already registered by '{existing}'")]
    AliasConflict {
        alias: String,
        handler: String,
        existing: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            ParameterError::UnknownFlag("zz".into()).to_string(),
            "'zz' is not a valid flag. No handler was found."
        );
        assert_eq!(
            ParameterError::Conflict {
                alias: "a".into(),
                value: "1".into(),
                other_alias: "b".into(),
                other_value: "2".into(),
            }
            .to_string(),
            "Parameter 'a:1' conflicts with other parameter: 'b:2'"
        );
        assert_eq!(
            ParameterError::Timeout(Duration::from_secs(10)).to_string(),
            "Timed out after 10s while resolving search parameters"
        );
    }
}
