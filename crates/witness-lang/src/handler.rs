//! Parameter and flag handler contracts.
//!
//! A parameter is a `alias:value` token; a flag is a `-alias[=value]` token.
//! Handlers add conditions to the query being compiled, either directly or by
//! returning a [`PendingConditions`] future for work that needs a lookup.

use std::fmt;

use futures::future::BoxFuture;
use witness_proto::{Query, QuerySession, Requester, SearchCondition};

use crate::error::ParameterError;

/// Conditions produced by an asynchronous lookup.
///
/// The compiler appends them to the query, in handler order, once every
/// pending lookup has resolved.
pub type PendingConditions = BoxFuture<'static, Result<Vec<SearchCondition>, ParameterError>>;

/// A default a parameter handler applied on the requester's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultUsed {
    pub alias: String,
    pub value: String,
}

impl DefaultUsed {
    pub fn new(alias: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for DefaultUsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.alias, self.value)
    }
}

/// Handles one `alias:value` search parameter.
pub trait ParameterHandler: Send + Sync {
    /// Stable name, used to ignore this handler's default.
    fn name(&self) -> &str;

    /// Aliases this handler answers to. Unique across a registry.
    fn aliases(&self) -> &[&'static str];

    fn handles(&self, alias: &str) -> bool {
        self.aliases().iter().any(|a| a.eq_ignore_ascii_case(alias))
    }

    fn can_run(&self, _requester: &Requester) -> bool {
        true
    }

    fn accepts_value(&self, value: &str) -> bool;

    /// Check if `candidate` may not be combined with an already defined
    /// parameter. Both are `(alias, value)` pairs.
    fn does_conflict(&self, _candidate: (&str, &str), _existing: (&str, &str)) -> bool {
        false
    }

    /// Add this parameter's conditions to `query`.
    fn build_for_query(
        &self,
        session: &QuerySession,
        alias: &str,
        value: &str,
        query: &mut Query,
    ) -> Result<Option<PendingConditions>, ParameterError>;

    /// Apply this handler's default when the requester gave none of its
    /// aliases. Returns what was applied, if anything.
    fn process_default(
        &self,
        _session: &QuerySession,
        _query: &mut Query,
    ) -> Result<Option<DefaultUsed>, ParameterError> {
        Ok(None)
    }
}

/// Handles one `-alias[=value]` search flag.
pub trait FlagHandler: Send + Sync {
    fn name(&self) -> &str;

    fn aliases(&self) -> &[&'static str];

    fn handles(&self, alias: &str) -> bool {
        self.aliases().iter().any(|a| a.eq_ignore_ascii_case(alias))
    }

    fn accepts_source(&self, _requester: &Requester) -> bool {
        true
    }

    /// Only consulted when the token carried a value.
    fn accepts_value(&self, _value: &str) -> bool {
        false
    }

    fn process(
        &self,
        session: &mut QuerySession,
        alias: &str,
        value: Option<&str>,
        query: &mut Query,
    ) -> Result<Option<PendingConditions>, ParameterError>;
}
