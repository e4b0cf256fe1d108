//! Compiles search arguments into a [`Query`].
//!
//! Compilation runs in two phases. The synchronous pass walks the tokens in
//! order, dispatching each to its handler, then injects defaults for
//! parameters the requester left out. Handlers that need a lookup return a
//! future instead of a condition; [`CompiledQuery::resolve`] awaits all of
//! them and appends their conditions in the order the tokens appeared.

use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use tracing::debug;
use witness_proto::{Query, QuerySession};

use crate::config::QueryConfig;
use crate::error::ParameterError;
use crate::flags::SelectionProvider;
use crate::handler::{DefaultUsed, FlagHandler, ParameterHandler, PendingConditions};
use crate::registry::HandlerRegistry;

/// Alias used for a parameter token without a `:`.
pub const DEFAULT_PARAMETER_ALIAS: &str = "p";

/// Split a raw argument string into tokens.
pub fn tokenize(arguments: &str) -> Vec<&str> {
    arguments.split_whitespace().collect()
}

/// The synchronous result of a compile, with lookups still outstanding.
pub struct CompiledQuery {
    query: Query,
    pending: Vec<PendingConditions>,
    defaults_used: Vec<DefaultUsed>,
    timeout: Duration,
}

impl CompiledQuery {
    /// Conditions known so far.
    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn defaults_used(&self) -> &[DefaultUsed] {
        &self.defaults_used
    }

    /// User-facing summary of the defaults applied, if any.
    pub fn defaults_notice(&self) -> Option<String> {
        if self.defaults_used.is_empty() {
            return None;
        }
        let used: Vec<String> = self.defaults_used.iter().map(ToString::to_string).collect();
        Some(format!("Defaults used: {}", used.join(" ")))
    }

    /// Await every outstanding lookup and return the finished query.
    ///
    /// Fails with the first lookup error, or with
    /// [`ParameterError::Timeout`] if the lookups take too long.
    pub async fn resolve(self) -> Result<Query, ParameterError> {
        let CompiledQuery {
            mut query,
            pending,
            timeout,
            ..
        } = self;
        if pending.is_empty() {
            return Ok(query);
        }

        let resolved = tokio::time::timeout(timeout, try_join_all(pending))
            .await
            .map_err(|_| ParameterError::Timeout(timeout))??;
        query.extend_conditions(resolved.into_iter().flatten());
        Ok(query)
    }
}

impl std::fmt::Debug for CompiledQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledQuery")
            .field("query", &self.query)
            .field("pending", &self.pending.len())
            .field("defaults_used", &self.defaults_used)
            .finish()
    }
}

/// Turns requester arguments into queries using a [`HandlerRegistry`].
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    registry: Arc<HandlerRegistry>,
    config: QueryConfig,
}

impl QueryBuilder {
    pub fn new(registry: Arc<HandlerRegistry>, config: QueryConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// A query with no conditions and the configured limit.
    pub fn empty_query(&self) -> Query {
        Query::new().with_limit(self.config.search_limit)
    }

    /// Install or remove the region selection flag. Ignored when the
    /// integration is disabled in config.
    pub fn set_selection_provider(&self, provider: Option<Arc<dyn SelectionProvider>>) {
        if provider.is_some() && !self.config.selection_integration {
            debug!("Region selection integration disabled by config");
            return;
        }
        self.registry.set_selection_provider(provider);
    }

    /// Compile `arguments` and store the finished query on the session.
    pub async fn from_arguments<S: AsRef<str>>(
        &self,
        session: &mut QuerySession,
        arguments: &[S],
    ) -> Result<Query, ParameterError> {
        let compiled = self.prepare(session, arguments)?;
        let query = compiled.resolve().await?;
        session.set_query(query.clone());
        Ok(query)
    }

    /// Run the synchronous pass over `arguments`.
    ///
    /// Flags may update `session`. The returned [`CompiledQuery`] still has
    /// to be resolved.
    pub fn prepare<S: AsRef<str>>(
        &self,
        session: &mut QuerySession,
        arguments: &[S],
    ) -> Result<CompiledQuery, ParameterError> {
        let parameters = self.registry.parameter_handlers();
        let flags = self.registry.flag_handlers();

        let mut query = self.empty_query();
        let mut pending = Vec::new();
        let mut defined: Vec<(String, String)> = Vec::new();

        for token in arguments.iter().map(|a| a.as_ref().trim()) {
            if token.is_empty() {
                continue;
            }

            if let Some(flag) = token.strip_prefix('-') {
                let (alias, value) = match flag.split_once('=') {
                    Some((alias, value)) => (alias, (!value.is_empty()).then_some(value)),
                    None => (flag, None),
                };
                pending.extend(self.apply_flag(&flags, session, alias, value, &mut query)?);
                continue;
            }

            let (alias, value) = token
                .split_once(':')
                .unwrap_or((DEFAULT_PARAMETER_ALIAS, token));
            if alias.is_empty() || value.is_empty() {
                let name = if alias.is_empty() { token } else { alias };
                return Err(ParameterError::EmptyValue(name.to_string()));
            }

            let handler = parameters
                .iter()
                .find(|h| h.handles(alias))
                .ok_or_else(|| ParameterError::UnknownParameter(alias.to_string()))?;
            if !handler.can_run(session.requester()) {
                return Err(ParameterError::NotAllowed(alias.to_string()));
            }
            if !handler.accepts_value(value) {
                return Err(ParameterError::invalid_value(alias, value));
            }
            if let Some((other_alias, other_value)) = defined
                .iter()
                .find(|(a, v)| handler.does_conflict((alias, value), (a.as_str(), v.as_str())))
            {
                return Err(ParameterError::Conflict {
                    alias: alias.to_string(),
                    value: value.to_string(),
                    other_alias: other_alias.clone(),
                    other_value: other_value.clone(),
                });
            }

            pending.extend(handler.build_for_query(session, alias, value, &mut query)?);

            match defined.iter_mut().find(|(a, _)| a.eq_ignore_ascii_case(alias)) {
                Some(entry) => entry.1 = value.to_string(),
                None => defined.push((alias.to_string(), value.to_string())),
            }
        }

        let defaults_used = if self.config.defaults_enabled {
            self.apply_defaults(&parameters, session, &defined, &mut query)?
        } else {
            Vec::new()
        };

        debug!(
            conditions = query.conditions().len(),
            pending = pending.len(),
            defaults = defaults_used.len(),
            "Compiled search arguments"
        );

        Ok(CompiledQuery {
            query,
            pending,
            defaults_used,
            timeout: self.config.compile_timeout,
        })
    }

    fn apply_flag(
        &self,
        flags: &[Arc<dyn FlagHandler>],
        session: &mut QuerySession,
        alias: &str,
        value: Option<&str>,
        query: &mut Query,
    ) -> Result<Option<PendingConditions>, ParameterError> {
        let handler = flags
            .iter()
            .find(|h| h.handles(alias))
            .ok_or_else(|| ParameterError::UnknownFlag(alias.to_string()))?;
        if !handler.accepts_source(session.requester()) {
            return Err(ParameterError::FlagNotAllowed(alias.to_string()));
        }
        if let Some(value) = value {
            if !handler.accepts_value(value) {
                return Err(ParameterError::invalid_value(alias, value));
            }
        }
        handler.process(session, alias, value, query)
    }

    fn apply_defaults(
        &self,
        parameters: &[Arc<dyn ParameterHandler>],
        session: &QuerySession,
        defined: &[(String, String)],
        query: &mut Query,
    ) -> Result<Vec<DefaultUsed>, ParameterError> {
        let mut used = Vec::new();

        for handler in parameters {
            let ignored = session.is_ignored_default(handler.name())
                || handler.aliases().iter().any(|a| session.is_ignored_default(a));
            let given = defined.iter().any(|(alias, _)| handler.handles(alias));
            if ignored || given {
                continue;
            }

            if let Some(default) = handler.process_default(session, query)? {
                debug!(handler = handler.name(), default = %default, "Applied search default");
                used.push(default);
            }
        }

        Ok(used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use witness_proto::{Requester, StaticPlayerDirectory};

    fn builder(config: QueryConfig) -> QueryBuilder {
        let directory = Arc::new(StaticPlayerDirectory::new());
        let registry = HandlerRegistry::with_builtins(&config, directory).unwrap();
        QueryBuilder::new(Arc::new(registry), config)
    }

    #[test]
    fn test_tokenize_drops_empty_tokens() {
        assert_eq!(tokenize("  a:break   -ng "), vec!["a:break", "-ng"]);
    }

    #[test]
    fn test_unknown_flag_and_parameter() {
        let builder = builder(QueryConfig::default());
        let mut session = QuerySession::new(Requester::console());

        let err = builder.prepare(&mut session, &["-zz"]).unwrap_err();
        assert_eq!(err.to_string(), "'zz' is not a valid flag. No handler was found.");

        let err = builder.prepare(&mut session, &["zz:1"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "'zz' is not a valid parameter. No handler was found."
        );
    }

    #[test]
    fn test_empty_value() {
        let builder = builder(QueryConfig::default());
        let mut session = QuerySession::new(Requester::console());

        let err = builder.prepare(&mut session, &["c:"]).unwrap_err();
        assert_eq!(err, ParameterError::EmptyValue("c".into()));
    }

    #[test]
    fn test_flag_value_validation() {
        let builder = builder(QueryConfig::default());
        let mut session = QuerySession::new(Requester::console());

        let err = builder.prepare(&mut session, &["-order=sideways"]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value 'sideways' for parameter 'order'");

        // An empty value after '=' is treated as no value.
        builder.prepare(&mut session, &["-ng="]).unwrap();
    }

    #[test]
    fn test_console_gets_time_default_only() {
        let builder = builder(QueryConfig::default());
        let mut session = QuerySession::new(Requester::console());

        let compiled = builder.prepare(&mut session, &["c:tnt"]).unwrap();
        assert_eq!(compiled.defaults_notice().as_deref(), Some("Defaults used: t:3d"));
        assert_eq!(compiled.query().conditions().len(), 2);
        assert_eq!(compiled.query().limit(), 2500);
    }

    #[test]
    fn test_defaults_disabled() {
        let builder = builder(QueryConfig::default().with_defaults_enabled(false));
        let mut session = QuerySession::new(Requester::console());

        let compiled = builder.prepare(&mut session, &["c:tnt"]).unwrap();
        assert_eq!(compiled.defaults_notice(), None);
        assert_eq!(compiled.query().conditions().len(), 1);
    }
}
