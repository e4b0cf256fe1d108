//! The search command boundary.
//!
//! Compiles requester arguments, runs the query against the record handler
//! and turns every failure into a message that is safe to show back.

use std::sync::Arc;
use std::time::Duration;

use chrono::FixedOffset;
use tracing::{debug, error, warn};
use witness_core::RecordHandler;
use witness_lang::{tokenize, QueryBuilder};
use witness_proto::{keys, DataEntry, DataKey, DataValue, QuerySession, Requester};

use crate::error::Error;

/// Shown when a search fails for a reason the requester cannot fix.
pub const GENERIC_FAILURE: &str = "An error occurred while searching. See the server log.";

/// Rows returned by a successful search.
#[derive(Debug, Clone)]
pub struct SearchResults {
    pub entries: Vec<DataEntry>,
    /// Summary of the default parameters that were applied.
    pub defaults_notice: Option<String>,
}

/// Compiles and executes searches on behalf of requesters.
pub struct SearchCommand {
    builder: QueryBuilder,
    handler: Arc<dyn RecordHandler>,
    query_timeout: Duration,
    time_zone: FixedOffset,
}

impl SearchCommand {
    pub fn new(
        builder: QueryBuilder,
        handler: Arc<dyn RecordHandler>,
        query_timeout: Duration,
        time_zone: FixedOffset,
    ) -> Self {
        Self {
            builder,
            handler,
            query_timeout,
            time_zone,
        }
    }

    pub fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    /// Run one search.
    ///
    /// Argument errors are returned verbatim. Anything else is logged and
    /// replaced by [`GENERIC_FAILURE`].
    pub async fn run(
        &self,
        requester: Requester,
        arguments: &str,
    ) -> Result<SearchResults, String> {
        let name = requester.name().to_string();
        let outcome = tokio::time::timeout(self.query_timeout, self.execute(requester, arguments))
            .await
            .unwrap_or(Err(Error::Timeout(self.query_timeout)));

        match outcome {
            Ok(results) => {
                debug!(requester = %name, rows = results.entries.len(), "Search complete");
                Ok(results)
            }
            Err(Error::Parameter(e)) => Err(e.to_string()),
            Err(e @ Error::Timeout(_)) => {
                warn!(requester = %name, arguments, "Search timed out");
                Err(e.to_string())
            }
            Err(e) => {
                error!(requester = %name, arguments, error = %e, "Search failed");
                Err(GENERIC_FAILURE.to_string())
            }
        }
    }

    async fn execute(&self, requester: Requester, arguments: &str) -> Result<SearchResults, Error> {
        let mut session = QuerySession::new(requester).with_time_zone(self.time_zone);

        let compiled = self.builder.prepare(&mut session, &tokenize(arguments))?;
        let defaults_notice = compiled.defaults_notice();
        let query = compiled.resolve().await?;
        session.set_query(query);

        let entries = self.handler.query(&session).await?;
        Ok(SearchResults {
            entries,
            defaults_notice,
        })
    }
}

/// One line of human-readable output for `entry`.
pub fn describe(entry: &DataEntry) -> String {
    let data = entry.data();
    let field = |key: &DataKey| data.get(key).map(text);

    let mut line = match entry.as_aggregate() {
        Some(aggregate) => format!("{}x {}", aggregate.count, entry.event()),
        None => entry.event().to_string(),
    };
    for key in [keys::cause(), DataKey::of(keys::TARGET), DataKey::of(keys::ENTITY_TYPE)] {
        if let Some(value) = field(&key) {
            line.push(' ');
            line.push_str(&value);
        }
    }
    if let Some(message) = field(&keys::message()) {
        line.push_str(&format!(" \"{message}\""));
    }

    match entry.as_aggregate() {
        Some(aggregate) => line.push_str(&format!(" ({})", aggregate.date.format("%Y-%m-%d"))),
        None => {
            let axes: Option<Vec<String>> = [keys::X, keys::Y, keys::Z]
                .into_iter()
                .map(|axis| field(&keys::location(axis)))
                .collect();
            if let (Some(world), Some(axes)) = (field(&keys::location(keys::WORLD)), axes) {
                line.push_str(&format!(" at {world} {}", axes.join(",")));
            }
            if let Some(created) = data.get(&keys::created()).and_then(DataValue::as_timestamp) {
                line.push_str(&format!(" ({})", created.format("%Y-%m-%d %H:%M:%S")));
            }
        }
    }
    line
}

fn text(value: &DataValue) -> String {
    match value {
        DataValue::Bool(b) => b.to_string(),
        DataValue::Int(i) => i.to_string(),
        DataValue::Float(f) => f.to_string(),
        DataValue::String(s) => s.clone(),
        DataValue::Timestamp(ts) => ts.to_rfc3339(),
        DataValue::Wrapper(_) => "{..}".to_string(),
        DataValue::List(items) => items.iter().map(text).collect::<Vec<_>>().join(","),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use witness_proto::DataWrapper;

    #[test]
    fn test_describe_record() {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let entry = DataEntry::record(
            "break",
            DataWrapper::new()
                .with("cause", "tnt")
                .with("target", "stone")
                .with("created", created)
                .with("location.world", "world")
                .with("location.x", 10)
                .with("location.y", 64.0)
                .with("location.z", -3),
        );
        assert_eq!(describe(&entry), "break tnt stone at world 10,64,-3 (2024-05-01 12:30:00)");
    }

    #[test]
    fn test_describe_aggregate() {
        let date = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 1, 0, 0, 0)
            .unwrap();
        let entry = DataEntry::aggregate(
            "say",
            DataWrapper::new().with("cause", "Alice").with("message", "hi"),
            date,
            3,
        );
        assert_eq!(describe(&entry), "3x say Alice \"hi\" (2024-05-01)");
    }
}
