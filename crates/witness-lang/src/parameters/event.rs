use witness_proto::{keys, EntryKind, Query, QuerySession};

use super::{one_of, split_values};
use crate::error::ParameterError;
use crate::handler::{ParameterHandler, PendingConditions};

/// `a:break,place` restricts results to known event names.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventParameter;

impl ParameterHandler for EventParameter {
    fn name(&self) -> &str {
        "event"
    }

    fn aliases(&self) -> &[&'static str] {
        &["a", "event", "action"]
    }

    fn accepts_value(&self, value: &str) -> bool {
        let values = split_values(value);
        !values.is_empty() && values.iter().all(|v| EntryKind::is_known_event(v))
    }

    fn build_for_query(
        &self,
        _session: &QuerySession,
        _alias: &str,
        value: &str,
        query: &mut Query,
    ) -> Result<Option<PendingConditions>, ParameterError> {
        let events: Vec<String> = split_values(value)
            .into_iter()
            .map(str::to_ascii_lowercase)
            .collect();
        query.add_condition(one_of(keys::event_name(), events)?);
        Ok(None)
    }
}
