use chrono::{DateTime, Utc};
use witness_proto::{keys, parse_duration, FieldCondition, MatchRule, Query, QuerySession};

use crate::error::ParameterError;
use crate::handler::{DefaultUsed, ParameterHandler, PendingConditions};

/// `t:3d` restricts results to records created within the given window.
#[derive(Debug, Clone)]
pub struct TimeParameter {
    default_time: String,
}

impl TimeParameter {
    pub fn new(default_time: impl Into<String>) -> Self {
        Self {
            default_time: default_time.into(),
        }
    }

    fn apply(&self, alias: &str, value: &str, query: &mut Query) -> Result<(), ParameterError> {
        let cutoff = cutoff(value).ok_or_else(|| ParameterError::invalid_value(alias, value))?;
        query.add_condition(FieldCondition::of(
            keys::created(),
            MatchRule::GreaterThanEqual,
            cutoff,
        )?);
        Ok(())
    }
}

/// Start of the window `value` ending now, if it is representable.
fn cutoff(value: &str) -> Option<DateTime<Utc>> {
    Utc::now().checked_sub_signed(parse_duration(value)?)
}

impl ParameterHandler for TimeParameter {
    fn name(&self) -> &str {
        "time"
    }

    fn aliases(&self) -> &[&'static str] {
        &["t", "time", "since"]
    }

    fn accepts_value(&self, value: &str) -> bool {
        cutoff(value).is_some()
    }

    fn build_for_query(
        &self,
        _session: &QuerySession,
        alias: &str,
        value: &str,
        query: &mut Query,
    ) -> Result<Option<PendingConditions>, ParameterError> {
        self.apply(alias, value, query)?;
        Ok(None)
    }

    fn process_default(
        &self,
        _session: &QuerySession,
        query: &mut Query,
    ) -> Result<Option<DefaultUsed>, ParameterError> {
        self.apply("t", &self.default_time, query)?;
        Ok(Some(DefaultUsed::new("t", self.default_time.clone())))
    }
}
