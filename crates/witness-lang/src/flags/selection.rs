use std::sync::Arc;

use witness_proto::{
    keys, FieldCondition, Flag, MatchRule, Query, QuerySession, Requester, ValueRange,
};

use crate::error::ParameterError;
use crate::handler::{FlagHandler, PendingConditions};

/// An axis-aligned box in a named world.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub world: String,
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Region {
    pub fn new(world: impl Into<String>, min: [f64; 3], max: [f64; 3]) -> Self {
        Self {
            world: world.into(),
            min,
            max,
        }
    }
}

/// Source of requesters' current region selections, e.g. a world editing
/// tool.
pub trait SelectionProvider: Send + Sync {
    fn selection(&self, requester: &Requester) -> Option<Region>;
}

/// `-we-sel` restricts results to the requester's current selection.
///
/// Registered only while a [`SelectionProvider`] is installed.
pub struct SelectionFlag {
    provider: Arc<dyn SelectionProvider>,
}

impl SelectionFlag {
    pub const NAME: &'static str = "selection";

    pub fn new(provider: Arc<dyn SelectionProvider>) -> Self {
        Self { provider }
    }
}

impl FlagHandler for SelectionFlag {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn aliases(&self) -> &[&'static str] {
        &["we-sel", "sel"]
    }

    fn accepts_source(&self, requester: &Requester) -> bool {
        !requester.is_console()
    }

    fn process(
        &self,
        session: &mut QuerySession,
        _alias: &str,
        _value: Option<&str>,
        query: &mut Query,
    ) -> Result<Option<PendingConditions>, ParameterError> {
        let region = self
            .provider
            .selection(session.requester())
            .ok_or_else(|| ParameterError::resolution("You do not have an active selection"))?;

        query.add_condition(FieldCondition::equals(
            keys::location(keys::WORLD),
            region.world.as_str(),
        )?);
        for (i, axis) in [keys::X, keys::Y, keys::Z].into_iter().enumerate() {
            let (a, b) = (region.min[i], region.max[i]);
            query.add_condition(FieldCondition::of(
                keys::location(axis),
                MatchRule::Between,
                ValueRange::closed(a.min(b), a.max(b)),
            )?);
        }

        session.add_flag(Flag::Selection);
        session.ignore_default("radius");
        Ok(None)
    }
}
