use tracing::debug;
use witness_proto::{
    keys, FieldCondition, Location, MatchRule, Query, QuerySession, Requester, ValueRange,
    PERMISSION_UNLIMITED_RADIUS,
};

use crate::error::ParameterError;
use crate::handler::{DefaultUsed, ParameterHandler, PendingConditions};

/// `r:10` restricts results to a cube around the requester.
///
/// Only requesters with a location may use it. Radii above the configured
/// limit are clamped unless the requester holds
/// [`PERMISSION_UNLIMITED_RADIUS`].
#[derive(Debug, Clone)]
pub struct RadiusParameter {
    default_radius: u32,
    limit: u32,
}

impl RadiusParameter {
    pub fn new(default_radius: u32, limit: u32) -> Self {
        Self {
            default_radius,
            limit,
        }
    }

    fn apply(
        &self,
        location: &Location,
        radius: f64,
        query: &mut Query,
    ) -> Result<(), ParameterError> {
        query.add_condition(FieldCondition::equals(
            keys::location(keys::WORLD),
            location.world.as_str(),
        )?);
        let axes = [
            (keys::X, location.x),
            (keys::Y, location.y),
            (keys::Z, location.z),
        ];
        for (axis, centre) in axes {
            query.add_condition(FieldCondition::of(
                keys::location(axis),
                MatchRule::Between,
                ValueRange::closed(centre - radius, centre + radius),
            )?);
        }
        Ok(())
    }
}

impl ParameterHandler for RadiusParameter {
    fn name(&self) -> &str {
        "radius"
    }

    fn aliases(&self) -> &[&'static str] {
        &["r", "radius"]
    }

    fn can_run(&self, requester: &Requester) -> bool {
        requester.location().is_some()
    }

    fn accepts_value(&self, value: &str) -> bool {
        value.parse::<u32>().is_ok()
    }

    fn does_conflict(&self, _candidate: (&str, &str), existing: (&str, &str)) -> bool {
        existing.0.eq_ignore_ascii_case("w") || existing.0.eq_ignore_ascii_case("world")
    }

    fn build_for_query(
        &self,
        session: &QuerySession,
        alias: &str,
        value: &str,
        query: &mut Query,
    ) -> Result<Option<PendingConditions>, ParameterError> {
        let requester = session.requester();
        let location = requester
            .location()
            .ok_or_else(|| ParameterError::NotAllowed(alias.to_string()))?;
        let mut radius: u32 = value
            .parse()
            .map_err(|_| ParameterError::invalid_value(alias, value))?;

        if radius > self.limit && !requester.has_permission(PERMISSION_UNLIMITED_RADIUS) {
            debug!(requested = radius, limit = self.limit, "Clamping search radius");
            radius = self.limit;
        }

        self.apply(location, f64::from(radius), query)?;
        Ok(None)
    }

    fn process_default(
        &self,
        session: &QuerySession,
        query: &mut Query,
    ) -> Result<Option<DefaultUsed>, ParameterError> {
        let Some(location) = session.requester().location() else {
            return Ok(None);
        };
        // A world or region restriction already bounds the search.
        if query.references(&keys::location(keys::WORLD)) {
            return Ok(None);
        }

        self.apply(location, f64::from(self.default_radius), query)?;
        Ok(Some(DefaultUsed::new("r", self.default_radius.to_string())))
    }
}
