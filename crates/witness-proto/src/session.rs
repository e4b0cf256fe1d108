//! Per-request search context.

use std::collections::HashSet;

use chrono::{FixedOffset, Offset, Utc};
use uuid::Uuid;

use crate::query::{Query, SortOrder};

/// Permission that lifts the radius cap.
pub const PERMISSION_UNLIMITED_RADIUS: &str = "witness.radius.unlimited";

/// A position in a named world.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }
}

/// Who issued a search.
///
/// A console requester has no location and holds every permission.
#[derive(Debug, Clone, PartialEq)]
pub struct Requester {
    name: String,
    id: Option<Uuid>,
    location: Option<Location>,
    permissions: HashSet<String>,
    console: bool,
}

impl Requester {
    /// An in-world player.
    pub fn player(name: impl Into<String>, id: Uuid, location: Location) -> Self {
        Self {
            name: name.into(),
            id: Some(id),
            location: Some(location),
            permissions: HashSet::new(),
            console: false,
        }
    }

    /// The operator console.
    pub fn console() -> Self {
        Self {
            name: "console".to_string(),
            id: None,
            location: None,
            permissions: HashSet::new(),
            console: true,
        }
    }

    /// Grant a permission.
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn is_console(&self) -> bool {
        self.console
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.console || self.permissions.contains(permission)
    }
}

/// Session-level switches set by flag handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    /// Show full detail for each result.
    ///
    /// Carried on the session only; result rendering happens outside this
    /// workspace.
    Extended,
    /// Return one row per record instead of daily aggregates.
    NoGroup,
    /// Exclude chat rows.
    NoChat,
    /// Drain liquids when restoring.
    ///
    /// Carried on the session only; restore happens outside this workspace.
    Drain,
    /// Ignore location-based defaults.
    Global,
    /// Some or all defaults were explicitly ignored.
    IgnoreDefault,
    /// Restricted to the requester's region selection.
    Selection,
}

/// Context for one compile + execute cycle. Not reused across requests.
#[derive(Debug, Clone)]
pub struct QuerySession {
    requester: Requester,
    query: Query,
    flags: HashSet<Flag>,
    ignored_defaults: HashSet<String>,
    ignore_all_defaults: bool,
    sort_order: SortOrder,
    time_zone: FixedOffset,
}

impl QuerySession {
    /// A fresh session in UTC.
    pub fn new(requester: Requester) -> Self {
        Self {
            requester,
            query: Query::new(),
            flags: HashSet::new(),
            ignored_defaults: HashSet::new(),
            ignore_all_defaults: false,
            sort_order: SortOrder::default(),
            time_zone: utc(),
        }
    }

    /// Set the session's effective time zone.
    pub fn with_time_zone(mut self, time_zone: FixedOffset) -> Self {
        self.time_zone = time_zone;
        self
    }

    pub fn requester(&self) -> &Requester {
        &self.requester
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut Query {
        &mut self.query
    }

    pub fn set_query(&mut self, query: Query) {
        self.query = query;
    }

    pub fn add_flag(&mut self, flag: Flag) {
        self.flags.insert(flag);
    }

    pub fn has_flag(&self, flag: Flag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn flags(&self) -> &HashSet<Flag> {
        &self.flags
    }

    /// Skip default injection for the parameter handler called `name`.
    pub fn ignore_default(&mut self, name: impl Into<String>) {
        self.ignored_defaults.insert(name.into());
    }

    /// Skip default injection for every parameter handler.
    pub fn ignore_all_defaults(&mut self) {
        self.ignore_all_defaults = true;
    }

    pub fn is_ignored_default(&self, name: &str) -> bool {
        self.ignore_all_defaults || self.ignored_defaults.contains(name)
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn set_sort_order(&mut self, sort_order: SortOrder) {
        self.sort_order = sort_order;
    }

    pub fn time_zone(&self) -> FixedOffset {
        self.time_zone
    }
}

fn utc() -> FixedOffset {
    Utc.fix()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_has_every_permission() {
        let console = Requester::console();
        assert!(console.has_permission(PERMISSION_UNLIMITED_RADIUS));
        assert!(console.location().is_none());
    }

    #[test]
    fn test_player_permissions() {
        let player = Requester::player(
            "Alice",
            Uuid::new_v4(),
            Location::new("world", 0.0, 64.0, 0.0),
        );
        assert!(!player.has_permission(PERMISSION_UNLIMITED_RADIUS));

        let player = player.with_permission(PERMISSION_UNLIMITED_RADIUS);
        assert!(player.has_permission(PERMISSION_UNLIMITED_RADIUS));
    }

    #[test]
    fn test_ignored_defaults() {
        let mut session = QuerySession::new(Requester::console());
        assert!(!session.is_ignored_default("radius"));

        session.ignore_default("radius");
        assert!(session.is_ignored_default("radius"));
        assert!(!session.is_ignored_default("time"));

        session.ignore_all_defaults();
        assert!(session.is_ignored_default("time"));
    }

    #[test]
    fn test_flags() {
        let mut session = QuerySession::new(Requester::console());
        session.add_flag(Flag::NoGroup);
        assert!(session.has_flag(Flag::NoGroup));
        assert!(!session.has_flag(Flag::NoChat));
        assert_eq!(session.time_zone().local_minus_utc(), 0);
    }
}
