//! Typed result records.

use chrono::{DateTime, FixedOffset};

use crate::wrapper::DataWrapper;

/// Broad family of an event, used to pick how a result is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Block,
    Entity,
    Container,
    Chat,
    Generic,
}

/// Event names understood by the event parameter, with their kind.
pub const KNOWN_EVENTS: &[(&str, EntryKind)] = &[
    ("break", EntryKind::Block),
    ("place", EntryKind::Block),
    ("grow", EntryKind::Block),
    ("form", EntryKind::Block),
    ("decay", EntryKind::Block),
    ("ignite", EntryKind::Block),
    ("death", EntryKind::Entity),
    ("spawn", EntryKind::Entity),
    ("withdraw", EntryKind::Container),
    ("deposit", EntryKind::Container),
    ("say", EntryKind::Chat),
    ("command", EntryKind::Chat),
];

impl EntryKind {
    /// Kind for an event name. Unknown names are generic.
    pub fn for_event(event: &str) -> Self {
        KNOWN_EVENTS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(event))
            .map(|(_, kind)| *kind)
            .unwrap_or(EntryKind::Generic)
    }

    /// Check if `event` is in [`KNOWN_EVENTS`].
    pub fn is_known_event(event: &str) -> bool {
        KNOWN_EVENTS
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case(event))
    }
}

/// One stored record returned as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordEntry {
    pub event: String,
    pub kind: EntryKind,
    pub data: DataWrapper,
}

/// A count of matching records bucketed by day.
#[derive(Debug, Clone, PartialEq)]
pub struct DataAggregateEntry {
    pub event: String,
    pub kind: EntryKind,
    pub data: DataWrapper,
    /// Midnight of the bucket day in the session's time zone.
    pub date: DateTime<FixedOffset>,
    pub count: u64,
}

/// A result row, keyed by event name.
#[derive(Debug, Clone, PartialEq)]
pub enum DataEntry {
    Record(RecordEntry),
    Aggregate(DataAggregateEntry),
}

impl DataEntry {
    /// A plain record entry for `event`.
    pub fn record(event: impl Into<String>, data: DataWrapper) -> Self {
        let event = event.into();
        DataEntry::Record(RecordEntry {
            kind: EntryKind::for_event(&event),
            event,
            data,
        })
    }

    /// An aggregate entry for `event`.
    pub fn aggregate(
        event: impl Into<String>,
        data: DataWrapper,
        date: DateTime<FixedOffset>,
        count: u64,
    ) -> Self {
        let event = event.into();
        DataEntry::Aggregate(DataAggregateEntry {
            kind: EntryKind::for_event(&event),
            event,
            data,
            date,
            count,
        })
    }

    pub fn event(&self) -> &str {
        match self {
            DataEntry::Record(e) => &e.event,
            DataEntry::Aggregate(e) => &e.event,
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            DataEntry::Record(e) => e.kind,
            DataEntry::Aggregate(e) => e.kind,
        }
    }

    pub fn data(&self) -> &DataWrapper {
        match self {
            DataEntry::Record(e) => &e.data,
            DataEntry::Aggregate(e) => &e.data,
        }
    }

    pub fn data_mut(&mut self) -> &mut DataWrapper {
        match self {
            DataEntry::Record(e) => &mut e.data,
            DataEntry::Aggregate(e) => &mut e.data,
        }
    }

    pub fn as_aggregate(&self) -> Option<&DataAggregateEntry> {
        match self {
            DataEntry::Aggregate(e) => Some(e),
            DataEntry::Record(_) => None,
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, DataEntry::Aggregate(_))
    }
}
