//! Witness data model.
//!
//! This crate defines the backend-agnostic types shared by the query compiler
//! and the storage layer.
//!
//! # Modules
//!
//! - [`key`] - Dotted field paths and well-known record fields
//! - [`value`] / [`wrapper`] - In-memory record representation
//! - [`condition`] - The condition tree and its visitor
//! - [`query`] - Query holder and sort order
//! - [`session`] - Requester identity, flags and per-search context
//! - [`directory`] - Player name and identifier lookup
//! - [`duration`] - Duration strings such as `3d` or `1w2d`
//! - [`entry`] - Typed result records
//! - [`error`] - Data model error types

pub mod condition;
pub mod directory;
pub mod duration;
pub mod entry;
pub mod error;
pub mod key;
pub mod query;
pub mod session;
pub mod value;
pub mod wrapper;

pub use condition::{
    ConditionValue, ConditionVisitor, FieldCondition, GroupOperator, MatchRule, SearchCondition,
    SearchConditionGroup, ValueRange,
};
pub use directory::{PlayerDirectory, StaticPlayerDirectory};
pub use duration::parse_duration;
pub use entry::{DataAggregateEntry, DataEntry, EntryKind, RecordEntry, KNOWN_EVENTS};
pub use error::Error;
pub use key::{keys, DataKey};
pub use query::{Query, SortOrder, DEFAULT_SEARCH_LIMIT};
pub use session::{Flag, Location, QuerySession, Requester, PERMISSION_UNLIMITED_RADIUS};
pub use value::DataValue;
pub use wrapper::DataWrapper;
