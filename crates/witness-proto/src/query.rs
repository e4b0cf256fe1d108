//! Query holder and sort order.

use serde::{Deserialize, Serialize};

use crate::condition::SearchCondition;
use crate::key::DataKey;

/// Default cap on returned rows.
pub const DEFAULT_SEARCH_LIMIT: usize = 2500;

/// A list of conditions (implicitly AND-ed) plus a result-size limit.
///
/// Mutable while a compile is in progress; treated as read-only once handed
/// to a record handler.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    conditions: Vec<SearchCondition>,
    limit: usize,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            conditions: Vec::new(),
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl Query {
    /// An empty query with the default limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a condition.
    pub fn add_condition(&mut self, condition: impl Into<SearchCondition>) -> &mut Self {
        self.conditions.push(condition.into());
        self
    }

    /// Builder-style [`add_condition`](Self::add_condition).
    pub fn with_condition(mut self, condition: impl Into<SearchCondition>) -> Self {
        self.add_condition(condition);
        self
    }

    /// Append several conditions in order.
    pub fn extend_conditions<I>(&mut self, conditions: I)
    where
        I: IntoIterator<Item = SearchCondition>,
    {
        self.conditions.extend(conditions);
    }

    pub fn conditions(&self) -> &[SearchCondition] {
        &self.conditions
    }

    /// Replace the whole condition list.
    pub fn set_conditions(&mut self, conditions: Vec<SearchCondition>) {
        self.conditions = conditions;
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
    }

    /// Builder-style [`set_limit`](Self::set_limit).
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Check if any condition targets `field`.
    pub fn references(&self, field: &DataKey) -> bool {
        self.conditions.iter().any(|c| c.references(field))
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Result ordering by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Oldest first.
    #[serde(alias = "asc")]
    Ascending,
    /// Newest first.
    #[default]
    #[serde(alias = "desc")]
    Descending,
}

impl SortOrder {
    /// Parse `asc` / `desc` (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "oldest" => Some(SortOrder::Ascending),
            "desc" | "descending" | "newest" => Some(SortOrder::Descending),
            _ => None,
        }
    }

    /// `1` for ascending, `-1` for descending.
    pub fn sort_value(self) -> i32 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }
}
