//! Aggregation pipeline built from a search session.
//!
//! A pipeline is `match -> group -> sort -> limit`. The group stage is left
//! out when the session has [`Flag::NoGroup`].

mod filter;
mod stage;

pub use filter::{Filter, Predicate};
pub use stage::{Stage, DAY, GROUP_FIELDS, GROUP_ID, MONTH, YEAR};

use std::fmt;

use chrono::{DateTime, Utc};
use witness_proto::{keys, FieldCondition, Flag, QuerySession};

use crate::document::Document;
use crate::error::Error;

/// An ordered list of stages.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Build the pipeline for a session's query.
    pub fn for_session(session: &QuerySession) -> Result<Self, Error> {
        let query = session.query();
        let mut filter = Filter::from_conditions(query.conditions())?;
        if session.has_flag(Flag::NoChat) {
            let no_chat = FieldCondition::exists(keys::message(), false)?;
            filter.merge(Filter::from_conditions(&[no_chat.into()])?);
        }

        let mut stages = vec![Stage::Match(filter)];
        if !session.has_flag(Flag::NoGroup) {
            stages.push(Stage::Group {
                time_zone: session.time_zone(),
            });
        }
        stages.push(Stage::Sort(session.sort_order()));
        stages.push(Stage::Limit(query.limit()));

        Ok(Self { stages })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Check if rows coming out of this pipeline are groups.
    pub fn is_grouped(&self) -> bool {
        self.stages.iter().any(|s| matches!(s, Stage::Group { .. }))
    }

    /// Lower bound on `created` that every matching document satisfies.
    ///
    /// Scans may start at this point instead of the oldest record.
    pub fn created_since(&self) -> Option<DateTime<Utc>> {
        let Some(Stage::Match(filter)) = self.stages.first() else {
            return None;
        };
        filter
            .predicates(&keys::created())?
            .iter()
            .filter_map(|predicate| match predicate {
                Predicate::Gte(bound) | Predicate::Gt(bound) => bound.as_datetime(),
                _ => None,
            })
            .max()
    }

    /// Run every stage over `documents`.
    pub fn execute<I>(&self, documents: I) -> Vec<Document>
    where
        I: IntoIterator<Item = Document>,
    {
        let mut stages = self.stages.iter();
        let mut rows: Vec<Document> = match stages.next() {
            // Non-matching rows are never buffered.
            Some(Stage::Match(filter)) => documents
                .into_iter()
                .filter(|d| filter.matches(d))
                .collect(),
            Some(first) => first.apply(documents.into_iter().collect()),
            None => return documents.into_iter().collect(),
        };
        for stage in stages {
            rows = stage.apply(rows);
        }
        rows
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{stage}")?;
        }
        write!(f, "]")
    }
}
