//! Pipeline stages and their in-process evaluation.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use chrono::{Datelike, FixedOffset};
use tracing::debug;
use witness_proto::{keys, SortOrder};

use super::filter::Filter;
use crate::document::{Document, Value};

/// Field holding the group key of an aggregated row.
pub const GROUP_ID: &str = "_id";

/// Record fields that, together with the creation day, identify a group.
pub const GROUP_FIELDS: [&str; 5] = [
    keys::EVENT_NAME,
    keys::PLAYER_ID,
    keys::CAUSE,
    keys::TARGET,
    keys::ENTITY_TYPE,
];

pub const DAY: &str = "day";
pub const MONTH: &str = "month";
pub const YEAR: &str = "year";

/// One step of a [`Pipeline`](super::Pipeline).
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Keep documents matching the filter.
    Match(Filter),
    /// Collapse documents into per-day groups, with days taken in `time_zone`.
    Group { time_zone: FixedOffset },
    /// Order by creation time.
    Sort(SortOrder),
    /// Keep at most this many documents.
    Limit(usize),
}

impl Stage {
    pub(crate) fn apply(&self, documents: Vec<Document>) -> Vec<Document> {
        match self {
            Stage::Match(filter) => documents
                .into_iter()
                .filter(|d| filter.matches(d))
                .collect(),
            Stage::Group { time_zone } => group(documents, *time_zone),
            Stage::Sort(order) => {
                let mut documents = documents;
                documents.sort_by(|a, b| compare_created(a, b, *order));
                documents
            }
            Stage::Limit(limit) => {
                let mut documents = documents;
                documents.truncate(*limit);
                documents
            }
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Match(filter) => write!(f, "{{\"$match\": {filter}}}"),
            Stage::Group { time_zone } => {
                write!(f, "{{\"$group\": {{\"_id\": [")?;
                for field in GROUP_FIELDS {
                    write!(f, "\"${field}\", ")?;
                }
                write!(f, "\"$day\", \"$month\", \"$year\"], \"timezone\": \"{time_zone}\", ")?;
                write!(f, "\"count\": {{\"$sum\": 1}}}}}}")
            }
            Stage::Sort(order) => {
                write!(f, "{{\"$sort\": {{\"created\": {}}}}}", order.sort_value())
            }
            Stage::Limit(limit) => write!(f, "{{\"$limit\": {limit}}}"),
        }
    }
}

fn compare_created(a: &Document, b: &Document, order: SortOrder) -> Ordering {
    let (a, b) = (a.get_datetime(keys::CREATED), b.get_datetime(keys::CREATED));
    match (a, b) {
        (Some(a), Some(b)) => match order {
            SortOrder::Ascending => a.cmp(&b),
            SortOrder::Descending => b.cmp(&a),
        },
        // Undated rows sort last either way.
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn group(documents: Vec<Document>, time_zone: FixedOffset) -> Vec<Document> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Document> = Vec::new();

    for document in documents {
        let Some(created) = document.get_datetime(keys::CREATED) else {
            debug!("Skipping undated document while grouping");
            continue;
        };
        let local = created.with_timezone(&time_zone);

        let mut id = Document::new();
        for field in GROUP_FIELDS {
            id.insert(field, document.get(field).cloned().unwrap_or(Value::Null));
        }
        id.insert(DAY, Value::Int(i64::from(local.day())));
        id.insert(MONTH, Value::Int(i64::from(local.month())));
        id.insert(YEAR, Value::Int(i64::from(local.year())));

        let key = id.to_string();
        match index.get(&key) {
            Some(&position) => {
                let row = &mut groups[position];
                let count = row.get(keys::COUNT).and_then(Value::as_i64).unwrap_or(0);
                row.insert(keys::COUNT, Value::Int(count + 1));
                if row.get_datetime(keys::CREATED).is_some_and(|latest| created > latest) {
                    row.insert(keys::CREATED, created);
                }
            }
            None => {
                index.insert(key, groups.len());
                groups.push(
                    Document::new()
                        .with(GROUP_ID, id)
                        .with(keys::COUNT, Value::Int(1))
                        .with(keys::CREATED, created),
                );
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(cause: &str, hour: u32) -> Document {
        Document::new()
            .with("event", "break")
            .with("cause", cause)
            .with("created", Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap())
    }

    #[test]
    fn test_group_counts_same_day() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let rows = Stage::Group { time_zone: utc }.apply(vec![
            record("tnt", 1),
            record("tnt", 20),
            record("creeper", 5),
        ]);

        assert_eq!(rows.len(), 2);
        let tnt = &rows[0];
        assert_eq!(tnt.get("count"), Some(&Value::Int(2)));
        assert_eq!(
            tnt.get_datetime("created"),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 20, 0, 0).unwrap())
        );
        let id = tnt.get_document(GROUP_ID).unwrap();
        assert_eq!(id.get("day"), Some(&Value::Int(1)));
        assert_eq!(id.get("target"), Some(&Value::Null));
    }

    #[test]
    fn test_group_days_follow_time_zone() {
        // 20:00 UTC is already the next day at UTC+5.
        let plus_five = FixedOffset::east_opt(5 * 3600).unwrap();
        let rows = Stage::Group {
            time_zone: plus_five,
        }
        .apply(vec![record("tnt", 1), record("tnt", 20)]);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_sort_and_limit() {
        let documents = vec![record("a", 3), record("b", 1), record("c", 2)];
        let sorted = Stage::Sort(SortOrder::Ascending).apply(documents);
        let limited = Stage::Limit(2).apply(sorted);

        let causes: Vec<&str> = limited.iter().filter_map(|d| d.get_str("cause")).collect();
        assert_eq!(causes, vec!["b", "c"]);
    }
}
