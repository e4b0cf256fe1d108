//! Record handlers: the storage contract used by searches and the write
//! queue.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use tracing::{debug, warn};
use uuid::Uuid;
use witness_proto::{keys, DataEntry, DataValue, DataWrapper, PlayerDirectory, QuerySession};

use crate::codec::{from_document, to_document};
use crate::document::{Document, Value};
use crate::error::Error;
use crate::pipeline::{Pipeline, DAY, GROUP_ID, MONTH, YEAR};
use crate::storage::{DocumentStore, StorageConfig, StoredRecord};

/// Owns a durable record store.
#[async_trait]
pub trait RecordHandler: Send + Sync {
    /// Implementation name, as selected in storage config.
    fn name(&self) -> &str;

    /// Persist a batch of records.
    ///
    /// Writes are unordered: a malformed record is skipped without blocking
    /// the rest, and the batch then reports [`Error::BatchWrite`].
    async fn write(&self, batch: Vec<DataWrapper>) -> Result<(), Error>;

    /// Execute the session's query.
    async fn query(&self, session: &QuerySession) -> Result<Vec<DataEntry>, Error>;
}

/// Record handler over a [`DocumentStore`], executing searches as
/// aggregation [`Pipeline`]s.
pub struct DocumentRecordHandler {
    store: Arc<DocumentStore>,
    expiry: Duration,
    directory: Option<Arc<dyn PlayerDirectory>>,
}

impl DocumentRecordHandler {
    pub const NAME: &'static str = "sled";

    pub fn new(store: Arc<DocumentStore>, expiry: Duration) -> Self {
        Self {
            store,
            expiry,
            directory: None,
        }
    }

    /// Open the store described by `config`.
    pub fn open(config: &StorageConfig) -> Result<Self, Error> {
        if config.handler != Self::NAME {
            return Err(Error::Config(format!(
                "unknown record handler '{}'",
                config.handler
            )));
        }
        let expiry = config.expiry()?;
        let store = DocumentStore::open(config)?;
        Ok(Self::new(Arc::new(store), expiry))
    }

    /// Resolve player identifiers to display names in results.
    pub fn with_player_directory(mut self, directory: Arc<dyn PlayerDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// Build the stored form of one record.
    fn prepare(&self, wrapper: &DataWrapper, now: DateTime<Utc>) -> Result<StoredRecord, Error> {
        if wrapper.get_str(&keys::event_name()).filter(|e| !e.is_empty()).is_none() {
            return Err(Error::InvalidData("record has no event name".into()));
        }
        let created = wrapper
            .get(&keys::created())
            .and_then(DataValue::as_timestamp)
            .unwrap_or(now);
        let expires = created
            .checked_add_signed(self.expiry)
            .ok_or_else(|| Error::InvalidData(format!("record expiry after {created} overflows")))?;
        if let Some((key, _)) = wrapper.iter().find(|(_, value)| has_non_finite(value)) {
            return Err(Error::InvalidData(format!("non-finite number under '{key}'")));
        }

        let mut document = to_document(wrapper);
        document.insert(keys::CREATED, created);
        document.insert(keys::EXPIRES, expires);

        StoredRecord::new(
            &document,
            created.timestamp_micros(),
            Some(expires.timestamp_micros()),
        )
    }

    async fn resolve_player(&self, entry: &mut DataEntry) {
        let Some(raw) = entry.data().get_str(&keys::player_id()).map(str::to_string) else {
            return;
        };
        let name = match (&self.directory, Uuid::parse_str(&raw)) {
            (Some(directory), Ok(id)) => directory.display_name(id).await,
            _ => None,
        };
        entry.data_mut().set(&keys::cause(), name.unwrap_or(raw));
    }
}

/// Check if `value` holds a NaN or infinite float at any depth.
fn has_non_finite(value: &DataValue) -> bool {
    match value {
        DataValue::Float(f) => !f.is_finite(),
        DataValue::Wrapper(wrapper) => wrapper.iter().any(|(_, v)| has_non_finite(v)),
        DataValue::List(items) => items.iter().any(has_non_finite),
        _ => false,
    }
}

/// Turn one pipeline row into a result entry.
fn entry_from_row(
    row: &Document,
    grouped: bool,
    time_zone: FixedOffset,
) -> Result<DataEntry, Error> {
    if !grouped {
        let data = from_document(row);
        let event = event_name(&data)?;
        return Ok(DataEntry::record(event, data));
    }

    let id = row
        .get_document(GROUP_ID)
        .ok_or_else(|| Error::InvalidData("group row has no key".into()))?;
    let part = |name: &str| {
        id.get(name)
            .and_then(Value::as_i64)
            .ok_or_else(|| Error::InvalidData(format!("group key has no {name}")))
    };
    let (year, month, day) = (part(YEAR)?, part(MONTH)?, part(DAY)?);
    let date = time_zone
        .with_ymd_and_hms(year as i32, month as u32, day as u32, 0, 0, 0)
        .single()
        .ok_or_else(|| Error::InvalidData(format!("invalid bucket date {year}-{month}-{day}")))?;
    let count = row.get(keys::COUNT).and_then(Value::as_i64).unwrap_or(0).max(0) as u64;

    let mut key = id.clone();
    for field in [DAY, MONTH, YEAR] {
        key.remove(field);
    }
    let mut data = from_document(&key);
    data.set(&keys::count(), count as i64);
    let event = event_name(&data)?;

    Ok(DataEntry::aggregate(event, data, date, count))
}

fn event_name(data: &DataWrapper) -> Result<String, Error> {
    data.get_str(&keys::event_name())
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidData("row has no event name".into()))
}

#[async_trait]
impl RecordHandler for DocumentRecordHandler {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn write(&self, batch: Vec<DataWrapper>) -> Result<(), Error> {
        let total = batch.len();
        let now = Utc::now();

        let mut records = Vec::with_capacity(total);
        for wrapper in &batch {
            match self.prepare(wrapper, now) {
                Ok(record) => records.push(record),
                Err(e) => warn!(error = %e, record = ?wrapper, "Skipping malformed record"),
            }
        }
        let failed = total - records.len();

        if !records.is_empty() {
            let store = Arc::clone(&self.store);
            tokio::task::spawn_blocking(move || store.insert_batch(&records)).await??;
        }
        debug!(written = total - failed, failed, "Wrote record batch");

        if failed > 0 {
            return Err(Error::BatchWrite { failed, total });
        }
        Ok(())
    }

    async fn query(&self, session: &QuerySession) -> Result<Vec<DataEntry>, Error> {
        let pipeline = Pipeline::for_session(session)?;
        debug!(pipeline = %pipeline, "Executing pipeline");

        let grouped = pipeline.is_grouped();
        let time_zone = session.time_zone();
        let now_us = Utc::now().timestamp_micros();
        let since_us = pipeline.created_since().map_or(0, |since| since.timestamp_micros());
        let store = Arc::clone(&self.store);

        let rows = tokio::task::spawn_blocking(move || {
            let mut failure = None;
            let documents = store.scan_since(since_us, now_us).filter_map(|result| match result {
                Ok(document) => Some(document),
                Err(e) => {
                    failure.get_or_insert(e);
                    None
                }
            });
            let rows = pipeline.execute(documents);
            match failure {
                Some(e) => Err(e),
                None => Ok(rows),
            }
        })
        .await??;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut entry = entry_from_row(row, grouped, time_zone)?;
            self.resolve_player(&mut entry).await;
            entries.push(entry);
        }

        debug!(entries = entries.len(), grouped, "Query complete");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use witness_proto::DataKey;

    #[test]
    fn test_grouped_row_to_aggregate() {
        let id = Document::new()
            .with("event", "break")
            .with("cause", "tnt")
            .with("target", Value::Null)
            .with(DAY, Value::Int(2))
            .with(MONTH, Value::Int(6))
            .with(YEAR, Value::Int(2024));
        let row = Document::new().with(GROUP_ID, id).with("count", Value::Int(3));
        let offset = FixedOffset::west_opt(4 * 3600).unwrap();

        let entry = entry_from_row(&row, true, offset).unwrap();
        let aggregate = entry.as_aggregate().unwrap();
        assert_eq!(aggregate.count, 3);
        assert_eq!(aggregate.date.day(), 2);
        assert_eq!(aggregate.date.offset(), &offset);
        assert_eq!(aggregate.data.get_str(&keys::cause()), Some("tnt"));
        assert!(!aggregate.data.contains(&DataKey::of(DAY)));
    }

    #[test]
    fn test_non_finite_detected_in_nested_values() {
        assert!(!has_non_finite(&DataValue::Float(1.5)));
        assert!(has_non_finite(&DataValue::Float(f64::NAN)));
        assert!(has_non_finite(&DataValue::List(vec![
            DataValue::Int(1),
            DataValue::Float(f64::NEG_INFINITY),
        ])));

        let mut location = DataWrapper::new();
        location.set(&DataKey::of(keys::X), f64::INFINITY);
        assert!(has_non_finite(&DataValue::Wrapper(location)));
    }

    #[test]
    fn test_plain_row_requires_event() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let err = entry_from_row(&Document::new().with("cause", "tnt"), false, utc).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }
}
