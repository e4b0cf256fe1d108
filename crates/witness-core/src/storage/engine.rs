//! Sled-backed document store.

use sled::{Batch, Db, Tree};
use tracing::{debug, info, warn};

use super::{RecordKey, StorageConfig, StoredRecord};
use crate::document::Document;
use crate::error::Error;

/// Documents in creation order, with expiry.
pub struct DocumentStore {
    /// The underlying sled database.
    db: Db,

    /// Tree holding records keyed by [`RecordKey`].
    records: Tree,
}

impl DocumentStore {
    /// Open or create a store with the given configuration.
    pub fn open(config: &StorageConfig) -> Result<Self, Error> {
        let db = config.to_sled_config().open()?;
        let records = db.open_tree(&config.collection)?;

        info!(
            path = %config.path.display(),
            collection = %config.collection,
            records = records.len(),
            recovered = db.was_recovered(),
            "Opened document store"
        );

        Ok(Self { db, records })
    }

    /// Check if the database was recovered from a previous crash.
    pub fn was_recovered(&self) -> bool {
        self.db.was_recovered()
    }

    /// Insert records in one atomic batch.
    ///
    /// Returns the keys in input order.
    pub fn insert_batch(&self, records: &[StoredRecord]) -> Result<Vec<RecordKey>, Error> {
        let mut batch = Batch::default();
        let mut keys = Vec::with_capacity(records.len());

        for record in records {
            let key = RecordKey::new(record.created_us.max(0) as u64, self.db.generate_id()?);
            batch.insert(key.encode().to_vec(), record.to_bytes()?);
            keys.push(key);
        }

        self.records.apply_batch(batch)?;
        debug!(records = keys.len(), "Inserted record batch");
        Ok(keys)
    }

    /// Load a single record.
    pub fn get(&self, key: &RecordKey) -> Result<Option<StoredRecord>, Error> {
        match self.records.get(key.encode())? {
            Some(bytes) => Ok(Some(StoredRecord::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Scan live documents in creation order.
    ///
    /// Records expired at `now_us` are skipped, as are records that fail to
    /// decode.
    pub fn scan(&self, now_us: i64) -> impl Iterator<Item = Result<Document, Error>> + '_ {
        self.scan_since(0, now_us)
    }

    /// Like [`scan`](Self::scan), starting at records created at `since_us`.
    pub fn scan_since(
        &self,
        since_us: i64,
        now_us: i64,
    ) -> impl Iterator<Item = Result<Document, Error>> + '_ {
        let start = RecordKey::new(since_us.max(0) as u64, 0).encode().to_vec();
        self.records.range(start..).filter_map(move |result| {
            let (key, bytes) = match result {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e.into())),
            };
            let decoded = StoredRecord::from_bytes(&bytes).and_then(|record| {
                if record.is_expired(now_us) {
                    Ok(None)
                } else {
                    record.document().map(Some)
                }
            });
            match decoded {
                Ok(document) => document.map(Ok),
                Err(e) => {
                    warn!(
                        key = ?RecordKey::decode(&key),
                        error = %e,
                        "Skipping undecodable record"
                    );
                    None
                }
            }
        })
    }

    /// Delete every record expired at `now_us`. Returns how many were removed.
    pub fn purge_expired(&self, now_us: i64) -> Result<usize, Error> {
        let mut batch = Batch::default();
        let mut purged = 0;

        for result in self.records.iter() {
            let (key, bytes) = result?;
            if RecordKey::decode(&key).is_none() {
                return Err(Error::InvalidKey);
            }
            match StoredRecord::from_bytes(&bytes) {
                Ok(record) if record.is_expired(now_us) => {
                    batch.remove(key);
                    purged += 1;
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Skipping undecodable record during purge"),
            }
        }

        self.records.apply_batch(batch)?;
        if purged > 0 {
            info!(purged, "Purged expired records");
        }
        Ok(purged)
    }

    /// Number of stored records, expired or not.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.db.flush()?;
        Ok(())
    }

    /// Get database size in bytes.
    pub fn size_on_disk(&self) -> Result<u64, Error> {
        Ok(self.db.size_on_disk()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> DocumentStore {
        DocumentStore::open(&StorageConfig::temporary()).unwrap()
    }

    fn record(event: &str, created_us: i64, expires_us: Option<i64>) -> StoredRecord {
        StoredRecord::new(&Document::new().with("event", event), created_us, expires_us).unwrap()
    }

    #[test]
    fn test_scan_in_creation_order() {
        let store = store();
        store
            .insert_batch(&[record("late", 300, None), record("early", 100, None)])
            .unwrap();
        store.insert_batch(&[record("middle", 200, None)]).unwrap();

        let events: Vec<String> = store
            .scan(0)
            .map(|d| d.unwrap().get_str("event").unwrap().to_string())
            .collect();
        assert_eq!(events, vec!["early", "middle", "late"]);
    }

    #[test]
    fn test_same_timestamp_does_not_overwrite() {
        let store = store();
        let keys = store
            .insert_batch(&[record("a", 100, None), record("b", 100, None)])
            .unwrap();

        assert_ne!(keys[0], keys[1]);
        assert_eq!(store.len(), 2);
        assert!(store.get(&keys[1]).unwrap().is_some());
    }

    #[test]
    fn test_expired_records_are_hidden_then_purged() {
        let store = store();
        store
            .insert_batch(&[record("old", 100, Some(500)), record("new", 600, Some(5_000))])
            .unwrap();

        assert_eq!(store.scan(1_000).count(), 1);
        assert_eq!(store.len(), 2);

        assert_eq!(store.purge_expired(1_000).unwrap(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.scan(0).count(), 1);
    }

    #[test]
    fn test_scan_since_starts_at_creation_time() {
        let store = store();
        store
            .insert_batch(&[
                record("early", 100, None),
                record("middle", 200, None),
                record("late", 300, None),
            ])
            .unwrap();

        let events: Vec<String> = store
            .scan_since(200, 0)
            .map(|d| d.unwrap().get_str("event").unwrap().to_string())
            .collect();
        assert_eq!(events, vec!["middle", "late"]);
    }

    #[test]
    fn test_undecodable_record_is_skipped() {
        let store = store();
        store.insert_batch(&[record("good", 200, None)]).unwrap();
        let key = RecordKey::new(100, u64::MAX);
        store.records.insert(key.encode().to_vec(), b"not a record".to_vec()).unwrap();

        let documents: Vec<Document> = store.scan(0).collect::<Result<_, _>>().unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].get_str("event"), Some("good"));
        assert_eq!(store.purge_expired(i64::MAX).unwrap(), 0);
        assert_eq!(store.len(), 2);
    }
}
