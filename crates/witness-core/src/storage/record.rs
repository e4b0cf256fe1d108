//! Envelope for stored documents.

use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize};

use crate::document::Document;
use crate::error::Error;

/// A stored document with its lifecycle timestamps.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct StoredRecord {
    /// JSON-encoded [`Document`].
    pub document: Vec<u8>,

    /// Creation time in microseconds since the Unix epoch.
    pub created_us: i64,

    /// Expiry time in microseconds since the Unix epoch.
    pub expires_us: Option<i64>,
}

impl StoredRecord {
    pub fn new(
        document: &Document,
        created_us: i64,
        expires_us: Option<i64>,
    ) -> Result<Self, Error> {
        Ok(Self {
            document: document.to_bytes()?,
            created_us,
            expires_us,
        })
    }

    /// Check if the record has expired at `now_us`.
    pub fn is_expired(&self, now_us: i64) -> bool {
        self.expires_us.is_some_and(|expires| expires <= now_us)
    }

    pub fn document(&self) -> Result<Document, Error> {
        Document::from_bytes(&self.document)
    }

    /// Serialize the record to bytes using rkyv.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a record from bytes using rkyv.
    ///
    /// Bytes read back from sled carry no alignment guarantee, so they are
    /// copied into an aligned buffer first.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let mut aligned = AlignedVec::<16>::with_capacity(bytes.len());
        aligned.extend_from_slice(bytes);
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(&aligned)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_roundtrip() {
        let document = Document::new().with("event", "break");
        let record = StoredRecord::new(&document, 1_000, Some(2_000)).unwrap();
        let decoded = StoredRecord::from_bytes(&record.to_bytes().unwrap()).unwrap();

        assert_eq!(decoded, record);
        assert_eq!(decoded.document().unwrap(), document);
    }

    #[test]
    fn test_expiry() {
        let record = StoredRecord::new(&Document::new(), 0, Some(100)).unwrap();
        assert!(!record.is_expired(99));
        assert!(record.is_expired(100));

        let forever = StoredRecord::new(&Document::new(), 0, None).unwrap();
        assert!(!forever.is_expired(i64::MAX));
    }
}
