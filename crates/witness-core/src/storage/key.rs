//! Record key encoding.

use std::fmt;

/// Size of the creation timestamp in bytes.
pub const CREATED_SIZE: usize = 8;

/// Size of the sequence number in bytes.
pub const SEQUENCE_SIZE: usize = 8;

/// Total key size.
pub const KEY_SIZE: usize = CREATED_SIZE + SEQUENCE_SIZE;

/// Key of a stored record.
///
/// Key format: `[created_us (8 bytes, big-endian)][sequence (8 bytes, big-endian)]`
///
/// Big-endian encoding makes a tree scan return records in creation order.
/// The sequence separates records created in the same microsecond.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    /// Creation time in microseconds since the Unix epoch, clamped at zero.
    pub created_us: u64,

    /// Per-store sequence number.
    pub sequence: u64,
}

impl RecordKey {
    pub fn new(created_us: u64, sequence: u64) -> Self {
        Self {
            created_us,
            sequence,
        }
    }

    /// Encode the key to bytes.
    pub fn encode(&self) -> [u8; KEY_SIZE] {
        let mut buf = [0u8; KEY_SIZE];
        buf[..CREATED_SIZE].copy_from_slice(&self.created_us.to_be_bytes());
        buf[CREATED_SIZE..].copy_from_slice(&self.sequence.to_be_bytes());
        buf
    }

    /// Decode a key from bytes.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != KEY_SIZE {
            return None;
        }

        let mut created = [0u8; CREATED_SIZE];
        created.copy_from_slice(&bytes[..CREATED_SIZE]);
        let mut sequence = [0u8; SEQUENCE_SIZE];
        sequence.copy_from_slice(&bytes[CREATED_SIZE..]);

        Some(Self {
            created_us: u64::from_be_bytes(created),
            sequence: u64::from_be_bytes(sequence),
        })
    }
}

impl fmt::Debug for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordKey")
            .field("created_us", &self.created_us)
            .field("sequence", &self.sequence)
            .finish()
    }
}
