//! Witness core: document storage and query execution.
//!
//! Records are encoded into [`Document`]s, kept in a sled-backed
//! [`DocumentStore`], and searched by translating a compiled query into an
//! aggregation [`Pipeline`].

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod codec;
pub mod document;
pub mod error;
pub mod handler;
pub mod pipeline;
pub mod queue;
pub mod storage;

pub use codec::{encode_value, from_document, to_document};
pub use document::{Document, Value};
pub use error::Error;
pub use handler::{DocumentRecordHandler, RecordHandler};
pub use pipeline::{Filter, Pipeline, Predicate, Stage};
pub use queue::{EntryQueue, FlushTask};
pub use storage::{DocumentStore, RecordKey, StorageConfig, StoredRecord};
