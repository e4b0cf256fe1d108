//! Witness server library.
//!
//! Wires the search compiler to the document store and exposes the
//! operator console used by the `witness` binary.

pub mod app;
pub mod config;
pub mod console;
pub mod error;
pub mod search;

pub use app::Witness;
pub use config::{Args, ServerConfig};
pub use console::{parse_line, ConsoleCommand};
pub use error::Error;
pub use search::{describe, SearchCommand, SearchResults, GENERIC_FAILURE};
