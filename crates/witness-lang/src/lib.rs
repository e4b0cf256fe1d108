//! Witness search compiler.
//!
//! Turns requester arguments such as `p:Alice a:break r:10 -no-group` into a
//! [`witness_proto::Query`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use witness_lang::{HandlerRegistry, QueryBuilder, QueryConfig};
//! use witness_proto::{QuerySession, Requester, StaticPlayerDirectory};
//!
//! let config = QueryConfig::default();
//! let directory = Arc::new(StaticPlayerDirectory::new());
//! let registry = HandlerRegistry::with_builtins(&config, directory)?;
//! let builder = QueryBuilder::new(Arc::new(registry), config);
//!
//! let mut session = QuerySession::new(Requester::console());
//! let query = builder.from_arguments(&mut session, &["c:creeper", "-ng"]).await?;
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod flags;
pub mod handler;
pub mod parameters;
pub mod registry;

pub use builder::{tokenize, CompiledQuery, QueryBuilder, DEFAULT_PARAMETER_ALIAS};
pub use config::QueryConfig;
pub use error::{ParameterError, RegistryError};
pub use flags::{Region, SelectionProvider};
pub use handler::{DefaultUsed, FlagHandler, ParameterHandler, PendingConditions};
pub use registry::HandlerRegistry;
