//! Dirstore: Hierarchical Filesystem-Backed Data Store
//!
//! A tree of directories on disk, each carrying JSON attribute documents and a
//! dataset manifest whose values live in sibling documents. Every node is
//! identity-cached per root, documents are read lazily, and all mutations are
//! staged in memory until an explicit commit flushes them.
//!
//! ```no_run
//! use dirstore::{Mapping, RootContainer};
//! use serde_json::json;
//!
//! # fn main() -> dirstore::StoreResult<()> {
//! let root = RootContainer::open("/srv/experiments")?;
//! let run = root.require_child("run-1")?;
//! run.attr().set("seed", json!(42))?;
//! run.datasets().set("weights", json!([0.1, 0.2, 0.3]))?;
//! root.commit()?;
//! # Ok(())
//! # }
//! ```

pub mod attribute;
pub mod cache;
pub mod config;
pub mod dataset;
pub mod directory;
pub mod error;
pub mod logging;
pub mod node;
pub mod path;
pub mod root;
pub mod serializer;
pub mod types;

mod ledger;

pub use attribute::{Attribute, Mapping};
pub use config::{ConfigLoader, LayoutConfig, PersistenceConfig, StoreConfig};
pub use dataset::Dataset;
pub use directory::Directory;
pub use error::{PersistenceCause, StoreError, StoreResult};
pub use logging::{init_logging, LoggingConfig};
pub use node::DeferredState;
pub use root::RootContainer;
pub use serializer::Serializer;
pub use types::{CommitReport, ValueKind};

use std::path::Path;

/// Open an existing folder as a store with the default configuration.
pub fn open(path: impl AsRef<Path>) -> StoreResult<RootContainer> {
    RootContainer::open(path)
}
