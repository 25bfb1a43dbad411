//! Configuration
//!
//! Store-wide settings: the reserved per-directory document names, how
//! documents are written on commit, and logging. Every section falls back to
//! its defaults, so an empty file (or no file at all) is a valid config.

mod facade;
mod sources;

pub use facade::ConfigLoader;

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

/// Top-level configuration for an open store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub layout: LayoutConfig,
    pub persistence: PersistenceConfig,
    pub logging: LoggingConfig,
}

/// Names of the documents every directory carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Internal metadata attributes (default: `.meta`)
    pub meta_name: String,

    /// User attributes (default: `.attributes`)
    pub attributes_name: String,

    /// Dataset manifest (default: `.data_sets`)
    pub datasets_name: String,
}

impl LayoutConfig {
    /// Whether `name` is one of the layout documents and therefore cannot be
    /// used for a child directory or dataset key.
    pub fn is_reserved(&self, name: &str) -> bool {
        name == self.meta_name || name == self.attributes_name || name == self.datasets_name
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            meta_name: ".meta".to_string(),
            attributes_name: ".attributes".to_string(),
            datasets_name: ".data_sets".to_string(),
        }
    }
}

/// How staged changes reach the disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Spaces per indentation level in written documents
    pub indent: usize,

    /// Stop a bulk commit at the first failing node instead of attempting
    /// every entry and reporting afterwards
    pub stop_on_error: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            indent: 4,
            stop_on_error: false,
        }
    }
}
