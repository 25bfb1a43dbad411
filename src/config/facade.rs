//! ConfigLoader facade over the layered sources.

use super::sources;
use super::StoreConfig;
use crate::error::StoreResult;
use config::{Config, File};
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the global file and environment.
    /// Precedence: defaults (lowest) -> global file -> environment (highest).
    pub fn load() -> StoreResult<StoreConfig> {
        let builder = sources::add_global_file(Config::builder())?;
        let builder = sources::add_environment(builder)?;

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Load configuration from a specific file with environment overlay.
    pub fn load_from_file(path: &Path) -> StoreResult<StoreConfig> {
        let builder = Config::builder().add_source(File::from(path));
        let builder = sources::add_environment(builder)?;

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Create default configuration.
    pub fn default() -> StoreConfig {
        StoreConfig::default()
    }
}
