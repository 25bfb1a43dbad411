//! Configuration sources: global file and DIRSTORE__* environment overlay.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment, File, FileFormat};
use std::path::PathBuf;

/// Location of the per-user config file (`<config dir>/config.toml`).
pub fn global_file_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "dirstore")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Add the global file if the platform has a config directory. A missing
/// file is not an error.
pub fn add_global_file(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let Some(path) = global_file_path() else {
        return Ok(builder);
    };
    Ok(builder.add_source(
        File::from(path)
            .format(FileFormat::Toml)
            .required(false),
    ))
}

/// Add environment variable overlay to builder.
/// Uses DIRSTORE prefix and __ as separator for nested keys, e.g.
/// `DIRSTORE__PERSISTENCE__INDENT=2`.
pub fn add_environment(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix("DIRSTORE")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    ))
}
