// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::ConfigFile;
use crate::config::validate::validate_config;
use crate::errors::Result;

/// Read and deserialize a pipeline file without semantic validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let config = parse_str(&contents)?;
    debug!(path = ?path, tasks = config.task.len(), "pipeline file parsed");
    Ok(config)
}

/// Deserialize a pipeline definition from TOML text.
pub fn parse_str(contents: &str) -> Result<ConfigFile> {
    Ok(toml::from_str(contents)?)
}

/// Load a pipeline file and validate it.
///
/// This is the entry point used by the binary. It checks for:
/// - at least one task,
/// - unknown, duplicated or self `after` references,
/// - operations fed the wrong number of inputs,
/// - dependency cycles.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let config = load_from_path(&path)?;
    validate_config(&config)?;
    Ok(config)
}
