// src/config/loader.rs

//! # Configuration Loader
//!
//! Reads `ldr.toml` and deserializes it into `Config`. The file is optional.

use crate::config::model::{Config, ConfigError};
use crate::ldr_log;
use log::Level;
use std::{fs, path::Path};

/// Settings file looked up next to the executable.
pub const CONFIG_FILE_NAME: &str = "ldr.toml";

/// Load and parse the configuration from `path`.
/// A missing file yields the defaults; a malformed one is an error.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        ldr_log!(Level::Debug, "config", "No settings at {:?}, using defaults", path);
        return Ok(Config::default());
    }
    ldr_log!(Level::Debug, "config", "Reading settings from {:?}", path);
    let txt = fs::read_to_string(path)?;
    let cfg: Config = toml::from_str(&txt)?;
    ldr_log!(Level::Debug, "config", "Loaded settings from {:?}", path);
    Ok(cfg)
}
