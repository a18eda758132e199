// src/config/model.rs

//! Settings read from `ldr.toml`.
//!
//! Every table and key is optional: an absent file, table or key falls back to
//! the built-in defaults, which follow the build flavour (`signed` feature,
//! debug vs release).

use log::LevelFilter;
use serde::Deserialize;
use shared::constants::{
    DRIVER_IMAGE_NAME, DRIVER_SERVICE_NAME, VBOX_DD_MODULE, VBOX_DRIVER_SERVICE, VBOX_INSTALL_KEY,
    VBOX_INSTALL_VALUE, VBOX_PROCESS_NAME,
};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level runtime config
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging:  LoggingConfig,
    pub driver:   DriverConfig,
    pub target:   TargetConfig,
    pub staging:  StagingConfig,
    pub compiler: CompilerConfig,
}

/// Mirror of the `[logging]` table
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enable: bool,
    pub file:   Option<String>,
    pub level:  String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { enable: false, file: None, level: "INFO".into() }
    }
}

impl LoggingConfig {
    /// Unknown level names fall back to INFO.
    pub fn level_filter(&self) -> LevelFilter {
        match self.level.to_uppercase().as_str() {
            "OFF" => LevelFilter::Off,
            "ERROR" => LevelFilter::Error,
            "WARN" => LevelFilter::Warn,
            "DEBUG" => LevelFilter::Debug,
            "TRACE" => LevelFilter::Trace,
            _ => LevelFilter::Info,
        }
    }
}

/// How the Tsugumi driver gets into the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverMode {
    /// Signed image, registered and started by the loader.
    Signed,
    /// Unsigned image inserted by an external loader; VBoxDrv is restarted
    /// after the refresh command instead.
    Restart,
}

impl Default for DriverMode {
    fn default() -> Self {
        if cfg!(feature = "signed") { DriverMode::Signed } else { DriverMode::Restart }
    }
}

/// Mirror of the `[driver]` table
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub mode:    DriverMode,
    pub service: String,
    /// Relative paths are resolved against the executable directory.
    pub image:   PathBuf,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            mode: DriverMode::default(),
            service: DRIVER_SERVICE_NAME.into(),
            image: PathBuf::from(DRIVER_IMAGE_NAME),
        }
    }
}

/// Mirror of the `[target]` table: the VirtualBox installation being patched.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub process:        String,
    pub module:         String,
    pub install_key:    String,
    pub install_value:  String,
    pub driver_service: String,
    pub process_check:  bool,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            process: VBOX_PROCESS_NAME.into(),
            module: VBOX_DD_MODULE.into(),
            install_key: VBOX_INSTALL_KEY.into(),
            install_value: VBOX_INSTALL_VALUE.into(),
            driver_service: VBOX_DRIVER_SERVICE.into(),
            process_check: !cfg!(debug_assertions),
        }
    }
}

/// Mirror of the `[staging]` table
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    pub dir: Option<PathBuf>,
}

impl StagingConfig {
    /// Directory receiving the private module copy; system temp by default.
    pub fn dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Mirror of the `[compiler]` table
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub program: Option<PathBuf>,
    pub args:    Vec<String>,
}

/// All the ways config loading can go wrong
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
