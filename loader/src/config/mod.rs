//! Public API for configuration

pub mod loader;
pub mod model;

// Re-export the main entrypoints:
pub use loader::{load, CONFIG_FILE_NAME};
pub use model::{Config, ConfigError, DriverMode};
