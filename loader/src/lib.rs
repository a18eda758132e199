// src/lib.rs
// ────────────────────────────────────────────────────────────────────────────
// Public library entry point.  Re-export everything for both `main.rs` and
// integration tests.

mod macros;

pub mod app;
pub mod cmdline;
pub mod comms;
pub mod config;
pub mod driver;
pub mod error;
pub mod instance;
pub mod process;
pub mod store;
pub mod system;
pub mod table;

pub use app::{execute, Loader, Platform, RunOutcome};
pub use error::{Error, Result};
