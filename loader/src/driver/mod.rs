// src/driver/mod.rs

//! Getting the Tsugumi driver into the kernel.
//!
//! Two strategies share the `DriverActivator` capability and one of them is
//! picked once at startup from `[driver] mode`:
//!
//! * `SignedDriverLoader` registers and starts the signed image before the
//!   refresh command is sent. Failure aborts the run.
//! * `RestartFallback` assumes an external loader already inserted the
//!   unsigned image. It loads nothing up front, and once the refresh command
//!   has been dispatched it restarts the VirtualBox support driver so the
//!   monitor sees VBoxDD being mapped again.

#[cfg(windows)]
pub mod scm;

use crate::config::model::{DriverConfig, DriverMode, TargetConfig};
use crate::error::{Error, Result};
use crate::ldr_log;
use log::Level;
use std::{
    io,
    path::{Path, PathBuf},
};

/// Service control manager operations used by the strategies.
pub trait ServiceControl {
    /// Registers `service` as an on-demand kernel driver for `image` when it
    /// does not exist yet, then starts it. Already running is success.
    fn start_driver(&self, service: &str, image: &Path) -> io::Result<()>;

    /// Stops `service` (if running) and starts it again.
    fn restart(&self, service: &str) -> io::Result<()>;
}

/// Result of the post-dispatch restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartOutcome {
    Restarted,
    /// Win32 error code of the failing step.
    Failed(u32),
}

pub trait DriverActivator {
    fn mode(&self) -> DriverMode;

    /// Runs before the refresh command; an error aborts the run.
    fn ensure_loaded(&self) -> Result<()>;

    /// Runs after the refresh command was dispatched, whatever its outcome.
    fn after_dispatch(&self) -> Option<RestartOutcome>;
}

pub struct SignedDriverLoader<'a> {
    services: &'a dyn ServiceControl,
    service:  String,
    image:    PathBuf,
}

impl<'a> SignedDriverLoader<'a> {
    pub fn new(services: &'a dyn ServiceControl, service: impl Into<String>, image: PathBuf) -> Self {
        Self { services, service: service.into(), image }
    }
}

impl DriverActivator for SignedDriverLoader<'_> {
    fn mode(&self) -> DriverMode {
        DriverMode::Signed
    }

    fn ensure_loaded(&self) -> Result<()> {
        ldr_log!(Level::Debug, "driver", "Loading {} from {:?}", self.service, self.image);
        self.services
            .start_driver(&self.service, &self.image)
            .map_err(|source| Error::DriverLoad { service: self.service.clone(), source })
    }

    fn after_dispatch(&self) -> Option<RestartOutcome> {
        None
    }
}

pub struct RestartFallback<'a> {
    services: &'a dyn ServiceControl,
    service:  String,
}

impl<'a> RestartFallback<'a> {
    pub fn new(services: &'a dyn ServiceControl, service: impl Into<String>) -> Self {
        Self { services, service: service.into() }
    }
}

impl DriverActivator for RestartFallback<'_> {
    fn mode(&self) -> DriverMode {
        DriverMode::Restart
    }

    fn ensure_loaded(&self) -> Result<()> {
        ldr_log!(Level::Debug, "driver", "Expecting Tsugumi to be loaded externally");
        Ok(())
    }

    fn after_dispatch(&self) -> Option<RestartOutcome> {
        let outcome = match self.services.restart(&self.service) {
            Ok(()) => {
                ldr_log!(Level::Info, "driver", "Restart of {} successful", self.service);
                RestartOutcome::Restarted
            }
            Err(e) => {
                let code = e.raw_os_error().unwrap_or(-1) as u32;
                ldr_log!(Level::Warn, "driver", "Restart of {} = 0x{:X}", self.service, code);
                RestartOutcome::Failed(code)
            }
        };
        Some(outcome)
    }
}

/// Builds the strategy selected by `driver.mode`. A relative image path is
/// resolved against `exe_dir`.
pub fn activator_for<'a>(
    driver: &DriverConfig,
    target: &TargetConfig,
    exe_dir: &Path,
    services: &'a dyn ServiceControl,
) -> Box<dyn DriverActivator + 'a> {
    match driver.mode {
        DriverMode::Signed => {
            Box::new(SignedDriverLoader::new(services, driver.service.clone(), exe_dir.join(&driver.image)))
        }
        DriverMode::Restart => Box::new(RestartFallback::new(services, target.driver_service.clone())),
    }
}
