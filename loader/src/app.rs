// src/app.rs

//! Run orchestration.
//!
//! ```text
//! Start → SingletonCheck → HostCheck → ParseCommand
//!   /?      → help
//!   /s      → SendCommand(MonitorStop)
//!   default → AcquireTable → Persist → ProcessGuard → EnsureDriverLoaded
//!             → SendCommand(RefreshList) → RestartFallback
//! ```
//!
//! Every step returns a `Result`; the first failure is reported once and ends
//! the run. All branches come back to the caller, which owns the single exit
//! point.

use crate::cmdline::{self, Invocation, HELP};
use crate::comms::{CommandOutcome, DeviceChannel, DriverController};
use crate::config::Config;
use crate::driver::{DriverActivator, RestartOutcome};
use crate::error::{Error, Result};
use crate::instance::{InstanceGuard, SharedCounter};
use crate::ldr_log;
use crate::process::{self, ProcessProbe};
use crate::store::{self, ConfigStore};
use crate::system::{HostSystem, MIN_NT_MAJOR_VERSION};
use crate::table::{self, PatchCompiler, PatchTable, TableBuilder};
use log::Level;
use shared::{DriverCommand, DEVICE_SYMLINK};
use std::{ffi::OsString, path::Path};

/// The OS seams a run goes through.
#[derive(Clone, Copy)]
pub struct Platform<'a> {
    pub store:     &'a dyn ConfigStore,
    pub compiler:  &'a dyn PatchCompiler,
    pub processes: &'a dyn ProcessProbe,
    pub device:    &'a dyn DeviceChannel,
    pub host:      &'a dyn HostSystem,
}

/// How a run ended. Never mapped to the exit status.
#[derive(Debug)]
pub enum RunOutcome {
    /// Another instance holds the singleton; nothing was done.
    AlreadyRunning,
    /// Help text was printed.
    Help,
    /// A step failed before the command could be dispatched.
    Aborted(Error),
    /// A command was dispatched (or the device was found missing).
    Completed {
        command: DriverCommand,
        outcome: CommandOutcome,
        restart: Option<RestartOutcome>,
    },
}

pub struct Loader<'a> {
    config:    &'a Config,
    platform:  Platform<'a>,
    activator: Box<dyn DriverActivator + 'a>,
}

impl<'a> Loader<'a> {
    pub fn new(config: &'a Config, platform: Platform<'a>, activator: Box<dyn DriverActivator + 'a>) -> Self {
        Self { config, platform, activator }
    }

    /// Carries out one invocation.
    pub fn run(&self, invocation: Invocation) -> RunOutcome {
        if let Err(e) = self.check_host() {
            return self.abort(e);
        }

        match invocation {
            Invocation::Help => {
                println!("{HELP}");
                RunOutcome::Help
            }
            Invocation::Stop => {
                let command = DriverCommand::MonitorStop;
                let outcome = self.controller().send(command);
                RunOutcome::Completed { command, outcome, restart: None }
            }
            Invocation::CustomTable(path) => self.refresh(Some(&path)),
            Invocation::Refresh => self.refresh(None),
        }
    }

    fn refresh(&self, custom: Option<&Path>) -> RunOutcome {
        if let Err(e) = self.prepare(custom) {
            return self.abort(e);
        }

        let command = DriverCommand::RefreshList;
        let outcome = self.controller().send(command);
        let restart = self.activator.after_dispatch();
        RunOutcome::Completed { command, outcome, restart }
    }

    /// Everything that must succeed before the refresh command is sent.
    fn prepare(&self, custom: Option<&Path>) -> Result<()> {
        let table = self.acquire(custom)?;
        ldr_log!(
            Level::Info,
            "table",
            "Patch table size = {} bytes, sha256 = {}",
            table.len(),
            table.fingerprint()
        );

        if let Err(e) = store::persist(self.platform.store, Some(&table)) {
            ldr_log!(Level::Error, "store", "Cannot write Tsugumi settings");
            return Err(e);
        }
        drop(table);
        ldr_log!(Level::Info, "store", "Tsugumi patch table parameters set");

        if self.config.target.process_check {
            process::ensure_not_running(self.platform.processes, &self.config.target.process)?;
        }

        self.activator.ensure_loaded()
    }

    fn acquire(&self, custom: Option<&Path>) -> Result<PatchTable> {
        match custom {
            Some(path) => table::load_custom(path).inspect_err(|_| {
                ldr_log!(Level::Error, "table", "Error reading file at parameter 1");
            }),
            None => {
                let builder = TableBuilder::new(
                    self.platform.store,
                    self.platform.compiler,
                    &self.config.target,
                    self.config.staging.dir(),
                );
                let table = builder.build().inspect_err(|_| {
                    ldr_log!(Level::Error, "table", "Could not load patch table");
                })?;
                ldr_log!(Level::Info, "table", "Patch table created");
                Ok(table)
            }
        }
    }

    fn check_host(&self) -> Result<()> {
        let major = self.platform.host.os_major_version();
        if major < MIN_NT_MAJOR_VERSION {
            return Err(Error::UnsupportedOs(major));
        }
        Ok(())
    }

    fn controller(&self) -> DriverController<'_> {
        DriverController::new(self.platform.device, self.platform.host, DEVICE_SYMLINK)
    }

    fn abort(&self, e: Error) -> RunOutcome {
        ldr_log!(Level::Error, "loader", "{}", e);
        RunOutcome::Aborted(e)
    }
}

/// Enforces the singleton, then runs the invocation named by `args` (the
/// arguments after the program name). The instance count is released before
/// this returns, on every path.
pub fn execute<I>(counter: &SharedCounter, args: I, loader: &Loader<'_>) -> RunOutcome
where
    I: IntoIterator<Item = OsString>,
{
    let guard = InstanceGuard::enter(counter);
    if !guard.is_first() {
        ldr_log!(Level::Debug, "instance", "Another instance is active ({})", guard.count());
        return RunOutcome::AlreadyRunning;
    }

    loader.run(cmdline::parse(args))
}
