//! IOCTL communication interface with the kernel driver.
//!
//! This module sends the loader's single command per run to the Tsugumi
//! control device and interprets the answer.
//!
//! Key responsibilities:
//! - Open a handle to the driver device (absent device = driver not loaded).
//! - Issue exactly one payload-less control code.
//! - Treat a returned byte count of exactly one as acceptance.
//! - Close the handle, then purge the system file cache on acceptance so no
//!   stale cached view of the patched module survives.

use crate::ldr_log;
use crate::system::HostSystem;
use log::Level;
use shared::{DriverCommand, REQUEST_ACCEPTED};
use std::io;

/// Opens device objects by symbolic link.
pub trait DeviceChannel {
    fn open(&self, link: &str) -> io::Result<Box<dyn DeviceLink + '_>>;
}

/// An open device handle, closed on drop.
pub trait DeviceLink {
    /// Raw handle value, shown in status output.
    fn id(&self) -> usize;

    /// Sends `code` with empty input and output buffers and returns the byte
    /// count reported by the driver.
    fn control(&self, code: u32) -> io::Result<u32>;
}

/// What became of the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The device could not be opened; nothing was sent.
    NotLoaded,
    /// The driver did not accept the request.
    Failed { bytes_returned: u32 },
    /// The driver accepted the request; `cache_purged` tells whether the
    /// follow-up cache purge went through.
    Succeeded { cache_purged: bool },
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CommandOutcome::Succeeded { .. })
    }
}

pub struct DriverController<'a> {
    channel: &'a dyn DeviceChannel,
    host:    &'a dyn HostSystem,
    link:    &'a str,
}

impl<'a> DriverController<'a> {
    pub fn new(channel: &'a dyn DeviceChannel, host: &'a dyn HostSystem, link: &'a str) -> Self {
        Self { channel, host, link }
    }

    /// Delivers `command` once.
    pub fn send(&self, command: DriverCommand) -> CommandOutcome {
        let device = match self.channel.open(self.link) {
            Ok(device) => device,
            Err(e) => {
                ldr_log!(
                    Level::Error,
                    "device",
                    "Cannot open Tsugumi device, make sure driver is loaded before running this program"
                );
                ldr_log!(Level::Debug, "device", "open {} failed: {}", self.link, e);
                return CommandOutcome::NotLoaded;
            }
        };
        ldr_log!(Level::Info, "device", "Tsugumi device handle opened = {}", device.id());

        let bytes_returned = device.control(command.code()).unwrap_or_else(|e| {
            ldr_log!(Level::Debug, "device", "DeviceIoControl({:#x}) failed: {}", command.code(), e);
            0
        });
        let accepted = bytes_returned == REQUEST_ACCEPTED;
        ldr_log!(
            Level::Info,
            "device",
            "{} request {}",
            command.name(),
            if accepted { "successful" } else { "failed" }
        );

        drop(device);

        if !accepted {
            return CommandOutcome::Failed { bytes_returned };
        }

        // force windows to rebuild its image cache
        ldr_log!(Level::Info, "device", "purge system cache");
        let cache_purged = match self.host.purge_cache() {
            Ok(()) => true,
            Err(e) => {
                ldr_log!(Level::Warn, "device", "System cache purge failed: {}", e);
                false
            }
        };
        CommandOutcome::Succeeded { cache_purged }
    }
}
