#![cfg_attr(feature = "kernel", no_std)]

//! Definitions shared by the Tsugumi driver and its user-mode loader.

pub mod constants;

/// Symbolic link of the Tsugumi control device, as opened from user mode.
pub const DEVICE_SYMLINK: &str = r"\\.\Tsugumi";

/// Custom device type in the user-defined range (0x8000‑0xFFFF).
pub const FILE_DEVICE_TSUGUMI: u32 = 0xA000;

pub const METHOD_BUFFERED: u32 = 0;
pub const FILE_WRITE_ACCESS: u32 = 0x0002;

/// Rust equivalent of the `CTL_CODE` macro.
pub const fn ctl_code(device_type: u32, function: u32, method: u32, access: u32) -> u32 {
    (device_type << 16) | (access << 14) | (function << 2) | method
}

pub const IOCTL_REFRESH_LIST: u32 =
    ctl_code(FILE_DEVICE_TSUGUMI, 0x0A00, METHOD_BUFFERED, FILE_WRITE_ACCESS);
pub const IOCTL_MONITOR_STOP: u32 =
    ctl_code(FILE_DEVICE_TSUGUMI, 0x0A01, METHOD_BUFFERED, FILE_WRITE_ACCESS);

/// Byte count the driver reports for an accepted request.
pub const REQUEST_ACCEPTED: u32 = 1;

/// Commands the loader can issue to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum DriverCommand {
    /// Re-read the patch table from the registry and rebuild the monitored list.
    RefreshList = IOCTL_REFRESH_LIST,

    /// Stop monitoring image loads.
    MonitorStop = IOCTL_MONITOR_STOP,
}

impl DriverCommand {
    /// Control code passed to `DeviceIoControl`.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Name used in status output.
    pub const fn name(self) -> &'static str {
        match self {
            DriverCommand::RefreshList => "TSUGUMI_IOCTL_REFRESH_LIST",
            DriverCommand::MonitorStop => "TSUGUMI_IOCTL_MONITOR_STOP",
        }
    }

    /// Converts a control code back to a command; `None` for codes outside
    /// the Tsugumi set.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            IOCTL_REFRESH_LIST => Some(DriverCommand::RefreshList),
            IOCTL_MONITOR_STOP => Some(DriverCommand::MonitorStop),
            _ => None,
        }
    }
}
