//! Communication with the Tsugumi driver through its control device.

#[cfg(windows)]
pub mod device;
pub mod ioctl;

pub use ioctl::{CommandOutcome, DeviceChannel, DeviceLink, DriverController};
