// src/process.rs

//! Running-process check for the target hypervisor.
//!
//! Advisory only: the loader refuses to continue while VirtualBox runs, it
//! never terminates it.

use crate::error::{Error, Result};
use std::io;

pub trait ProcessProbe {
    /// Whether a process whose image name equals `image_name`
    /// (case-insensitive) is running.
    fn is_running(&self, image_name: &str) -> io::Result<bool>;
}

/// Fails with `TargetRunning` while `image_name` is running.
pub fn ensure_not_running(probe: &dyn ProcessProbe, image_name: &str) -> Result<()> {
    if probe.is_running(image_name).map_err(Error::ProcessQuery)? {
        return Err(Error::TargetRunning(image_name.trim_end_matches(".exe").to_string()));
    }
    Ok(())
}

#[cfg(windows)]
pub use toolhelp::Toolhelp;

#[cfg(windows)]
mod toolhelp {
    use super::ProcessProbe;
    use std::{io, mem::size_of};
    use windows_sys::Win32::{
        Foundation::{CloseHandle, ERROR_NO_MORE_FILES, HANDLE, INVALID_HANDLE_VALUE},
        System::Diagnostics::ToolHelp::{
            CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
            TH32CS_SNAPPROCESS,
        },
    };

    /// Walks a ToolHelp process snapshot.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct Toolhelp;

    /// Snapshot handle, closed on drop.
    struct Snapshot(HANDLE);

    impl Drop for Snapshot {
        fn drop(&mut self) {
            unsafe { CloseHandle(self.0) };
        }
    }

    /// Converts a NUL-terminated UTF-16 array to a Rust String
    fn exe_name(buffer: &[u16]) -> String {
        let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
        String::from_utf16_lossy(&buffer[..len])
    }

    fn end_of_list(err: &io::Error) -> bool {
        err.raw_os_error() == Some(ERROR_NO_MORE_FILES as i32)
    }

    impl ProcessProbe for Toolhelp {
        fn is_running(&self, image_name: &str) -> io::Result<bool> {
            let handle = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) };
            if handle == INVALID_HANDLE_VALUE {
                return Err(io::Error::last_os_error());
            }
            let snapshot = Snapshot(handle);

            let mut entry: PROCESSENTRY32W = unsafe { std::mem::zeroed() };
            entry.dwSize = size_of::<PROCESSENTRY32W>() as u32;

            if unsafe { Process32FirstW(snapshot.0, &mut entry) } == 0 {
                let err = io::Error::last_os_error();
                return if end_of_list(&err) { Ok(false) } else { Err(err) };
            }

            loop {
                if exe_name(&entry.szExeFile).eq_ignore_ascii_case(image_name) {
                    return Ok(true);
                }
                if unsafe { Process32NextW(snapshot.0, &mut entry) } == 0 {
                    let err = io::Error::last_os_error();
                    return if end_of_list(&err) { Ok(false) } else { Err(err) };
                }
            }
        }
    }
}
