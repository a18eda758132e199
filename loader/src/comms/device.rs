// src/comms/device.rs

//! `DeviceChannel` over `CreateFileW` / `DeviceIoControl`.

use super::{DeviceChannel, DeviceLink};
use std::{ffi::OsStr, io, os::windows::prelude::OsStrExt, ptr};
use windows_sys::Win32::{
    Foundation::{CloseHandle, GENERIC_READ, GENERIC_WRITE, HANDLE, INVALID_HANDLE_VALUE},
    Storage::FileSystem::{CreateFileW, FILE_ATTRIBUTE_NORMAL, OPEN_EXISTING},
    System::IO::DeviceIoControl,
};

/// Opens device symbolic links (`\\.\Name`) for read/write, exclusive.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeviceFiles;

impl DeviceChannel for DeviceFiles {
    fn open(&self, link: &str) -> io::Result<Box<dyn DeviceLink + '_>> {
        let wide: Vec<u16> = OsStr::new(link).encode_wide().chain(Some(0)).collect();
        let handle = unsafe {
            CreateFileW(
                wide.as_ptr(),
                GENERIC_READ | GENERIC_WRITE,
                0,
                ptr::null(),
                OPEN_EXISTING,
                FILE_ATTRIBUTE_NORMAL,
                ptr::null_mut(),
            )
        };
        if handle == INVALID_HANDLE_VALUE {
            return Err(io::Error::last_os_error());
        }
        Ok(Box::new(Device(handle)))
    }
}

struct Device(HANDLE);

impl DeviceLink for Device {
    fn id(&self) -> usize {
        self.0 as usize
    }

    fn control(&self, code: u32) -> io::Result<u32> {
        let mut bytes_returned: u32 = 0;
        let ok = unsafe {
            DeviceIoControl(
                self.0,
                code,
                ptr::null(),
                0,
                ptr::null_mut(),
                0,
                &mut bytes_returned,
                ptr::null_mut(),
            )
        };
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(bytes_returned)
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        unsafe { CloseHandle(self.0) };
    }
}
