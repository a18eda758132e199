// src/system.rs

//! Host-wide queries and side effects: OS version gate and cache purge.

use std::io;

/// Oldest supported NT major version (Vista).
pub const MIN_NT_MAJOR_VERSION: u32 = 6;

pub trait HostSystem {
    /// NT major version of the running system; 0 when it cannot be queried.
    fn os_major_version(&self) -> u32;

    /// Drops cached file views so the patched module is re-read from disk.
    fn purge_cache(&self) -> io::Result<()>;
}

#[cfg(windows)]
pub use native::NativeHost;

#[cfg(windows)]
mod native {
    use super::HostSystem;
    use std::{ffi::OsStr, io, mem, os::windows::prelude::OsStrExt, ptr};
    use windows_sys::Win32::{
        Foundation::{CloseHandle, GetLastError, ERROR_NOT_ALL_ASSIGNED, HANDLE, LUID},
        Security::{
            AdjustTokenPrivileges, LookupPrivilegeValueW, LUID_AND_ATTRIBUTES,
            SE_PRIVILEGE_ENABLED, TOKEN_ADJUST_PRIVILEGES, TOKEN_PRIVILEGES, TOKEN_QUERY,
        },
        System::{
            Memory::SetSystemFileCacheSize,
            SystemInformation::{GetVersionExW, OSVERSIONINFOW},
            Threading::{GetCurrentProcess, OpenProcessToken},
        },
    };

    const SE_INCREASE_QUOTA_NAME: &str = "SeIncreaseQuotaPrivilege";

    #[derive(Debug, Default, Clone, Copy)]
    pub struct NativeHost;

    impl HostSystem for NativeHost {
        fn os_major_version(&self) -> u32 {
            let mut info: OSVERSIONINFOW = unsafe { mem::zeroed() };
            info.dwOSVersionInfoSize = mem::size_of::<OSVERSIONINFOW>() as u32;
            if unsafe { GetVersionExW(&mut info) } == 0 {
                return 0;
            }
            info.dwMajorVersion
        }

        fn purge_cache(&self) -> io::Result<()> {
            enable_privilege(SE_INCREASE_QUOTA_NAME)?;
            // (-1, -1) empties the system file cache working set
            if unsafe { SetSystemFileCacheSize(usize::MAX, usize::MAX, 0) } == 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        }
    }

    /// Enables `name` in the process token.
    fn enable_privilege(name: &str) -> io::Result<()> {
        let wide: Vec<u16> = OsStr::new(name).encode_wide().chain(Some(0)).collect();

        let mut token: HANDLE = ptr::null_mut();
        if unsafe { OpenProcessToken(GetCurrentProcess(), TOKEN_ADJUST_PRIVILEGES | TOKEN_QUERY, &mut token) } == 0 {
            return Err(io::Error::last_os_error());
        }

        let mut luid = LUID { LowPart: 0, HighPart: 0 };
        let result = if unsafe { LookupPrivilegeValueW(ptr::null(), wide.as_ptr(), &mut luid) } == 0 {
            Err(io::Error::last_os_error())
        } else {
            let privileges = TOKEN_PRIVILEGES {
                PrivilegeCount: 1,
                Privileges: [LUID_AND_ATTRIBUTES { Luid: luid, Attributes: SE_PRIVILEGE_ENABLED }],
            };
            let ok = unsafe {
                AdjustTokenPrivileges(token, 0, &privileges, 0, ptr::null_mut(), ptr::null_mut())
            };
            // succeeds with ERROR_NOT_ALL_ASSIGNED when the account lacks it
            let last = unsafe { GetLastError() };
            if ok == 0 || last == ERROR_NOT_ALL_ASSIGNED {
                Err(io::Error::from_raw_os_error(last as i32))
            } else {
                Ok(())
            }
        };

        unsafe { CloseHandle(token) };
        result
    }
}
