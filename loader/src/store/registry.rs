// src/store/registry.rs

//! `ConfigStore` over `HKEY_LOCAL_MACHINE`.

use super::{ConfigStore, StoreKey};
use std::{ffi::OsStr, io, os::windows::prelude::OsStrExt, ptr};
use windows_sys::Win32::{
    Foundation::{ERROR_SUCCESS, WIN32_ERROR},
    System::Registry::{
        RegCloseKey, RegCreateKeyExW, RegDeleteValueW, RegOpenKeyExW, RegQueryValueExW,
        RegSetValueExW, HKEY, HKEY_LOCAL_MACHINE, KEY_ALL_ACCESS, KEY_READ, REG_BINARY,
        REG_EXPAND_SZ, REG_OPTION_NON_VOLATILE, REG_SZ, REG_VALUE_TYPE,
    },
};

/// Null-terminated UTF-16 for the W APIs.
fn to_wide(s: &str) -> Vec<u16> {
    OsStr::new(s).encode_wide().chain(Some(0)).collect()
}

fn check(status: WIN32_ERROR) -> io::Result<()> {
    if status == ERROR_SUCCESS {
        Ok(())
    } else {
        Err(io::Error::from_raw_os_error(status as i32))
    }
}

/// The local machine hive.
#[derive(Debug, Default, Clone, Copy)]
pub struct Registry;

impl ConfigStore for Registry {
    fn open_key(&self, path: &str) -> io::Result<Box<dyn StoreKey + '_>> {
        let wide = to_wide(path);
        let mut hkey: HKEY = ptr::null_mut();
        check(unsafe { RegOpenKeyExW(HKEY_LOCAL_MACHINE, wide.as_ptr(), 0, KEY_READ, &mut hkey) })?;
        Ok(Box::new(RegKey(hkey)))
    }

    fn create_key(&self, path: &str) -> io::Result<Box<dyn StoreKey + '_>> {
        let wide = to_wide(path);
        let mut hkey: HKEY = ptr::null_mut();
        check(unsafe {
            RegCreateKeyExW(
                HKEY_LOCAL_MACHINE,
                wide.as_ptr(),
                0,
                ptr::null(),
                REG_OPTION_NON_VOLATILE,
                KEY_ALL_ACCESS,
                ptr::null(),
                &mut hkey,
                ptr::null_mut(),
            )
        })?;
        Ok(Box::new(RegKey(hkey)))
    }
}

/// Open key handle, closed on drop.
struct RegKey(HKEY);

impl StoreKey for RegKey {
    fn query_string(&self, name: &str) -> io::Result<String> {
        let wide = to_wide(name);
        let mut kind: REG_VALUE_TYPE = 0;
        let mut size: u32 = 0;

        // 1 ▸ size probe
        check(unsafe {
            RegQueryValueExW(self.0, wide.as_ptr(), ptr::null(), &mut kind, ptr::null_mut(), &mut size)
        })?;
        if kind != REG_SZ && kind != REG_EXPAND_SZ {
            return Err(io::Error::new(io::ErrorKind::InvalidData, format!("{name} is not a string value")));
        }

        // 2 ▸ data
        let mut buf = vec![0u16; (size as usize).div_ceil(2)];
        check(unsafe {
            RegQueryValueExW(
                self.0,
                wide.as_ptr(),
                ptr::null(),
                &mut kind,
                buf.as_mut_ptr() as *mut u8,
                &mut size,
            )
        })?;
        buf.truncate(size as usize / 2);
        while buf.last() == Some(&0) {
            buf.pop();
        }
        Ok(String::from_utf16_lossy(&buf))
    }

    fn set_binary(&self, name: &str, data: &[u8]) -> io::Result<()> {
        let wide = to_wide(name);
        check(unsafe {
            RegSetValueExW(self.0, wide.as_ptr(), 0, REG_BINARY, data.as_ptr(), data.len() as u32)
        })
    }

    fn delete_value(&self, name: &str) -> io::Result<()> {
        let wide = to_wide(name);
        check(unsafe { RegDeleteValueW(self.0, wide.as_ptr()) })
    }
}

impl Drop for RegKey {
    fn drop(&mut self) {
        unsafe { RegCloseKey(self.0) };
    }
}
