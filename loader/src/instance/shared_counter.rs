//! Cross‑process instance counter
//! ------------------------------
//! A single `i32` living in memory shared by every `ldr` process on the host:
//
//!   ┌──── 0 ──────── 4 ┐
//!   │ i32 instances    │
//!   └──────────────────┘
//
//! * On Windows the cell is a pagefile-backed named section
//!   (`Global\TsugumiLoaderInstances`), created by whichever process comes
//!   first and released by the kernel with the last handle.
//! * Elsewhere (and in tests) the cell is a memory-mapped file; every process
//!   mapping the same path shares it.
//!
//! All updates are single atomic RMW instructions; there is no lock.

use memmap2::{MmapMut, MmapOptions};
use std::{
    fs::OpenOptions,
    io,
    path::Path,
    sync::atomic::{AtomicI32, Ordering},
};

/// Section name used by the loader on Windows.
pub const COUNTER_SECTION_NAME: &str = r"Global\TsugumiLoaderInstances";

const CELL_SIZE: usize = size_of::<AtomicI32>();

enum Backing {
    #[cfg(windows)]
    Section(section::Section),
    File(MmapMut),
}

/// RAII wrapper around the shared cell: maps on construction, unmaps on drop.
pub struct SharedCounter {
    backing: Backing,
}

impl SharedCounter {
    /// Create or open the named section holding the counter.
    #[cfg(windows)]
    pub fn open_named(name: &str) -> io::Result<Self> {
        Ok(Self { backing: Backing::Section(section::Section::create(name, CELL_SIZE)?) })
    }

    /// Create or open a file-backed counter at `path`.
    pub fn open_file(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).create(true).truncate(false).open(path)?;
        if file.metadata()?.len() < CELL_SIZE as u64 {
            // zero-filled extension, so a fresh counter starts at 0
            file.set_len(CELL_SIZE as u64)?;
        }
        let map = unsafe { MmapOptions::new().len(CELL_SIZE).map_mut(&file)? };
        Ok(Self { backing: Backing::File(map) })
    }

    fn cell(&self) -> &AtomicI32 {
        let base = match &self.backing {
            #[cfg(windows)]
            Backing::Section(section) => section.base(),
            Backing::File(map) => map.as_ptr(),
        };
        // Mapped views are page aligned and at least CELL_SIZE long.
        unsafe { &*(base as *const AtomicI32) }
    }

    /// Atomically add one; returns the post-increment value.
    pub fn increment(&self) -> i32 {
        self.cell().fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Atomically subtract one; returns the post-decrement value.
    pub fn decrement(&self) -> i32 {
        self.cell().fetch_sub(1, Ordering::SeqCst) - 1
    }

    /// Current value, for diagnostics only.
    pub fn current(&self) -> i32 {
        self.cell().load(Ordering::SeqCst)
    }
}

#[cfg(windows)]
mod section {
    use std::{ffi::OsStr, io, os::windows::prelude::OsStrExt, ptr};
    use windows_sys::Win32::{
        Foundation::{CloseHandle, HANDLE, INVALID_HANDLE_VALUE},
        System::Memory::{
            CreateFileMappingW, MapViewOfFile, UnmapViewOfFile, FILE_MAP_ALL_ACCESS,
            MEMORY_MAPPED_VIEW_ADDRESS, PAGE_READWRITE,
        },
    };

    /// Pagefile-backed named section, mapped read/write.
    pub struct Section {
        handle: HANDLE,
        view:   MEMORY_MAPPED_VIEW_ADDRESS,
    }

    impl Section {
        pub fn create(name: &str, size: usize) -> io::Result<Self> {
            let wide: Vec<u16> = OsStr::new(name).encode_wide().chain(Some(0)).collect();

            // Opens the existing section when another instance created it first.
            let handle = unsafe {
                CreateFileMappingW(
                    INVALID_HANDLE_VALUE,
                    ptr::null(),
                    PAGE_READWRITE,
                    0,
                    size as u32,
                    wide.as_ptr(),
                )
            };
            if handle.is_null() {
                return Err(io::Error::last_os_error());
            }

            let view = unsafe { MapViewOfFile(handle, FILE_MAP_ALL_ACCESS, 0, 0, size) };
            if view.Value.is_null() {
                let err = io::Error::last_os_error();
                unsafe { CloseHandle(handle) };
                return Err(err);
            }

            Ok(Self { handle, view })
        }

        pub fn base(&self) -> *const u8 {
            self.view.Value as *const u8
        }
    }

    impl Drop for Section {
        fn drop(&mut self) {
            unsafe {
                UnmapViewOfFile(self.view); // unmap first
                CloseHandle(self.handle);   // then close handle
            }
        }
    }
}
