// src/table/custom.rs

//! Loader for a patch table supplied on the command line.

use crate::error::{Error, Result};
use crate::ldr_log;
use crate::table::PatchTable;
use log::Level;
use shared::constants::MAX_CUSTOM_TABLE_SIZE;
use std::{
    fs::File,
    io::{ErrorKind, Read},
    path::Path,
};

/// Reads the whole file at `path` into a table.
///
/// Files of size 0 or above `MAX_CUSTOM_TABLE_SIZE` are rejected without
/// reading. A short read yields a table holding only the bytes actually read.
pub fn load_custom(path: &Path) -> Result<PatchTable> {
    let read_err = |source| Error::TableRead { path: path.to_owned(), source };

    // std opens with FILE_SHARE_READ | FILE_SHARE_WRITE on Windows
    let mut file = File::open(path).map_err(read_err)?;
    let size = file.metadata().map_err(read_err)?.len();

    if size == 0 || size > MAX_CUSTOM_TABLE_SIZE {
        return Err(Error::TableSize { path: path.to_owned(), size, max: MAX_CUSTOM_TABLE_SIZE });
    }

    let mut buf = vec![0u8; size as usize];
    let read = read_up_to(&mut file, &mut buf).map_err(read_err)?;
    if read < buf.len() {
        ldr_log!(Level::Warn, "table", "Short read on {:?}: {} of {} bytes", path, read, size);
        buf.truncate(read);
    }

    PatchTable::new(buf).ok_or_else(|| Error::TableEmpty(path.to_owned()))
}

/// Fills `buf` until EOF or full; returns the number of bytes read.
fn read_up_to(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
