// src/store/mod.rs

//! Durable configuration store (the registry on Windows) and the persister
//! that publishes the patch table to the driver.
//!
//! Key responsibilities:
//! - Abstract the hierarchical key/value store behind `ConfigStore`/`StoreKey`.
//! - Write the acquired table as a binary value, creating the key path.
//! - Clear a stale value when no table applies.

#[cfg(windows)]
pub mod registry;

use crate::error::{Error, Result};
use crate::ldr_log;
use crate::table::PatchTable;
use log::Level;
use shared::constants::{PARAMETERS_KEY, PATCH_TABLE_VALUE};
use std::io;

/// Root of the store; paths are relative to it (`HKEY_LOCAL_MACHINE`).
pub trait ConfigStore {
    /// Opens an existing key for reading.
    fn open_key(&self, path: &str) -> io::Result<Box<dyn StoreKey + '_>>;

    /// Opens a key for writing, creating every missing component of `path`.
    fn create_key(&self, path: &str) -> io::Result<Box<dyn StoreKey + '_>>;
}

/// An open key. Implementations release the underlying handle on drop.
pub trait StoreKey {
    /// Reads a string value.
    fn query_string(&self, name: &str) -> io::Result<String>;

    /// Writes (or overwrites) a binary value.
    fn set_binary(&self, name: &str, data: &[u8]) -> io::Result<()>;

    /// Removes a value; an absent value is reported as `NotFound`.
    fn delete_value(&self, name: &str) -> io::Result<()>;
}

/// Publishes `table` under the driver parameters key, or clears any stale
/// table when `table` is `None`.
///
/// Failing to create/open the key or to write the value is fatal. Failing to
/// delete is not: an absent value means "no table" to the driver as well.
pub fn persist(store: &dyn ConfigStore, table: Option<&PatchTable>) -> Result<()> {
    let key = store
        .create_key(PARAMETERS_KEY)
        .map_err(|source| Error::KeyCreate { path: PARAMETERS_KEY.into(), source })?;

    match table {
        Some(table) => {
            key.set_binary(PATCH_TABLE_VALUE, table.as_bytes())
                .map_err(|source| Error::ValueWrite { name: PATCH_TABLE_VALUE.into(), source })?;
            ldr_log!(
                Level::Debug,
                "store",
                "Wrote {} bytes to {}\\{}",
                table.len(),
                PARAMETERS_KEY,
                PATCH_TABLE_VALUE
            );
        }
        None => {
            if let Err(e) = key.delete_value(PATCH_TABLE_VALUE) {
                ldr_log!(Level::Debug, "store", "No stale table removed: {}", e);
            }
        }
    }
    Ok(())
}
