// src/table/mod.rs

//! Patch table acquisition.
//!
//! A run obtains exactly one table, either from a file given on the command
//! line (`custom`) or by compiling the installed VBoxDD module (`builder`).
//! The bytes are opaque to the loader; only the driver interprets them.

pub mod builder;
pub mod compiler;
pub mod custom;

pub use builder::{TableBuilder, STAGING_FILE_NAME};
pub use compiler::{CommandCompiler, PatchCompiler, UnconfiguredCompiler};
pub use custom::load_custom;

use sha2::{Digest, Sha256};

/// Owned, non-empty patch table.
///
/// "No table" is expressed as `Option<PatchTable>::None`, so a table value
/// always carries at least one byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchTable {
    bytes: Box<[u8]>,
}

impl PatchTable {
    /// Wraps `bytes`; `None` when empty.
    pub fn new(bytes: Vec<u8>) -> Option<Self> {
        if bytes.is_empty() {
            None
        } else {
            Some(Self { bytes: bytes.into_boxed_slice() })
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Hex SHA-256 of the table, printed so persisted content can be audited.
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }
}
