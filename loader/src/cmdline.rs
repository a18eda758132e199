// src/cmdline.rs

//! Command interpreter.
//!
//! Only the first argument is significant; anything after it is ignored.
//!
//! ```text
//! LOADER [/s] or [Table]
//! ```

use std::{ffi::OsString, path::PathBuf};

/// Longest token considered, in characters (MAX_PATH).
pub const MAX_TOKEN_CHARS: usize = 260;

pub const HELP: &str = "\
Sets parameters for Tsugumi driver.

Optional parameters to execute:

LOADER [/s] or [Table]

  /s - stop monitoring and purge system cache.
  Table - optional, custom VBoxDD patch table fullpath.

  Example: ldr.exe vboxdd.bin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// `/?`: print help and leave.
    Help,
    /// `/s`: stop monitoring.
    Stop,
    /// Any other token: path of a custom patch table.
    CustomTable(PathBuf),
    /// No token: refresh with an auto-built table.
    Refresh,
}

/// Interprets the arguments that follow the program name.
pub fn parse<I>(args: I) -> Invocation
where
    I: IntoIterator<Item = OsString>,
{
    let Some(first) = args.into_iter().next() else {
        return Invocation::Refresh;
    };

    let token: String = first.to_string_lossy().chars().take(MAX_TOKEN_CHARS).collect();
    if token.is_empty() {
        Invocation::Refresh
    } else if token.eq_ignore_ascii_case("/?") {
        Invocation::Help
    } else if token.eq_ignore_ascii_case("/s") {
        Invocation::Stop
    } else {
        Invocation::CustomTable(PathBuf::from(token))
    }
}
