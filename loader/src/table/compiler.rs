// src/table/compiler.rs

//! Patch compiler seam.
//!
//! Deriving a table from a VBoxDD image is not the loader's job. The loader
//! hands a staged copy of the module to a `PatchCompiler` and takes back the
//! table it produces.

use crate::error::{Error, Result};
use crate::ldr_log;
use crate::table::PatchTable;
use log::Level;
use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

pub trait PatchCompiler {
    /// Produces the patch table for the module image at `module`.
    fn compile(&self, module: &Path) -> Result<PatchTable>;
}

/// Runs an external generator as `<program> [args..] <module> <output>` and
/// reads the table it writes to `<output>`.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    program: PathBuf,
    args:    Vec<String>,
}

impl CommandCompiler {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self { program: program.into(), args }
    }

    fn run(&self, module: &Path, output: &Path) -> Result<PatchTable> {
        ldr_log!(Level::Debug, "compiler", "Running {:?} on {:?}", self.program, module);
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(module)
            .arg(output)
            .status()
            .map_err(|e| Error::Compiler(format!("cannot run {}: {}", self.program.display(), e)))?;

        if !status.success() {
            return Err(Error::Compiler(format!("{} exited with {}", self.program.display(), status)));
        }

        let bytes = fs::read(output)
            .map_err(|e| Error::Compiler(format!("cannot read {}: {}", output.display(), e)))?;
        PatchTable::new(bytes).ok_or_else(|| Error::Compiler("generated table is empty".into()))
    }
}

impl PatchCompiler for CommandCompiler {
    fn compile(&self, module: &Path) -> Result<PatchTable> {
        let output = module.with_extension("tbl");
        let result = self.run(module, &output);
        let _ = fs::remove_file(&output);
        result
    }
}

/// Used when no generator is configured: every build attempt fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredCompiler;

impl PatchCompiler for UnconfiguredCompiler {
    fn compile(&self, _module: &Path) -> Result<PatchTable> {
        Err(Error::Compiler("no patch compiler configured".into()))
    }
}
