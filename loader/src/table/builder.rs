// src/table/builder.rs

//! Builds the patch table from the installed VirtualBox.
//!
//! 1. Look up the installation directory in the configuration store.
//! 2. Copy `<InstallDir>\VBoxDD.dll` to a fixed name in the staging directory,
//!    so the compiler never touches (or locks) the live module.
//! 3. Run the patch compiler on the staged copy.
//! 4. Remove the staged copy whatever the compiler returned.

use crate::config::model::TargetConfig;
use crate::error::{Error, Result};
use crate::ldr_log;
use crate::store::ConfigStore;
use crate::table::{PatchCompiler, PatchTable};
use log::Level;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Name of the private module copy inside the staging directory.
pub const STAGING_FILE_NAME: &str = "nyan.dll";

pub struct TableBuilder<'a> {
    store:       &'a dyn ConfigStore,
    compiler:    &'a dyn PatchCompiler,
    target:      &'a TargetConfig,
    staging_dir: PathBuf,
}

impl<'a> TableBuilder<'a> {
    pub fn new(
        store: &'a dyn ConfigStore,
        compiler: &'a dyn PatchCompiler,
        target: &'a TargetConfig,
        staging_dir: PathBuf,
    ) -> Self {
        Self { store, compiler, target, staging_dir }
    }

    /// Runs every step; the first failure aborts the build.
    pub fn build(&self) -> Result<PatchTable> {
        let module = self.locate_module()?;
        let staged = StagedFile::copy(&module, &self.staging_dir.join(STAGING_FILE_NAME))?;
        ldr_log!(Level::Debug, "table", "Staged {:?} as {:?}", module, staged.path());
        self.compiler.compile(staged.path())
    }

    /// Full path of the installed device-emulation module.
    pub fn locate_module(&self) -> Result<PathBuf> {
        let key = self
            .store
            .open_key(&self.target.install_key)
            .map_err(|source| Error::KeyOpen { path: self.target.install_key.clone(), source })?;

        let install_dir = key
            .query_string(&self.target.install_value)
            .map_err(|source| Error::ValueQuery { name: self.target.install_value.clone(), source })?;

        Ok(Path::new(&install_dir).join(&self.target.module))
    }
}

/// Private copy of the module, deleted on drop.
struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    fn copy(from: &Path, to: &Path) -> Result<Self> {
        if let Err(source) = fs::copy(from, to) {
            // partial or stale copy
            let _ = fs::remove_file(to);
            return Err(Error::Stage { from: from.to_owned(), to: to.to_owned(), source });
        }
        Ok(Self { path: to.to_owned() })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            ldr_log!(Level::Warn, "table", "Cannot remove staged {:?}: {}", self.path, e);
        }
    }
}
