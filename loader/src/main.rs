// src/main.rs

//! `ldr` entry-point.
//!
//! 1. Read `ldr.toml` next to the executable & set up logging
//! 2. Open the host-wide instance counter
//! 3. Wire the Windows implementation of every seam into a `Loader`
//! 4. Run the invocation from the command line, report `exit`, return 0
//!
//! Failures are reported as text only; the exit status is always 0.

// ───── std / 3rd-party imports ──────────────────────────────────────────────
#[cfg(windows)]
use anyhow::Context;
#[cfg(windows)]
use chrono::Local;
#[cfg(windows)]
use fern::Dispatch;
#[cfg(windows)]
use log::Level;
#[cfg(windows)]
use std::{
    path::{Path, PathBuf},
    process, thread,
};

// ───── local imports ────────────────────────────────────────────────────────
#[cfg(windows)]
use loader::{
    comms::device::DeviceFiles,
    config::{self, model::LoggingConfig, Config, CONFIG_FILE_NAME},
    driver::{self, scm::ServiceManagerControl},
    execute,
    instance::{SharedCounter, COUNTER_SECTION_NAME},
    ldr_log,
    process::Toolhelp,
    store::registry::Registry,
    system::NativeHost,
    table::{CommandCompiler, PatchCompiler, UnconfiguredCompiler},
    Loader, Platform,
};

#[cfg(windows)]
const PROGRAM_TITLE: &str = concat!("VirtualBox Hardened Loader v", env!("CARGO_PKG_VERSION"));

// ───── helpers ──────────────────────────────────────────────────────────────

/// Directory that contains the running executable.
#[cfg(windows)]
fn exe_dir() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe().context("Cannot determine exe path")?;
    exe.parent()
        .map(Path::to_path_buf)
        .context("Executable must live in some directory")
}

/// Load `ldr.toml`; a broken file is reported and replaced by the defaults.
#[cfg(windows)]
fn load_config(exe_dir: &Path) -> Config {
    config::load(&exe_dir.join(CONFIG_FILE_NAME)).unwrap_or_else(|e| {
        eprintln!("Ldr: Ignoring {}: {}", CONFIG_FILE_NAME, e);
        Config::default()
    })
}

/// Console gets `Ldr: <message>`; the optional log file gets the full record.
#[cfg(windows)]
fn setup_logging(exe_dir: &Path, logging: &LoggingConfig) -> Result<(), fern::InitError> {
    let log_path = logging
        .enable
        .then(|| exe_dir.join(logging.file.as_deref().unwrap_or("ldr.log")));

    let console = Dispatch::new()
        .format(|out, msg, _record| out.finish(format_args!("Ldr: {}", msg)))
        .chain(std::io::stdout());

    let mut dispatch = Dispatch::new().level(logging.level_filter()).chain(console);

    if let Some(path) = log_path {
        dispatch = dispatch.chain(
            Dispatch::new()
                .format(|out, msg, record| {
                    out.finish(format_args!(
                        "[{}][{:5}][{}][pid={}][tid={:?}] {}",
                        Local::now().to_rfc3339(),
                        record.level(),
                        record.target(),
                        process::id(),
                        thread::current().id(),
                        msg
                    ))
                })
                .chain(fern::log_file(path)?),
        );
    }

    dispatch.apply()?;
    Ok(())
}

/// External generator when configured; relative paths start at `exe_dir`.
#[cfg(windows)]
fn patch_compiler(exe_dir: &Path, config: &Config) -> Box<dyn PatchCompiler> {
    match &config.compiler.program {
        Some(program) => Box::new(CommandCompiler::new(exe_dir.join(program), config.compiler.args.clone())),
        None => Box::new(UnconfiguredCompiler),
    }
}

// ───── loader logic ─────────────────────────────────────────────────────────

#[cfg(windows)]
fn run() -> anyhow::Result<()> {
    // 1 ─ Context & logging
    let exe_dir = exe_dir()?;
    let config = load_config(&exe_dir);
    if let Err(e) = setup_logging(&exe_dir, &config.logging) {
        eprintln!("Ldr: Logging setup failed: {}", e);
    }
    ldr_log!(Level::Info, "loader", "{}", PROGRAM_TITLE);

    // 2 ─ Singleton
    let counter = SharedCounter::open_named(COUNTER_SECTION_NAME)
        .map_err(loader::Error::Counter)?;

    // 3 ─ Seams
    let compiler = patch_compiler(&exe_dir, &config);
    let services = ServiceManagerControl;
    let platform = Platform {
        store: &Registry,
        compiler: compiler.as_ref(),
        processes: &Toolhelp,
        device: &DeviceFiles,
        host: &NativeHost,
    };
    let activator = driver::activator_for(&config.driver, &config.target, &exe_dir, &services);
    let loader = Loader::new(&config, platform, activator);

    // 4 ─ Run
    let outcome = execute(&counter, std::env::args_os().skip(1), &loader);
    ldr_log!(Level::Debug, "loader", "Run outcome: {:?}", outcome);
    Ok(())
}

#[cfg(windows)]
fn main() {
    if let Err(e) = run() {
        ldr_log!(Level::Error, "loader", "{:#}", e);
    }
    ldr_log!(Level::Info, "loader", "exit");
    log::logger().flush();
}

#[cfg(not(windows))]
fn main() {
    eprintln!("ldr is only supported on Windows");
    std::process::exit(1);
}
