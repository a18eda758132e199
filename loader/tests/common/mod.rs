// tests/common/mod.rs

//! In-memory stand-ins for every OS seam the loader touches, plus a `World`
//! that wires them into a `Platform` rooted in a temporary directory.
#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    ffi::OsString,
    fs, io,
    path::{Path, PathBuf},
    rc::Rc,
};
use tempfile::TempDir;

use loader::{
    comms::{DeviceChannel, DeviceLink},
    config::Config,
    driver::ServiceControl,
    error::Result,
    process::ProcessProbe,
    store::{ConfigStore, StoreKey},
    system::HostSystem,
    table::{PatchCompiler, PatchTable},
    Platform,
};
use shared::constants::{PARAMETERS_KEY, PATCH_TABLE_VALUE, VBOX_INSTALL_KEY, VBOX_INSTALL_VALUE};

/*────────── registry ─────────*/

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Binary(Vec<u8>),
}

#[derive(Default)]
pub struct MemoryStore {
    pub keys:        RefCell<HashMap<String, HashMap<String, Value>>>,
    pub fail_create: bool,
    pub fail_write:  bool,
    pub opens:       Cell<usize>,
    pub creates:     Cell<usize>,
    pub writes:      Cell<usize>,
    pub deletes:     Cell<usize>,
}

impl MemoryStore {
    pub fn set(&self, path: &str, name: &str, value: Value) {
        self.keys.borrow_mut().entry(path.to_string()).or_default().insert(name.to_string(), value);
    }

    pub fn get(&self, path: &str, name: &str) -> Option<Value> {
        self.keys.borrow().get(path).and_then(|k| k.get(name).cloned())
    }

    pub fn has_key(&self, path: &str) -> bool {
        self.keys.borrow().contains_key(path)
    }

    /// Bytes currently persisted for the driver.
    pub fn persisted(&self) -> Option<Vec<u8>> {
        match self.get(PARAMETERS_KEY, PATCH_TABLE_VALUE) {
            Some(Value::Binary(bytes)) => Some(bytes),
            _ => None,
        }
    }

    pub fn touched(&self) -> bool {
        self.opens.get() + self.creates.get() > 0
    }
}

struct MemoryKey<'a> {
    store: &'a MemoryStore,
    path:  String,
}

impl ConfigStore for MemoryStore {
    fn open_key(&self, path: &str) -> io::Result<Box<dyn StoreKey + '_>> {
        self.opens.set(self.opens.get() + 1);
        if !self.has_key(path) {
            return Err(io::Error::new(io::ErrorKind::NotFound, format!("no key {path}")));
        }
        Ok(Box::new(MemoryKey { store: self, path: path.to_string() }))
    }

    fn create_key(&self, path: &str) -> io::Result<Box<dyn StoreKey + '_>> {
        self.creates.set(self.creates.get() + 1);
        if self.fail_create {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "access denied"));
        }
        self.keys.borrow_mut().entry(path.to_string()).or_default();
        Ok(Box::new(MemoryKey { store: self, path: path.to_string() }))
    }
}

impl StoreKey for MemoryKey<'_> {
    fn query_string(&self, name: &str) -> io::Result<String> {
        match self.store.get(&self.path, name) {
            Some(Value::Text(s)) => Ok(s),
            Some(Value::Binary(_)) => Err(io::Error::new(io::ErrorKind::InvalidData, "not a string")),
            None => Err(io::Error::new(io::ErrorKind::NotFound, format!("no value {name}"))),
        }
    }

    fn set_binary(&self, name: &str, data: &[u8]) -> io::Result<()> {
        if self.store.fail_write {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "access denied"));
        }
        self.store.writes.set(self.store.writes.get() + 1);
        self.store.set(&self.path, name, Value::Binary(data.to_vec()));
        Ok(())
    }

    fn delete_value(&self, name: &str) -> io::Result<()> {
        self.store.deletes.set(self.store.deletes.get() + 1);
        let mut keys = self.store.keys.borrow_mut();
        match keys.get_mut(&self.path).and_then(|k| k.remove(name)) {
            Some(_) => Ok(()),
            None => Err(io::Error::new(io::ErrorKind::NotFound, format!("no value {name}"))),
        }
    }
}

/*────────── patch compiler ─────────*/

pub struct FakeCompiler {
    /// Table handed back, `None` makes every call fail.
    pub output:     Option<Vec<u8>>,
    pub calls:      Cell<usize>,
    pub last_input: RefCell<Option<PathBuf>>,
    /// Whether the staged input existed while the compiler ran.
    pub saw_input:  Cell<bool>,
}

impl FakeCompiler {
    pub fn producing(bytes: &[u8]) -> Self {
        Self { output: Some(bytes.to_vec()), ..Self::failing() }
    }

    pub fn failing() -> Self {
        Self { output: None, calls: Cell::new(0), last_input: RefCell::new(None), saw_input: Cell::new(false) }
    }
}

impl PatchCompiler for FakeCompiler {
    fn compile(&self, module: &Path) -> Result<PatchTable> {
        self.calls.set(self.calls.get() + 1);
        self.saw_input.set(module.exists());
        *self.last_input.borrow_mut() = Some(module.to_path_buf());
        self.output
            .clone()
            .and_then(PatchTable::new)
            .ok_or_else(|| loader::Error::Compiler("fake compiler refused".into()))
    }
}

/*────────── processes ─────────*/

#[derive(Default)]
pub struct FakeProbe {
    pub running: Vec<String>,
    pub fail:    bool,
    pub queries: Cell<usize>,
}

impl FakeProbe {
    pub fn with(name: &str) -> Self {
        Self { running: vec![name.to_string()], ..Self::default() }
    }
}

impl ProcessProbe for FakeProbe {
    fn is_running(&self, image_name: &str) -> io::Result<bool> {
        self.queries.set(self.queries.get() + 1);
        if self.fail {
            return Err(io::Error::other("snapshot failed"));
        }
        Ok(self.running.iter().any(|p| p.eq_ignore_ascii_case(image_name)))
    }
}

/*────────── device ─────────*/

pub struct FakeDevice {
    /// Byte count answered to every control request; `None` = no device.
    pub reply:    Option<u32>,
    pub opens:    Cell<usize>,
    pub codes:    RefCell<Vec<u32>>,
    pub closes:   Rc<Cell<usize>>,
}

impl FakeDevice {
    pub fn answering(bytes: u32) -> Self {
        Self { reply: Some(bytes), ..Self::absent() }
    }

    pub fn absent() -> Self {
        Self { reply: None, opens: Cell::new(0), codes: RefCell::new(Vec::new()), closes: Rc::new(Cell::new(0)) }
    }
}

struct FakeLink<'a> {
    device: &'a FakeDevice,
    bytes:  u32,
}

impl DeviceChannel for FakeDevice {
    fn open(&self, _link: &str) -> io::Result<Box<dyn DeviceLink + '_>> {
        self.opens.set(self.opens.get() + 1);
        match self.reply {
            Some(bytes) => Ok(Box::new(FakeLink { device: self, bytes })),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "no such device")),
        }
    }
}

impl DeviceLink for FakeLink<'_> {
    fn id(&self) -> usize {
        0x1c4
    }

    fn control(&self, code: u32) -> io::Result<u32> {
        self.device.codes.borrow_mut().push(code);
        Ok(self.bytes)
    }
}

impl Drop for FakeLink<'_> {
    fn drop(&mut self) {
        self.device.closes.set(self.device.closes.get() + 1);
    }
}

/*────────── host ─────────*/

pub struct FakeHost {
    pub major:       u32,
    pub purge_fails: bool,
    pub purges:      Cell<usize>,
}

impl FakeHost {
    pub fn version(major: u32) -> Self {
        Self { major, purge_fails: false, purges: Cell::new(0) }
    }
}

impl HostSystem for FakeHost {
    fn os_major_version(&self) -> u32 {
        self.major
    }

    fn purge_cache(&self) -> io::Result<()> {
        self.purges.set(self.purges.get() + 1);
        if self.purge_fails {
            return Err(io::Error::from_raw_os_error(1314));
        }
        Ok(())
    }
}

/*────────── services ─────────*/

#[derive(Default)]
pub struct FakeServices {
    pub start_error:   Option<i32>,
    pub restart_error: Option<i32>,
    pub started:       RefCell<Vec<(String, PathBuf)>>,
    pub restarted:     RefCell<Vec<String>>,
}

impl ServiceControl for FakeServices {
    fn start_driver(&self, service: &str, image: &Path) -> io::Result<()> {
        self.started.borrow_mut().push((service.to_string(), image.to_path_buf()));
        match self.start_error {
            Some(code) => Err(io::Error::from_raw_os_error(code)),
            None => Ok(()),
        }
    }

    fn restart(&self, service: &str) -> io::Result<()> {
        self.restarted.borrow_mut().push(service.to_string());
        match self.restart_error {
            Some(code) => Err(io::Error::from_raw_os_error(code)),
            None => Ok(()),
        }
    }
}

/*────────── world ─────────*/

/// Every fake plus a scratch directory holding the staging area and a fake
/// VirtualBox installation.
pub struct World {
    pub tmp:      TempDir,
    pub config:   Config,
    pub store:    MemoryStore,
    pub compiler: FakeCompiler,
    pub probe:    FakeProbe,
    pub device:   FakeDevice,
    pub host:     FakeHost,
    pub services: FakeServices,
}

impl World {
    /// Windows 10 host, device answering with one byte, compiler producing a
    /// small table, nothing running, process check on.
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let staging = tmp.path().join("staging");
        fs::create_dir_all(&staging).unwrap();

        let mut config = Config::default();
        config.staging.dir = Some(staging);
        config.target.process_check = true;

        Self {
            tmp,
            config,
            store: MemoryStore::default(),
            compiler: FakeCompiler::producing(&[0xde, 0xad, 0xbe, 0xef]),
            probe: FakeProbe::default(),
            device: FakeDevice::answering(1),
            host: FakeHost::version(10),
            services: FakeServices::default(),
        }
    }

    /// Registers a VirtualBox installation holding a dummy VBoxDD.dll.
    pub fn install_vbox(&self) -> PathBuf {
        let dir = self.tmp.path().join("VirtualBox");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("VBoxDD.dll"), b"MZ\x90\x00").unwrap();
        self.store.set(VBOX_INSTALL_KEY, VBOX_INSTALL_VALUE, Value::Text(dir.to_string_lossy().into_owned()));
        dir
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.config.staging.dir()
    }

    pub fn platform(&self) -> Platform<'_> {
        Platform {
            store:     &self.store,
            compiler:  &self.compiler,
            processes: &self.probe,
            device:    &self.device,
            host:      &self.host,
        }
    }

    /// Writes `bytes` to a file inside the scratch directory.
    pub fn table_file(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.tmp.path().join(name);
        fs::write(&path, bytes).unwrap();
        path
    }
}

pub fn args(tokens: &[&str]) -> Vec<OsString> {
    tokens.iter().map(OsString::from).collect()
}
