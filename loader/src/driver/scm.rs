// src/driver/scm.rs

//! `ServiceControl` over the Windows service control manager.

use super::ServiceControl;
use crate::ldr_log;
use log::Level;
use std::{
    ffi::{OsStr, OsString},
    io,
    path::Path,
    thread,
    time::{Duration, Instant},
};
use windows_service::{
    service::{
        Service, ServiceAccess, ServiceErrorControl, ServiceInfo, ServiceStartType, ServiceState,
        ServiceType,
    },
    service_manager::{ServiceManager, ServiceManagerAccess},
};
use windows_sys::Win32::Foundation::{
    ERROR_INVALID_PARAMETER, ERROR_SERVICE_ALREADY_RUNNING, ERROR_SERVICE_DOES_NOT_EXIST,
    ERROR_SERVICE_NOT_ACTIVE, ERROR_SERVICE_REQUEST_TIMEOUT,
};

/// How long a stopping service may take before the restart gives up.
const STOP_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Default, Clone, Copy)]
pub struct ServiceManagerControl;

/// Keeps the Win32 code; argument validation failures inside the crate
/// become `ERROR_INVALID_PARAMETER` so every error carries a real code.
fn to_io(err: windows_service::Error) -> io::Error {
    match err {
        windows_service::Error::Winapi(e) => e,
        other => {
            ldr_log!(Level::Debug, "driver", "Service call rejected: {}", other);
            io::Error::from_raw_os_error(ERROR_INVALID_PARAMETER as i32)
        }
    }
}

fn stop_timeout() -> io::Error {
    io::Error::from_raw_os_error(ERROR_SERVICE_REQUEST_TIMEOUT as i32)
}

fn is_code(err: &io::Error, code: u32) -> bool {
    err.raw_os_error() == Some(code as i32)
}

fn start(service: &Service) -> io::Result<()> {
    match service.start::<&OsStr>(&[]).map_err(to_io) {
        Err(e) if is_code(&e, ERROR_SERVICE_ALREADY_RUNNING) => Ok(()),
        other => other,
    }
}

fn wait_stopped(service: &Service) -> io::Result<()> {
    let deadline = Instant::now() + STOP_TIMEOUT;
    loop {
        if service.query_status().map_err(to_io)?.current_state == ServiceState::Stopped {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(stop_timeout());
        }
        thread::sleep(POLL_INTERVAL);
    }
}

impl ServiceControl for ServiceManagerControl {
    fn start_driver(&self, name: &str, image: &Path) -> io::Result<()> {
        let manager = ServiceManager::local_computer(
            None::<&str>,
            ServiceManagerAccess::CONNECT | ServiceManagerAccess::CREATE_SERVICE,
        )
        .map_err(to_io)?;
        let access = ServiceAccess::START | ServiceAccess::QUERY_STATUS;

        let service = match manager.open_service(name, access).map_err(to_io) {
            Ok(service) => service,
            Err(e) if is_code(&e, ERROR_SERVICE_DOES_NOT_EXIST) => {
                let info = ServiceInfo {
                    name: OsString::from(name),
                    display_name: OsString::from(name),
                    service_type: ServiceType::KERNEL_DRIVER,
                    start_type: ServiceStartType::OnDemand,
                    error_control: ServiceErrorControl::Normal,
                    executable_path: image.to_path_buf(),
                    launch_arguments: vec![],
                    dependencies: vec![],
                    account_name: None,
                    account_password: None,
                };
                manager.create_service(&info, access).map_err(to_io)?
            }
            Err(e) => return Err(e),
        };

        start(&service)
    }

    fn restart(&self, name: &str) -> io::Result<()> {
        let manager = ServiceManager::local_computer(None::<&str>, ServiceManagerAccess::CONNECT)
            .map_err(to_io)?;
        let service = manager
            .open_service(name, ServiceAccess::START | ServiceAccess::STOP | ServiceAccess::QUERY_STATUS)
            .map_err(to_io)?;

        match service.stop().map_err(to_io) {
            Ok(_) => {}
            Err(e) if is_code(&e, ERROR_SERVICE_NOT_ACTIVE) => {}
            Err(e) => return Err(e),
        }
        wait_stopped(&service)?;
        start(&service)
    }
}
