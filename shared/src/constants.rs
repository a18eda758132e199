//! Registry locations and well-known names.
//!
//! The driver reads the patch table from the same key at initialisation time,
//! so these must stay in sync on both sides.

/*────────── driver parameters (HKLM) ─────────*/

/// Key holding the driver parameters, relative to `HKEY_LOCAL_MACHINE`.
pub const PARAMETERS_KEY: &str = r"Software\Tsugumi\Parameters";

/// `REG_BINARY` value carrying the VBoxDD patch table.
pub const PATCH_TABLE_VALUE: &str = "VBoxDD.dll";

/// Upper bound for a patch table supplied on the command line.
pub const MAX_CUSTOM_TABLE_SIZE: u64 = 4096;

/*────────── driver service ─────────*/

pub const DRIVER_SERVICE_NAME: &str = "Tsugumi";
pub const DRIVER_IMAGE_NAME: &str = "Tsugumi.sys";

/*────────── VirtualBox installation ─────────*/

pub const VBOX_INSTALL_KEY: &str = r"Software\Oracle\VirtualBox";
pub const VBOX_INSTALL_VALUE: &str = "InstallDir";
pub const VBOX_DD_MODULE: &str = "VBoxDD.dll";
pub const VBOX_PROCESS_NAME: &str = "VirtualBox.exe";
pub const VBOX_DRIVER_SERVICE: &str = "VBoxDrv";
