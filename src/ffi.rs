//! Exported C ABI
//!
//! Flat functions loaded by the managed host. Strings are returned as `BSTR`
//! owned by the caller. Calls are serialized through one process-wide context.

use crate::boundary;
use crate::config::{ConfigManager, InteropConfig};
use crate::context::{InteropContext, MODULE_VERSION};
use crate::utils::init_logging;
use crate::winget::WinGetConnector;
use parking_lot::{Mutex, MutexGuard};
use std::sync::LazyLock;
use windows::core::BSTR;

/// Process-wide context behind the exported functions
struct ExportContext(InteropContext<WinGetConnector>);

// SAFETY: the WinGet objects held by the context are agile, and every access goes
// through the CONTEXT mutex
#[expect(unsafe_code, reason = "WinRT handles shared behind a mutex")]
unsafe impl Send for ExportContext {}

static CONTEXT: LazyLock<Mutex<ExportContext>> = LazyLock::new(|| {
    let config = ConfigManager::load().unwrap_or_else(|e| {
        eprintln!("Failed to load interop configuration, using defaults: {e}");
        InteropConfig::default()
    });
    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Failed to initialize interop logging: {e}");
    }
    Mutex::new(ExportContext(InteropContext::new(WinGetConnector::new(
        config.activation,
    ))))
});

fn context() -> MutexGuard<'static, ExportContext> {
    CONTEXT.lock()
}

/// Fixed module version
#[expect(non_snake_case, unsafe_code, reason = "exported name is fixed by the host")]
#[unsafe(no_mangle)]
pub extern "C" fn GetModuleVersion() -> BSTR {
    BSTR::from(MODULE_VERSION)
}

/// Create or replace the package manager handle
#[expect(non_snake_case, unsafe_code, reason = "exported name is fixed by the host")]
#[unsafe(no_mangle)]
pub extern "C" fn InitializePackageManager() -> bool {
    boundary::initialize(&mut context().0)
}

/// Every installed package as `Name\tId\tInstalledVersion\tSource\n` rows
#[expect(non_snake_case, unsafe_code, reason = "exported name is fixed by the host")]
#[unsafe(no_mangle)]
pub extern "C" fn GetInstalledPackagesFromAllCatalogs() -> BSTR {
    BSTR::from(boundary::installed_packages(&mut context().0))
}

/// Installed packages with an update as
/// `Name\tId\tInstalledVersion\tAvailableVersion\tSource\n` rows
#[expect(non_snake_case, unsafe_code, reason = "exported name is fixed by the host")]
#[unsafe(no_mangle)]
pub extern "C" fn GetAvailableUpdatesFromAllCatalogs() -> BSTR {
    BSTR::from(boundary::available_updates(&mut context().0))
}

/// Every configured catalog as `Name\tArgument\n` rows
#[expect(non_snake_case, unsafe_code, reason = "exported name is fixed by the host")]
#[unsafe(no_mangle)]
pub extern "C" fn GetSourcesFromAllCatalogs() -> BSTR {
    BSTR::from(boundary::sources(&mut context().0))
}

/// Message of the last failed call, empty after a success
#[expect(non_snake_case, unsafe_code, reason = "exported name is fixed by the host")]
#[unsafe(no_mangle)]
pub extern "C" fn GetLastInteropError() -> BSTR {
    BSTR::from(boundary::last_error(&context().0))
}
