//! Win32 implementations of the activation strategies
//!
//! [`StandardActivator`] wraps `CoCreateInstance`; [`Win32HelperLoader`] drives the
//! manual-activation helper through `LoadLibraryW` / `GetProcAddress`.

use crate::activation::{
    ActivatedObject, ActivationTarget, Activator, ElevatedActivation, HelperLibrary,
    HelperLibraryLoader, ManualActivator, SelectingActivator,
};
use crate::error::ActivationError;
use std::ffi::{CString, c_void};
use tracing::debug;
use uuid::Uuid;
use windows::Win32::Foundation::{FreeLibrary, HMODULE};
use windows::Win32::System::Com::{CLSCTX_ALL, CoCreateInstance};
use windows::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryW};
use windows::core::{GUID, HRESULT, HSTRING, IInspectable, IUnknown, Interface, PCSTR};

/// Activator used by the WinRT backend
pub type ComActivator = SelectingActivator<StandardActivator, ManualActivator<Win32HelperLoader>>;

/// Build the activator for this process from the configured helper and policy
pub fn com_activator(
    library: &str,
    symbol: &str,
    policy: ElevatedActivation,
) -> ComActivator {
    SelectingActivator::for_current_process(
        StandardActivator,
        ManualActivator::new(Win32HelperLoader, library, symbol),
        policy,
    )
}

/// Signature of `WinGetServerManualActivation_CreateInstance`
type ManualActivationFactory =
    unsafe extern "system" fn(*const GUID, *const GUID, u32, *mut *mut c_void) -> HRESULT;

fn to_guid(id: Uuid) -> GUID {
    GUID::from_u128(id.as_u128())
}

/// Activation through `CoCreateInstance` with `CLSCTX_ALL`
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardActivator;

impl Activator for StandardActivator {
    type Instance = IInspectable;

    #[expect(unsafe_code, reason = "Windows FFI for COM class activation")]
    fn create_instance(&self, target: &ActivationTarget) -> Result<IInspectable, ActivationError> {
        let clsid = to_guid(target.clsid);
        debug!("Creating {} through CoCreateInstance", target.name);
        // SAFETY: clsid outlives the call; no aggregation
        let unknown: IUnknown = unsafe { CoCreateInstance(&raw const clsid, None, CLSCTX_ALL) }
            .map_err(|e| ActivationError::CreateInstanceFailed {
                clsid: target.clsid,
                source: Box::new(e),
            })?;
        unknown.query_interface(target.iid)
    }
}

impl ActivatedObject for IUnknown {
    type Interface = IInspectable;

    #[expect(unsafe_code, reason = "QueryInterface with a runtime interface identity")]
    fn query_interface(&self, iid: Uuid) -> Result<IInspectable, ActivationError> {
        let guid = to_guid(iid);
        let mut interface: *mut c_void = std::ptr::null_mut();
        // SAFETY: guid and interface outlive the call
        let hr = unsafe { self.query(&raw const guid, &raw mut interface) };
        if hr.is_err() || interface.is_null() {
            return Err(ActivationError::InterfaceUnavailable { iid });
        }
        // SAFETY: QueryInterface succeeded and transferred one reference;
        // every WinRT interface derives from IInspectable
        Ok(unsafe { IInspectable::from_raw(interface) })
    }
}

/// Loads helper libraries with `LoadLibraryW`
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32HelperLoader;

/// Helper library loaded with `LoadLibraryW`, freed on drop
#[derive(Debug)]
pub struct Win32HelperLibrary {
    module: HMODULE,
    name: String,
}

impl HelperLibraryLoader for Win32HelperLoader {
    type Library = Win32HelperLibrary;

    #[expect(unsafe_code, reason = "Windows FFI to load the activation helper")]
    fn load(&self, name: &str) -> Result<Win32HelperLibrary, ActivationError> {
        // SAFETY: the library name is a valid null-terminated wide string
        let module = unsafe { LoadLibraryW(&HSTRING::from(name)) }.map_err(|e| {
            ActivationError::LibraryNotFound {
                library: name.to_string(),
                source: Box::new(e),
            }
        })?;
        debug!("Loaded activation helper {}", name);
        Ok(Win32HelperLibrary {
            module,
            name: name.to_string(),
        })
    }
}

impl HelperLibrary for Win32HelperLibrary {
    type Object = IUnknown;

    #[expect(unsafe_code, reason = "Windows FFI to call the manual activation factory")]
    fn invoke_factory(
        &self,
        symbol: &str,
        target: &ActivationTarget,
        flags: u32,
    ) -> Result<IUnknown, ActivationError> {
        let symbol_name = CString::new(symbol).map_err(|_| ActivationError::SymbolNotFound {
            symbol: symbol.to_string(),
        })?;

        // SAFETY: module is loaded for the lifetime of self; symbol_name is null-terminated
        let proc = unsafe { GetProcAddress(self.module, PCSTR(symbol_name.as_ptr().cast())) };
        let Some(proc) = proc else {
            return Err(ActivationError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        };

        // SAFETY: the export has the ManualActivationFactory signature
        let factory: ManualActivationFactory = unsafe { std::mem::transmute(proc) };

        let clsid = to_guid(target.clsid);
        let iid = to_guid(target.iid);
        let mut instance: *mut c_void = std::ptr::null_mut();
        // SAFETY: all pointers outlive the call
        let hr = unsafe { factory(&raw const clsid, &raw const iid, flags, &raw mut instance) };

        if hr.is_err() || instance.is_null() {
            return Err(ActivationError::FactoryFailed { hresult: hr.0 });
        }

        // SAFETY: the factory returned one owned reference
        Ok(unsafe { IUnknown::from_raw(instance) })
    }
}

impl Drop for Win32HelperLibrary {
    #[expect(unsafe_code, reason = "Windows FFI to unload the activation helper")]
    fn drop(&mut self) {
        // SAFETY: module came from LoadLibraryW and is freed exactly once
        if let Err(e) = unsafe { FreeLibrary(self.module) } {
            tracing::warn!("Failed to unload activation helper {}: {}", self.name, e);
        } else {
            debug!("Unloaded activation helper {}", self.name);
        }
    }
}
