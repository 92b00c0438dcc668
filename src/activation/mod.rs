//! COM class activation
//!
//! The package-management service is created through one of two strategies:
//!
//! - **Standard**: `CoCreateInstance` in the calling process. Used when the process
//!   is not elevated.
//! - **Manual activation**: when elevated, standard activation of the WinGet server is
//!   refused by the platform, so the helper library `winrtact.dll` is loaded and its
//!   exported factory creates the instance instead.
//!
//! [`select_activation_path`] picks the strategy from the cached elevation state and
//! the configured policy; [`SelectingActivator`] dispatches to it.
//!
//! # Manual Activation Steps
//!
//! 1. Load the helper library by name
//! 2. Resolve the exported factory
//! 3. Invoke it with the class and interface identities and flags `0`
//! 4. Query the target interface from the returned object
//! 5. Release the intermediate object
//! 6. Unload the helper library
//!
//! Any failing step aborts the activation; nothing is retried.
//!
//! **Known Limitation:** manual activation is unreliable on some platform builds.
//! Set `elevated_activation` to `standard` in the configuration to bypass it.

pub mod elevation;

#[cfg(windows)]
pub mod com;

pub use elevation::{ElevationCache, is_process_elevated};

use crate::error::ActivationError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// Default helper library used for manual activation
pub const HELPER_LIBRARY: &str = "winrtact.dll";

/// Default factory exported by the helper library
pub const HELPER_FACTORY_SYMBOL: &str = "WinGetServerManualActivation_CreateInstance";

/// Flags passed to the helper factory
pub const ACTIVATION_FLAGS: u32 = 0;

/// Class and interface identity of an instance to create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationTarget {
    /// Friendly class name used in logs and errors
    pub name: &'static str,
    /// Class identity (CLSID)
    pub clsid: Uuid,
    /// Interface identity (IID) requested from the instance
    pub iid: Uuid,
}

/// How an elevated process activates classes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElevatedActivation {
    /// Use the helper library's manual activation factory
    #[default]
    ManualActivation,
    /// Use standard activation even when elevated
    Standard,
}

/// Strategy chosen for this process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationPath {
    /// `CoCreateInstance`
    Standard,
    /// Helper library factory
    ManualActivation,
}

/// Choose the activation strategy
pub fn select_activation_path(elevated: bool, policy: ElevatedActivation) -> ActivationPath {
    match (elevated, policy) {
        (true, ElevatedActivation::ManualActivation) => ActivationPath::ManualActivation,
        _ => ActivationPath::Standard,
    }
}

/// Something that can create class instances
pub trait Activator {
    /// Interface pointer type produced
    type Instance;

    /// Create an instance of `target`
    fn create_instance(&self, target: &ActivationTarget) -> Result<Self::Instance, ActivationError>;
}

/// Loads the manual-activation helper library
pub trait HelperLibraryLoader {
    /// Loaded library; dropping it unloads the library
    type Library: HelperLibrary;

    /// Load the library by name
    fn load(&self, name: &str) -> Result<Self::Library, ActivationError>;
}

/// A loaded manual-activation helper library
pub trait HelperLibrary {
    /// Untyped object returned by the factory; dropping it releases the object
    type Object: ActivatedObject;

    /// Resolve `symbol` and invoke it for `target`
    fn invoke_factory(
        &self,
        symbol: &str,
        target: &ActivationTarget,
        flags: u32,
    ) -> Result<Self::Object, ActivationError>;
}

/// Untyped object produced by a helper factory
pub trait ActivatedObject {
    /// Typed interface pointer
    type Interface;

    /// Request the interface `iid`
    fn query_interface(&self, iid: Uuid) -> Result<Self::Interface, ActivationError>;
}

/// Activation through the helper library factory
#[derive(Debug, Clone)]
pub struct ManualActivator<L> {
    loader: L,
    library: String,
    symbol: String,
}

impl<L> ManualActivator<L> {
    /// Create an activator that loads `library` and calls its `symbol` export
    pub fn new(loader: L, library: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            loader,
            library: library.into(),
            symbol: symbol.into(),
        }
    }
}

impl<L: HelperLibraryLoader> Activator for ManualActivator<L> {
    type Instance = <<L::Library as HelperLibrary>::Object as ActivatedObject>::Interface;

    fn create_instance(&self, target: &ActivationTarget) -> Result<Self::Instance, ActivationError> {
        debug!(
            "Manually activating {} through {}!{}",
            target.name, self.library, self.symbol
        );
        let library = self.loader.load(&self.library)?;
        let object = library.invoke_factory(&self.symbol, target, ACTIVATION_FLAGS)?;
        let instance = object.query_interface(target.iid);

        // Release the untyped object before the library goes away
        drop(object);
        drop(library);

        instance
    }
}

/// Dispatches to the strategy chosen by [`select_activation_path`]
#[derive(Debug, Clone)]
pub struct SelectingActivator<S, M> {
    standard: S,
    manual: M,
    path: ActivationPath,
}

impl<S, M> SelectingActivator<S, M> {
    /// Create an activator for an explicit path
    pub fn new(standard: S, manual: M, path: ActivationPath) -> Self {
        Self {
            standard,
            manual,
            path,
        }
    }

    /// Create an activator for this process, consulting the cached elevation state
    pub fn for_current_process(standard: S, manual: M, policy: ElevatedActivation) -> Self {
        let elevated = is_process_elevated();
        let path = select_activation_path(elevated, policy);
        info!(
            "Process elevated: {}, activation path: {:?}",
            elevated, path
        );
        Self::new(standard, manual, path)
    }

    /// Strategy in use
    pub fn path(&self) -> ActivationPath {
        self.path
    }
}

impl<S, M> Activator for SelectingActivator<S, M>
where
    S: Activator,
    M: Activator<Instance = S::Instance>,
{
    type Instance = S::Instance;

    fn create_instance(&self, target: &ActivationTarget) -> Result<Self::Instance, ActivationError> {
        match self.path {
            ActivationPath::Standard => self.standard.create_instance(target),
            ActivationPath::ManualActivation => self.manual.create_instance(target),
        }
    }
}
