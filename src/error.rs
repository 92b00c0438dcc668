//! Error types for the WinGet interop shim
//!
//! Internal layers return structured errors; the exported boundary renders them
//! as the fixed sentinel strings the managed host expects (see [`sentinel_message`]).
//!
//! Error variants use `#[source]` to preserve error chains so the log carries the
//! full cause even though the host only ever sees the sentinel text.

use crate::catalog::FindPackagesStatus;
use thiserror::Error;

/// Structured code for a catalog connection failure
pub const CONNECT_FAILED_CODE: i32 = 1;

/// Base added to the find status to produce a structured query code
pub const FIND_STATUS_BASE_CODE: i32 = 10;

/// Simple error type for wrapping string messages while implementing `std::error::Error`
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StringError(pub String);

impl StringError {
    /// Create a new `StringError` from a string message
    pub fn new(msg: impl Into<String>) -> Box<Self> {
        Box::new(Self(msg.into()))
    }
}

/// Failure of one step of class activation
#[derive(Debug, Error)]
pub enum ActivationError {
    /// The helper library could not be loaded
    #[error("Failed to load activation helper {library}: {source}")]
    LibraryNotFound {
        /// Library name passed to the loader
        library: String,
        /// Loader error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The helper library does not export the factory
    #[error("Activation helper does not export {symbol}")]
    SymbolNotFound {
        /// Exported symbol name
        symbol: String,
    },

    /// The factory returned a failure HRESULT or a null instance
    #[error("Activation factory failed with HRESULT {hresult:#010x}")]
    FactoryFailed {
        /// HRESULT returned by the factory
        hresult: i32,
    },

    /// The activated object does not implement the requested interface
    #[error("Activated object does not implement interface {iid}")]
    InterfaceUnavailable {
        /// Requested interface identity
        iid: uuid::Uuid,
    },

    /// Standard COM activation failed
    #[error("CoCreateInstance failed for class {clsid}: {source}")]
    CreateInstanceFailed {
        /// Requested class identity
        clsid: uuid::Uuid,
        /// COM error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Activation is not available on this platform
    #[error("COM activation is not supported on this platform")]
    Unsupported,
}

/// Main error type for the interop shim
#[derive(Debug, Error)]
pub enum InteropError {
    /// No package manager handle exists and lazy initialization did not produce one
    #[error("Package manager is not initialized")]
    NotInitialized,

    /// Creating a COM class instance failed
    #[error("Failed to activate {class}: {source}")]
    Activation {
        /// Friendly class name
        class: &'static str,
        /// Step that failed
        #[source]
        source: ActivationError,
    },

    /// The composite catalog did not connect
    #[error("Failed to connect to catalog")]
    CatalogConnect,

    /// The find-packages query returned a non-success status
    #[error("Failed to find packages on catalog: status was {0:?}")]
    FindPackages(FindPackagesStatus),

    /// Reading a single package failed
    /// Preserves the underlying error source for full error chain transparency
    #[error("Failed to read package: {0}")]
    PackageRead(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The package-management service reported a fault
    /// Preserves the underlying error source for full error chain transparency
    #[error("Package manager service error: {0}")]
    Service(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A panic was caught at the exported boundary
    #[error("Unexpected fault: {0}")]
    Panic(String),

    /// Configuration error
    /// Preserves the underlying error source for full error chain transparency
    #[error("Configuration error: {0}")]
    ConfigError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Windows API error
    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    WindowsApiError(#[from] windows::core::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl InteropError {
    /// Structured code of a query-layer failure
    ///
    /// Connection failure is [`CONNECT_FAILED_CODE`]; a find status failure is
    /// [`FIND_STATUS_BASE_CODE`] plus the raw status. Other errors carry no code.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::CatalogConnect => Some(CONNECT_FAILED_CODE),
            Self::FindPackages(status) => Some(FIND_STATUS_BASE_CODE + status.raw()),
            _ => None,
        }
    }
}

/// Exit code reported when the redirect target does not exist (`ENOENT`)
pub const TARGET_MISSING_EXIT_CODE: i32 = 2;

/// Failure to hand over to the redirect target
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The redirector could not locate its own executable
    #[error("Failed to locate the running executable: {0}")]
    CurrentExe(#[source] std::io::Error),

    /// The target executable does not exist
    #[error("Redirect target not found: {}", path.display())]
    TargetMissing {
        /// Expected target path
        path: std::path::PathBuf,
    },

    /// The target exists but could not be started
    #[error("Failed to start {}: {source}", path.display())]
    Spawn {
        /// Target path
        path: std::path::PathBuf,
        /// OS error
        #[source]
        source: std::io::Error,
    },
}

impl LaunchError {
    /// Process exit code for this failure
    ///
    /// A missing target is [`TARGET_MISSING_EXIT_CODE`]; other failures report the
    /// OS error code, or `1` when there is none.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::TargetMissing { .. } => TARGET_MISSING_EXIT_CODE,
            Self::CurrentExe(source) | Self::Spawn { source, .. } => {
                source.raw_os_error().unwrap_or(1)
            }
        }
    }
}

/// Result type alias for interop operations
pub type Result<T> = std::result::Result<T, InteropError>;

/// Exported entry points that can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPoint {
    /// `InitializePackageManager`
    InitializePackageManager,
    /// `GetInstalledPackagesFromAllCatalogs`
    InstalledPackages,
    /// `GetAvailableUpdatesFromAllCatalogs`
    AvailableUpdates,
    /// `GetSourcesFromAllCatalogs`
    Sources,
}

impl EntryPoint {
    /// Exported symbol name
    pub fn name(self) -> &'static str {
        match self {
            Self::InitializePackageManager => "InitializePackageManager",
            Self::InstalledPackages => "GetInstalledPackagesFromAllCatalogs",
            Self::AvailableUpdates => "GetAvailableUpdatesFromAllCatalogs",
            Self::Sources => "GetSourcesFromAllCatalogs",
        }
    }

    fn subject(self) -> &'static str {
        match self {
            Self::Sources => "package sources",
            _ => "installed packages",
        }
    }
}

/// Render an error as the fixed sentinel string returned by an exported function
///
/// The host distinguishes failure only by string content, so the set of strings is
/// small and fixed: a query-layer failure (structured code written to the log), a
/// service fault, and an unexpected fault.
pub fn sentinel_message(entry: EntryPoint, error: &InteropError) -> String {
    let name = entry.name();
    let subject = entry.subject();
    match error {
        InteropError::CatalogConnect | InteropError::FindPackages(_) => {
            format!("{name}(): Failed to get {subject}. Error code in log")
        }
        InteropError::Panic(_) => format!("{name}(): Failed to get {subject}."),
        _ => format!("{name}(): Failed to get {subject}. Error details in log"),
    }
}
