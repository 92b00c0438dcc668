//! `winget-interop` - flat C ABI over the Windows Package Manager
//!
//! Exposes the installed-package and available-update listings of the Windows
//! Package Manager to a managed host as tab-separated text. The service is created
//! through standard COM activation, or through the manual-activation helper when
//! the host process is elevated.
//!
//! # Layers
//!
//! - [`activation`]: strategy selection and class activation
//! - [`catalog`]: composite catalog query and row formatting, over traits so the
//!   logic runs against fakes on every platform
//! - [`context`] / [`boundary`]: service handle lifecycle and sentinel conversion
//! - `ffi`: the exported functions (Windows, feature `winget-com`)
//!
//! The redirector binary uses [`launcher`].

// Module declarations
pub mod activation;
pub mod boundary;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod launcher;
pub mod utils;

// WinGet WinRT backend and exported ABI (Windows only, generated bindings)
#[cfg(all(windows, feature = "winget-com"))]
pub mod ffi;
#[cfg(all(windows, feature = "winget-com"))]
pub mod winget;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types
pub use context::{InteropContext, MODULE_VERSION, ServiceConnector};
pub use error::{InteropError, Result};
