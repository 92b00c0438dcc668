//! Configuration data models
//!
//! This module defines the data structures used for the interop configuration.

use crate::activation::{ElevatedActivation, HELPER_FACTORY_SYMBOL, HELPER_LIBRARY};
use serde::{Deserialize, Serialize};

/// Top-level interop configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteropConfig {
    /// Class activation settings
    pub activation: ActivationSettings,
    /// Diagnostic log settings
    pub logging: LoggingSettings,
}

/// Class activation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivationSettings {
    /// How an elevated process activates the package manager
    pub elevated_activation: ElevatedActivation,
    /// Helper library loaded for manual activation
    pub helper_library: String,
    /// Factory exported by the helper library
    pub helper_factory_symbol: String,
}

/// Diagnostic log settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Whether to write %APPDATA%\WinGetInterop\interop.log
    pub log_to_file: bool,
    /// Filter used when `RUST_LOG` is not set
    pub default_filter: String,
}

impl Default for ActivationSettings {
    fn default() -> Self {
        Self {
            elevated_activation: ElevatedActivation::default(),
            helper_library: HELPER_LIBRARY.to_string(),
            helper_factory_symbol: HELPER_FACTORY_SYMBOL.to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_to_file: true,
            default_filter: "info".to_string(),
        }
    }
}
