//! Configuration manager for loading and saving the interop configuration
//!
//! This module provides functionality to load and save configuration to
//! %APPDATA%\WinGetInterop\config.json with atomic writes to prevent corruption.

use crate::config::models::InteropConfig;
use crate::error::{InteropError, Result, StringError};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Directory name under %APPDATA% holding configuration and logs
pub const APP_DIR_NAME: &str = "WinGetInterop";

/// Configuration manager
pub struct ConfigManager;

impl ConfigManager {
    /// Get the application data directory
    ///
    /// Returns: %APPDATA%\WinGetInterop (or .\WinGetInterop when APPDATA is unset)
    pub fn get_app_dir() -> PathBuf {
        let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(appdata).join(APP_DIR_NAME)
    }

    /// Get the path to the configuration file
    ///
    /// Returns: %APPDATA%\WinGetInterop\config.json
    pub fn get_config_path() -> PathBuf {
        Self::get_app_dir().join("config.json")
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist or is corrupt, returns default configuration.
    pub fn load() -> Result<InteropConfig> {
        Self::load_from(&Self::get_config_path())
    }

    /// Load configuration from an explicit path
    pub fn load_from(config_path: &Path) -> Result<InteropConfig> {
        if !config_path.exists() {
            info!("Configuration file not found, using defaults");
            return Ok(InteropConfig::default());
        }

        let json = std::fs::read_to_string(config_path)?;

        match serde_json::from_str(&json) {
            Ok(config) => {
                info!("Configuration loaded successfully");
                Ok(config)
            }
            Err(e) => {
                warn!("Failed to parse configuration, using defaults: {}", e);
                Ok(InteropConfig::default())
            }
        }
    }

    /// Save configuration to disk with atomic write
    pub fn save(config: &InteropConfig) -> Result<()> {
        Self::save_to(config, &Self::get_config_path())
    }

    /// Save configuration to an explicit path with atomic write
    ///
    /// Writes a temporary file in the same directory, then renames it over the target.
    pub fn save_to(config: &InteropConfig, config_path: &Path) -> Result<()> {
        let config_dir = config_path.parent().ok_or_else(|| {
            InteropError::ConfigError(StringError::new("Invalid config path"))
        })?;
        std::fs::create_dir_all(config_dir)?;

        let json = serde_json::to_string_pretty(config)?;
        let mut temp_file = tempfile::NamedTempFile::new_in(config_dir)?;
        temp_file.write_all(json.as_bytes())?;
        temp_file
            .persist(config_path)
            .map_err(|e| InteropError::IoError(e.error))?;

        info!("Configuration saved successfully");
        Ok(())
    }
}
