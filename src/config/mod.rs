//! Configuration management module
//!
//! This module handles loading and saving the interop configuration.
//! Configuration is stored in %APPDATA%\WinGetInterop\config.json; a missing or
//! corrupt file falls back to defaults so the exported functions always work.

pub mod manager;
pub mod models;

pub use manager::ConfigManager;
pub use models::{ActivationSettings, InteropConfig, LoggingSettings};
