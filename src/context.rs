//! Package manager context
//!
//! [`InteropContext`] owns the package-management service handle. The handle is
//! created by a [`ServiceConnector`] on [`InteropContext::initialize`], or lazily by
//! the first query that finds none. Initialization is retry friendly: every call
//! re-attempts, a success replaces the handle and a failure keeps the previous one.

use crate::catalog::format::{
    AvailableUpdate, CatalogSource, InstalledPackage, collect_available_updates,
    collect_installed_packages, collect_sources, render_available_updates,
    render_installed_packages, render_sources,
};
use crate::catalog::{PackageService, find_installed_packages};
use crate::error::{InteropError, Result};
use tracing::{debug, info, warn};

/// Version reported by `GetModuleVersion`
pub const MODULE_VERSION: &str = "1.0.0.0";

/// Creates package-management service handles
pub trait ServiceConnector {
    /// Service produced on success
    type Service: PackageService;

    /// Activate the service
    fn connect(&self) -> Result<Self::Service>;
}

/// Process-level state behind the exported functions
pub struct InteropContext<C: ServiceConnector> {
    connector: C,
    service: Option<C::Service>,
    last_error: Option<String>,
}

impl<C: ServiceConnector> InteropContext<C> {
    /// Create an uninitialized context
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            service: None,
            last_error: None,
        }
    }

    /// Connector used to create service handles
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Whether a service handle exists
    pub fn is_initialized(&self) -> bool {
        self.service.is_some()
    }

    /// Create a service handle, replacing any existing one on success
    ///
    /// On failure the previous handle (if any) stays in place.
    pub fn initialize(&mut self) -> Result<()> {
        match self.connector.connect() {
            Ok(service) => {
                if self.service.replace(service).is_some() {
                    debug!("Replaced existing package manager handle");
                }
                info!("Package manager initialized");
                Ok(())
            }
            Err(e) => {
                warn!(
                    "Failed to initialize package manager (existing handle kept: {}): {}",
                    self.service.is_some(),
                    e
                );
                Err(e)
            }
        }
    }

    /// Current service handle, initializing first when none exists
    pub fn ensure_initialized(&mut self) -> Result<&C::Service> {
        if self.service.is_none() {
            debug!("No package manager handle, initializing lazily");
            self.initialize()?;
        }
        self.service.as_ref().ok_or(InteropError::NotInitialized)
    }

    /// Every locally installed package
    pub fn installed_packages(&mut self) -> Result<Vec<InstalledPackage>> {
        let service = self.ensure_initialized()?;
        let packages = find_installed_packages(service)?;
        let installed = collect_installed_packages(&packages);
        info!("Found {} installed packages", installed.len());
        Ok(installed)
    }

    /// Installed packages with a newer version available
    pub fn available_updates(&mut self) -> Result<Vec<AvailableUpdate>> {
        let service = self.ensure_initialized()?;
        let packages = find_installed_packages(service)?;
        let updates = collect_available_updates(&packages);
        info!("Found {} available updates", updates.len());
        Ok(updates)
    }

    /// Every catalog known to the service
    pub fn sources(&mut self) -> Result<Vec<CatalogSource>> {
        let service = self.ensure_initialized()?;
        let catalogs = service.package_catalogs()?;
        Ok(collect_sources(&catalogs))
    }

    /// Installed packages as delimited rows
    pub fn installed_packages_text(&mut self) -> Result<String> {
        self.installed_packages()
            .map(|packages| render_installed_packages(&packages))
    }

    /// Available updates as delimited rows
    pub fn available_updates_text(&mut self) -> Result<String> {
        self.available_updates()
            .map(|updates| render_available_updates(&updates))
    }

    /// Package sources as delimited rows
    pub fn sources_text(&mut self) -> Result<String> {
        self.sources().map(|sources| render_sources(&sources))
    }

    /// Message of the most recent boundary failure, if the last call failed
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub(crate) fn set_last_error(&mut self, message: Option<String>) {
        self.last_error = message;
    }
}
