//! Delimited-text rendering of query results
//!
//! Rows are tab-separated and newline-terminated:
//!
//! - installed: `Name\tId\tInstalledVersion\tSource\n` (Source empty = local-only)
//! - updates: `Name\tId\tInstalledVersion\tAvailableVersion\tSource\n`
//! - sources: `Name\tArgument\n`
//!
//! Packages are snapshotted before rendering; a package whose fields cannot be read
//! is logged and left out, never failing the whole listing.

use crate::catalog::{CatalogPackage, CatalogReference};
use crate::error::Result;
use tracing::warn;

const FIELD_SEPARATOR: char = '\t';
const ROW_TERMINATOR: char = '\n';

/// Snapshot of an installed package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    /// Display name
    pub name: String,
    /// Stable identifier
    pub id: String,
    /// Installed version
    pub installed_version: String,
    /// Catalog offering the default install version; `None` for local-only packages
    pub source: Option<String>,
}

impl InstalledPackage {
    /// Read the snapshot from a package object
    pub fn read<P: CatalogPackage>(package: &P) -> Result<Self> {
        let source = package.default_install_version()?.map(|v| v.source);
        Ok(Self {
            name: package.name()?,
            id: package.id()?,
            installed_version: package.installed_version()?,
            source,
        })
    }

    /// Render the four-field row
    pub fn to_row(&self) -> String {
        row(&[
            self.name.as_str(),
            self.id.as_str(),
            self.installed_version.as_str(),
            self.source.as_deref().unwrap_or_default(),
        ])
    }
}

/// Snapshot of an installed package with a newer version available
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableUpdate {
    /// Display name
    pub name: String,
    /// Stable identifier
    pub id: String,
    /// Installed version
    pub installed_version: String,
    /// Default install version offered by the catalog
    pub available_version: String,
    /// Catalog offering the update
    pub source: String,
}

impl AvailableUpdate {
    /// Read the snapshot, or `None` when the package has no update
    ///
    /// A package qualifies only with both a default install version and the
    /// service's update-available flag.
    pub fn read<P: CatalogPackage>(package: &P) -> Result<Option<Self>> {
        let Some(available) = package.default_install_version()? else {
            return Ok(None);
        };
        if !package.is_update_available()? {
            return Ok(None);
        }
        Ok(Some(Self {
            name: package.name()?,
            id: package.id()?,
            installed_version: package.installed_version()?,
            available_version: available.version,
            source: available.source,
        }))
    }

    /// Render the five-field row
    pub fn to_row(&self) -> String {
        row(&[
            self.name.as_str(),
            self.id.as_str(),
            self.installed_version.as_str(),
            self.available_version.as_str(),
            self.source.as_str(),
        ])
    }
}

/// A catalog known to the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSource {
    /// Display name
    pub name: String,
    /// Source argument
    pub argument: String,
}

impl CatalogSource {
    /// Render the two-field row
    pub fn to_row(&self) -> String {
        row(&[self.name.as_str(), self.argument.as_str()])
    }
}

/// Snapshot every readable package
pub fn collect_installed_packages<P: CatalogPackage>(packages: &[P]) -> Vec<InstalledPackage> {
    packages
        .iter()
        .filter_map(|package| match InstalledPackage::read(package) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Failed to read package: {}", e);
                None
            }
        })
        .collect()
}

/// Snapshot every readable package that has an update
pub fn collect_available_updates<P: CatalogPackage>(packages: &[P]) -> Vec<AvailableUpdate> {
    packages
        .iter()
        .filter_map(|package| match AvailableUpdate::read(package) {
            Ok(update) => update,
            Err(e) => {
                warn!("Failed to read package: {}", e);
                None
            }
        })
        .collect()
}

/// Read the info of every catalog reference, skipping unreadable ones
pub fn collect_sources<C: CatalogReference>(catalogs: &[C]) -> Vec<CatalogSource> {
    catalogs
        .iter()
        .filter_map(|catalog| match catalog.info() {
            Ok(info) => Some(CatalogSource {
                name: info.name,
                argument: info.argument,
            }),
            Err(e) => {
                warn!("Failed to read catalog info: {}", e);
                None
            }
        })
        .collect()
}

/// Concatenate installed-package rows
pub fn render_installed_packages(packages: &[InstalledPackage]) -> String {
    packages.iter().map(InstalledPackage::to_row).collect()
}

/// Concatenate update rows
pub fn render_available_updates(updates: &[AvailableUpdate]) -> String {
    updates.iter().map(AvailableUpdate::to_row).collect()
}

/// Concatenate source rows
pub fn render_sources(sources: &[CatalogSource]) -> String {
    sources.iter().map(CatalogSource::to_row).collect()
}

fn row(fields: &[&str]) -> String {
    let mut out = String::with_capacity(fields.iter().map(|f| f.len() + 1).sum());
    for (index, field) in fields.iter().enumerate() {
        if index > 0 {
            out.push(FIELD_SEPARATOR);
        }
        push_field(&mut out, field);
    }
    out.push(ROW_TERMINATOR);
    out
}

/// Append a field, replacing delimiter characters so the row shape holds
fn push_field(out: &mut String, field: &str) {
    out.extend(field.chars().map(|c| match c {
        FIELD_SEPARATOR | ROW_TERMINATOR | '\r' => ' ',
        other => other,
    }));
}
