//! Catalog query module
//!
//! This module models the slice of the Windows Package Manager catalog API the shim
//! needs, and turns query results into the delimited text returned to the host.
//!
//! # Overview
//!
//! - **Service traits** (`PackageService`, `PackageCatalog`, `CatalogPackage`) describe
//!   the external package-management service. The WinRT backend implements them on
//!   Windows; tests implement them with in-memory fakes.
//! - **Filters** (`PackageFilter`, `FindPackagesOptions`) describe a find query.
//! - **Query** (`find_installed_packages`) builds a local-only composite view over
//!   every catalog and selects all of its packages.
//! - **Format** (`InstalledPackage`, `AvailableUpdate`) snapshots packages and renders
//!   the tab/newline rows.
//!
//! # Query Flow
//!
//! 1. Enumerate catalog references
//! 2. Build a composite view with `SearchScope::LocalCatalogs`
//! 3. Connect (failure → structured code 1)
//! 4. Find with `Id` contains-case-insensitive `""` (matches everything)
//! 5. Non-`Ok` status → structured code 10 + status
//! 6. Skip matches without a package object

pub mod filter;
pub mod format;
pub mod query;

pub use filter::{FindPackagesOptions, MatchField, MatchOption, PackageFilter};
pub use format::{
    AvailableUpdate, CatalogSource, InstalledPackage, collect_available_updates,
    collect_installed_packages, collect_sources, render_available_updates,
    render_installed_packages, render_sources,
};
pub use query::{build_installed_view, find_installed_packages};

use crate::error::Result;

/// Search behavior of a composite catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Search only the local install database, correlating remote catalogs
    LocalCatalogs,
    /// Search every catalog in the view
    AllCatalogs,
}

/// Status of a find-packages query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindPackagesStatus {
    /// The query succeeded
    Ok,
    /// Group policy blocked the query
    BlockedByPolicy,
    /// A catalog failed while searching
    CatalogError,
    /// The service hit an internal error
    InternalError,
    /// The query options were rejected
    InvalidOptions,
    /// A catalog required authentication
    AuthenticationError,
    /// Access to a catalog was denied
    AccessDenied,
    /// Status value this crate does not know
    Other(i32),
}

impl FindPackagesStatus {
    /// Build a status from the service's raw enumeration value
    pub fn from_raw(value: i32) -> Self {
        match value {
            0 => Self::Ok,
            1 => Self::BlockedByPolicy,
            2 => Self::CatalogError,
            3 => Self::InternalError,
            4 => Self::InvalidOptions,
            5 => Self::AuthenticationError,
            6 => Self::AccessDenied,
            other => Self::Other(other),
        }
    }

    /// Raw enumeration value
    pub fn raw(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::BlockedByPolicy => 1,
            Self::CatalogError => 2,
            Self::InternalError => 3,
            Self::InvalidOptions => 4,
            Self::AuthenticationError => 5,
            Self::AccessDenied => 6,
            Self::Other(value) => value,
        }
    }
}

/// Ephemeral aggregation of catalog references queried as one source
#[derive(Debug, Clone)]
pub struct CompositeCatalogView<C> {
    /// Catalog references in enumeration order
    pub catalogs: Vec<C>,
    /// Search behavior
    pub scope: SearchScope,
}

/// Name and argument of a catalog as reported by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogInfo {
    /// Display name (e.g., "winget")
    pub name: String,
    /// Source argument, usually a URL
    pub argument: String,
}

/// Highest available version of a package and the catalog offering it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableVersion {
    /// Version string
    pub version: String,
    /// Display name of the originating catalog
    pub source: String,
}

/// Result of a find-packages query
#[derive(Debug)]
pub struct FindPackagesResult<P> {
    /// Query status
    pub status: FindPackagesStatus,
    /// One entry per match; `None` when the match has no resolvable package
    pub matches: Vec<Option<P>>,
}

/// Handle to one catalog known to the service
pub trait CatalogReference {
    /// Read the catalog's name and argument
    fn info(&self) -> Result<CatalogInfo>;
}

/// The external package-management service
pub trait PackageService {
    /// Catalog reference handle
    type CatalogRef: CatalogReference;
    /// Connected catalog
    type Catalog: PackageCatalog;

    /// Enumerate every catalog reference, freshly on each call
    fn package_catalogs(&self) -> Result<Vec<Self::CatalogRef>>;

    /// Create a composite catalog over `view` and connect to it
    ///
    /// Returns `Ok(None)` when the connection did not produce a catalog.
    fn connect_composite(
        &self,
        view: &CompositeCatalogView<Self::CatalogRef>,
    ) -> Result<Option<Self::Catalog>>;
}

/// A connected catalog that can be searched
pub trait PackageCatalog {
    /// Package object type
    type Package: CatalogPackage;

    /// Run a find query
    fn find_packages(
        &self,
        options: &FindPackagesOptions,
    ) -> Result<FindPackagesResult<Self::Package>>;
}

/// A package surfaced by a catalog query
///
/// Every getter may fail independently; callers skip the package on failure.
pub trait CatalogPackage {
    /// Display name
    fn name(&self) -> Result<String>;

    /// Stable identifier
    fn id(&self) -> Result<String>;

    /// Installed version string
    fn installed_version(&self) -> Result<String>;

    /// Default install version, present only when a remote catalog offers one
    fn default_install_version(&self) -> Result<Option<AvailableVersion>>;

    /// Whether the service reports a newer version than the installed one
    fn is_update_available(&self) -> Result<bool>;
}
