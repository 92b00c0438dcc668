//! Shared test utilities for the interop unit tests.
//!
//! Provides an in-memory package service and an APPDATA guard. Only compiled during
//! testing (`#[cfg(test)]`).

use crate::catalog::{
    AvailableVersion, CatalogInfo, CatalogPackage, CatalogReference, CompositeCatalogView,
    FindPackagesOptions, FindPackagesResult, FindPackagesStatus, PackageCatalog, PackageService,
};
use crate::error::{InteropError, Result, StringError};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Mutex;
use tempfile::TempDir;

/// Global mutex to serialize tests that modify the APPDATA environment variable.
static APPDATA_LOCK: Mutex<()> = Mutex::new(());

/// Helper function to create a temporary test directory using tempfile.
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// RAII guard that points APPDATA at a temp directory and restores it on drop.
///
/// `APPDATA_LOCK` is held for the guard's lifetime so tests modify the variable
/// serially.
pub struct AppdataGuard {
    original: Option<String>,
    _lock: std::sync::MutexGuard<'static, ()>,
}

#[expect(
    unsafe_code,
    reason = "Test-only code that modifies environment variables under APPDATA_LOCK"
)]
impl AppdataGuard {
    /// Create a new guard that sets APPDATA to the given temp directory path.
    pub fn new(temp_dir: &TempDir) -> Self {
        let lock = APPDATA_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let original = std::env::var("APPDATA").ok();
        // SAFETY: APPDATA_LOCK serializes every writer of APPDATA in this test binary
        unsafe {
            std::env::set_var("APPDATA", temp_dir.path());
        }
        Self {
            original,
            _lock: lock,
        }
    }
}

#[expect(
    unsafe_code,
    reason = "Test-only code that restores environment variables under APPDATA_LOCK"
)]
impl Drop for AppdataGuard {
    fn drop(&mut self) {
        // SAFETY: the lock is still held by this guard
        if let Some(ref original) = self.original {
            unsafe {
                std::env::set_var("APPDATA", original);
            }
        } else {
            unsafe {
                std::env::remove_var("APPDATA");
            }
        }
    }
}

/// In-memory package
#[derive(Debug, Clone, Default)]
pub struct FakePackage {
    pub name: String,
    pub id: String,
    pub installed_version: String,
    pub default_install: Option<AvailableVersion>,
    pub update_available: bool,
    /// Makes every getter fail
    pub broken: bool,
}

impl FakePackage {
    /// Package known only to the local install database
    pub fn local(name: &str, id: &str, installed_version: &str) -> Self {
        Self {
            name: name.to_string(),
            id: id.to_string(),
            installed_version: installed_version.to_string(),
            ..Self::default()
        }
    }

    /// Package offered by a remote catalog
    pub fn remote(
        name: &str,
        id: &str,
        installed_version: &str,
        available_version: &str,
        source: &str,
        update_available: bool,
    ) -> Self {
        Self {
            default_install: Some(AvailableVersion {
                version: available_version.to_string(),
                source: source.to_string(),
            }),
            update_available,
            ..Self::local(name, id, installed_version)
        }
    }

    /// Package whose getters all fail
    pub fn broken(id: &str) -> Self {
        Self {
            broken: true,
            ..Self::local(id, id, "1.0")
        }
    }

    fn read<T>(&self, value: T) -> Result<T> {
        if self.broken {
            Err(InteropError::PackageRead(StringError::new(format!(
                "package {} is unreadable",
                self.id
            ))))
        } else {
            Ok(value)
        }
    }
}

impl CatalogPackage for FakePackage {
    fn name(&self) -> Result<String> {
        self.read(self.name.clone())
    }

    fn id(&self) -> Result<String> {
        self.read(self.id.clone())
    }

    fn installed_version(&self) -> Result<String> {
        self.read(self.installed_version.clone())
    }

    fn default_install_version(&self) -> Result<Option<AvailableVersion>> {
        self.read(self.default_install.clone())
    }

    fn is_update_available(&self) -> Result<bool> {
        self.read(self.update_available)
    }
}

/// In-memory catalog reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeCatalogRef {
    pub name: String,
    pub argument: String,
    pub broken: bool,
}

impl FakeCatalogRef {
    pub fn new(name: &str, argument: &str) -> Self {
        Self {
            name: name.to_string(),
            argument: argument.to_string(),
            broken: false,
        }
    }
}

impl CatalogReference for FakeCatalogRef {
    fn info(&self) -> Result<CatalogInfo> {
        if self.broken {
            return Err(InteropError::Service(StringError::new("catalog info unavailable")));
        }
        Ok(CatalogInfo {
            name: self.name.clone(),
            argument: self.argument.clone(),
        })
    }
}

/// Connected in-memory catalog
#[derive(Debug, Clone)]
pub struct FakeCatalog {
    status: FindPackagesStatus,
    matches: Vec<Option<FakePackage>>,
    seen_options: Rc<RefCell<Vec<FindPackagesOptions>>>,
}

impl PackageCatalog for FakeCatalog {
    type Package = FakePackage;

    fn find_packages(&self, options: &FindPackagesOptions) -> Result<FindPackagesResult<FakePackage>> {
        self.seen_options.borrow_mut().push(options.clone());
        let matches = self
            .matches
            .iter()
            .filter(|m| match m {
                Some(p) if !p.broken => options.accepts(&p.id, &p.name, ""),
                _ => true,
            })
            .cloned()
            .collect();
        Ok(FindPackagesResult {
            status: self.status,
            matches,
        })
    }
}

/// In-memory package service
#[derive(Debug, Clone)]
pub struct FakeService {
    pub catalogs: Vec<FakeCatalogRef>,
    pub matches: Vec<Option<FakePackage>>,
    pub connect_succeeds: bool,
    pub status: FindPackagesStatus,
    pub enumeration_fails: bool,
    pub seen_views: RefCell<Vec<CompositeCatalogView<FakeCatalogRef>>>,
    pub last_catalog: RefCell<Option<FakeCatalog>>,
}

impl FakeService {
    /// Service whose composite catalog contains `packages`
    pub fn with_packages(packages: Vec<FakePackage>) -> Self {
        Self {
            catalogs: vec![
                FakeCatalogRef::new("winget", "https://cdn.winget.microsoft.com/cache"),
                FakeCatalogRef::new("msstore", "https://storeedgefd.dsx.mp.microsoft.com/v9.0"),
            ],
            matches: packages.into_iter().map(Some).collect(),
            connect_succeeds: true,
            status: FindPackagesStatus::Ok,
            enumeration_fails: false,
            seen_views: RefCell::new(Vec::new()),
            last_catalog: RefCell::new(None),
        }
    }

    /// The two-package scenario: A is local-only, B has an update from Repo1
    pub fn scenario() -> Self {
        Self::with_packages(vec![
            FakePackage::local("A", "A.id", "1.0"),
            FakePackage::remote("B", "B.id", "1.0", "2.0", "Repo1", true),
        ])
    }

    /// Options passed to the most recent find query
    pub fn last_find_options(&self) -> Option<FindPackagesOptions> {
        self.last_catalog
            .borrow()
            .as_ref()
            .and_then(|c| c.seen_options.borrow().last().cloned())
    }
}

impl PackageService for FakeService {
    type CatalogRef = FakeCatalogRef;
    type Catalog = FakeCatalog;

    fn package_catalogs(&self) -> Result<Vec<FakeCatalogRef>> {
        if self.enumeration_fails {
            return Err(InteropError::Service(StringError::new("RPC server unavailable")));
        }
        Ok(self.catalogs.clone())
    }

    fn connect_composite(
        &self,
        view: &CompositeCatalogView<FakeCatalogRef>,
    ) -> Result<Option<FakeCatalog>> {
        self.seen_views.borrow_mut().push(view.clone());
        if !self.connect_succeeds {
            return Ok(None);
        }
        let catalog = FakeCatalog {
            status: self.status,
            matches: self.matches.clone(),
            seen_options: Rc::new(RefCell::new(Vec::new())),
        };
        *self.last_catalog.borrow_mut() = Some(catalog.clone());
        Ok(Some(catalog))
    }
}

/// Shorthand for a service-level failure in tests
pub fn service_fault(message: &str) -> InteropError {
    InteropError::Service(StringError::new(message))
}

/// Connector that fails a set number of times before handing out a service
#[derive(Debug)]
pub struct FakeConnector {
    pub service: FakeService,
    pub failures_left: std::cell::Cell<usize>,
    pub attempts: std::cell::Cell<usize>,
}

impl FakeConnector {
    /// Connector that always succeeds with `service`
    pub fn new(service: FakeService) -> Self {
        Self::failing(service, 0)
    }

    /// Connector that fails the first `failures` attempts
    pub fn failing(service: FakeService, failures: usize) -> Self {
        Self {
            service,
            failures_left: std::cell::Cell::new(failures),
            attempts: std::cell::Cell::new(0),
        }
    }
}

impl crate::context::ServiceConnector for FakeConnector {
    type Service = FakeService;

    fn connect(&self) -> Result<FakeService> {
        self.attempts.set(self.attempts.get() + 1);
        let left = self.failures_left.get();
        if left > 0 {
            self.failures_left.set(left - 1);
            return Err(service_fault("Class not registered"));
        }
        Ok(self.service.clone())
    }
}
