//! Installed-package query
//!
//! Builds a local-only composite view over every catalog the service knows, connects
//! to it and selects all of its packages. Failures carry the structured codes from
//! [`crate::error::InteropError::code`].

use crate::catalog::{
    CompositeCatalogView, FindPackagesOptions, FindPackagesStatus, PackageCatalog,
    PackageService, SearchScope,
};
use crate::error::{InteropError, Result};
use tracing::{debug, warn};

/// Package type produced by a service's connected catalog
pub type ServicePackage<S> = <<S as PackageService>::Catalog as PackageCatalog>::Package;

/// Composite view over every catalog reference, restricted to local catalogs
///
/// Catalog references are enumerated fresh on every call.
pub fn build_installed_view<S: PackageService>(
    service: &S,
) -> Result<CompositeCatalogView<S::CatalogRef>> {
    let catalogs = service.package_catalogs()?;
    debug!("Building local composite view over {} catalogs", catalogs.len());
    Ok(CompositeCatalogView {
        catalogs,
        scope: SearchScope::LocalCatalogs,
    })
}

/// Find every locally installed package
///
/// On failure no partial result is returned: a failed connection yields
/// [`InteropError::CatalogConnect`] and a non-`Ok` query status yields
/// [`InteropError::FindPackages`]. Matches without a package object are skipped.
pub fn find_installed_packages<S: PackageService>(service: &S) -> Result<Vec<ServicePackage<S>>> {
    let view = build_installed_view(service)?;

    let Some(catalog) = service.connect_composite(&view)? else {
        warn!("Failed to connect to the composite catalog");
        return Err(InteropError::CatalogConnect);
    };

    let result = catalog.find_packages(&FindPackagesOptions::select_all())?;
    if result.status != FindPackagesStatus::Ok {
        warn!(
            "Failed to find packages on catalog: status was {}",
            result.status.raw()
        );
        return Err(InteropError::FindPackages(result.status));
    }

    let total = result.matches.len();
    let packages: Vec<_> = result.matches.into_iter().flatten().collect();
    if packages.len() < total {
        debug!(
            "Skipped {} matches without a package object",
            total - packages.len()
        );
    }

    Ok(packages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogPackage, PackageFilter};
    use crate::test_utils::{FakePackage, FakeService};

    #[test]
    fn test_view_contains_every_catalog_in_local_scope() {
        let service = FakeService::scenario();
        let view = build_installed_view(&service).unwrap();
        assert_eq!(view.scope, SearchScope::LocalCatalogs);
        assert_eq!(view.catalogs, service.catalogs);
    }

    #[test]
    fn test_query_connects_with_local_view() {
        let service = FakeService::scenario();
        find_installed_packages(&service).unwrap();

        let views = service.seen_views.borrow();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].scope, SearchScope::LocalCatalogs);
        assert_eq!(views[0].catalogs.len(), 2);
    }

    #[test]
    fn test_query_uses_single_select_all_filter() {
        let service = FakeService::scenario();
        find_installed_packages(&service).unwrap();

        let options = service.last_find_options().expect("find was issued");
        assert_eq!(options.filters.as_slice(), &[PackageFilter::select_all()]);
    }

    #[test]
    fn test_query_returns_every_package() {
        let service = FakeService::scenario();
        let packages = find_installed_packages(&service).unwrap();
        let ids: Vec<String> = packages.iter().map(|p| p.id().unwrap()).collect();
        assert_eq!(ids, vec!["A.id", "B.id"]);
    }

    #[test]
    fn test_query_with_no_catalogs_still_connects() {
        let mut service = FakeService::scenario();
        service.catalogs.clear();
        let packages = find_installed_packages(&service).unwrap();
        assert_eq!(packages.len(), 2);
        assert!(service.seen_views.borrow()[0].catalogs.is_empty());
    }

    #[test]
    fn test_connect_failure_yields_code_one() {
        let mut service = FakeService::scenario();
        service.connect_succeeds = false;
        let error = find_installed_packages(&service).unwrap_err();
        assert!(matches!(error, InteropError::CatalogConnect));
        assert_eq!(error.code(), Some(1));
    }

    #[test]
    fn test_find_status_failure_yields_offset_code() {
        let mut service = FakeService::scenario();
        service.status = FindPackagesStatus::InternalError;
        let error = find_installed_packages(&service).unwrap_err();
        assert!(matches!(
            error,
            InteropError::FindPackages(FindPackagesStatus::InternalError)
        ));
        assert_eq!(error.code(), Some(13));
    }

    #[test]
    fn test_matches_without_package_are_skipped() {
        let mut service = FakeService::with_packages(vec![FakePackage::local("A", "A.id", "1.0")]);
        service.matches.insert(0, None);
        service.matches.push(None);
        let packages = find_installed_packages(&service).unwrap();
        assert_eq!(packages.len(), 1);
    }

    #[test]
    fn test_enumeration_fault_propagates() {
        let mut service = FakeService::scenario();
        service.enumeration_fails = true;
        let error = find_installed_packages(&service).unwrap_err();
        assert!(matches!(error, InteropError::Service(_)));
        assert!(service.seen_views.borrow().is_empty());
    }
}
