//! Exported-function boundary
//!
//! Nothing crosses into the host as a Rust error or a panic. Each entry point runs
//! its query through [`render_text`] (or [`initialize`]), which logs the failure
//! with its structured code, records it for `GetLastInteropError` and returns the
//! entry point's sentinel string instead.

use crate::context::{InteropContext, ServiceConnector};
use crate::error::{EntryPoint, InteropError, Result, sentinel_message};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::error;

/// Run `query` for `entry`, converting any failure into the sentinel string
pub fn render_text<C, F>(context: &mut InteropContext<C>, entry: EntryPoint, query: F) -> String
where
    C: ServiceConnector,
    F: FnOnce(&mut InteropContext<C>) -> Result<String>,
{
    match guarded(context, query) {
        Ok(text) => {
            context.set_last_error(None);
            text
        }
        Err(e) => fail(context, entry, &e),
    }
}

/// `InitializePackageManager`: whether this attempt produced a handle
pub fn initialize<C: ServiceConnector>(context: &mut InteropContext<C>) -> bool {
    match guarded(context, InteropContext::initialize) {
        Ok(()) => {
            context.set_last_error(None);
            true
        }
        Err(e) => {
            fail(context, EntryPoint::InitializePackageManager, &e);
            false
        }
    }
}

/// `GetInstalledPackagesFromAllCatalogs`
pub fn installed_packages<C: ServiceConnector>(context: &mut InteropContext<C>) -> String {
    render_text(
        context,
        EntryPoint::InstalledPackages,
        InteropContext::installed_packages_text,
    )
}

/// `GetAvailableUpdatesFromAllCatalogs`
pub fn available_updates<C: ServiceConnector>(context: &mut InteropContext<C>) -> String {
    render_text(
        context,
        EntryPoint::AvailableUpdates,
        InteropContext::available_updates_text,
    )
}

/// `GetSourcesFromAllCatalogs`
pub fn sources<C: ServiceConnector>(context: &mut InteropContext<C>) -> String {
    render_text(context, EntryPoint::Sources, InteropContext::sources_text)
}

/// `GetLastInteropError`: empty when the last call succeeded
pub fn last_error<C: ServiceConnector>(context: &InteropContext<C>) -> String {
    context.last_error().unwrap_or_default().to_string()
}

fn guarded<C, T, F>(context: &mut InteropContext<C>, f: F) -> Result<T>
where
    C: ServiceConnector,
    F: FnOnce(&mut InteropContext<C>) -> Result<T>,
{
    catch_unwind(AssertUnwindSafe(|| f(context)))
        .unwrap_or_else(|payload| Err(InteropError::Panic(panic_message(payload.as_ref()))))
}

fn fail<C: ServiceConnector>(
    context: &mut InteropContext<C>,
    entry: EntryPoint,
    error: &InteropError,
) -> String {
    match error.code() {
        Some(code) => error!("{}() failed with code {}: {}", entry.name(), code, error),
        None => error!("{}() failed: {}", entry.name(), error),
    }
    context.set_last_error(Some(error.to_string()));
    sentinel_message(entry, error)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FindPackagesStatus;
    use crate::test_utils::{FakeConnector, FakePackage, FakeService};

    fn context(service: FakeService) -> InteropContext<FakeConnector> {
        InteropContext::new(FakeConnector::new(service))
    }

    #[test]
    fn test_success_clears_last_error() {
        let mut service = FakeService::scenario();
        service.connect_succeeds = false;
        let mut ctx = context(service);

        installed_packages(&mut ctx);
        assert!(!last_error(&ctx).is_empty());

        initialize(&mut ctx);
        assert_eq!(last_error(&ctx), "");
    }

    #[test]
    fn test_connect_failure_sentinel() {
        let mut service = FakeService::scenario();
        service.connect_succeeds = false;
        let mut ctx = context(service);
        assert_eq!(
            installed_packages(&mut ctx),
            "GetInstalledPackagesFromAllCatalogs(): Failed to get installed packages. Error code in log"
        );
        assert_eq!(last_error(&ctx), "Failed to connect to catalog");
    }

    #[test]
    fn test_find_status_failure_sentinel() {
        let mut service = FakeService::scenario();
        service.status = FindPackagesStatus::CatalogError;
        let mut ctx = context(service);
        assert_eq!(
            available_updates(&mut ctx),
            "GetAvailableUpdatesFromAllCatalogs(): Failed to get installed packages. Error code in log"
        );
    }

    #[test]
    fn test_lazy_initialization_failure_sentinel() {
        let mut ctx = InteropContext::new(FakeConnector::failing(FakeService::scenario(), 5));
        assert_eq!(
            installed_packages(&mut ctx),
            "GetInstalledPackagesFromAllCatalogs(): Failed to get installed packages. Error details in log"
        );
        assert!(last_error(&ctx).contains("Class not registered"));
    }

    #[test]
    fn test_initialize_reports_each_attempt() {
        let mut ctx = InteropContext::new(FakeConnector::failing(FakeService::scenario(), 1));
        assert!(!initialize(&mut ctx));
        assert!(initialize(&mut ctx));
    }

    #[test]
    fn test_panic_is_contained() {
        let mut ctx = context(FakeService::scenario());
        let text = render_text(&mut ctx, EntryPoint::InstalledPackages, |_| {
            panic!("catalog went away")
        });
        assert_eq!(
            text,
            "GetInstalledPackagesFromAllCatalogs(): Failed to get installed packages."
        );
        assert_eq!(last_error(&ctx), "Unexpected fault: catalog went away");
    }

    #[test]
    fn test_sources_sentinel_names_sources() {
        let mut service = FakeService::with_packages(vec![FakePackage::local("A", "A.id", "1.0")]);
        service.enumeration_fails = true;
        let mut ctx = context(service);
        assert_eq!(
            sources(&mut ctx),
            "GetSourcesFromAllCatalogs(): Failed to get package sources. Error details in log"
        );
    }

    #[test]
    fn test_scenario_through_boundary() {
        let mut ctx = context(FakeService::scenario());
        assert!(initialize(&mut ctx));
        assert_eq!(
            installed_packages(&mut ctx),
            "A\tA.id\t1.0\t\nB\tB.id\t1.0\tRepo1\n"
        );
        assert_eq!(available_updates(&mut ctx), "B\tB.id\t1.0\t2.0\tRepo1\n");
        assert_eq!(last_error(&ctx), "");
    }
}
