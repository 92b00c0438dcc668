//! Windows Package Manager backend
//!
//! Implements the catalog traits over the `Microsoft.Management.Deployment` WinRT
//! API. The package manager and every options object are created out of process
//! through the [`ComActivator`], so an elevated host goes through manual
//! activation for all of them.

use crate::activation::com::{ComActivator, com_activator};
use crate::activation::{ActivationTarget, Activator};
use crate::catalog::{
    AvailableVersion, CatalogInfo, CompositeCatalogView, FindPackagesResult, FindPackagesStatus,
    MatchField, MatchOption, SearchScope,
};
use crate::config::ActivationSettings;
use crate::context::ServiceConnector;
use crate::error::{InteropError, Result};
use tracing::{debug, info, warn};
use uuid::Uuid;
use windows::Win32::Foundation::RPC_E_CHANGED_MODE;
use windows::Win32::System::Com::{COINIT_APARTMENTTHREADED, CoInitializeEx};
use windows::core::{HSTRING, IInspectable, Interface};

#[allow(
    non_snake_case,
    non_camel_case_types,
    non_upper_case_globals,
    missing_docs,
    unsafe_code,
    clippy::all,
    clippy::pedantic,
    reason = "generated WinRT bindings"
)]
mod bindings {
    include!(concat!(env!("OUT_DIR"), "/winget_bindings.rs"));
}

use bindings::{
    CompositeSearchBehavior, CreateCompositePackageCatalogOptions, FindPackagesOptions,
    FindPackagesResultStatus, PackageFieldMatchOption, PackageManager, PackageMatchField,
    PackageMatchFilter,
};

const PACKAGE_MANAGER_CLSID: Uuid = Uuid::from_u128(0xC53A_4F16_787E_42A4_B304_29EF_FB4B_F597);
const FIND_PACKAGES_OPTIONS_CLSID: Uuid =
    Uuid::from_u128(0x572D_ED96_9C60_4526_8F92_EE7D_91D3_8C1A);
const PACKAGE_MATCH_FILTER_CLSID: Uuid =
    Uuid::from_u128(0xD02C_9DAF_99DC_429C_B503_4E50_4E4A_B000);
const CREATE_COMPOSITE_CATALOG_OPTIONS_CLSID: Uuid =
    Uuid::from_u128(0x5265_34B8_7E46_47C8_8416_B168_5C32_7D37);

fn target<T: Interface>(name: &'static str, clsid: Uuid) -> ActivationTarget {
    ActivationTarget {
        name,
        clsid,
        iid: Uuid::from_u128(T::IID.to_u128()),
    }
}

fn activate<T: Interface>(
    activator: &ComActivator,
    name: &'static str,
    clsid: Uuid,
) -> Result<T> {
    let instance: IInspectable = activator
        .create_instance(&target::<T>(name, clsid))
        .map_err(|source| InteropError::Activation {
            class: name,
            source,
        })?;
    Ok(instance.cast::<T>()?)
}

/// Treat a null object (empty error) as absent
fn optional<T>(result: windows::core::Result<T>) -> windows::core::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.code().is_ok() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Creates [`WinGetService`] handles
#[derive(Debug, Clone)]
pub struct WinGetConnector {
    settings: ActivationSettings,
}

impl WinGetConnector {
    /// Connector using the configured activation settings
    pub fn new(settings: ActivationSettings) -> Self {
        Self { settings }
    }
}

impl ServiceConnector for WinGetConnector {
    type Service = WinGetService;

    #[expect(unsafe_code, reason = "Windows FFI to initialize COM on this thread")]
    fn connect(&self) -> Result<WinGetService> {
        // SAFETY: no reserved pointer; balanced by process teardown
        let hr = unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) };
        if hr == RPC_E_CHANGED_MODE {
            debug!("COM already initialized with another apartment model");
        } else {
            hr.ok()?;
        }

        let activator = com_activator(
            &self.settings.helper_library,
            &self.settings.helper_factory_symbol,
            self.settings.elevated_activation,
        );
        let manager = activate::<PackageManager>(&activator, "PackageManager", PACKAGE_MANAGER_CLSID)?;
        info!("Activated PackageManager via {:?}", activator.path());
        Ok(WinGetService { manager, activator })
    }
}

/// Package-management service handle
pub struct WinGetService {
    manager: PackageManager,
    activator: ComActivator,
}

impl crate::catalog::PackageService for WinGetService {
    type CatalogRef = bindings::PackageCatalogReference;
    type Catalog = WinGetCatalog;

    fn package_catalogs(&self) -> Result<Vec<Self::CatalogRef>> {
        Ok(self.manager.GetPackageCatalogs()?.into_iter().collect())
    }

    fn connect_composite(
        &self,
        view: &CompositeCatalogView<Self::CatalogRef>,
    ) -> Result<Option<WinGetCatalog>> {
        let options: CreateCompositePackageCatalogOptions = activate(
            &self.activator,
            "CreateCompositePackageCatalogOptions",
            CREATE_COMPOSITE_CATALOG_OPTIONS_CLSID,
        )?;
        let catalogs = options.Catalogs()?;
        for catalog in &view.catalogs {
            catalogs.Append(catalog)?;
        }
        options.SetCompositeSearchBehavior(match view.scope {
            SearchScope::LocalCatalogs => CompositeSearchBehavior::LocalCatalogs,
            SearchScope::AllCatalogs => CompositeSearchBehavior::AllCatalogs,
        })?;

        let composite = self.manager.CreateCompositePackageCatalog(&options)?;
        let connected = composite.Connect()?;
        match optional(connected.PackageCatalog())? {
            Some(catalog) => Ok(Some(WinGetCatalog {
                catalog,
                activator: self.activator.clone(),
            })),
            None => {
                warn!("Composite catalog connect returned no catalog");
                Ok(None)
            }
        }
    }
}

impl crate::catalog::CatalogReference for bindings::PackageCatalogReference {
    fn info(&self) -> Result<CatalogInfo> {
        let info = self.Info()?;
        Ok(CatalogInfo {
            name: info.Name()?.to_string(),
            argument: info.Argument()?.to_string(),
        })
    }
}

/// Connected composite catalog
pub struct WinGetCatalog {
    catalog: bindings::PackageCatalog,
    activator: ComActivator,
}

impl crate::catalog::PackageCatalog for WinGetCatalog {
    type Package = bindings::CatalogPackage;

    fn find_packages(
        &self,
        options: &crate::catalog::FindPackagesOptions,
    ) -> Result<FindPackagesResult<bindings::CatalogPackage>> {
        let find_options: FindPackagesOptions = activate(
            &self.activator,
            "FindPackagesOptions",
            FIND_PACKAGES_OPTIONS_CLSID,
        )?;
        let filters = find_options.Filters()?;
        for filter in &options.filters {
            let match_filter: PackageMatchFilter = activate(
                &self.activator,
                "PackageMatchFilter",
                PACKAGE_MATCH_FILTER_CLSID,
            )?;
            match_filter.SetField(match filter.field {
                MatchField::Id => PackageMatchField::Id,
                MatchField::Name => PackageMatchField::Name,
                MatchField::Moniker => PackageMatchField::Moniker,
            })?;
            match_filter.SetOption(match filter.option {
                MatchOption::Equals => PackageFieldMatchOption::Equals,
                MatchOption::EqualsCaseInsensitive => PackageFieldMatchOption::EqualsCaseInsensitive,
                MatchOption::StartsWithCaseInsensitive => {
                    PackageFieldMatchOption::StartsWithCaseInsensitive
                }
                MatchOption::ContainsCaseInsensitive => {
                    PackageFieldMatchOption::ContainsCaseInsensitive
                }
            })?;
            match_filter.SetValue(&HSTRING::from(filter.value.as_str()))?;
            filters.Append(&match_filter)?;
        }
        if options.result_limit > 0 {
            find_options.SetResultLimit(options.result_limit)?;
        }

        let result = self.catalog.FindPackages(&find_options)?;
        let FindPackagesResultStatus(status) = result.Status()?;
        let matches = result
            .Matches()?
            .into_iter()
            .map(|m| optional(m.CatalogPackage()))
            .collect::<windows::core::Result<Vec<_>>>()?;

        Ok(FindPackagesResult {
            status: FindPackagesStatus::from_raw(status),
            matches,
        })
    }
}

impl crate::catalog::CatalogPackage for bindings::CatalogPackage {
    fn name(&self) -> Result<String> {
        Ok(self.Name()?.to_string())
    }

    fn id(&self) -> Result<String> {
        Ok(self.Id()?.to_string())
    }

    fn installed_version(&self) -> Result<String> {
        Ok(self.InstalledVersion()?.Version()?.to_string())
    }

    fn default_install_version(&self) -> Result<Option<AvailableVersion>> {
        let Some(version) = optional(self.DefaultInstallVersion())? else {
            return Ok(None);
        };
        Ok(Some(AvailableVersion {
            version: version.Version()?.to_string(),
            source: version.PackageCatalog()?.Info()?.Name()?.to_string(),
        }))
    }

    fn is_update_available(&self) -> Result<bool> {
        Ok(self.IsUpdateAvailable()?)
    }
}
