//! Find-query filters
//!
//! Mirrors `PackageMatchFilter` / `FindPackagesOptions`. The shim only ever issues
//! one filter, `Id` contains-case-insensitive `""`, which matches every package;
//! [`PackageFilter::matches`] spells out that semantics so fakes and tests agree
//! with the service.

use smallvec::SmallVec;

/// Package field a filter applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchField {
    /// Package identifier
    Id,
    /// Display name
    Name,
    /// Moniker (short alias)
    Moniker,
}

/// Comparison performed by a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOption {
    /// Exact, case-sensitive
    Equals,
    /// Exact, case-insensitive
    EqualsCaseInsensitive,
    /// Prefix, case-insensitive
    StartsWithCaseInsensitive,
    /// Substring, case-insensitive
    ContainsCaseInsensitive,
}

/// One filter of a find query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFilter {
    /// Field compared
    pub field: MatchField,
    /// Comparison
    pub option: MatchOption,
    /// Value compared against
    pub value: String,
}

impl PackageFilter {
    /// `Id` contains-case-insensitive `""`: selects every package
    pub fn select_all() -> Self {
        Self {
            field: MatchField::Id,
            option: MatchOption::ContainsCaseInsensitive,
            value: String::new(),
        }
    }

    /// Whether `candidate` satisfies this filter
    pub fn matches(&self, candidate: &str) -> bool {
        match self.option {
            MatchOption::Equals => candidate == self.value,
            MatchOption::EqualsCaseInsensitive => {
                candidate.to_lowercase() == self.value.to_lowercase()
            }
            MatchOption::StartsWithCaseInsensitive => candidate
                .to_lowercase()
                .starts_with(&self.value.to_lowercase()),
            // The empty string is a substring of every string
            MatchOption::ContainsCaseInsensitive => candidate
                .to_lowercase()
                .contains(&self.value.to_lowercase()),
        }
    }
}

/// Options of a find query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindPackagesOptions {
    /// Filters, all of which must match
    pub filters: SmallVec<[PackageFilter; 2]>,
    /// Maximum number of results, 0 for no limit
    pub result_limit: u32,
}

impl FindPackagesOptions {
    /// Options selecting every package in the catalog
    pub fn select_all() -> Self {
        let mut options = Self::default();
        options.filters.push(PackageFilter::select_all());
        options
    }

    /// Whether a package with the given fields passes every filter
    pub fn accepts(&self, id: &str, name: &str, moniker: &str) -> bool {
        self.filters.iter().all(|filter| {
            let candidate = match filter.field {
                MatchField::Id => id,
                MatchField::Name => name,
                MatchField::Moniker => moniker,
            };
            filter.matches(candidate)
        })
    }
}
