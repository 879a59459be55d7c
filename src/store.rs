//! Region store.
//!
//! Owns the region entities and exposes the filters the listing flows
//! use: exact and prefix name lookup, country-code lookup, and search
//! by country display-name prefix. Filters return materialized vectors
//! in insertion order; no match is an empty result, never an error.

use std::sync::Arc;

use crate::countries::CountryDirectory;
use crate::error::Error;
use crate::region::{Region, SharedRegion};

pub struct RegionStore {
    directory: Arc<CountryDirectory>,
    regions: Vec<SharedRegion>,
}

impl RegionStore {
    pub fn new(directory: Arc<CountryDirectory>) -> Self {
        Self {
            directory,
            regions: Vec::new(),
        }
    }

    /// Validate and add a region, returning the shared handle.
    ///
    /// # Errors
    /// [`Error::Validation`] when the name is blank or the country code
    /// is not a known alpha-2 code.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        country_code: impl Into<String>,
    ) -> Result<SharedRegion, Error> {
        let region = Region::new_shared(name, country_code, Arc::clone(&self.directory))?;
        self.regions.push(Arc::clone(&region));
        Ok(region)
    }

    /// All regions, in insertion order.
    pub fn all(&self) -> Vec<SharedRegion> {
        self.regions.clone()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Case-insensitive exact name match.
    pub fn find_by_name_exact(&self, name: &str) -> Vec<SharedRegion> {
        self.regions
            .iter()
            .filter(|r| r.name().eq_ignore_ascii_case(name))
            .cloned()
            .collect()
    }

    /// Case-insensitive name prefix match.
    pub fn find_by_name_prefix(&self, prefix: &str) -> Vec<SharedRegion> {
        let prefix = prefix.to_lowercase();
        self.regions
            .iter()
            .filter(|r| r.name().to_lowercase().starts_with(&prefix))
            .cloned()
            .collect()
    }

    /// Case-insensitive country-code equality (codes are stored
    /// lower-case, so the query is normalized once).
    pub fn find_by_country_code(&self, code: &str) -> Vec<SharedRegion> {
        let code = code.to_lowercase();
        self.regions
            .iter()
            .filter(|r| r.country_code() == code)
            .cloned()
            .collect()
    }

    /// Regions whose country display name starts with `query`,
    /// case-insensitively. "austr" finds regions in both Australia and
    /// Austria.
    pub fn search_by_country_name_prefix(&self, query: &str) -> Vec<SharedRegion> {
        // Lower-case the query once, not per comparison.
        let query = query.to_lowercase();
        let codes: Vec<&str> = self
            .directory
            .all_codes()
            .filter(|code| {
                self.directory
                    .display_name(code)
                    .is_some_and(|name| name.to_lowercase().starts_with(&query))
            })
            .collect();

        self.regions
            .iter()
            .filter(|r| codes.contains(&r.country_code()))
            .cloned()
            .collect()
    }

    /// Narrow an already-filtered result by exact name, the way the
    /// listing-creation flow chains country and city filters.
    pub fn filter_by_name_exact(regions: &[SharedRegion], name: &str) -> Vec<SharedRegion> {
        regions
            .iter()
            .filter(|r| r.name().eq_ignore_ascii_case(name))
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
