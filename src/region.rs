//! Region entity.
//!
//! A region is a city within a country, identified by name plus ISO
//! alpha-2 country code (always stored lower-case and validated against
//! the country directory at construction). Regions are shared by
//! identity (`Arc<Region>`): the resolver mutates the transient
//! in-memory weather slot while callers hold the same handle.
//!
//! The weather slot is request-lifetime state, not a cache: it never
//! expires on its own and is cleared only when the region instance is
//! dropped. Only the resolver writes it.

use std::sync::{Arc, Mutex};

use crate::countries::CountryDirectory;
use crate::error::Error;
use crate::weather::WeatherObservation;

/// Shared region handle. Identity (pointer) equality is what "same
/// region" means in batch resolution.
pub type SharedRegion = Arc<Region>;

#[derive(Debug)]
pub struct Region {
    name: String,
    /// Lower-case alpha-2 code, known to the directory.
    country_code: String,
    directory: Arc<CountryDirectory>,
    /// Last-known observation for this region. In-memory only.
    weather: Mutex<Option<WeatherObservation>>,
}

impl Region {
    /// Validate and construct a region.
    ///
    /// # Errors
    /// Returns [`Error::Validation`] naming the offending field when
    /// the name is blank or the country code is not a known alpha-2
    /// code.
    pub fn new(
        name: impl Into<String>,
        country_code: impl Into<String>,
        directory: Arc<CountryDirectory>,
    ) -> Result<Self, Error> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::validation("name", "can't be blank"));
        }

        let country_code = country_code.into().to_lowercase();
        if country_code.is_empty() {
            return Err(Error::validation("country_code", "can't be blank"));
        }
        if country_code.len() != 2 {
            return Err(Error::validation(
                "country_code",
                "is the wrong length (should be 2 characters)",
            ));
        }
        if !directory.is_valid_code(&country_code) {
            return Err(Error::validation(
                "country_code",
                "must be a valid alpha-2 country code",
            ));
        }

        Ok(Self {
            name,
            country_code,
            directory,
            weather: Mutex::new(None),
        })
    }

    /// Validate and construct, already wrapped for sharing.
    pub fn new_shared(
        name: impl Into<String>,
        country_code: impl Into<String>,
        directory: Arc<CountryDirectory>,
    ) -> Result<SharedRegion, Error> {
        Ok(Arc::new(Self::new(name, country_code, directory)?))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    /// Display name of the region's country, per the directory.
    pub fn country_name(&self) -> &str {
        // Validated at construction; an unknown code cannot get here.
        self.directory
            .display_name(&self.country_code)
            .unwrap_or_default()
    }

    /// Derived address string, e.g.
    /// `123 Example St, Melbourne, Australia` or `Melbourne, Australia`.
    /// Empty components are skipped, parts joined with `", "`.
    pub fn address(&self, prefix: Option<&str>) -> String {
        [prefix.unwrap_or(""), self.name.as_str(), self.country_name()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Cache key for this region's weather entry. The format is shared
    /// with other systems reading the same cache, so it must stay
    /// byte-exact.
    pub fn cache_key(&self) -> String {
        format!("region.address({}).weather", self.address(None))
    }

    /// Current in-memory observation, if any.
    pub fn weather(&self) -> Option<WeatherObservation> {
        self.weather_slot().clone()
    }

    /// Whether an observation is currently held in memory.
    pub fn has_weather(&self) -> bool {
        self.weather_slot().is_some()
    }

    /// Set the in-memory observation. Resolver-only.
    pub(crate) fn set_weather(&self, observation: WeatherObservation) {
        *self.weather_slot() = Some(observation);
    }

    fn weather_slot(&self) -> std::sync::MutexGuard<'_, Option<WeatherObservation>> {
        // A poisoned slot still holds a valid Option; keep going.
        self.weather
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
