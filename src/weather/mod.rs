//! Weather data sources.
//!
//! Defines the `WeatherProvider` trait the resolver fetches through,
//! and the loosely-structured observation records providers return.
//! Observations come from an untrusted source: every field is optional
//! and a record missing its location is simply unmatchable, never an
//! error.

pub mod wttr;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Observation shapes
// ---------------------------------------------------------------------------

/// Location tag attached to an observation by the provider.
///
/// `country` is whatever string the provider uses, which is often an
/// abbreviation of the directory's display name ("Aus" for
/// "Australia"); matching accounts for that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ObservationLocation {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// A single weather observation as returned by an external provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WeatherObservation {
    #[serde(default)]
    pub location: Option<ObservationLocation>,
    #[serde(default)]
    pub temperature_c: Option<f64>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub humidity_pct: Option<u8>,
    #[serde(default)]
    pub wind_speed_kmh: Option<f64>,
    #[serde(default)]
    pub observed_at: Option<DateTime<Utc>>,
}

impl WeatherObservation {
    /// Observation city, if the provider tagged one.
    pub fn city(&self) -> Option<&str> {
        self.location.as_ref()?.city.as_deref()
    }

    /// Observation country string, if the provider tagged one.
    pub fn country(&self) -> Option<&str> {
        self.location.as_ref()?.country.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Abstraction over external weather data sources.
///
/// One call covers a whole batch of addresses; returned observations
/// are unordered with respect to the input and are matched back to
/// regions by their location content, not by position.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Fetch current observations for the given address strings.
    ///
    /// Partial results are fine: an address the provider cannot serve
    /// simply has no matching observation in the output.
    async fn fetch_weather(&self, addresses: &[String]) -> Result<Vec<WeatherObservation>>;

    /// Provider name for logging and identification.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
