//! Mock weather collaborators for integration testing.
//!
//! Provides a deterministic `WeatherProvider` implementation that
//! returns known observations and records every batch it is asked for,
//! plus an always-failing cache — all in-memory with no external
//! dependencies.

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Duration;

use stayfinder::cache::WeatherCache;
use stayfinder::weather::{ObservationLocation, WeatherObservation, WeatherProvider};

/// A mock weather provider for deterministic testing.
///
/// Observations and errors are fully controllable from test code; every
/// `fetch_weather` call is recorded with the exact address batch.
pub struct MockWeatherProvider {
    observations: Mutex<Vec<WeatherObservation>>,
    calls: Arc<Mutex<Vec<Vec<String>>>>,
    /// If set, all fetches return this error.
    force_error: Arc<Mutex<Option<String>>>,
}

impl MockWeatherProvider {
    /// Create a mock returning the given observations for every fetch.
    pub fn returning(observations: Vec<WeatherObservation>) -> Arc<Self> {
        Arc::new(Self {
            observations: Mutex::new(observations),
            calls: Arc::new(Mutex::new(Vec::new())),
            force_error: Arc::new(Mutex::new(None)),
        })
    }

    /// Create a mock with no observations at all.
    pub fn empty() -> Arc<Self> {
        Self::returning(Vec::new())
    }

    /// Force all subsequent fetches to return an error.
    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    /// Clear any forced error.
    pub fn clear_error(&self) {
        *self.force_error.lock().unwrap() = None;
    }

    /// Replace the canned observations.
    pub fn set_observations(&self, observations: Vec<WeatherObservation>) {
        *self.observations.lock().unwrap() = observations;
    }

    /// Number of fetches issued so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// All recorded address batches.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WeatherProvider for MockWeatherProvider {
    async fn fetch_weather(&self, addresses: &[String]) -> Result<Vec<WeatherObservation>> {
        self.calls.lock().unwrap().push(addresses.to_vec());
        if let Some(msg) = self.force_error.lock().unwrap().clone() {
            return Err(anyhow!(msg));
        }
        Ok(self.observations.lock().unwrap().clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A cache whose every operation fails, for degradation testing.
pub struct FailingCache;

impl WeatherCache for FailingCache {
    fn get(&self, _key: &str) -> Result<Option<WeatherObservation>> {
        Err(anyhow!("cache backend unreachable"))
    }

    fn put(&self, _key: &str, _value: &WeatherObservation, _ttl: Duration) -> Result<()> {
        Err(anyhow!("cache backend unreachable"))
    }
}

/// Build an observation tagged with the given city/country.
pub fn observation(city: &str, country: &str, condition: &str) -> WeatherObservation {
    WeatherObservation {
        location: Some(ObservationLocation {
            city: Some(city.to_string()),
            country: Some(country.to_string()),
        }),
        condition: Some(condition.to_string()),
        temperature_c: Some(18.0),
        ..Default::default()
    }
}
