//! wttr.in weather provider.
//!
//! Fetches current conditions from the free wttr.in JSON interface
//! (`https://wttr.in/<address>?format=j1`, no key required) and tags
//! each observation with the `nearest_area` city/country so the
//! resolver can match it back by content. One batch fans out into one
//! request per address, issued concurrently; an address that fails is
//! logged and skipped, never fatal.
//!
//! Auth: none. Rate limit: be polite, it is a shared free service.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{ObservationLocation, WeatherObservation, WeatherProvider};

const DEFAULT_BASE_URL: &str = "https://wttr.in";

// ---------------------------------------------------------------------------
// wttr.in response types
// ---------------------------------------------------------------------------

/// wttr.in wraps every scalar in `[{"value": "..."}]`.
#[derive(Debug, Deserialize, Default)]
struct ValueWrapper {
    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct WttrCondition {
    #[serde(rename = "temp_C", default)]
    temp_c: Option<String>,
    #[serde(default)]
    humidity: Option<String>,
    #[serde(rename = "windspeedKmph", default)]
    windspeed_kmph: Option<String>,
    #[serde(rename = "weatherDesc", default)]
    weather_desc: Vec<ValueWrapper>,
}

#[derive(Debug, Deserialize, Default)]
struct WttrArea {
    #[serde(rename = "areaName", default)]
    area_name: Vec<ValueWrapper>,
    #[serde(default)]
    country: Vec<ValueWrapper>,
}

#[derive(Debug, Deserialize, Default)]
struct WttrResponse {
    #[serde(rename = "current_condition", default)]
    current_condition: Vec<WttrCondition>,
    #[serde(rename = "nearest_area", default)]
    nearest_area: Vec<WttrArea>,
}

impl WttrResponse {
    fn into_observation(self) -> WeatherObservation {
        let location = self.nearest_area.into_iter().next().map(|area| {
            ObservationLocation {
                city: area.area_name.into_iter().next().and_then(|v| v.value),
                country: area.country.into_iter().next().and_then(|v| v.value),
            }
        });

        let condition = self.current_condition.into_iter().next().unwrap_or_default();
        WeatherObservation {
            location,
            temperature_c: condition.temp_c.and_then(|t| t.parse().ok()),
            humidity_pct: condition.humidity.and_then(|h| h.parse().ok()),
            wind_speed_kmh: condition.windspeed_kmph.and_then(|w| w.parse().ok()),
            condition: condition
                .weather_desc
                .into_iter()
                .next()
                .and_then(|v| v.value),
            observed_at: Some(Utc::now()),
        }
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

pub struct WttrProvider {
    http: Client,
    base_url: String,
}

impl WttrProvider {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the provider at a different endpoint (tests, mirrors).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent("stayfinder/0.1.0")
            .build()
            .context("Failed to build weather HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    async fn fetch_one(&self, address: &str) -> Result<WeatherObservation> {
        let url = format!(
            "{}/{}?format=j1",
            self.base_url,
            urlencoding::encode(address)
        );

        let response: WttrResponse = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Weather request failed for {address}"))?
            .error_for_status()
            .with_context(|| format!("Weather request rejected for {address}"))?
            .json()
            .await
            .with_context(|| format!("Malformed weather response for {address}"))?;

        Ok(response.into_observation())
    }
}

#[async_trait]
impl WeatherProvider for WttrProvider {
    async fn fetch_weather(&self, addresses: &[String]) -> Result<Vec<WeatherObservation>> {
        let fetches = addresses.iter().map(|address| self.fetch_one(address));
        let results = futures::future::join_all(fetches).await;

        let mut observations = Vec::with_capacity(addresses.len());
        for (address, result) in addresses.iter().zip(results) {
            match result {
                Ok(observation) => {
                    debug!(address = %address, city = ?observation.city(), "Weather observation fetched");
                    observations.push(observation);
                }
                Err(e) => {
                    warn!(address = %address, error = %e, "Skipping address, weather fetch failed");
                }
            }
        }
        Ok(observations)
    }

    fn name(&self) -> &str {
        "wttr.in"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
