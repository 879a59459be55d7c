//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs:
//! service settings, weather-provider settings, and the seed region
//! list the binary loads into the store at startup.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub weather: WeatherConfig,
    /// Regions loaded into the store at startup.
    #[serde(default)]
    pub regions: Vec<RegionSeed>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub name: String,
    /// How often the binary refreshes weather for all known regions.
    pub refresh_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    /// Override the provider endpoint (tests, mirrors). Default is the
    /// public wttr.in instance.
    #[serde(default)]
    pub provider_base_url: Option<String>,
    /// Ceiling on a single batched provider call.
    pub fetch_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RegionSeed {
    pub name: String,
    pub country_code: String,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }
}
