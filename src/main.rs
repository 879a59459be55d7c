//! Stayfinder weather refresher.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! seeds the region store, and periodically resolves weather for every
//! known region in one batched call, with graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use stayfinder::cache::MemoryCache;
use stayfinder::config::AppConfig;
use stayfinder::countries::CountryDirectory;
use stayfinder::resolver::WeatherResolver;
use stayfinder::store::RegionStore;
use stayfinder::weather::wttr::WttrProvider;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load("config.toml")?;

    init_logging();

    info!(
        service = %cfg.service.name,
        refresh_interval_secs = cfg.service.refresh_interval_secs,
        seed_regions = cfg.regions.len(),
        "Stayfinder weather refresher starting up"
    );

    // -- Initialise components -------------------------------------------

    let directory = CountryDirectory::shared();

    let mut store = RegionStore::new(Arc::clone(&directory));
    for seed in &cfg.regions {
        match store.insert(seed.name.as_str(), seed.country_code.as_str()) {
            Ok(region) => info!(address = %region.address(None), "Region loaded"),
            Err(e) => warn!(name = %seed.name, error = %e, "Skipping invalid seed region"),
        }
    }

    let provider = match &cfg.weather.provider_base_url {
        Some(base) => WttrProvider::with_base_url(base)?,
        None => WttrProvider::new()?,
    };

    let resolver = WeatherResolver::with_timeout(
        Arc::new(provider),
        Arc::new(MemoryCache::new()),
        Duration::from_secs(cfg.weather.fetch_timeout_secs),
    );

    // -- Refresh loop -----------------------------------------------------

    let mut interval =
        tokio::time::interval(Duration::from_secs(cfg.service.refresh_interval_secs));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        interval_secs = cfg.service.refresh_interval_secs,
        "Entering refresh loop. Press Ctrl+C to stop."
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let regions = store.all();
                resolver.resolve_batch(&regions).await;
                log_weather_summary(&regions);
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    info!(
        provider_calls = resolver.provider_calls(),
        cache_hits = resolver.cache_hits(),
        "Stayfinder weather refresher shut down cleanly."
    );

    Ok(())
}

/// Log current per-region weather state.
fn log_weather_summary(regions: &[stayfinder::region::SharedRegion]) {
    for region in regions {
        match region.weather() {
            Some(observation) => info!(
                address = %region.address(None),
                condition = observation.condition.as_deref().unwrap_or("unknown"),
                temperature_c = observation.temperature_c,
                "Weather current"
            ),
            None => info!(address = %region.address(None), "Weather unresolved"),
        }
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("stayfinder=info"));

    let json_logging = std::env::var("STAYFINDER_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
