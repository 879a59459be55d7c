//! Batched weather resolution.
//!
//! The resolver maps a batch of regions to weather observations with at
//! most one provider call per resolution: regions already carrying an
//! in-memory observation are skipped, the cache fills what it can, and
//! the remainder is fetched in a single batched call and matched back
//! to regions by location content. Everything external is best-effort —
//! a dead provider or cache leaves regions unresolved, it never fails
//! the resolution.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use tracing::{debug, info, warn};

use crate::cache::WeatherCache;
use crate::error::Error;
use crate::region::SharedRegion;
use crate::weather::{WeatherObservation, WeatherProvider};

/// Cache entries go stale after five minutes. In-memory state on the
/// regions themselves has no TTL; only the backing cache expires.
pub const WEATHER_CACHE_TTL_MINS: i64 = 5;

/// Default ceiling on the provider call.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

pub struct WeatherResolver {
    provider: Arc<dyn WeatherProvider>,
    cache: Arc<dyn WeatherCache>,
    fetch_timeout: StdDuration,
    // Monitoring counters
    provider_calls: AtomicU64,
    cache_hits: AtomicU64,
}

impl WeatherResolver {
    pub fn new(provider: Arc<dyn WeatherProvider>, cache: Arc<dyn WeatherCache>) -> Self {
        Self::with_timeout(
            provider,
            cache,
            StdDuration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        )
    }

    pub fn with_timeout(
        provider: Arc<dyn WeatherProvider>,
        cache: Arc<dyn WeatherCache>,
        fetch_timeout: StdDuration,
    ) -> Self {
        Self {
            provider,
            cache,
            fetch_timeout,
            provider_calls: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
        }
    }

    /// Resolve weather for a batch of regions.
    ///
    /// Side-effecting: the outcome is observable through each region's
    /// `weather()` accessor. Regions that could not be matched are left
    /// unresolved and will be retried on the next resolution — there is
    /// no negative caching, and no partial-failure signal to the
    /// caller.
    pub async fn resolve_batch(&self, regions: &[SharedRegion]) {
        if regions.is_empty() {
            return;
        }

        debug!(count = regions.len(), "Starting batch weather resolution");

        // Step 1: fill empty in-memory slots from the cache. This
        // mutates the regions even though it is only a "check".
        for region in regions {
            if region.has_weather() {
                continue;
            }
            match self.cache.get(&region.cache_key()) {
                Ok(Some(observation)) => {
                    self.cache_hits.fetch_add(1, Ordering::Relaxed);
                    region.set_weather(observation);
                }
                Ok(None) => {}
                Err(e) => {
                    // Degrade to always-fetch; never fatal.
                    let err = Error::Cache(e.to_string());
                    warn!(error = %err, key = %region.cache_key(), "Weather cache unavailable, treating as miss");
                }
            }
        }

        // Step 2: whatever still has no observation needs a fetch. A
        // region with a previously-set observation counts as resolved
        // even if the backing cache entry has long expired.
        let to_fetch: Vec<SharedRegion> =
            regions.iter().filter(|r| !r.has_weather()).cloned().collect();

        // Step 3: nothing to fetch, no external call.
        if to_fetch.is_empty() {
            debug!("All regions resolved from memory/cache");
            return;
        }

        // Step 4: one batched provider call, regardless of batch size.
        let addresses: Vec<String> = to_fetch.iter().map(|r| r.address(None)).collect();
        let observations = self.fetch_observations(&addresses).await;

        // Steps 5–6: first-match-wins by location content; matched
        // regions get their slot set and a fresh cache entry, the rest
        // stay unresolved.
        let mut matched = 0usize;
        for region in &to_fetch {
            let found = observations
                .iter()
                .find(|&obs| Self::observation_matches(region, obs));
            if let Some(observation) = found {
                region.set_weather(observation.clone());
                if let Err(e) = self.cache.put(
                    &region.cache_key(),
                    observation,
                    Duration::minutes(WEATHER_CACHE_TTL_MINS),
                ) {
                    let err = Error::Cache(e.to_string());
                    warn!(error = %err, key = %region.cache_key(), "Failed to cache weather observation");
                }
                matched += 1;
            }
        }

        info!(
            batch = regions.len(),
            fetched = to_fetch.len(),
            matched,
            unmatched = to_fetch.len() - matched,
            "Batch weather resolution complete"
        );
    }

    /// Single-region convenience accessor. With `load`, an empty slot
    /// triggers a singleton batch resolution first.
    pub async fn weather(&self, region: &SharedRegion, load: bool) -> Option<WeatherObservation> {
        if load && !region.has_weather() {
            self.resolve_batch(std::slice::from_ref(region)).await;
        }
        region.weather()
    }

    /// Call the provider once, under a timeout. Any failure — transport
    /// error, malformed response, timeout — collapses to an empty
    /// observation list so the affected regions simply stay unresolved.
    async fn fetch_observations(&self, addresses: &[String]) -> Vec<WeatherObservation> {
        self.provider_calls.fetch_add(1, Ordering::Relaxed);

        let fetch = self.provider.fetch_weather(addresses);
        match tokio::time::timeout(self.fetch_timeout, fetch).await {
            Ok(Ok(observations)) => {
                debug!(
                    provider = self.provider.name(),
                    requested = addresses.len(),
                    returned = observations.len(),
                    "Weather fetch complete"
                );
                observations
            }
            Ok(Err(e)) => {
                let err = Error::Fetch(e.to_string());
                warn!(provider = self.provider.name(), error = %err, "Weather fetch failed, leaving regions unresolved");
                Vec::new()
            }
            Err(_) => {
                let err = Error::Fetch(format!(
                    "timed out after {:.1}s",
                    self.fetch_timeout.as_secs_f64()
                ));
                warn!(provider = self.provider.name(), error = %err, "Weather fetch timed out, leaving regions unresolved");
                Vec::new()
            }
        }
    }

    /// Whether an observation belongs to a region.
    ///
    /// City must equal the region name exactly (case-sensitive); the
    /// region's full country display name must *start with* the
    /// observation's country string, which tolerates providers that
    /// abbreviate ("Aus" for "Australia"). The check is asymmetric:
    /// an observation country *longer* than the display name never
    /// matches. An observation missing city or country never matches.
    fn observation_matches(region: &SharedRegion, observation: &WeatherObservation) -> bool {
        let city_matches = observation.city() == Some(region.name());
        let country_matches = observation
            .country()
            .is_some_and(|country| region.country_name().starts_with(country));
        city_matches && country_matches
    }

    // -- Accessors for monitoring ----------------------------------------

    /// Provider calls issued so far (at most one per resolution).
    pub fn provider_calls(&self) -> u64 {
        self.provider_calls.load(Ordering::Relaxed)
    }

    /// Observations served from the cache so far.
    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
