//! End-to-end resolution tests: store → resolver → cache → provider,
//! with a mocked provider.

use std::sync::Arc;

use chrono::Duration;

use stayfinder::cache::{MemoryCache, WeatherCache};
use stayfinder::countries::CountryDirectory;
use stayfinder::region::{Region, SharedRegion};
use stayfinder::resolver::WeatherResolver;
use stayfinder::store::RegionStore;

use crate::mock_weather::{observation, FailingCache, MockWeatherProvider};

fn region(name: &str, code: &str) -> SharedRegion {
    Region::new_shared(name, code, CountryDirectory::shared()).unwrap()
}

// -- Cache hits bypass the provider --------------------------------------

#[tokio::test]
async fn cached_observation_resolves_without_provider_call() {
    let cache = Arc::new(MemoryCache::new());
    let melbourne = region("Melbourne", "au");

    cache
        .put(
            &melbourne.cache_key(),
            &observation("Melbourne", "Australia", "Sunny"),
            Duration::minutes(5),
        )
        .unwrap();

    let provider = MockWeatherProvider::empty();
    let resolver = WeatherResolver::new(provider.clone(), cache);

    resolver.resolve_batch(std::slice::from_ref(&melbourne)).await;

    assert_eq!(
        melbourne.weather().unwrap().condition.as_deref(),
        Some("Sunny")
    );
    assert_eq!(provider.call_count(), 0);
    assert_eq!(resolver.cache_hits(), 1);
}

// -- One provider call per resolution, regardless of batch size ----------

#[tokio::test]
async fn batch_of_many_regions_issues_one_provider_call() {
    let regions = vec![
        region("Melbourne", "au"),
        region("Sydney", "au"),
        region("Vienna", "at"),
        region("Lisbon", "pt"),
    ];

    let provider = MockWeatherProvider::returning(vec![
        observation("Sydney", "Australia", "Windy"),
        observation("Melbourne", "Aus", "Rain"),
        observation("Vienna", "Austria", "Snow"),
    ]);
    let resolver = WeatherResolver::new(provider.clone(), Arc::new(MemoryCache::new()));

    resolver.resolve_batch(&regions).await;

    assert_eq!(provider.call_count(), 1);
    // The single call carried every unresolved address, in input order.
    assert_eq!(
        provider.calls()[0],
        vec![
            "Melbourne, Australia".to_string(),
            "Sydney, Australia".to_string(),
            "Vienna, Austria".to_string(),
            "Lisbon, Portugal".to_string(),
        ]
    );

    assert_eq!(regions[0].weather().unwrap().condition.as_deref(), Some("Rain"));
    assert_eq!(regions[1].weather().unwrap().condition.as_deref(), Some("Windy"));
    assert_eq!(regions[2].weather().unwrap().condition.as_deref(), Some("Snow"));
    // Lisbon had no observation and stays unresolved.
    assert!(regions[3].weather().is_none());
}

// -- Matching rules -------------------------------------------------------

#[tokio::test]
async fn city_case_mismatch_does_not_match() {
    let melbourne = region("Melbourne", "au");
    let provider =
        MockWeatherProvider::returning(vec![observation("melbourne", "Australia", "Sunny")]);
    let resolver = WeatherResolver::new(provider, Arc::new(MemoryCache::new()));

    resolver.resolve_batch(std::slice::from_ref(&melbourne)).await;
    assert!(melbourne.weather().is_none());
}

#[tokio::test]
async fn abbreviated_country_matches_by_prefix() {
    let melbourne = region("Melbourne", "au");
    let provider = MockWeatherProvider::returning(vec![observation("Melbourne", "Aus", "Sunny")]);
    let resolver = WeatherResolver::new(provider, Arc::new(MemoryCache::new()));

    resolver.resolve_batch(std::slice::from_ref(&melbourne)).await;
    assert!(melbourne.weather().is_some());
}

// -- Fetched observations are written through to the cache ----------------

#[tokio::test]
async fn fetched_observation_is_cached_for_fresh_instances() {
    let cache = Arc::new(MemoryCache::new());
    let provider =
        MockWeatherProvider::returning(vec![observation("Melbourne", "Australia", "Sunny")]);
    let resolver = WeatherResolver::new(provider.clone(), cache.clone());

    let first = region("Melbourne", "au");
    resolver.resolve_batch(std::slice::from_ref(&first)).await;
    assert_eq!(provider.call_count(), 1);
    assert!(!cache.is_empty());

    // A brand-new instance of the same region starts with empty
    // in-memory state, but the first resolution wrote its observation
    // to the cache under the shared address key — so it resolves
    // without another provider call.
    let second = region("Melbourne", "au");
    resolver.resolve_batch(std::slice::from_ref(&second)).await;

    assert_eq!(provider.call_count(), 1);
    assert_eq!(resolver.cache_hits(), 1);
    assert_eq!(
        second.weather().unwrap().condition.as_deref(),
        Some("Sunny")
    );
}

// -- Idempotence: in-memory state short-circuits the second call ----------

#[tokio::test]
async fn second_resolution_is_satisfied_from_memory() {
    let melbourne = region("Melbourne", "au");
    let provider =
        MockWeatherProvider::returning(vec![observation("Melbourne", "Australia", "Sunny")]);
    let resolver = WeatherResolver::new(provider.clone(), Arc::new(MemoryCache::new()));

    resolver.resolve_batch(std::slice::from_ref(&melbourne)).await;
    resolver.resolve_batch(std::slice::from_ref(&melbourne)).await;

    assert_eq!(provider.call_count(), 1);
}

// -- TTL expiry -----------------------------------------------------------

#[tokio::test]
async fn expired_cache_entry_forces_fresh_fetch_for_new_instance() {
    let cache = Arc::new(MemoryCache::new());
    let first = region("Melbourne", "au");

    // An entry that is already past its TTL.
    cache
        .put(
            &first.cache_key(),
            &observation("Melbourne", "Australia", "Stale"),
            Duration::seconds(0),
        )
        .unwrap();

    let provider =
        MockWeatherProvider::returning(vec![observation("Melbourne", "Australia", "Fresh")]);
    let resolver = WeatherResolver::new(provider.clone(), cache.clone());

    // A fresh region instance misses the cache and fetches.
    resolver.resolve_batch(std::slice::from_ref(&first)).await;
    assert_eq!(provider.call_count(), 1);
    assert_eq!(first.weather().unwrap().condition.as_deref(), Some("Fresh"));

    // An existing instance with weather already in memory never
    // re-fetches, whatever the state of the backing cache.
    cache.evict_expired();
    resolver.resolve_batch(std::slice::from_ref(&first)).await;
    assert_eq!(provider.call_count(), 1);
}

// -- No-match batches -----------------------------------------------------

#[tokio::test]
async fn unmatched_batch_leaves_no_trace() {
    let cache = Arc::new(MemoryCache::new());
    let regions = vec![region("Melbourne", "au"), region("Sydney", "au")];

    let provider =
        MockWeatherProvider::returning(vec![observation("Reykjavik", "Iceland", "Sleet")]);
    let resolver = WeatherResolver::new(provider.clone(), cache.clone());

    resolver.resolve_batch(&regions).await;

    assert!(regions.iter().all(|r| r.weather().is_none()));
    // No cache writes occurred.
    assert!(cache.is_empty());
    assert_eq!(provider.call_count(), 1);
}

// -- Degradation ----------------------------------------------------------

#[tokio::test]
async fn failing_cache_degrades_to_always_fetch() {
    let melbourne = region("Melbourne", "au");
    let provider =
        MockWeatherProvider::returning(vec![observation("Melbourne", "Australia", "Sunny")]);
    let resolver = WeatherResolver::new(provider.clone(), Arc::new(FailingCache));

    resolver.resolve_batch(std::slice::from_ref(&melbourne)).await;

    // Resolution still works; the cache failure is swallowed.
    assert!(melbourne.weather().is_some());
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn provider_error_leaves_regions_unresolved_and_is_retried() {
    let melbourne = region("Melbourne", "au");
    let provider = MockWeatherProvider::empty();
    provider.set_error("connection refused");
    let resolver = WeatherResolver::new(provider.clone(), Arc::new(MemoryCache::new()));

    resolver.resolve_batch(std::slice::from_ref(&melbourne)).await;
    assert!(melbourne.weather().is_none());
    assert_eq!(provider.call_count(), 1);

    // No negative caching: once the provider recovers, the same region
    // resolves on the next attempt.
    provider.clear_error();
    provider.set_observations(vec![observation("Melbourne", "Australia", "Sunny")]);
    resolver.resolve_batch(std::slice::from_ref(&melbourne)).await;

    assert_eq!(provider.call_count(), 2);
    assert_eq!(
        melbourne.weather().unwrap().condition.as_deref(),
        Some("Sunny")
    );
}

// -- Convenience accessor -------------------------------------------------

#[tokio::test]
async fn single_region_accessor_loads_on_demand() {
    let melbourne = region("Melbourne", "au");
    let provider =
        MockWeatherProvider::returning(vec![observation("Melbourne", "Australia", "Sunny")]);
    let resolver = WeatherResolver::new(provider.clone(), Arc::new(MemoryCache::new()));

    // Without load: no fetch, no value.
    assert!(resolver.weather(&melbourne, false).await.is_none());
    assert_eq!(provider.call_count(), 0);

    // With load: singleton batch resolution first.
    let got = resolver.weather(&melbourne, true).await;
    assert_eq!(got.unwrap().condition.as_deref(), Some("Sunny"));
    assert_eq!(provider.call_count(), 1);

    // Loaded value is reused.
    assert!(resolver.weather(&melbourne, true).await.is_some());
    assert_eq!(provider.call_count(), 1);
}

// -- Store-driven flow ----------------------------------------------------

#[tokio::test]
async fn store_search_feeds_batch_resolution() {
    let mut store = RegionStore::new(CountryDirectory::shared());
    store.insert("Melbourne", "au").unwrap();
    store.insert("Vienna", "at").unwrap();
    store.insert("Lisbon", "pt").unwrap();

    // "austr" matches Australia and Austria, not Portugal.
    let matches = store.search_by_country_name_prefix("austr");
    assert_eq!(matches.len(), 2);

    let provider = MockWeatherProvider::returning(vec![
        observation("Melbourne", "Australia", "Rain"),
        observation("Vienna", "Austria", "Snow"),
    ]);
    let resolver = WeatherResolver::new(provider.clone(), Arc::new(MemoryCache::new()));

    resolver.resolve_batch(&matches).await;

    assert_eq!(provider.call_count(), 1);
    assert!(matches.iter().all(|r| r.weather().is_some()));

    // The store hands out the same identities, so the weather is
    // visible through later lookups too.
    let melbourne = &store.find_by_name_exact("melbourne")[0];
    assert_eq!(melbourne.weather().unwrap().condition.as_deref(), Some("Rain"));
}
