//! Weather cache.
//!
//! A TTL key/value store keyed by each region's cache key. The trait is
//! injected into the resolver so deployments can point it at a shared
//! cache; the in-memory implementation below is the default. The cache
//! is best-effort everywhere: a failing cache degrades the resolver to
//! always-fetch, it never fails a resolution.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

use crate::weather::WeatherObservation;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// TTL key/value store for weather observations.
///
/// `put` is last-write-wins; `get` must not return an entry whose TTL
/// has elapsed. Eager eviction is not required.
#[cfg_attr(test, mockall::automock)]
pub trait WeatherCache: Send + Sync {
    /// Read an unexpired entry, if present.
    fn get(&self, key: &str) -> Result<Option<WeatherObservation>>;

    /// Store an entry; it becomes unreadable once `ttl` elapses.
    fn put(&self, key: &str, value: &WeatherObservation, ttl: Duration) -> Result<()>;
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

struct CacheEntry {
    value: WeatherObservation,
    expires_at: DateTime<Utc>,
}

/// In-process TTL map. Expiry is checked on read; stale entries are
/// dropped lazily (on the read that finds them, or via
/// [`MemoryCache::evict_expired`]).
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry.
    pub fn evict_expired(&self) {
        let now = Utc::now();
        self.entries_lock().retain(|_, entry| now < entry.expires_at);
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries_lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries_lock().is_empty()
    }

    fn entries_lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl WeatherCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<WeatherObservation>> {
        let mut entries = self.entries_lock();
        match entries.get(key) {
            Some(entry) if Utc::now() < entry.expires_at => Ok(Some(entry.value.clone())),
            Some(_) => {
                // Found but stale; drop it on the way out.
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, value: &WeatherObservation, ttl: Duration) -> Result<()> {
        let entry = CacheEntry {
            value: value.clone(),
            expires_at: Utc::now() + ttl,
        };
        self.entries_lock().insert(key.to_string(), entry);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
