//! Short-lived response caching
//!
//! The aggregation queries cache assembled payloads for one hour to reduce
//! provider API calls. Storage sits behind the [`Cache`] trait so it can be
//! swapped without touching aggregation logic; the in-process
//! [`MemoryCache`] is the default. Entries are purged lazily on read; there
//! is no background eviction, and growth over a process lifetime is
//! accepted.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Default cache TTL (1 hour)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Key/value cache with per-entry TTL
///
/// An entry is never served past its TTL.
pub trait Cache: Send + Sync {
    /// Get a non-expired entry
    fn get(&self, key: &str) -> Option<serde_json::Value>;

    /// Store an entry with the given TTL
    fn set(&self, key: &str, value: serde_json::Value, ttl: Duration);
}

struct Entry {
    value: serde_json::Value,
    inserted_at: Instant,
    ttl: Duration,
}

/// Process-local in-memory cache
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<serde_json::Value> {
        {
            let entries = self.entries.read().ok()?;
            let entry = entries.get(key)?;
            if entry.inserted_at.elapsed() <= entry.ttl {
                tracing::debug!(key = %key, "cache hit");
                return Some(entry.value.clone());
            }
        }

        // Expired; drop the entry so the map does not accumulate dead keys
        // for hot cache keys.
        tracing::debug!(key = %key, "cache entry expired");
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
        None
    }

    fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                key.to_string(),
                Entry {
                    value,
                    inserted_at: Instant::now(),
                    ttl,
                },
            );
        }
    }
}

/// Get a cached value deserialized to `T`
///
/// An entry that fails to deserialize is treated as a miss.
pub fn get_typed<T: DeserializeOwned>(cache: &dyn Cache, key: &str) -> Option<T> {
    cache
        .get(key)
        .and_then(|value| serde_json::from_value(value).ok())
}

/// Store a serializable value
pub fn set_typed<T: Serialize>(cache: &dyn Cache, key: &str, value: &T, ttl: Duration) {
    match serde_json::to_value(value) {
        Ok(value) => cache.set(key, value, ttl),
        Err(e) => tracing::warn!(key = %key, error = %e, "failed to serialize cache payload"),
    }
}

/// Generate a stable fingerprint for a query parameter set
///
/// Used as the cache key component for listing queries.
pub fn fingerprint<T: Serialize>(params: &T) -> String {
    let mut hasher = Sha256::new();
    hasher.update(
        serde_json::to_string(params)
            .unwrap_or_default()
            .as_bytes(),
    );
    hex::encode(hasher.finalize())
}
