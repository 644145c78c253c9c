//! In-process TTL cache for formatted responses.
//!
//! Expired entries are dropped lazily on read and swept on write, so the
//! map never grows past one entry per distinct request seen within a TTL
//! window. Keys are derived from the *normalized* request, making them
//! immune to client JSON key order and float formatting.

use crate::request::PredictionRequest;
use crate::response::FormattedResponse;
use dashmap::DashMap;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

#[derive(Clone)]
struct CacheEntry {
    response: FormattedResponse,
    created_at: Instant,
}

/// Concurrent TTL cache keyed by [`cache_key`] strings.
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl ResponseCache {
    /// Create a cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Look up a fresh entry; expired entries are removed on the way.
    pub fn get(&self, key: &str) -> Option<FormattedResponse> {
        let expired = match self.entries.get(key) {
            Some(entry) => {
                if entry.created_at.elapsed() < self.ttl {
                    return Some(entry.response.clone());
                }
                true
            }
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    /// Insert a response and sweep out anything already expired.
    pub fn put(&self, key: String, response: FormattedResponse) {
        self.entries.insert(
            key,
            CacheEntry {
                response,
                created_at: Instant::now(),
            },
        );
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.created_at.elapsed() < ttl);
    }

    /// Current entry count, including any not-yet-swept expired entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Stable cache key for a normalized request.
///
/// Hashes the canonical serialization of the typed request; two
/// submissions that normalize to the same request always share a key.
pub fn cache_key(request: &PredictionRequest) -> String {
    let canonical = serde_json::to_string(request).unwrap_or_default();
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    canonical.hash(&mut hasher);
    format!("predict:{:x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{sample_request, StressLevel};
    use crate::response::WellnessPlan;

    fn sample_response() -> FormattedResponse {
        FormattedResponse {
            level: StressLevel::Low,
            score: 25,
            confidence: 0.8,
            insights: vec![],
            recommendations: vec![],
            wellness_plan: WellnessPlan {
                title: "Stress Maintenance Plan".to_string(),
                summary: String::new(),
                tasks: vec![],
            },
            model_name: None,
            model_score: None,
            feature_importance: None,
        }
    }

    #[test]
    fn test_put_then_get_within_ttl() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.put("predict:abc".to_string(), sample_response());
        let hit = cache.get("predict:abc").expect("fresh entry must hit");
        assert_eq!(hit.level, StressLevel::Low);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entry_misses_and_is_removed() {
        let cache = ResponseCache::new(Duration::from_millis(10));
        cache.put("predict:abc".to_string(), sample_response());
        std::thread::sleep(Duration::from_millis(25));
        assert!(cache.get("predict:abc").is_none());
        assert!(cache.is_empty(), "expired entry removed on read");
    }

    #[test]
    fn test_put_sweeps_expired_entries() {
        let cache = ResponseCache::new(Duration::from_millis(10));
        cache.put("predict:old".to_string(), sample_response());
        std::thread::sleep(Duration::from_millis(25));
        cache.put("predict:new".to_string(), sample_response());
        assert_eq!(cache.len(), 1, "write sweeps the expired entry");
        assert!(cache.get("predict:new").is_some());
    }

    #[test]
    fn test_cache_key_stable_for_equal_requests() {
        let a = cache_key(&sample_request());
        let b = cache_key(&sample_request());
        assert_eq!(a, b);
        assert!(a.starts_with("predict:"));
    }

    #[test]
    fn test_cache_key_differs_when_a_field_differs() {
        let mut other = sample_request();
        other.age = 31;
        assert_ne!(cache_key(&sample_request()), cache_key(&other));
    }
}
