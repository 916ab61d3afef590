//! Process-lifetime TTL cache for upstream responses and derived lookups.
//!
//! Entries expire lazily on read; there is no background sweeper. The map is
//! accessed without an outer lock because a slightly stale read only costs a
//! redundant upstream fetch.

use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use tokio::time::Instant;

/// TTL-bounded key/value cache keyed by composite operation strings.
pub struct TtlCache {
    entries: DashMap<String, (Instant, Value)>,
    ttl_seconds: i64,
}

impl TtlCache {
    /// A TTL of zero or less disables caching: every read misses.
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            entries: DashMap::new(),
            ttl_seconds,
        }
    }

    /// Composite cache key: operation kind, auth-presence flag, subject.
    pub fn key(op: &str, authed: bool, subject: &str) -> String {
        format!("{op}::{authed}::{subject}")
    }

    /// Look up a fresh entry. `bypass` forces a miss without touching state;
    /// a stale entry is removed on the failed freshness check.
    pub fn get(&self, key: &str, bypass: bool) -> Option<Value> {
        if bypass {
            return None;
        }
        {
            let entry = self.entries.get(key)?;
            let (stored_at, value) = entry.value();
            if self.ttl_seconds > 0
                && stored_at.elapsed() <= Duration::from_secs(self.ttl_seconds as u64)
            {
                return Some(value.clone());
            }
        }
        self.entries.remove(key);
        None
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), (Instant::now(), value));
    }

    /// Drop every entry whose key contains the given fragment. Used to
    /// force-refresh all cached state for one listing ID.
    pub fn invalidate_containing(&self, fragment: &str) {
        self.entries.retain(|key, _| !key.contains(fragment));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn round_trip_within_ttl() {
        let cache = TtlCache::new(300);
        cache.set("details::false::123456", json!({"price": 100}));
        assert_eq!(
            cache.get("details::false::123456", false),
            Some(json!({"price": 100}))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_misses_and_is_removed() {
        let cache = TtlCache::new(300);
        cache.set("k", json!(1));
        tokio::time::advance(Duration::from_secs(301)).await;
        assert_eq!(cache.get("k", false), None);
        assert!(cache.is_empty(), "stale entry should be purged on read");
    }

    #[tokio::test(start_paused = true)]
    async fn bypass_always_misses_without_removing() {
        let cache = TtlCache::new(300);
        cache.set("k", json!(1));
        assert_eq!(cache.get("k", true), None);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("k", false), Some(json!(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_ttl_disables_caching() {
        let cache = TtlCache::new(0);
        cache.set("k", json!(1));
        assert_eq!(cache.get("k", false), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_containing_purges_matching_keys() {
        let cache = TtlCache::new(300);
        cache.set(TtlCache::key("details", true, "123456"), json!(1));
        cache.set(TtlCache::key("details", false, "123456"), json!(2));
        cache.set("price_any::123456", json!(3));
        cache.set("price_any::999999", json!(4));

        cache.invalidate_containing("123456");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("price_any::999999", false), Some(json!(4)));
    }

    #[test]
    fn composite_key_shape() {
        assert_eq!(TtlCache::key("details", true, "42"), "details::true::42");
    }
}
