//! Session-scoped API response cache
//!
//! Stores previously fetched results per `(session, key)` pair with a fixed
//! time-to-live. Entries are checked lazily on read: an expired entry is
//! treated as absent but stays in memory until the next `set` for the same
//! key replaces it.
//!
//! Payloads are kept as serialized JSON so a single cache instance can hold
//! values of different types, the same way the GitHub client caches raw
//! response bodies.
//!
//! The cache never evicts in the background. Memory grows with the number of
//! distinct keys queried during the process lifetime, which is bounded by the
//! handful of repositories a dashboard user selects.
//!
//! # Example
//!
//! ```rust
//! use gh_api_cache::ApiCache;
//! use std::time::Duration;
//!
//! let mut cache = ApiCache::new(Duration::from_secs(300));
//! cache.set("session-a", "repositories", &vec!["acme/widgets"]).unwrap();
//!
//! let repos: Option<Vec<String>> = cache.get("session-a", "repositories");
//! assert_eq!(repos, Some(vec!["acme/widgets".to_string()]));
//!
//! // Other sessions never see this entry
//! let other: Option<Vec<String>> = cache.get("session-b", "repositories");
//! assert!(other.is_none());
//! ```

use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Default time-to-live for cached entries (5 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// A cached payload together with the instant it was stored
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Serialized JSON payload
    pub body: String,
    /// When the payload was stored
    pub stored_at: Instant,
}

impl CacheEntry {
    /// Whether the entry is still valid at `now` for the given TTL
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.stored_at) < ttl
    }
}

/// Composite cache key: session identifier plus logical key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EntryKey {
    session: String,
    key: String,
}

impl EntryKey {
    fn new(session: &str, key: &str) -> Self {
        Self {
            session: session.to_string(),
            key: key.to_string(),
        }
    }
}

/// In-memory cache keyed by `(session, key)` with lazy TTL checks
#[derive(Debug)]
pub struct ApiCache {
    ttl: Duration,
    entries: HashMap<EntryKey, CacheEntry>,
}

impl Default for ApiCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ApiCache {
    /// Create an empty cache with the given time-to-live
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Time-to-live applied to every entry
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Read a fresh entry for `(session, key)`
    ///
    /// Returns `None` when the entry is missing, expired, or cannot be
    /// deserialized as `T`.
    pub fn get<T: DeserializeOwned>(&self, session: &str, key: &str) -> Option<T> {
        let entry = self.entries.get(&EntryKey::new(session, key))?;

        if !entry.is_fresh(Instant::now(), self.ttl) {
            debug!("Cache entry expired for {}:{}", session, key);
            return None;
        }

        match serde_json::from_str(&entry.body) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("Failed to parse cached entry {}:{}: {}", session, key, e);
                None
            }
        }
    }

    /// Store a value for `(session, key)`, replacing any previous entry
    pub fn set<T: Serialize + ?Sized>(
        &mut self,
        session: &str,
        key: &str,
        value: &T,
    ) -> serde_json::Result<()> {
        let body = serde_json::to_string(value)?;
        self.entries.insert(
            EntryKey::new(session, key),
            CacheEntry {
                body,
                stored_at: Instant::now(),
            },
        );
        Ok(())
    }

    /// Drop a single entry
    pub fn invalidate(&mut self, session: &str, key: &str) {
        self.entries.remove(&EntryKey::new(session, key));
    }

    /// Drop every entry belonging to a session
    pub fn invalidate_session(&mut self, session: &str) {
        let before = self.entries.len();
        self.entries.retain(|k, _| k.session != session);
        debug!(
            "Invalidated {} cache entries for session {}",
            before - self.entries.len(),
            session
        );
    }

    /// Number of stored entries, expired ones included
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

    #[test]
    fn test_set_then_get_returns_value() {
        let mut cache = ApiCache::default();
        cache.set("s1", "repositories", &vec![1u32, 2, 3]).unwrap();

        let value: Option<Vec<u32>> = cache.get("s1", "repositories");
        assert_eq!(value, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_missing_key_is_absent() {
        let cache = ApiCache::default();
        let value: Option<String> = cache.get("s1", "nope");
        assert!(value.is_none());
    }

    #[test]
    fn test_sessions_are_isolated() {
        let mut cache = ApiCache::default();
        cache.set("alice", "repositories", "alice-data").unwrap();
        cache.set("bob", "repositories", "bob-data").unwrap();

        assert_eq!(
            cache.get::<String>("alice", "repositories").as_deref(),
            Some("alice-data")
        );
        assert_eq!(
            cache.get::<String>("bob", "repositories").as_deref(),
            Some("bob-data")
        );
        assert!(cache.get::<String>("carol", "repositories").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let mut cache = ApiCache::new(Duration::from_secs(300));
        cache.set("s1", "k", &42u32).unwrap();

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get::<u32>("s1", "k"), Some(42));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get::<u32>("s1", "k"), None);

        // Expired entries are not purged, only superseded
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_refreshes_expired_entry() {
        let mut cache = ApiCache::new(Duration::from_secs(10));
        cache.set("s1", "k", &1u32).unwrap();

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(cache.get::<u32>("s1", "k").is_none());

        cache.set("s1", "k", &2u32).unwrap();
        assert_eq!(cache.get::<u32>("s1", "k"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_default_ttl_is_five_minutes() {
        assert_eq!(ApiCache::default().ttl(), Duration::from_secs(300));
        assert_eq!(ApiCache::new(Duration::from_secs(7)).ttl(), Duration::from_secs(7));
    }

    #[test]
    fn test_zero_ttl_never_hits() {
        let mut cache = ApiCache::new(Duration::ZERO);
        cache.set("s1", "k", &1u32).unwrap();
        assert!(cache.get::<u32>("s1", "k").is_none());
    }

    #[test]
    fn test_type_mismatch_is_treated_as_miss() {
        let mut cache = ApiCache::default();
        cache.set("s1", "k", "not a number").unwrap();
        assert!(cache.get::<u32>("s1", "k").is_none());
    }

    #[test]
    fn test_invalidate_session_keeps_other_sessions() {
        let mut cache = ApiCache::default();
        cache.set("alice", "repositories", &1u32).unwrap();
        cache.set("alice", "deployments-acme/widgets", &2u32).unwrap();
        cache.set("bob", "repositories", &3u32).unwrap();

        cache.invalidate_session("alice");

        assert!(cache.get::<u32>("alice", "repositories").is_none());
        assert!(cache.get::<u32>("alice", "deployments-acme/widgets").is_none());
        assert_eq!(cache.get::<u32>("bob", "repositories"), Some(3));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_single_key() {
        let mut cache = ApiCache::default();
        cache.set("s1", "a", &1u32).unwrap();
        cache.set("s1", "b", &2u32).unwrap();

        cache.invalidate("s1", "a");

        assert!(cache.get::<u32>("s1", "a").is_none());
        assert_eq!(cache.get::<u32>("s1", "b"), Some(2));
    }
}
