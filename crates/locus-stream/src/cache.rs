//! In-memory search result cache.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use locus_core::{Domain, Poi};

/// Cache identity of a search: domain plus case-folded query and location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchCacheKey {
    pub domain: Domain,
    pub query: String,
    pub location: String,
}

impl SearchCacheKey {
    #[must_use]
    pub fn new(domain: Domain, query: &str, location: &str) -> Self {
        Self {
            domain,
            query: query.trim().to_lowercase(),
            location: location.trim().to_lowercase(),
        }
    }
}

/// Expiry policy for cached results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CachePolicy {
    /// `None` keeps entries for the lifetime of the cache.
    pub ttl: Option<Duration>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    pois: Vec<Poi>,
    stored_at: Instant,
}

/// Completed result sets keyed by [`SearchCacheKey`].
#[derive(Debug, Default)]
pub struct SearchCache {
    policy: CachePolicy,
    entries: HashMap<SearchCacheKey, CacheEntry>,
}

impl SearchCache {
    #[must_use]
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            entries: HashMap::new(),
        }
    }

    #[must_use]
    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    #[must_use]
    pub fn get(&self, key: &SearchCacheKey) -> Option<&[Poi]> {
        self.get_at(key, Instant::now())
    }

    /// Looks up `key` as of `now`, ignoring entries older than the TTL.
    #[must_use]
    pub fn get_at(&self, key: &SearchCacheKey, now: Instant) -> Option<&[Poi]> {
        let entry = self.entries.get(key)?;
        if let Some(ttl) = self.policy.ttl {
            if now.saturating_duration_since(entry.stored_at) > ttl {
                return None;
            }
        }
        Some(&entry.pois)
    }

    pub fn insert(&mut self, key: SearchCacheKey, pois: Vec<Poi>) {
        self.insert_at(key, pois, Instant::now());
    }

    pub fn insert_at(&mut self, key: SearchCacheKey, pois: Vec<Poi>, now: Instant) {
        self.entries.insert(
            key,
            CacheEntry {
                pois,
                stored_at: now,
            },
        );
    }

    /// Drops entries that have outlived the TTL. Returns how many were removed.
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        let Some(ttl) = self.policy.ttl else {
            return 0;
        };
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.stored_at) <= ttl);
        before - self.entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(query: &str, location: &str) -> SearchCacheKey {
        SearchCacheKey::new(Domain::Dining, query, location)
    }

    #[test]
    fn key_is_case_insensitive() {
        assert_eq!(key("Seafood", "LISBON"), key("seafood", "lisbon"));
    }

    #[test]
    fn key_distinguishes_domains() {
        assert_ne!(
            SearchCacheKey::new(Domain::Dining, "q", "lisbon"),
            SearchCacheKey::new(Domain::Accommodation, "q", "lisbon")
        );
    }

    #[test]
    fn entries_never_expire_without_ttl() {
        let mut cache = SearchCache::new(CachePolicy::default());
        let start = Instant::now();
        cache.insert_at(key("q", "l"), vec![Poi::named("A")], start);
        let much_later = start + Duration::from_secs(60 * 60 * 24 * 365);
        assert_eq!(cache.get_at(&key("Q", "L"), much_later).map(<[Poi]>::len), Some(1));
    }

    #[test]
    fn entries_expire_after_ttl() {
        let mut cache = SearchCache::new(CachePolicy {
            ttl: Some(Duration::from_secs(60)),
        });
        let start = Instant::now();
        cache.insert_at(key("q", "l"), vec![Poi::named("A")], start);

        assert!(cache.get_at(&key("q", "l"), start + Duration::from_secs(60)).is_some());
        assert!(cache.get_at(&key("q", "l"), start + Duration::from_secs(61)).is_none());
    }

    #[test]
    fn purge_removes_only_expired_entries() {
        let mut cache = SearchCache::new(CachePolicy {
            ttl: Some(Duration::from_secs(10)),
        });
        let start = Instant::now();
        cache.insert_at(key("old", "l"), vec![], start);
        cache.insert_at(key("new", "l"), vec![], start + Duration::from_secs(8));

        let removed = cache.purge_expired(start + Duration::from_secs(15));
        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 1);
        assert!(cache
            .get_at(&key("new", "l"), start + Duration::from_secs(15))
            .is_some());
    }

    #[test]
    fn insert_replaces_existing_entry() {
        let mut cache = SearchCache::default();
        cache.insert(key("q", "l"), vec![Poi::named("A")]);
        cache.insert(key("q", "l"), vec![Poi::named("B"), Poi::named("C")]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key("q", "l")).unwrap()[0].name, "B");
    }
}
