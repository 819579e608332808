//! In-memory TTL cache for item lookup outcomes.
//!
//! Non-matches are cached alongside matches: an item that found nothing will
//! keep finding nothing for the storefront's catalog churn horizon, and
//! re-running the cascade for it is the expensive case.

use crate::competitors::Competitor;
use crate::vtex::matcher::normalize;
use crate::vtex::models::VtexProduct;
use dashmap::DashMap;
use std::time::{Duration, Instant};

struct CacheEntry {
    outcome: Option<VtexProduct>,
    expires_at: Instant,
}

/// Concurrent cache of per-competitor lookup outcomes.
pub struct MatchCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl MatchCache {
    pub fn new(ttl: Duration) -> Self {
        Self { entries: DashMap::new(), ttl }
    }

    /// Cache key for an item lookup. The query is normalized so trivially
    /// different spellings of the same item share an entry.
    pub fn key(competitor: Competitor, item: &str) -> String {
        format!("{}:{}", competitor, normalize(item))
    }

    /// Returns the cached outcome for a key.
    ///
    /// The outer `Option` is the cache miss; the inner one is the stored
    /// lookup outcome, which may itself be "no match".
    pub fn get(&self, key: &str) -> Option<Option<VtexProduct>> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return Some(entry.outcome.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove(key);
        }
        None
    }

    /// Stores a lookup outcome, match or not.
    pub fn insert(&self, key: String, outcome: Option<VtexProduct>) {
        self.entries.insert(key, CacheEntry { outcome, expires_at: Instant::now() + self.ttl });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
