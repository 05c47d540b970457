//! Replay protection.
//!
//! The one piece of genuinely shared mutable state in the pipeline. The
//! cache is an injected trait over a concurrent store with atomic
//! check-and-insert: two concurrent requests presenting the same ID must
//! not both be accepted. Categories are independent keyspaces, so a
//! matching-dataset assertion and an authn-statement assertion may share an
//! ID without being treated as replays of each other.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use hub_core::Clock;

/// Independent replay-tracking categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplayCategory {
    /// Inbound AuthnRequest IDs.
    AuthnRequest,
    /// Matching-dataset assertion IDs.
    MatchingDatasetAssertion,
    /// Authn-statement assertion IDs.
    AuthnStatementAssertion,
}

/// Atomic check-and-insert replay protection.
pub trait ReplayCache: Send + Sync {
    /// Claims an ID within a category for the given window.
    ///
    /// Returns true only for the first claimant while the window is open;
    /// after the window elapses the ID may be claimed again.
    fn try_claim(&self, id: &str, category: ReplayCategory, ttl: Duration) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ReplayKey {
    id: String,
    category: ReplayCategory,
}

/// In-memory replay cache over a concurrent map.
///
/// The entry API gives the atomic compare-and-insert; a backing store
/// swap (external cache, shared store) only needs a new [`ReplayCache`]
/// impl behind the same trait.
pub struct InMemoryReplayCache {
    entries: DashMap<ReplayKey, DateTime<Utc>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryReplayCache {
    /// Creates a cache reading time from the given clock.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Drops expired entries, returning how many were removed.
    ///
    /// Claims stay correct without sweeping (expired entries are
    /// overwritten on claim); this only bounds memory.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, expiry| *expiry > now);
        before - self.entries.len()
    }

    /// Number of live entries, for diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ReplayCache for InMemoryReplayCache {
    fn try_claim(&self, id: &str, category: ReplayCategory, ttl: Duration) -> bool {
        use dashmap::mapref::entry::Entry;

        let now = self.clock.now();
        let key = ReplayKey {
            id: id.to_string(),
            category,
        };

        match self.entries.entry(key) {
            Entry::Vacant(vacant) => {
                vacant.insert(now + ttl);
                true
            }
            Entry::Occupied(mut occupied) => {
                if *occupied.get() <= now {
                    occupied.insert(now + ttl);
                    true
                } else {
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hub_core::FixedClock;

    fn cache_with_clock() -> (InMemoryReplayCache, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::at(Utc::now()));
        let cache = InMemoryReplayCache::new(clock.clone());
        (cache, clock)
    }

    #[test]
    fn first_claim_wins_second_loses() {
        let (cache, _) = cache_with_clock();
        let ttl = Duration::minutes(15);

        assert!(cache.try_claim("_req1", ReplayCategory::AuthnRequest, ttl));
        assert!(!cache.try_claim("_req1", ReplayCategory::AuthnRequest, ttl));
    }

    #[test]
    fn categories_do_not_cross_contaminate() {
        let (cache, _) = cache_with_clock();
        let ttl = Duration::minutes(15);

        assert!(cache.try_claim("_a1", ReplayCategory::MatchingDatasetAssertion, ttl));
        assert!(cache.try_claim("_a1", ReplayCategory::AuthnStatementAssertion, ttl));
        assert!(!cache.try_claim("_a1", ReplayCategory::MatchingDatasetAssertion, ttl));
    }

    #[test]
    fn id_reclaimable_after_expiry() {
        let (cache, clock) = cache_with_clock();
        let ttl = Duration::minutes(15);

        assert!(cache.try_claim("_req1", ReplayCategory::AuthnRequest, ttl));
        clock.advance(Duration::minutes(16));
        assert!(cache.try_claim("_req1", ReplayCategory::AuthnRequest, ttl));
    }

    #[test]
    fn purge_drops_only_expired_entries() {
        let (cache, clock) = cache_with_clock();

        cache.try_claim("_short", ReplayCategory::AuthnRequest, Duration::minutes(1));
        cache.try_claim("_long", ReplayCategory::AuthnRequest, Duration::minutes(60));
        clock.advance(Duration::minutes(5));

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn concurrent_claims_admit_exactly_one() {
        let clock = Arc::new(FixedClock::at(Utc::now()));
        let cache = Arc::new(InMemoryReplayCache::new(clock));
        let ttl = Duration::minutes(15);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    cache.try_claim("_contended", ReplayCategory::AuthnRequest, ttl)
                })
            })
            .collect();

        let accepted = handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .filter(|accepted| *accepted)
            .count();
        assert_eq!(accepted, 1);
    }
}
