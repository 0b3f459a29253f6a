//! Read-mostly memoization of fetched series, keyed by (symbol, start, end).
//!
//! Readers call [`FetchCache::get`], which loads an `Arc` snapshot of the map
//! with no lock contention. Writers call [`FetchCache::insert`], which builds
//! a new map and atomically swaps it in; readers see either the old or the new
//! snapshot, never a partial one.
//!
//! Implementation notes:
//! - Uses `arc-swap` for atomic pointer swaps + cheap reads (no RwLock).
//! - The map is an `IndexMap` in insertion order, so when a capacity is set
//!   the oldest entry is the one evicted.
//! - Expired entries (when a TTL is set) are invisible to `get` and are pruned
//!   on the next `insert`.
//! - There is no explicit invalidation beyond [`FetchCache::clear`].

use std::{
    num::NonZeroUsize,
    sync::Arc,
    time::{Duration, Instant},
};

use arc_swap::ArcSwap;
use chrono::NaiveDate;
use indexmap::IndexMap;
use tracing::debug;

use crate::models::{request_params::HistoryRequest, time_series::TimeSeries};

/// Identifies one fetch. Symbols compare case-insensitively.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl From<&HistoryRequest> for CacheKey {
    fn from(request: &HistoryRequest) -> Self {
        Self {
            symbol: request.symbol.to_ascii_uppercase(),
            start: request.start(),
            end: request.end(),
        }
    }
}

/// Bounds applied to the cache. The default is unbounded with no expiry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CachePolicy {
    /// Maximum number of entries; the oldest insertion is evicted first.
    pub capacity: Option<NonZeroUsize>,
    /// How long an entry stays visible after it was stored.
    pub ttl: Option<Duration>,
}

#[derive(Clone, Debug)]
struct Entry {
    series: Arc<TimeSeries>,
    stored_at: Instant,
}

/// Snapshot type held inside the cache.
type Snapshot = IndexMap<CacheKey, Entry>;

pub struct FetchCache {
    entries: ArcSwap<Snapshot>,
    policy: CachePolicy,
}

impl Default for FetchCache {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

impl FetchCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            entries: ArcSwap::from_pointee(Snapshot::new()),
            policy,
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Returns the cached series for `key`, if present and not expired.
    ///
    /// Fast path: one atomic load + a map lookup.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<TimeSeries>> {
        let snap = self.entries.load();
        let entry = snap.get(key)?;
        if self.is_expired(entry, Instant::now()) {
            debug!(symbol = %key.symbol, "cache entry expired");
            return None;
        }
        Some(Arc::clone(&entry.series))
    }

    /// Stores `series` under `key`, replacing any previous entry.
    ///
    /// Safe to call from any thread; concurrent writers are serialized by the
    /// read-copy-update loop.
    pub fn insert(&self, key: CacheKey, series: Arc<TimeSeries>) {
        let now = Instant::now();
        self.entries.rcu(|current| {
            let mut next: Snapshot = current
                .iter()
                .filter(|(k, e)| **k != key && !self.is_expired(e, now))
                .map(|(k, e)| (k.clone(), e.clone()))
                .collect();
            next.insert(
                key.clone(),
                Entry {
                    series: Arc::clone(&series),
                    stored_at: now,
                },
            );
            if let Some(capacity) = self.policy.capacity {
                while next.len() > capacity.get() {
                    next.shift_remove_index(0);
                }
            }
            next
        });
    }

    /// Number of stored entries, including ones that expired but were not pruned yet.
    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.store(Arc::new(Snapshot::new()));
    }

    fn is_expired(&self, entry: &Entry, now: Instant) -> bool {
        self.policy
            .ttl
            .is_some_and(|ttl| now.saturating_duration_since(entry.stored_at) >= ttl)
    }
}
