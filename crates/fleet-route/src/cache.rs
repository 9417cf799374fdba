//! `RouteCache` — bounded, expiring cache over a [`RouteSource`].
//!
//! # Contract
//!
//! [`RouteCache::route`] never fails.  On a miss the external source is
//! consulted; on timeout or error a synthetic straight-line polyline is
//! substituted and stored with its `fallback` flag set, so a flapping
//! routing service does not get hammered on every tick.
//!
//! # Concurrency
//!
//! Concurrent lookups for the same key collapse into a single external
//! call: the first caller inserts an in-flight marker and fetches outside
//! the lock; followers block on a condvar until the leader publishes.
//! Distinct keys fetch independently.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use fleet_core::config::RouteConfig;
use fleet_core::GeoPoint;
use serde::Serialize;

use crate::client::RouteSource;
use crate::polyline::Polyline;

// ── Key ───────────────────────────────────────────────────────────────────────

/// Cache key: both endpoints rounded to 3 decimal places (~110 m), so
/// jittered GPS positions for the same journey share an entry.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
struct RouteKey {
    start_mlat: i64,
    start_mlng: i64,
    end_mlat: i64,
    end_mlng: i64,
}

impl RouteKey {
    fn new(start: GeoPoint, end: GeoPoint) -> Self {
        let milli = |v: f64| (v * 1000.0).round() as i64;
        Self {
            start_mlat: milli(start.lat),
            start_mlng: milli(start.lng),
            end_mlat: milli(end.lat),
            end_mlng: milli(end.lng),
        }
    }
}

// ── Stats ─────────────────────────────────────────────────────────────────────

/// Cumulative cache counters since construction.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    /// Misses answered with a synthetic polyline.
    pub fallbacks: u64,
}

// ── Cache internals ───────────────────────────────────────────────────────────

enum Slot {
    /// A fetch for this key is in progress; wait on the condvar.
    InFlight,
    Ready {
        polyline: Arc<Polyline>,
        inserted: Instant,
        /// Logical access counter for LRU eviction.
        last_used: u64,
    },
}

struct CacheState {
    slots: HashMap<RouteKey, Slot>,
    /// Monotone access counter backing `last_used`.
    use_counter: u64,
    stats: CacheStats,
}

// ── RouteCache ────────────────────────────────────────────────────────────────

/// Shared route cache.  Cheap to share via `Arc`; all methods take `&self`.
pub struct RouteCache<S: RouteSource> {
    source: S,
    capacity: usize,
    ttl: Duration,
    state: Mutex<CacheState>,
    published: Condvar,
}

impl<S: RouteSource> RouteCache<S> {
    pub fn new(source: S, config: &RouteConfig) -> Self {
        Self {
            source,
            capacity: config.cache_size.max(1),
            ttl: Duration::from_secs_f64(config.cache_ttl_secs),
            state: Mutex::new(CacheState {
                slots: HashMap::new(),
                use_counter: 0,
                stats: CacheStats::default(),
            }),
            published: Condvar::new(),
        }
    }

    /// Return the polyline for `start → end`.  Never fails; inspect
    /// [`Polyline::fallback`] to learn whether the result was synthesized.
    pub fn route(&self, start: GeoPoint, end: GeoPoint) -> Arc<Polyline> {
        enum Lookup {
            Hit(Arc<Polyline>),
            Expired,
            InFlight,
            Missing,
        }

        let key = RouteKey::new(start, end);

        let mut state = self.lock();
        loop {
            let s = &mut *state;
            s.use_counter += 1;
            let stamp = s.use_counter;

            // First pass only reads/claims; all bookkeeping happens after the
            // slot borrow ends.
            let lookup = match s.slots.get_mut(&key) {
                Some(Slot::Ready { polyline, inserted, last_used }) => {
                    if inserted.elapsed() <= self.ttl {
                        *last_used = stamp;
                        Lookup::Hit(Arc::clone(polyline))
                    } else {
                        Lookup::Expired
                    }
                }
                Some(Slot::InFlight) => Lookup::InFlight,
                None => Lookup::Missing,
            };

            match lookup {
                Lookup::Hit(p) => {
                    s.stats.hits += 1;
                    return p;
                }
                Lookup::Expired => {
                    s.slots.remove(&key);
                    s.stats.expirations += 1;
                    s.stats.misses += 1;
                    s.slots.insert(key, Slot::InFlight);
                    break;
                }
                Lookup::Missing => {
                    s.stats.misses += 1;
                    s.slots.insert(key, Slot::InFlight);
                    break;
                }
                Lookup::InFlight => {
                    state = self
                        .published
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
        drop(state);

        let polyline = match self.source.fetch(start, end) {
            Ok(p) => Arc::new(p),
            Err(e) => {
                tracing::warn!(error = %e, %start, %end, "routing failed, using fallback polyline");
                let fallback = Arc::new(Polyline::synthetic(start, end));
                self.lock().stats.fallbacks += 1;
                fallback
            }
        };

        let mut state = self.lock();
        self.evict_if_full(&mut state, key);
        state.use_counter += 1;
        let last_used = state.use_counter;
        state.slots.insert(
            key,
            Slot::Ready { polyline: Arc::clone(&polyline), inserted: Instant::now(), last_used },
        );
        drop(state);
        self.published.notify_all();

        polyline
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }

    /// Number of resident entries (ready or in-flight).
    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        // The public contract never fails; recover from a poisoned lock
        // rather than propagating a panic into every caller.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Evict the least-recently-used ready entry if publishing `incoming`
    /// would exceed capacity.  Replacing the key's own in-flight marker
    /// does not grow the map, and in-flight slots are never evicted — a
    /// follower may be waiting on them.
    fn evict_if_full(&self, state: &mut CacheState, incoming: RouteKey) {
        let occupied = state.slots.len() - usize::from(state.slots.contains_key(&incoming));
        if occupied < self.capacity {
            return;
        }
        let victim = state
            .slots
            .iter()
            .filter_map(|(k, slot)| match slot {
                Slot::Ready { last_used, .. } => Some((*last_used, *k)),
                Slot::InFlight => None,
            })
            .min_by_key(|&(last_used, _)| last_used)
            .map(|(_, k)| k);
        if let Some(key) = victim {
            state.slots.remove(&key);
            state.stats.evictions += 1;
        }
    }
}
