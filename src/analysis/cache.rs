// =============================================================================
// Analysis Cache — single-flight memoisation keyed by (date, config version)
// =============================================================================
//
// Slot lifecycle for one key:
//
//   (vacant) --miss--> Pending(flight) --Ok--> Ready(result) --TTL/clear--> (vacant)
//                                      --Err/panic--> (vacant)
//
// The first caller for a vacant key becomes the leader and computes outside
// the map lock.  Later callers clone the pending flight and block on its
// condvar until the leader publishes an outcome.  A leader only stores its
// result if its own flight is still registered, so a `clear()` that lands
// mid-computation is never undone by a late store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analysis::{AnalysisResult, Clock};
use crate::error::AnalysisError;

pub type Outcome = Result<Arc<AnalysisResult>, AnalysisError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub date: NaiveDate,
    pub config_version: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Callers that joined another caller's in-flight computation.
    pub coalesced: u64,
    pub computations: u64,
    pub entries: usize,
}

// =============================================================================
// In-flight computation
// =============================================================================

struct Flight {
    outcome: Mutex<Option<Outcome>>,
    done: Condvar,
}

impl Flight {
    fn new() -> Self {
        Self {
            outcome: Mutex::new(None),
            done: Condvar::new(),
        }
    }

    fn wait(&self) -> Outcome {
        let mut outcome = self.outcome.lock();
        loop {
            if let Some(o) = outcome.as_ref() {
                return o.clone();
            }
            self.done.wait(&mut outcome);
        }
    }

    /// First completion wins.
    fn complete(&self, result: Outcome) {
        let mut outcome = self.outcome.lock();
        if outcome.is_none() {
            *outcome = Some(result);
        }
        self.done.notify_all();
    }
}

#[derive(Clone)]
enum Slot {
    Ready(Arc<AnalysisResult>),
    Pending(Arc<Flight>),
}

// =============================================================================
// AnalysisCache
// =============================================================================

pub struct AnalysisCache {
    slots: Mutex<HashMap<CacheKey, Slot>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
    computations: AtomicU64,
}

impl AnalysisCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            ttl,
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            coalesced: AtomicU64::new(0),
            computations: AtomicU64::new(0),
        }
    }

    /// Return the cached result for `key`, join an in-flight computation for
    /// it, or run `compute` as the leader.  Errors are handed to every waiter
    /// and never stored.
    pub fn get_or_compute<F>(&self, key: CacheKey, compute: F) -> Outcome
    where
        F: FnOnce() -> Outcome,
    {
        let flight = {
            let mut slots = self.slots.lock();
            match slots.get(&key).cloned() {
                Some(Slot::Ready(result)) => {
                    if !self.is_fresh(&result) {
                        debug!(date = %key.date, version = key.config_version, "cache entry expired");
                        slots.remove(&key);
                    } else if !result.is_well_formed(key.date, key.config_version) {
                        warn!(date = %key.date, version = key.config_version, "discarding malformed cache entry");
                        slots.remove(&key);
                    } else {
                        self.hits.fetch_add(1, Ordering::Relaxed);
                        debug!(date = %key.date, version = key.config_version, "cache hit");
                        return Ok(result);
                    }
                }
                Some(Slot::Pending(flight)) => {
                    self.coalesced.fetch_add(1, Ordering::Relaxed);
                    drop(slots);
                    debug!(date = %key.date, version = key.config_version, "joining in-flight analysis");
                    return flight.wait();
                }
                None => {}
            }

            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!(date = %key.date, version = key.config_version, "cache miss");
            let flight = Arc::new(Flight::new());
            slots.insert(key, Slot::Pending(Arc::clone(&flight)));
            flight
        };

        self.computations.fetch_add(1, Ordering::Relaxed);
        let mut leader = Leader {
            cache: self,
            key,
            flight,
            finished: false,
        };
        let outcome = compute();
        leader.finish(outcome.clone());
        outcome
    }

    /// Drop every entry, including in-flight registrations.
    pub fn clear(&self) {
        let mut slots = self.slots.lock();
        let n = slots.len();
        slots.clear();
        debug!(entries = n, "cache cleared");
    }

    fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            computations: self.computations.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    fn is_fresh(&self, result: &AnalysisResult) -> bool {
        self.clock.now() - result.computed_at < self.ttl
    }

    /// Remove expired results for every key.  Dates and config versions that
    /// are never asked for again would otherwise stay resident.
    fn evict_expired(&self, slots: &mut HashMap<CacheKey, Slot>) {
        let before = slots.len();
        slots.retain(|_, slot| match slot {
            Slot::Ready(result) => self.is_fresh(result),
            Slot::Pending(_) => true,
        });
        let evicted = before - slots.len();
        if evicted > 0 {
            debug!(evicted, "expired cache entries evicted");
        }
    }

    /// Store or drop the leader's outcome, but only while its own flight is
    /// still the registered one.
    fn settle(&self, key: CacheKey, flight: &Arc<Flight>, outcome: &Outcome) {
        let mut slots = self.slots.lock();
        let registered = matches!(
            slots.get(&key),
            Some(Slot::Pending(current)) if Arc::ptr_eq(current, flight)
        );
        if !registered {
            debug!(date = %key.date, version = key.config_version, "cache cleared during computation, not storing");
            return;
        }
        match outcome {
            Ok(result) => {
                self.evict_expired(&mut slots);
                slots.insert(key, Slot::Ready(Arc::clone(result)));
                debug!(date = %key.date, version = key.config_version, "cache store");
            }
            Err(_) => {
                slots.remove(&key);
            }
        }
    }
}

/// Completes the flight even if `compute` unwinds, so waiters never hang.
struct Leader<'a> {
    cache: &'a AnalysisCache,
    key: CacheKey,
    flight: Arc<Flight>,
    finished: bool,
}

impl Leader<'_> {
    fn finish(&mut self, outcome: Outcome) {
        self.cache.settle(self.key, &self.flight, &outcome);
        self.flight.complete(outcome);
        self.finished = true;
    }
}

impl Drop for Leader<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!(date = %self.key.date, "analysis leader aborted");
        let outcome = Err(AnalysisError::Aborted { date: self.key.date });
        self.cache.settle(self.key, &self.flight, &outcome);
        self.flight.complete(outcome);
    }
}
