//! Inspection & Statistics (spec §4.9's counterpart — "Inspection &
//! Statistics" row in §2's component table, and the `inspect`/`stats`
//! actions in §6).

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// A rough byte-size estimate, used by `inspect(memory)`. Implemented
/// for common scalar/owned types; callers storing larger payloads can
/// implement it themselves for a tighter estimate.
pub trait ApproxSize {
    fn approx_size(&self) -> usize;
}

impl ApproxSize for String {
    fn approx_size(&self) -> usize {
        self.capacity()
    }
}

impl ApproxSize for Vec<u8> {
    fn approx_size(&self) -> usize {
        self.capacity()
    }
}

macro_rules! impl_approx_size_for_scalar {
    ($($t:ty),*) => {
        $(impl ApproxSize for $t {
            fn approx_size(&self) -> usize { std::mem::size_of::<$t>() }
        })*
    };
}

impl_approx_size_for_scalar!(i8, i16, i32, i64, i128, u8, u16, u32, u64, u128, f32, f64, bool);

/// What `inspect` can be asked to report on (spec §6 "Inspect
/// targets").
pub enum InspectTarget<'a, K> {
    /// Number or list of currently expired (not-yet-purged) keys.
    ExpiredCount,
    ExpiredKeys,
    /// When the Janitor last ran and how long it took.
    JanitorLast,
    /// Approximate memory footprint, in one of three units.
    MemoryBytes,
    MemoryWords,
    /// A single entry's full record, for debugging.
    Record(&'a K),
    /// A coarse snapshot of cache-wide state (size, janitor presence, ...).
    State,
}

/// What each [`InspectTarget`] variant resolves to, paired back up by
/// the `inspect` action. Kept as one tagged enum rather than a trait
/// object per spec §9's "tagged variants, not open hierarchies".
pub enum InspectResult<K, V> {
    ExpiredCount(usize),
    ExpiredKeys(Vec<K>),
    JanitorLast(Option<JanitorRun>),
    MemoryBytes(usize),
    MemoryWords(usize),
    Record(Option<crate::entry::Entry<V>>),
    State(CacheState),
}

/// A coarse, debugging-oriented snapshot of one cache's live state.
#[derive(Debug, Clone, Serialize)]
pub struct CacheState {
    pub name: String,
    pub size: usize,
    pub janitor_running: bool,
    pub stats_enabled: bool,
}

/// Metadata the Janitor records after each sweep (spec §4.3).
#[derive(Debug, Clone, Default)]
pub struct JanitorRun {
    pub count: usize,
    pub duration_ms: u64,
    pub started_at_millis: u64,
}

/// Lock-free hit/miss/eviction/expiry counters a cache accumulates
/// over its lifetime. Disabled entirely returns `StatsDisabled` from
/// the `stats` action (spec §6 error atoms).
#[derive(Default)]
pub struct Stats {
    pub enabled: bool,
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl Stats {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Default::default()
        }
    }

    pub fn record_hit(&self) {
        if self.enabled {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_miss(&self) {
        if self.enabled {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_write(&self) {
        if self.enabled {
            self.writes.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_eviction(&self, count: u64) {
        if self.enabled {
            self.evictions.fetch_add(count, Ordering::Relaxed);
        }
    }

    pub fn record_expiration(&self, count: u64) {
        if self.enabled {
            self.expirations.fetch_add(count, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time read of [`Stats`]'s counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub evictions: u64,
    pub expirations: u64,
}

impl StatsSnapshot {
    /// Render as a JSON object, for embedders wiring `stats` output
    /// into a structured log line or a metrics-scrape endpoint rather
    /// than the statistics aggregation hook's own presentation layer
    /// (out of scope here — spec §1).
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "hits": self.hits,
            "misses": self.misses,
            "writes": self.writes,
            "evictions": self.evictions,
            "expirations": self.expirations,
        })
    }
}
