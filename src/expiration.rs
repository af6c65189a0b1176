//! Expiration (spec §4.3): lazy purge-on-read plus the periodic
//! Janitor sweeper. The sweeper task is spawned the same way
//! `caddy::enterprise::cache::lock::DeadlockDetector::start_detection_task`
//! spawns its periodic ticker, repurposed here for TTL sweeping
//! instead of cycle detection.

use parking_lot::RwLock;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use crate::entry::now_millis;
use crate::inspect::JanitorRun;
use crate::keyspace::Keyspace;

/// A running Janitor task's handle. Dropping it aborts the sweeper
/// task, tying its lifetime to the owning `Cache<K, V>` the same way
/// the transaction queue and hook tasks are torn down on their
/// owner's drop (spec §5's "explicit init/teardown" posture applied
/// per-cache rather than process-wide).
pub struct Janitor {
    handle: tokio::task::JoinHandle<()>,
    last_run: Arc<RwLock<Option<JanitorRun>>>,
}

impl Janitor {
    /// Spawn a sweeper that wakes every `interval_dur`, deletes every
    /// entry whose TTL has elapsed, and records run metadata. Returns
    /// `None` if `interval_dur` is `None` (spec §4.3: "disabled when
    /// interval is nil").
    pub fn spawn<K, V>(keyspace: Arc<Keyspace<K, V>>, interval_dur: Option<Duration>) -> Option<Self>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: Send + Sync + 'static,
    {
        let interval_dur = interval_dur?;
        let last_run = Arc::new(RwLock::new(None));
        let last_run_task = last_run.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval(interval_dur);
            loop {
                ticker.tick().await;

                let started = now_millis();
                let start_instant = std::time::Instant::now();
                let count = keyspace.select_delete(started, |entry, now| !entry.is_live(now));
                let duration_ms = start_instant.elapsed().as_millis() as u64;

                *last_run_task.write() = Some(JanitorRun {
                    count,
                    duration_ms,
                    started_at_millis: started,
                });

                tracing::debug!(count, duration_ms, "janitor sweep complete");
            }
        });

        Some(Self { handle, last_run })
    }

    /// `inspect(janitor, :last)` (spec §6). Synchronous — `last_run` is
    /// plain interior-mutable state, not worth a Tokio lock's await
    /// point for a single clone.
    pub fn last_run(&self) -> Option<JanitorRun> {
        self.last_run.read().clone()
    }
}

impl Drop for Janitor {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Apply lazy purge-on-read to a single lookup result (spec §4.3): if
/// the entry exists but is dead, delete it and report a miss. Returns
/// `true` iff a purge actually happened (the caller uses this to
/// decide whether to fire the synthetic `purge` post-hook).
pub fn lazy_purge<K, V>(keyspace: &Keyspace<K, V>, key: &K, now: u64) -> bool
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    match keyspace.lookup(key) {
        Some(entry) if !entry.is_live(now) => {
            keyspace.delete(key);
            true
        }
        _ => false,
    }
}
