//! The Keyspace Table (spec §4.1): a concurrent key→entry map with
//! atomic per-key primitives, built on [`dashmap::DashMap`] the same
//! way `caddy::enterprise::cache::lock::DistributedMutex` and
//! `::tier::LruCache` both do.

use dashmap::DashMap;
use std::hash::Hash;

use crate::entry::{Entry, Millis};

/// A predicate over an entry's `(touched, ttl)` pair, evaluated at a
/// single wall-clock snapshot (spec §4.1's bulk-match contract). Used
/// by the Janitor and by `inspect`.
pub type MatchSpec<V> = dyn Fn(&Entry<V>) -> bool + Send + Sync;

/// The concurrent keyspace store underlying one named cache.
///
/// Every method here is atomic with respect to a single key; counting
/// and selection are explicitly not linearizable across keys (spec
/// §4.1's invariant list), matching `DashMap`'s per-shard locking.
pub struct Keyspace<K, V> {
    table: DashMap<K, Entry<V>>,
}

impl<K, V> Keyspace<K, V>
where
    K: Eq + Hash + Clone,
{
    /// An empty keyspace.
    pub fn new() -> Self {
        Self {
            table: DashMap::new(),
        }
    }

    /// Insert or overwrite an entry.
    pub fn insert(&self, key: K, entry: Entry<V>) {
        self.table.insert(key, entry);
    }

    /// Look up a key, cloning the entry out from under the shard lock.
    pub fn lookup(&self, key: &K) -> Option<Entry<V>>
    where
        V: Clone,
    {
        self.table.get(key).map(|r| r.clone())
    }

    /// Remove a key. Returns `true` iff an entry was actually present
    /// (spec §8 idempotence: `del; del` is `{ok,true}` then
    /// `{ok,false}`).
    pub fn delete(&self, key: &K) -> bool {
        self.table.remove(key).is_some()
    }

    /// Apply field updates to an existing entry in place. Returns
    /// `false` if the key is absent — this never inserts.
    pub fn update_fields<F>(&self, key: &K, f: F) -> bool
    where
        F: FnOnce(&mut Entry<V>),
    {
        match self.table.get_mut(key) {
            Some(mut entry) => {
                f(&mut entry);
                true
            }
            None => false,
        }
    }

    /// Atomically compute a result against an entry if present, with
    /// the shard lock held for the duration of `f` — the primitive
    /// `incr`/`decr`/`take` build on.
    pub fn compute_if_present<F, R>(&self, key: &K, f: F) -> Option<R>
    where
        F: FnOnce(&mut Entry<V>) -> R,
    {
        self.table.get_mut(key).map(|mut entry| f(&mut entry))
    }

    /// Insert if absent, else run `f` against the existing entry;
    /// returns the entry's value in both cases. Used by `incr`/`decr`
    /// to apply their `initial` argument.
    pub fn upsert_with<F>(&self, key: K, initial: Entry<V>, f: F) -> V
    where
        F: FnOnce(&mut Entry<V>),
        V: Clone,
    {
        let mut entry = self.table.entry(key).or_insert(initial);
        f(&mut entry);
        entry.value.clone()
    }

    /// Select entries whose `(touched, ttl)` satisfy `pred`, evaluated
    /// at the given snapshot time. Used by the Janitor (expired match)
    /// and by `inspect`.
    pub fn select<F>(&self, now: Millis, pred: F) -> Vec<K>
    where
        F: Fn(&Entry<V>, Millis) -> bool,
    {
        self.table
            .iter()
            .filter(|r| pred(r.value(), now))
            .map(|r| r.key().clone())
            .collect()
    }

    /// Delete every key matching `pred` in one bulk pass; returns the
    /// count removed. This is the primitive the Janitor calls so that
    /// a row already purged lazily cannot be double-counted (removal
    /// is atomic per row, per spec §4.3).
    pub fn select_delete<F>(&self, now: Millis, pred: F) -> usize
    where
        F: Fn(&Entry<V>, Millis) -> bool,
    {
        let victims = self.select(now, pred);
        let mut removed = 0;
        for key in victims {
            if self.table.remove(&key).is_some() {
                removed += 1;
            }
        }
        removed
    }

    /// Number of entries currently stored (including dead-but-not-yet
    /// purged ones — counting is not required to observe liveness).
    pub fn count(&self) -> usize {
        self.table.len()
    }

    /// Atomically remove and return an entry (the `take` action's
    /// get-and-delete primitive) — a single `DashMap::remove`, so no
    /// separate lookup-then-delete race is possible.
    pub fn take(&self, key: &K) -> Option<Entry<V>> {
        self.table.remove(key).map(|(_, entry)| entry)
    }

    /// A point-in-time copy of every `(key, entry)` pair, dead or
    /// alive — the `dump` action's source material.
    pub fn snapshot(&self) -> Vec<(K, Entry<V>)>
    where
        V: Clone,
    {
        self.table
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }

    /// Remove every entry, returning how many were removed.
    pub fn clear(&self) -> usize {
        let n = self.table.len();
        self.table.clear();
        n
    }

    /// Rough heap footprint estimate in bytes, used by `inspect(memory)`.
    pub fn size_bytes(&self) -> usize
    where
        V: crate::inspect::ApproxSize,
    {
        self.table
            .iter()
            .map(|r| std::mem::size_of::<K>() + r.value().value.approx_size())
            .sum()
    }

    /// Snapshot every live key at `now` (used by the `keys` action).
    pub fn live_keys(&self, now: Millis) -> Vec<K> {
        self.table
            .iter()
            .filter(|r| r.value().is_live(now))
            .map(|r| r.key().clone())
            .collect()
    }
}

impl<K, V> Default for Keyspace<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn insert_lookup_delete_roundtrip() {
        let ks: Keyspace<String, i32> = Keyspace::new();
        ks.insert("a".into(), Entry::new(1, None, 0));
        assert_eq!(ks.lookup(&"a".to_string()).unwrap().value, 1);
        assert!(ks.delete(&"a".to_string()));
        assert!(!ks.delete(&"a".to_string()));
    }

    #[test]
    fn select_delete_is_atomic_per_row() {
        let ks: Keyspace<i32, i32> = Keyspace::new();
        for i in 0..10 {
            ks.insert(i, Entry::new(i, Some(Duration::from_millis(1)), 0));
        }
        let removed = ks.select_delete(100, |e, now| !e.is_live(now));
        assert_eq!(removed, 10);
        assert_eq!(ks.count(), 0);
    }
}
