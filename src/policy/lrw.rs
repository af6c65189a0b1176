//! LRW — Least-Recently-Written, the reference eviction policy (spec
//! §4.6). Reuses the `touched` field every entry already carries for
//! TTL purposes, so no separate ordering structure is needed: cheap,
//! at the cost of exact LRU semantics. A deliberate "simple and fast
//! enough" default, same trade-off the teacher's own `tier::LruCache`
//! documents for its L1 eviction.

use std::hash::Hash;

use crate::entry::now_millis;
use crate::keyspace::Keyspace;
use crate::policy::Policy;

/// The reference Least-Recently-Written policy.
#[derive(Default)]
pub struct Lrw;

impl<K, V> Policy<K, V> for Lrw
where
    K: Eq + Hash + Clone + Ord,
{
    fn on_write(&self, keyspace: &Keyspace<K, V>, size_limit: usize, reclaim: f64, _batch: usize) {
        let size = keyspace.count();
        if size <= size_limit {
            return;
        }

        let evict_count = (size_limit as f64 * reclaim).ceil() as usize;
        if evict_count == 0 {
            return;
        }

        let now = now_millis();
        // Oldest-`touched`-first, ties broken by key ordering (spec
        // §4.6). `select` already hands back every live-or-dead key;
        // we don't filter by liveness here because LRW's job is pure
        // size enforcement, independent of TTL expiry.
        let mut candidates: Vec<(u64, K)> = keyspace
            .select(now, |_entry, _now| true)
            .into_iter()
            .filter_map(|k| keyspace.lookup(&k).map(|e| (e.touched, k)))
            .collect();

        candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        for (_, key) in candidates.into_iter().take(evict_count) {
            keyspace.delete(&key);
        }
    }

    fn strategy(&self) -> &'static str {
        "lrw"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Entry;

    #[test]
    fn evicts_oldest_touched_first() {
        let ks: Keyspace<i32, i32> = Keyspace::new();
        for i in 0..501 {
            ks.insert(i, Entry::new(i, None, i as u64));
        }

        let lrw = Lrw;
        lrw.on_write(&ks, 500, 0.1, 500);

        // ceil(500 * 0.1) = 50 evicted out of 501 inserted -> 451 survive.
        assert_eq!(ks.count(), 451);
        // The 50 earliest-touched keys (0..50) should be gone.
        for i in 0..50 {
            assert!(ks.lookup(&i).is_none(), "key {i} should have been evicted");
        }
        for i in 50..501 {
            assert!(ks.lookup(&i).is_some(), "key {i} should have survived");
        }
    }

    #[test]
    fn no_eviction_under_bound() {
        let ks: Keyspace<i32, i32> = Keyspace::new();
        for i in 0..10 {
            ks.insert(i, Entry::new(i, None, i as u64));
        }
        Lrw.on_write(&ks, 500, 0.1, 500);
        assert_eq!(ks.count(), 10);
    }
}
