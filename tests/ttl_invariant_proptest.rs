//! Property-based check of the live-entry invariant (spec §8): for
//! every live entry `e`, `e.ttl.is_none() || e.touched + e.ttl > now`.
//! Exercised across randomized sequences of set/expire/touch
//! operations against the Keyspace Table directly — no Tokio runtime
//! needed, since every primitive here already takes its wall-clock
//! snapshot as a plain argument rather than reading the real clock.

use proptest::prelude::*;
use std::time::Duration;

use wardenkv::entry::Entry;
use wardenkv::keyspace::Keyspace;

#[derive(Debug, Clone)]
enum Op {
    Set { ttl_millis: Option<u64> },
    Touch,
    Persist,
    AdvanceClock { millis: u64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u64..2_000).prop_map(|t| Op::Set {
            ttl_millis: if t == 0 { None } else { Some(t) }
        }),
        Just(Op::Touch),
        Just(Op::Persist),
        (1u64..500).prop_map(|millis| Op::AdvanceClock { millis }),
    ]
}

proptest! {
    /// After applying any sequence of set/touch/persist/advance-clock
    /// operations to a single key, a live entry always satisfies the
    /// spec's liveness invariant at the clock's current position.
    #[test]
    fn live_entry_always_satisfies_ttl_invariant(ops in prop::collection::vec(op_strategy(), 0..200)) {
        let ks: Keyspace<&'static str, i32> = Keyspace::new();
        let mut now: u64 = 0;

        for op in ops {
            match op {
                Op::Set { ttl_millis } => {
                    let ttl = ttl_millis.map(Duration::from_millis);
                    ks.insert("k", Entry::new(1, ttl, now));
                }
                Op::Touch => {
                    ks.update_fields(&"k", |e| e.touched = now);
                }
                Op::Persist => {
                    ks.update_fields(&"k", |e| e.ttl = None);
                }
                Op::AdvanceClock { millis } => {
                    now = now.saturating_add(millis);
                }
            }

            if let Some(entry) = ks.lookup(&"k") {
                if entry.is_live(now) {
                    prop_assert!(
                        entry.ttl.is_none()
                            || entry.touched.saturating_add(entry.ttl.unwrap().as_millis() as u64) > now,
                        "live entry violated ttl invariant: touched={}, ttl={:?}, now={}",
                        entry.touched,
                        entry.ttl,
                        now
                    );
                }
            }
        }
    }

    /// `is_live` is monotone in time for a fixed entry: once an entry
    /// is observed dead at some `now`, it stays dead at every later
    /// `now` (no TTL resurrection).
    #[test]
    fn dead_entries_never_resurrect(touched in 0u64..10_000, ttl_millis in 1u64..5_000, now_offset in 0u64..20_000) {
        let entry = Entry::new(7, Some(Duration::from_millis(ttl_millis)), touched);
        let deadline = touched.saturating_add(ttl_millis);
        let now = deadline.saturating_add(now_offset);

        if !entry.is_live(now) {
            prop_assert!(!entry.is_live(now.saturating_add(1)));
        }
    }
}
