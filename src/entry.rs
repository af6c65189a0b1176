//! The cache entry record (spec §3: `{key, touched, ttl, value}`).

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, as used for `touched` and all
/// TTL arithmetic. Kept as a bare `u64` (not `Instant`) so entries are
/// comparable across the dump/load boundary.
pub type Millis = u64;

/// Current wall-clock time in milliseconds since epoch.
pub fn now_millis() -> Millis {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_millis() as Millis
}

/// A stored value plus the bookkeeping the expiration and policy
/// subsystems need. Identity-owned by the Keyspace Table; nothing else
/// retains a reference to an `Entry` past the call that touched it.
#[derive(Debug, Clone)]
pub struct Entry<V> {
    /// Milliseconds-since-epoch at last write (insert or update).
    pub touched: Millis,
    /// `None` means "no expiration". `Some(d)` is a duration relative
    /// to `touched`.
    pub ttl: Option<Duration>,
    /// The opaque stored payload.
    pub value: V,
}

impl<V> Entry<V> {
    /// Build a fresh entry touched at `now`.
    pub fn new(value: V, ttl: Option<Duration>, now: Millis) -> Self {
        Self {
            touched: now,
            ttl,
            value,
        }
    }

    /// An entry is live at `now` iff it has no TTL, or the TTL has not
    /// yet elapsed since it was last touched.
    pub fn is_live(&self, now: Millis) -> bool {
        match self.ttl {
            None => true,
            Some(ttl) => self.touched.saturating_add(ttl.as_millis() as Millis) > now,
        }
    }

    /// Milliseconds remaining before expiry, or `None` if the entry
    /// never expires. Returns `Some(0)` (not negative) once elapsed.
    pub fn remaining_millis(&self, now: Millis) -> Option<Millis> {
        self.ttl.map(|ttl| {
            let deadline = self.touched.saturating_add(ttl.as_millis() as Millis);
            deadline.saturating_sub(now)
        })
    }
}
