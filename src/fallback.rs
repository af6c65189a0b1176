//! The Fallback Runtime (spec §4.8): on-miss value population for
//! read-through actions, normalized to a `{commit, ignore, error}`
//! outcome.

use async_trait::async_trait;

use crate::error::CacheError;

/// The normalized result of invoking a fallback (spec §4.8).
pub enum FallbackOutcome<V> {
    /// Store the value (applying the default TTL) and return it.
    Commit(V),
    /// Return the value without storing it.
    Ignore(V),
    /// Propagate an error; nothing is stored.
    Error(CacheError),
}

/// A fallback is either a bare `f(key)` or a `f(key, state)` pair
/// (spec §4.8). Both shapes are unified behind this trait so the
/// read-through path doesn't need to branch on which form was
/// configured.
#[async_trait]
pub trait Fallback<K, V>: Send + Sync {
    async fn call(&self, key: &K) -> FallbackOutcome<V>;
}

/// Wrap any `Fn(&K) -> FallbackOutcome<V>` (optionally async via the
/// blanket impl below) as a [`Fallback`]. This is the "bare function"
/// shape from spec §4.8.
pub struct FnFallback<F> {
    f: F,
}

impl<F> FnFallback<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<K, V, F> Fallback<K, V> for FnFallback<F>
where
    K: Send + Sync,
    V: Send,
    F: Fn(&K) -> FallbackOutcome<V> + Send + Sync,
{
    async fn call(&self, key: &K) -> FallbackOutcome<V> {
        (self.f)(key)
    }
}

/// Any other return shape from a fallback is normalized to `Commit`
/// (spec §4.8: "any other `v` -> treat as `{commit, v}`"). Callers
/// build this with `FallbackOutcome::Commit` directly; this helper
/// exists for call sites translating a plain value.
impl<V> From<V> for FallbackOutcome<V> {
    fn from(value: V) -> Self {
        FallbackOutcome::Commit(value)
    }
}
