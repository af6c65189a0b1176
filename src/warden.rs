//! The crate's top-level facade: a process-wide-shaped pairing of the
//! Overseer registry and the global Locksmith lock table (spec §5
//! "Shared-resource policy" / §9 "Global state").
//!
//! The source this is ported from keeps the registry and lock table as
//! literal process globals. A generic Rust library can't do that
//! directly — `Overseer<K, V>` and `GlobalLocks<K>` are monomorphized
//! per embedder-chosen key/value type, so there is no single concrete
//! type to hang a `static` off inside this crate. Instead `Warden<K,
//! V>` bundles both singletons behind one handle that the embedder
//! constructs once and is expected to hold for the process's lifetime
//! (typically behind their own `once_cell::sync::Lazy<Warden<MyKey,
//! MyValue>>` static) — preserving the spec's "explicit init/teardown,
//! `not_started` otherwise" contract without this crate dictating what
//! `K`/`V` every embedder needs. See `DESIGN.md` for the full
//! grounding of this Open Question resolution.

use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cache::Cache;
use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::locksmith::GlobalLocks;
use crate::overseer::Overseer;

/// The process-wide pair of singletons every cache action resolves
/// through: the named-cache registry and the cross-cache lock table.
pub struct Warden<K, V> {
    overseer: Overseer<K, V>,
    locks: Arc<GlobalLocks<K>>,
    started: AtomicBool,
}

impl<K, V> Warden<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + std::fmt::Debug + 'static,
{
    /// Build an unstarted Warden. Every cache operation through it
    /// fails `NotStarted` until [`Warden::start`] is called.
    pub fn new() -> Self {
        Self {
            overseer: Overseer::new(),
            locks: Arc::new(GlobalLocks::new()),
            started: AtomicBool::new(false),
        }
    }

    /// Mark the subsystem live. Idempotent.
    pub fn start(&self) {
        self.started.store(true, Ordering::SeqCst);
        tracing::info!("warden started");
    }

    /// Mark the subsystem stopped. Already-running cache tasks (hooks,
    /// Janitors, transaction queues) are not forcibly torn down here —
    /// that happens when their owning `Cache<K, V>` handles drop.
    /// Further calls through this Warden fail `NotStarted` until the
    /// next [`Warden::start`].
    pub fn shutdown(&self) {
        self.started.store(false, Ordering::SeqCst);
        tracing::info!("warden shut down");
    }

    fn ensure_started(&self) -> CacheResult<()> {
        if self.started.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CacheError::NotStarted)
        }
    }

    /// Register and start a new named cache under this Warden (spec
    /// §4.7's `Overseer::set` plus §4.3/§4.5/§4.8 startup wiring,
    /// forwarded to [`Cache::start`]).
    pub async fn start_cache(&self, config: CacheConfig<K, V>) -> CacheResult<Cache<K, V>> {
        self.ensure_started()?;
        Cache::start(config, &self.overseer, self.locks.clone()).await
    }

    /// `Overseer::get` — resolve a running cache's record by name.
    /// Exposed for embedders composing their own actions on top of the
    /// raw record (e.g. a custom command dispatcher); ordinary callers
    /// use the `Cache<K, V>` handle returned by [`Warden::start_cache`]
    /// directly.
    pub fn cache_record(&self, name: &str) -> CacheResult<Arc<crate::overseer::CacheRecord<K, V>>> {
        self.ensure_started()?;
        self.overseer.get(name)
    }

    /// `Overseer::member?`.
    pub fn has_cache(&self, name: &str) -> bool {
        self.overseer.member(name)
    }

    /// `Overseer::del`.
    pub fn stop_cache(&self, name: &str) -> CacheResult<bool> {
        self.ensure_started()?;
        Ok(self.overseer.del(name))
    }

    /// `Overseer::update` (spec §4.7): serialized config mutation, with
    /// every `provide:[:cache]` hook re-provisioned on success.
    pub async fn update_cache<F>(&self, name: &str, f: F) -> CacheResult<()>
    where
        F: FnOnce(&CacheConfig<K, V>) -> CacheResult<CacheConfig<K, V>>,
        K: Send + Sync,
        V: Send + Sync,
    {
        self.ensure_started()?;
        self.overseer.update(name, f).await
    }
}

impl<K, V> Default for Warden<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + std::fmt::Debug + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;

    #[tokio::test]
    async fn rejects_operations_before_start() {
        let warden: Warden<String, i32> = Warden::new();
        let result = warden.start_cache(CacheConfig::new("c")).await;
        assert_eq!(result.err(), Some(CacheError::NotStarted));
    }

    #[tokio::test]
    async fn starts_and_resolves_cache_after_start() {
        let warden: Warden<String, i32> = Warden::new();
        warden.start();
        let cache = warden.start_cache(CacheConfig::new("c")).await.unwrap();
        assert_eq!(cache.name(), "c");
        assert!(warden.has_cache("c"));
    }
}
