//! The Overseer (spec §4.7): the process-wide, named-cache registry.
//! Modeled on `caddy`'s own `config` module pattern (a read-mostly
//! record behind a serializing update) plus the `once_cell` statics
//! idiom spec §9 calls for to keep the registry process-wide without
//! requiring every call site to thread a handle through.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::hook::Informant;

/// One registered cache's live state: its (possibly updated) config,
/// plus the Informant that owns its hook tasks. Kept together because
/// an Overseer `update` needs to re-provision the Informant's hooks
/// immediately after committing a new config (spec §4.7).
pub struct CacheRecord<K, V> {
    pub config: RwLock<Arc<CacheConfig<K, V>>>,
    pub informant: Arc<Informant>,
}

/// The named-cache directory. One instance per process (spec §5
/// "Shared-resource policy" — the Overseer registry is a process-wide
/// singleton with explicit init/teardown).
pub struct Overseer<K, V> {
    caches: DashMap<String, Arc<CacheRecord<K, V>>>,
}

impl<K, V> Overseer<K, V> {
    pub fn new() -> Self {
        Self {
            caches: DashMap::new(),
        }
    }

    /// Register a cache under its config's name. Fails if the name is
    /// already registered (use `ensure` to get-or-create instead).
    pub fn set(&self, config: CacheConfig<K, V>, informant: Arc<Informant>) -> CacheResult<()> {
        let name = config.name.clone();
        if self.caches.contains_key(&name) {
            return Err(CacheError::InvalidName);
        }
        self.caches.insert(
            name,
            Arc::new(CacheRecord {
                config: RwLock::new(Arc::new(config)),
                informant,
            }),
        );
        Ok(())
    }

    /// Resolve a cache's current record by name.
    pub fn get(&self, name: &str) -> CacheResult<Arc<CacheRecord<K, V>>> {
        self.caches
            .get(name)
            .map(|r| r.clone())
            .ok_or(CacheError::NoCache)
    }

    /// Remove a cache from the registry (its tasks are not stopped
    /// here — that's the `Cache` facade's job on drop/shutdown).
    pub fn del(&self, name: &str) -> bool {
        self.caches.remove(name).is_some()
    }

    pub fn member(&self, name: &str) -> bool {
        self.caches.contains_key(name)
    }

    /// Get-or-create: if `name` is already registered, return its
    /// existing record; otherwise register `config` under it.
    pub fn ensure(
        &self,
        config: CacheConfig<K, V>,
        informant: Arc<Informant>,
    ) -> Arc<CacheRecord<K, V>> {
        self.caches
            .entry(config.name.clone())
            .or_insert_with(|| {
                Arc::new(CacheRecord {
                    config: RwLock::new(Arc::new(config)),
                    informant,
                })
            })
            .clone()
    }

    /// Run `f` against the current config under an exclusive
    /// serializer for this one name (spec §4.7): on success the new
    /// config replaces the old and every `provide:[:cache]` hook is
    /// re-provisioned; on failure the prior config is left intact.
    pub async fn update<F>(&self, name: &str, f: F) -> CacheResult<()>
    where
        F: FnOnce(&CacheConfig<K, V>) -> CacheResult<CacheConfig<K, V>>,
        K: Send + Sync,
        V: Send + Sync,
    {
        let record = self.get(name)?;
        let mut guard = record.config.write().await;

        match f(&guard) {
            Ok(new_config) => {
                *guard = Arc::new(new_config);
                drop(guard);
                // Provisioning hooks only need a lightweight witness
                // that config changed; the hooks already hold a
                // reference to the Overseer if they need the full
                // record.
                record
                    .informant
                    .provision_config(Arc::from(name.to_string()))
                    .await;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

impl<K, V> Default for Overseer<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
