//! The public `Cache<K, V>` facade (spec §6): every external action
//! wired through the Action Pipeline onto the Keyspace Table, the
//! Locksmith, the Informant, the Janitor, and a cache's configured
//! policy/fallback/warmers/commands.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::action::{self, Outcome};
use crate::config::{CacheConfig, CommandOutcome, CommandType};
use crate::entry::{now_millis, Entry, Millis};
use crate::error::{CacheError, CacheResult};
use crate::expiration::{lazy_purge, Janitor};
use crate::fallback::{Fallback, FallbackOutcome};
use crate::hook::Informant;
use crate::inspect::{ApproxSize, CacheState, InspectResult, InspectTarget, Stats, StatsSnapshot};
use crate::keyspace::Keyspace;
use crate::locksmith::{GlobalLocks, Owner, TransactionQueue};
use crate::overseer::{CacheRecord, Overseer};

/// One running, named cache: the Keyspace Table plus every subsystem
/// wired around it. Holding a `Cache<K, V>` keeps its Janitor and
/// transaction-queue tasks alive — dropping the last one tears them
/// down (spec §5's "explicit init/teardown" shared-resource policy).
pub struct Cache<K, V> {
    name: String,
    keyspace: Arc<Keyspace<K, V>>,
    locks: Arc<GlobalLocks<K>>,
    queue: TransactionQueue<K>,
    record: Arc<CacheRecord<K, V>>,
    stats: Arc<Stats>,
    janitor: Option<Janitor>,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + Debug + 'static,
{
    /// Register and start a new named cache: registers `config` with
    /// `overseer`, starts each hook's task, runs any configured
    /// warmers, and spawns the Janitor if an expiration interval is
    /// set (spec §4.7/§4.5/§4.8/§4.3, in that startup order).
    pub async fn start(
        mut config: CacheConfig<K, V>,
        overseer: &Overseer<K, V>,
        locks: Arc<GlobalLocks<K>>,
    ) -> CacheResult<Self> {
        let name = config.name.clone();
        let interval = config.expiration.interval;
        let stats = Arc::new(Stats::new(config.stats_enabled));
        let keyspace: Arc<Keyspace<K, V>> = Arc::new(Keyspace::new());

        let informant = Arc::new(Informant::new());
        for (spec, observer) in &config.hooks {
            informant.register(spec.clone(), observer.clone()).await;
        }

        let warmers = std::mem::take(&mut config.warmers);
        for spec in &warmers {
            for (key, value) in spec.warmer.warm().await {
                keyspace.insert(key, Entry::new(value, config.expiration.default, now_millis()));
            }
        }
        config.warmers = warmers;

        overseer.set(config, informant.clone())?;
        let record = overseer.get(&name)?;

        let janitor = Janitor::spawn(keyspace.clone(), interval);
        let queue = TransactionQueue::spawn(name.clone(), locks.clone());

        Ok(Self {
            name,
            keyspace,
            locks,
            queue,
            record,
            stats,
            janitor,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    async fn enforce_limit(&self, config: &CacheConfig<K, V>) {
        let Some(limit) = &config.limit else { return };
        let before = self.keyspace.count();
        if (before as f64) <= (limit.size as f64) * limit.trigger {
            return;
        }
        limit.policy.on_write(&self.keyspace, limit.size, limit.reclaim, limit.batch);
        let after = self.keyspace.count();
        if after < before {
            self.stats.record_eviction((before - after) as u64);
        }
    }

    /// Purge `key` on read if it's dead and lazy purging is enabled.
    /// A purge fires a synthetic `{purge, []}` post-hook notification
    /// with result `{ok, 1}` (spec §4.3) so observers see the eviction
    /// even though no caller explicitly asked for it.
    async fn lazy_purge_if_configured(&self, key: &K, now: Millis) {
        let config = self.record.config.read().await;
        if config.expiration.lazy && lazy_purge(&self.keyspace, key, now) {
            self.stats.record_expiration(1);
            self.record
                .informant
                .dispatch_post(
                    crate::hook::Notification {
                        action: "purge",
                        args: vec![],
                    },
                    "Ok(1)".to_string(),
                )
                .await;
        }
    }

    /// Read a key through to a configured fallback on miss, with at
    /// most one fallback in flight per key (spec §4.8) via the same
    /// per-key slot the Locksmith's global lock table provides.
    async fn read_through(
        &self,
        key: &K,
        now: Millis,
        override_fallback: Option<&Arc<dyn Fallback<K, V>>>,
    ) -> Outcome<V> {
        if let Some(entry) = self.keyspace.lookup(key) {
            if entry.is_live(now) {
                self.stats.record_hit();
                return Outcome::Ok(entry.value);
            }
        }
        self.stats.record_miss();

        let config = self.record.config.read().await;
        let fallback = match override_fallback {
            Some(f) => Some(f.clone()),
            None => config.fallback.as_ref().map(|f| f.default.clone()),
        };
        let Some(fallback) = fallback else {
            return Outcome::Missing;
        };

        let owner = Owner::Transaction(Uuid::new_v4());
        if self
            .locks
            .lock(&self.name, std::slice::from_ref(key), owner)
            .is_err()
        {
            // Someone else is already populating this key; treat this
            // call as a plain miss rather than blocking (spec §4.8
            // guarantees at most one in flight, not that every racer
            // waits on it).
            return Outcome::Missing;
        }

        // Double-check under the lock: another fallback may have
        // already populated the key while we waited to acquire it.
        if let Some(entry) = self.keyspace.lookup(key) {
            if entry.is_live(now) {
                self.locks.unlock(&self.name, std::slice::from_ref(key), owner);
                self.stats.record_hit();
                return Outcome::Ok(entry.value);
            }
        }

        let outcome = match fallback.call(key).await {
            FallbackOutcome::Commit(value) => {
                self.keyspace.insert(
                    key.clone(),
                    Entry::new(value.clone(), config.expiration.default, now),
                );
                self.stats.record_write();
                self.enforce_limit(&config).await;
                Outcome::Commit(value)
            }
            FallbackOutcome::Ignore(value) => Outcome::Ignore(value),
            FallbackOutcome::Error(e) => Outcome::Error(e),
        };

        self.locks.unlock(&self.name, std::slice::from_ref(key), owner);
        outcome
    }

    /// `get(key)` — a plain lookup that, per this engine's reading of
    /// spec §4.8, runs the configured fallback on a miss (see
    /// `DESIGN.md` for why `get` is read-through here).
    pub async fn get(&self, key: &K) -> CacheResult<Outcome<V>> {
        let now = now_millis();
        self.lazy_purge_if_configured(key, now).await;
        let args = vec![format!("{key:?}")];
        let outcome = action::dispatch(&self.record.informant, "get", args, true, || async {
            self.read_through(key, now, None).await
        })
        .await;
        Ok(outcome)
    }

    /// `fetch(key, fallback?)` — like `get`, but lets the caller
    /// supply a one-off fallback overriding the configured default.
    pub async fn fetch(
        &self,
        key: &K,
        fallback: Option<Arc<dyn Fallback<K, V>>>,
    ) -> CacheResult<Outcome<V>> {
        let now = now_millis();
        self.lazy_purge_if_configured(key, now).await;
        let args = vec![format!("{key:?}")];
        let outcome = action::dispatch(&self.record.informant, "fetch", args, true, || async {
            self.read_through(key, now, fallback.as_ref()).await
        })
        .await;
        Ok(outcome)
    }

    /// `set(key, value, ttl?)`.
    pub async fn set(&self, key: K, value: V, ttl: Option<Duration>) -> CacheResult<Outcome<V>> {
        if !self.locks.write_allowed(&self.name, &key, None) {
            return Err(CacheError::Locked);
        }
        let now = now_millis();
        let config = self.record.config.read().await;
        let effective_ttl = ttl.or(config.expiration.default);
        let args = vec![format!("{key:?}")];

        let outcome = action::dispatch(&self.record.informant, "set", args, true, || async {
            self.keyspace
                .insert(key.clone(), Entry::new(value.clone(), effective_ttl, now));
            self.stats.record_write();
            Outcome::Ok(value)
        })
        .await;

        self.enforce_limit(&config).await;
        Ok(outcome)
    }

    /// `del(key)`.
    pub async fn del(&self, key: &K) -> CacheResult<Outcome<bool>> {
        if !self.locks.write_allowed(&self.name, key, None) {
            return Err(CacheError::Locked);
        }
        let args = vec![format!("{key:?}")];
        let outcome = action::dispatch(&self.record.informant, "del", args, true, || async {
            Outcome::Ok(self.keyspace.delete(key))
        })
        .await;
        Ok(outcome)
    }

    /// `exists?(key)`.
    pub async fn exists(&self, key: &K) -> CacheResult<Outcome<bool>> {
        let now = now_millis();
        self.lazy_purge_if_configured(key, now).await;
        let args = vec![format!("{key:?}")];
        let outcome = action::dispatch(&self.record.informant, "exists", args, true, || async {
            Outcome::Ok(self.keyspace.lookup(key).is_some_and(|e| e.is_live(now)))
        })
        .await;
        Ok(outcome)
    }

    /// `count` — live entries only (dead-but-unpurged rows excluded).
    pub async fn count(&self) -> CacheResult<Outcome<usize>> {
        let now = now_millis();
        let outcome = action::dispatch(&self.record.informant, "count", vec![], true, || async {
            Outcome::Ok(self.keyspace.live_keys(now).len())
        })
        .await;
        Ok(outcome)
    }

    /// `size` — raw table length, including unpurged dead rows.
    pub async fn size(&self) -> CacheResult<Outcome<usize>> {
        let outcome = action::dispatch(&self.record.informant, "size", vec![], true, || async {
            Outcome::Ok(self.keyspace.count())
        })
        .await;
        Ok(outcome)
    }

    /// `keys` — every currently live key.
    pub async fn keys(&self) -> CacheResult<Outcome<Vec<K>>> {
        let now = now_millis();
        let outcome = action::dispatch(&self.record.informant, "keys", vec![], true, || async {
            Outcome::Ok(self.keyspace.live_keys(now))
        })
        .await;
        Ok(outcome)
    }

    /// `empty?`.
    pub async fn is_empty(&self) -> CacheResult<Outcome<bool>> {
        let outcome = action::dispatch(&self.record.informant, "empty", vec![], true, || async {
            Outcome::Ok(self.keyspace.count() == 0)
        })
        .await;
        Ok(outcome)
    }

    /// `clear`.
    pub async fn clear(&self) -> CacheResult<Outcome<usize>> {
        let outcome = action::dispatch(&self.record.informant, "clear", vec![], true, || async {
            Outcome::Ok(self.keyspace.clear())
        })
        .await;
        Ok(outcome)
    }

    /// `purge` — force an immediate expired-entry sweep, independent
    /// of the Janitor's own schedule.
    pub async fn purge(&self) -> CacheResult<Outcome<usize>> {
        let outcome = action::dispatch(&self.record.informant, "purge", vec![], true, || async {
            let now = now_millis();
            let removed = self.keyspace.select_delete(now, |e, now| !e.is_live(now));
            if removed > 0 {
                self.stats.record_expiration(removed as u64);
            }
            Outcome::Ok(removed)
        })
        .await;
        Ok(outcome)
    }

    /// `take(key)` — atomic get-and-delete.
    pub async fn take(&self, key: &K) -> CacheResult<Outcome<V>> {
        if !self.locks.write_allowed(&self.name, key, None) {
            return Err(CacheError::Locked);
        }
        let args = vec![format!("{key:?}")];
        let outcome = action::dispatch(&self.record.informant, "take", args, true, || async {
            let now = now_millis();
            match self.keyspace.take(key) {
                Some(entry) if entry.is_live(now) => {
                    self.stats.record_hit();
                    Outcome::Ok(entry.value)
                }
                Some(_) => {
                    self.stats.record_expiration(1);
                    Outcome::Missing
                }
                None => {
                    self.stats.record_miss();
                    Outcome::Missing
                }
            }
        })
        .await;
        Ok(outcome)
    }

    /// `update(key, value)` — replace a live key's value in place,
    /// leaving `touched`/`ttl` untouched. `false` if the key is absent.
    pub async fn update(&self, key: &K, value: V) -> CacheResult<Outcome<bool>> {
        if !self.locks.write_allowed(&self.name, key, None) {
            return Err(CacheError::Locked);
        }
        let args = vec![format!("{key:?}")];
        let outcome = action::dispatch(&self.record.informant, "update", args, true, || async {
            let existed = self.keyspace.update_fields(key, |e| e.value = value);
            if existed {
                self.stats.record_write();
            }
            Outcome::Ok(existed)
        })
        .await;
        Ok(outcome)
    }

    /// `ttl(key)` — milliseconds remaining, `None` if the key never
    /// expires, `Missing` if the key isn't present (or already dead).
    pub async fn ttl(&self, key: &K) -> CacheResult<Outcome<Option<Millis>>> {
        let args = vec![format!("{key:?}")];
        let outcome = action::dispatch(&self.record.informant, "ttl", args, true, || async {
            let now = now_millis();
            match self.keyspace.lookup(key) {
                Some(entry) if entry.is_live(now) => Outcome::Ok(entry.remaining_millis(now)),
                _ => Outcome::Missing,
            }
        })
        .await;
        Ok(outcome)
    }

    /// `expire(key, ttl)` — (re)arm a TTL counted from now.
    pub async fn expire(&self, key: &K, ttl: Duration) -> CacheResult<Outcome<bool>> {
        if !self.locks.write_allowed(&self.name, key, None) {
            return Err(CacheError::Locked);
        }
        let args = vec![format!("{key:?}")];
        let outcome = action::dispatch(&self.record.informant, "expire", args, true, || async {
            let now = now_millis();
            let existed = self.keyspace.update_fields(key, |e| {
                e.touched = now;
                e.ttl = Some(ttl);
            });
            Outcome::Ok(existed)
        })
        .await;
        Ok(outcome)
    }

    /// `expire_at(key, at_millis)` — arm a TTL expiring at an absolute
    /// wall-clock instant.
    pub async fn expire_at(&self, key: &K, at_millis: Millis) -> CacheResult<Outcome<bool>> {
        if !self.locks.write_allowed(&self.name, key, None) {
            return Err(CacheError::Locked);
        }
        let args = vec![format!("{key:?}")];
        let outcome = action::dispatch(&self.record.informant, "expire_at", args, true, || async {
            let now = now_millis();
            let existed = self.keyspace.update_fields(key, |e| {
                e.touched = now;
                e.ttl = Some(Duration::from_millis(at_millis.saturating_sub(now)));
            });
            Outcome::Ok(existed)
        })
        .await;
        Ok(outcome)
    }

    /// `persist(key)` — strip a key's TTL so it never expires.
    pub async fn persist(&self, key: &K) -> CacheResult<Outcome<bool>> {
        if !self.locks.write_allowed(&self.name, key, None) {
            return Err(CacheError::Locked);
        }
        let args = vec![format!("{key:?}")];
        let outcome = action::dispatch(&self.record.informant, "persist", args, true, || async {
            Outcome::Ok(self.keyspace.update_fields(key, |e| e.ttl = None))
        })
        .await;
        Ok(outcome)
    }

    /// `refresh(key)` — slide a key's expiry window forward from now,
    /// keeping its configured TTL duration.
    pub async fn refresh(&self, key: &K) -> CacheResult<Outcome<bool>> {
        if !self.locks.write_allowed(&self.name, key, None) {
            return Err(CacheError::Locked);
        }
        let args = vec![format!("{key:?}")];
        let outcome = action::dispatch(&self.record.informant, "refresh", args, true, || async {
            let now = now_millis();
            Outcome::Ok(self.keyspace.update_fields(key, |e| e.touched = now))
        })
        .await;
        Ok(outcome)
    }

    /// `touch(key)` — the same `touched`-bump primitive as `refresh`,
    /// exposed under its own action name because the lazy
    /// touch-on-access path (when configured) and the explicit
    /// `refresh` action are observably distinct notifications even
    /// though they share an implementation.
    pub async fn touch(&self, key: &K) -> CacheResult<Outcome<bool>> {
        if !self.locks.write_allowed(&self.name, key, None) {
            return Err(CacheError::Locked);
        }
        let args = vec![format!("{key:?}")];
        let outcome = action::dispatch(&self.record.informant, "touch", args, true, || async {
            let now = now_millis();
            Outcome::Ok(self.keyspace.update_fields(key, |e| e.touched = now))
        })
        .await;
        Ok(outcome)
    }

    /// `transaction(keys, f)` — serialize `f` against `keys` behind
    /// the per-cache queue (spec §4.2). Fails `InvalidOption` if this
    /// cache isn't enrolled for transactions.
    pub async fn transaction<F, R>(&self, keys: Vec<K>, f: F) -> CacheResult<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if !self.record.config.read().await.transactional {
            return Err(CacheError::InvalidOption(
                "cache is not enrolled for transactions".into(),
            ));
        }
        self.queue.transaction(keys, f).await
    }

    /// `execute(f)` — run `f` serialized against this cache's queue
    /// with no key locking.
    pub async fn execute<F, R>(&self, f: F) -> CacheResult<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.queue.exec(f).await
    }

    /// `reset(target, args)` — spec §4.5's reset protocol.
    pub async fn reset(&self, target: ResetTarget) -> CacheResult<()> {
        match target {
            ResetTarget::Cache => {
                self.keyspace.clear();
            }
            ResetTarget::Hooks { modules, args } => {
                self.record
                    .informant
                    .reset(modules.as_deref(), args)
                    .await;
            }
            ResetTarget::Both { modules, args } => {
                self.keyspace.clear();
                self.record
                    .informant
                    .reset(modules.as_deref(), args)
                    .await;
            }
        }
        Ok(())
    }

    /// `inspect(target)`. `:janitor` fails `janitor_disabled` when no
    /// sweeper is running at all (spec §6) — distinct from a Janitor
    /// that's running but hasn't completed a sweep yet, which reports
    /// `JanitorLast(None)`.
    pub async fn inspect(&self, target: InspectTarget<'_, K>) -> CacheResult<InspectResult<K, V>>
    where
        V: ApproxSize,
    {
        if matches!(target, InspectTarget::JanitorLast) && self.janitor.is_none() {
            return Err(CacheError::JanitorDisabled);
        }

        let now = now_millis();
        Ok(match target {
            InspectTarget::ExpiredCount => {
                let count = self
                    .keyspace
                    .select(now, |e, now| !e.is_live(now))
                    .len();
                InspectResult::ExpiredCount(count)
            }
            InspectTarget::ExpiredKeys => {
                InspectResult::ExpiredKeys(self.keyspace.select(now, |e, now| !e.is_live(now)))
            }
            InspectTarget::JanitorLast => {
                InspectResult::JanitorLast(self.janitor.as_ref().and_then(|j| j.last_run()))
            }
            InspectTarget::MemoryBytes => InspectResult::MemoryBytes(self.keyspace.size_bytes()),
            InspectTarget::MemoryWords => {
                InspectResult::MemoryWords(self.keyspace.size_bytes() / std::mem::size_of::<usize>())
            }
            InspectTarget::Record(key) => InspectResult::Record(self.keyspace.lookup(key)),
            InspectTarget::State => InspectResult::State(CacheState {
                name: self.name.clone(),
                size: self.keyspace.count(),
                janitor_running: self.janitor.is_some(),
                stats_enabled: self.stats.enabled,
            }),
        })
    }

    /// `stats` — fails `StatsDisabled` if the cache wasn't configured
    /// to collect them.
    pub async fn stats(&self) -> CacheResult<StatsSnapshot> {
        if !self.stats.enabled {
            return Err(CacheError::StatsDisabled);
        }
        Ok(self.stats.snapshot())
    }

    /// `invoke(name, key)` — run a registered named command (spec §6
    /// `command{type, execute}`) against `key`'s current value.
    pub async fn invoke(&self, name: &str, key: &K) -> CacheResult<Outcome<V>> {
        let config = self.record.config.read().await;
        let command = config
            .commands
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| CacheError::InvalidCommand(name.to_string()))?;

        if command.kind == CommandType::Write && !self.locks.write_allowed(&self.name, key, None) {
            return Err(CacheError::Locked);
        }

        let args = vec![name.to_string(), format!("{key:?}")];
        let outcome = action::dispatch(&self.record.informant, "invoke", args, true, || async {
            let current = self.keyspace.lookup(key);
            match (command.execute)(key, current.as_ref().map(|e| &e.value)) {
                CommandOutcome::Return(value) => Outcome::Ok(value),
                CommandOutcome::Write(value) => {
                    let now = now_millis();
                    let ttl = current.as_ref().and_then(|e| e.ttl).or(config.expiration.default);
                    self.keyspace
                        .insert(key.clone(), Entry::new(value.clone(), ttl, now));
                    self.stats.record_write();
                    Outcome::Ok(value)
                }
            }
        })
        .await;
        Ok(outcome)
    }

    /// `dump(path)` — write every entry (dead or alive) to a framed
    /// snapshot file. Notified like every other action (spec §4.4),
    /// but `dump`/`load` return a plain entry count rather than an
    /// `Outcome<V>` — there's no single stored value a multi-entry
    /// snapshot could sensibly report as "the" result — so they go
    /// through the Informant directly instead of `action::dispatch`.
    pub async fn dump(&self, path: &std::path::Path) -> CacheResult<usize>
    where
        K: serde::Serialize,
        V: serde::Serialize,
    {
        let notification = crate::hook::Notification {
            action: "dump",
            args: vec![format!("{path:?}")],
        };
        self.record.informant.dispatch_pre(&notification).await;
        let entries = self.keyspace.snapshot();
        let count = entries.len();
        let result = crate::dump::dump(path, entries);
        let post_result = match &result {
            Ok(()) => format!("Ok({count})"),
            Err(e) => format!("Err({e:?})"),
        };
        self.record
            .informant
            .dispatch_post(notification, post_result)
            .await;
        result?;
        Ok(count)
    }

    /// `load(path, clear_first)` — read a framed snapshot back in.
    /// Additive unless `clear_first` is set (spec §6).
    pub async fn load(&self, path: &std::path::Path, clear_first: bool) -> CacheResult<usize>
    where
        K: for<'de> serde::Deserialize<'de>,
        V: for<'de> serde::Deserialize<'de>,
    {
        let notification = crate::hook::Notification {
            action: "load",
            args: vec![format!("{path:?}")],
        };
        self.record.informant.dispatch_pre(&notification).await;

        let outcome: CacheResult<usize> = (|| {
            let entries = crate::dump::load(path)?;
            if clear_first {
                self.keyspace.clear();
            }
            let count = entries.len();
            for (key, entry) in entries {
                self.keyspace.insert(key, entry);
            }
            Ok(count)
        })();

        self.record
            .informant
            .dispatch_post(notification, format!("{outcome:?}"))
            .await;

        let count = outcome?;
        self.stats.record_write();
        Ok(count)
    }
}

/// What a `reset` call targets (spec §4.5): the keyspace, the hook
/// runtime (optionally scoped to specific modules), or both.
pub enum ResetTarget {
    Cache,
    Hooks {
        modules: Option<Vec<String>>,
        args: Vec<String>,
    },
    Both {
        modules: Option<Vec<String>>,
        args: Vec<String>,
    },
}

/// A value that can be moved by a signed delta (spec §6 `incr`/`decr`).
/// Implemented only for the fixed-width integers an embedder is
/// realistically storing counters as — not a generic numeric-tower
/// abstraction.
pub trait Numeric: Copy + Send + Sync {
    fn checked_move(self, delta: i64) -> Option<Self>;
}

macro_rules! impl_numeric {
    ($($t:ty),*) => {
        $(impl Numeric for $t {
            fn checked_move(self, delta: i64) -> Option<Self> {
                let delta = <$t>::try_from(delta).ok()?;
                self.checked_add(delta)
            }
        })*
    };
}

impl_numeric!(i8, i16, i32, i64, i128, isize);

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Numeric + Send + Sync + Debug + 'static,
{
    /// `incr(key, amount, initial)`.
    pub async fn incr(&self, key: &K, amount: i64, initial: V) -> CacheResult<Outcome<V>> {
        self.bump("incr", key, amount, initial).await
    }

    /// `decr(key, amount, initial)`.
    pub async fn decr(&self, key: &K, amount: i64, initial: V) -> CacheResult<Outcome<V>> {
        self.bump("decr", key, -amount, initial).await
    }

    async fn bump(
        &self,
        action_name: &'static str,
        key: &K,
        delta: i64,
        initial: V,
    ) -> CacheResult<Outcome<V>> {
        if !self.locks.write_allowed(&self.name, key, None) {
            return Err(CacheError::Locked);
        }
        let mut overflowed = false;
        let args = vec![format!("{key:?}")];
        let outcome = action::dispatch(&self.record.informant, action_name, args, true, || async {
            let now = now_millis();
            let value = self
                .keyspace
                .upsert_with(key.clone(), Entry::new(initial, None, now), |entry| {
                    match entry.value.checked_move(delta) {
                        Some(v) => entry.value = v,
                        None => overflowed = true,
                    }
                });
            Outcome::Ok(value)
        })
        .await;
        if overflowed {
            return Err(CacheError::NonNumericValue);
        }
        self.stats.record_write();
        Ok(outcome)
    }
}
