//! Cache configuration records (spec §3 "Cache config", §6 "Option
//! record forms").
//!
//! Parsing and validating these from untyped input (CLI flags, a TOML
//! file, ...) is out of scope for this engine (spec §1) — by the time
//! a `CacheConfig` reaches the Overseer it is assumed valid. What
//! follows are the record shapes themselves, with the `Default` impls
//! a validated-record consumer expects.

use std::time::Duration;
use uuid::Uuid;

use std::sync::Arc;

use crate::fallback::Fallback;
use crate::hook::{HookObserver, HookSpec};
use crate::policy::Policy;
use crate::warmer::WarmerSpec;

/// `expiration{default, interval, lazy}` (spec §6).
#[derive(Debug, Clone)]
pub struct ExpirationOptions {
    /// TTL applied to writes that don't specify one. `None` = no
    /// default (writes without an explicit TTL never expire).
    pub default: Option<Duration>,
    /// Janitor sweep interval. `None` disables the periodic sweeper.
    pub interval: Option<Duration>,
    /// Whether reads purge-on-access when they observe a dead entry.
    pub lazy: bool,
}

impl Default for ExpirationOptions {
    fn default() -> Self {
        Self {
            default: None,
            interval: Some(Duration::from_secs(3)),
            lazy: true,
        }
    }
}

/// `limit{size, policy, reclaim, options}` (spec §4.6/§6).
pub struct LimitOptions<K, V> {
    /// The soft size bound the policy reacts to.
    pub size: usize,
    /// The eviction policy installed as a post-hook.
    pub policy: Box<dyn Policy<K, V>>,
    /// Fraction of `size` to evict once the bound is crossed.
    pub reclaim: f64,
    /// Trigger threshold, as a fraction of `size` (1.0 = act only once
    /// strictly over the bound; spec §4.6 default).
    pub trigger: f64,
    /// Batch size the policy's periodic wake uses when scanning.
    pub batch: usize,
}

impl<K, V> LimitOptions<K, V>
where
    K: Eq + std::hash::Hash + Clone + Ord + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Build limit options around the LRW reference policy — the
    /// common case spec §4.6 describes as the default.
    pub fn lrw(size: usize) -> Self {
        Self {
            size,
            policy: Box::new(crate::policy::lrw::Lrw::default()),
            reclaim: 0.1,
            trigger: 1.0,
            batch: 500,
        }
    }
}

/// `fallback{default, provide}` (spec §4.8/§6).
pub struct FallbackOptions<K, V> {
    /// The function/state pair invoked on a read-through miss. Kept
    /// behind an `Arc` (not a `Box`) so a single registered fallback
    /// can be cheaply shared with an ad hoc per-call override in
    /// `Cache::fetch` without re-allocating.
    pub default: Arc<dyn Fallback<K, V>>,
}

impl<K, V> FallbackOptions<K, V> {
    /// Wrap a bare closure as a fallback with no extra provisioned state.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fallback<K, V> + 'static,
    {
        Self {
            default: Arc::new(f),
        }
    }
}

/// `command{type, execute}` (spec §6) — a user-defined action looked
/// up by name, modeled as a tagged `(type, fn)` pair rather than an
/// open trait hierarchy (spec §9).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandType {
    /// Does not mutate the keyspace; safe to run without locking.
    Read,
    /// Mutates the keyspace; routed through the transaction queue.
    Write,
}

/// What a command's `execute` function hands back: either a value to
/// return to the caller without touching the keyspace, or a value to
/// both write back and return (spec §6 "command execution result").
pub enum CommandOutcome<V> {
    Return(V),
    Write(V),
}

/// A single registered command (spec §6 `command{type, execute}`):
/// looked up by name via [`crate::cache::Cache::invoke`] and run
/// against the current value stored at a key (or `None` on a miss).
pub struct CommandSpec<K, V> {
    pub name: String,
    pub kind: CommandType,
    pub execute: Box<dyn Fn(&K, Option<&V>) -> CommandOutcome<V> + Send + Sync>,
}

impl<K, V> CommandSpec<K, V> {
    pub fn new<F>(name: impl Into<String>, kind: CommandType, execute: F) -> Self
    where
        F: Fn(&K, Option<&V>) -> CommandOutcome<V> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind,
            execute: Box::new(execute),
        }
    }
}

/// A single named, opaque per-cache hook/command/warmer identifier.
pub type ConfigId = Uuid;

/// The full, validated per-cache configuration record (spec §3).
///
/// Once built it is read-mostly: the [`crate::overseer::Overseer`]
/// mediates every subsequent change through a compare-and-swap style
/// `update`.
pub struct CacheConfig<K, V> {
    /// The cache's registered name.
    pub name: String,
    /// TTL defaulting and lazy-purge behavior.
    pub expiration: ExpirationOptions,
    /// Read-through miss population, if configured.
    pub fallback: Option<FallbackOptions<K, V>>,
    /// Pre/post observers, paired with the descriptor the Informant
    /// registers them under.
    pub hooks: Vec<(HookSpec, Arc<dyn HookObserver>)>,
    /// Size bound and eviction policy, if configured.
    pub limit: Option<LimitOptions<K, V>>,
    /// Whether this cache enrolls in multi-key transactions at all
    /// (spec §3 — `transactional` flag).
    pub transactional: bool,
    /// Startup pre-population routines.
    pub warmers: Vec<WarmerSpec<K, V>>,
    /// User-defined named commands, looked up by name on `invoke`.
    pub commands: Vec<CommandSpec<K, V>>,
    /// Whether hit/miss/write/eviction/expiration counters accumulate
    /// at all (spec §6 `stats` error atom: disabled -> `StatsDisabled`).
    pub stats_enabled: bool,
}

impl<K, V> CacheConfig<K, V> {
    /// Construct a config record from already-validated fields. This
    /// is the only constructor: there is deliberately no `from_raw`/
    /// parser entry point here (spec §1's scope line — "out of scope:
    /// ... configuration parsing and validation").
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expiration: ExpirationOptions::default(),
            fallback: None,
            hooks: Vec::new(),
            limit: None,
            transactional: true,
            warmers: Vec::new(),
            commands: Vec::new(),
            stats_enabled: true,
        }
    }

    /// Builder-style toggle for statistics collection.
    pub fn with_stats_enabled(mut self, enabled: bool) -> Self {
        self.stats_enabled = enabled;
        self
    }

    /// Builder-style attach of expiration options.
    pub fn with_expiration(mut self, expiration: ExpirationOptions) -> Self {
        self.expiration = expiration;
        self
    }

    /// Builder-style attach of a fallback.
    pub fn with_fallback(mut self, fallback: FallbackOptions<K, V>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Builder-style attach of a size limit/policy.
    pub fn with_limit(mut self, limit: LimitOptions<K, V>) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Builder-style hook registration.
    pub fn with_hook(mut self, hook: HookSpec, observer: Arc<dyn HookObserver>) -> Self {
        self.hooks.push((hook, observer));
        self
    }

    /// Builder-style warmer registration.
    pub fn with_warmer(mut self, warmer: WarmerSpec<K, V>) -> Self {
        self.warmers.push(warmer);
        self
    }

    /// Builder-style command registration.
    pub fn with_command(mut self, command: CommandSpec<K, V>) -> Self {
        self.commands.push(command);
        self
    }
}
