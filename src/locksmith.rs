//! The Locksmith (spec §4.2): the global cross-cache lock table plus
//! one serializing transaction-queue task per cache.
//!
//! The global lock table is modeled directly on
//! `caddy::enterprise::cache::lock::DistributedMutex`'s
//! `DashMap<K, LockHolder>`, generalized to a `(cache, key)` pair and
//! stripped of the distributed fencing-token/lease machinery that
//! doesn't apply to an in-process engine. The per-cache queue is the
//! actor pattern seen throughout the pack's GenServer-style cache
//! actors: a dedicated task owning an `mpsc` mailbox is the
//! serialization point, so uncontested writes never have to touch the
//! global lock table at all (spec §4.2's design rationale).

use dashmap::DashMap;
use std::any::Any;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::error::{CacheError, CacheResult};

/// Opaque id of whoever is allowed to hold a lock: either a specific
/// caller-supplied owner, or the cache's own transaction queue acting
/// on a transaction's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    /// A transaction identified by its queue-assigned id.
    Transaction(Uuid),
}

/// Global, process-wide `(cache_name, key) -> owner` lock table (spec
/// §3 "Lock table (global)"). At most one owner per pair at any
/// instant.
pub struct GlobalLocks<K> {
    table: DashMap<(String, K), Owner>,
}

impl<K> GlobalLocks<K>
where
    K: Eq + Hash + Clone + Debug + Send + Sync,
{
    pub fn new() -> Self {
        Self {
            table: DashMap::new(),
        }
    }

    /// `write_allowed?` (spec §4.2): true iff nothing holds the key,
    /// or the holder is the given transaction.
    pub fn write_allowed(&self, cache: &str, key: &K, caller: Option<Owner>) -> bool {
        match self.table.get(&(cache.to_string(), key.clone())) {
            None => true,
            Some(holder) => Some(*holder) == caller,
        }
    }

    /// Acquire every key in `keys` in one step for `owner`. Fails with
    /// `Locked` (and acquires nothing) if any key is already held.
    pub fn lock(&self, cache: &str, keys: &[K], owner: Owner) -> CacheResult<()> {
        for key in keys {
            if self.table.contains_key(&(cache.to_string(), key.clone())) {
                return Err(CacheError::Locked);
            }
        }
        for key in keys {
            self.table.insert((cache.to_string(), key.clone()), owner);
        }
        Ok(())
    }

    /// Release keys previously acquired by `owner`. Keys not actually
    /// held by `owner` are left untouched.
    pub fn unlock(&self, cache: &str, keys: &[K], owner: Owner) {
        for key in keys {
            let pair = (cache.to_string(), key.clone());
            if let Some(holder) = self.table.get(&pair) {
                if *holder != owner {
                    continue;
                }
            } else {
                continue;
            }
            self.table.remove(&pair);
        }
    }
}

impl<K> Default for GlobalLocks<K>
where
    K: Eq + Hash + Clone + Debug + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

type BoxedFn = Box<dyn FnOnce() -> Box<dyn Any + Send> + Send>;

enum QueueMessage {
    /// `{exec, f}` — runs to completion with no key locking.
    Exec {
        f: BoxedFn,
        reply: oneshot::Sender<CacheResult<Box<dyn Any + Send>>>,
    },
    /// `{transaction, keys, f}` — locks `keys`, runs `f`, unlocks.
    Transaction {
        keys: Vec<Box<dyn Any + Send>>,
        f: BoxedFn,
        reply: oneshot::Sender<CacheResult<Box<dyn Any + Send>>>,
    },
}

/// A single-threaded serializer for one cache's contested operations
/// (spec §4.2's "per-cache transaction queue"). Messages are handled
/// strictly in FIFO order, so transactions against the same cache are
/// totally ordered relative to one another and to routed `exec` calls.
///
/// Keyed operations are generic over `K`, but the queue's mailbox
/// can't be — it's instantiated once per `Cache<K, V>` and only ever
/// sees that cache's own key type, so the `Any` boxing here never
/// actually needs to downcast across types in practice; it exists so
/// the queue task itself stays non-generic and cheap to spawn.
pub struct TransactionQueue<K> {
    sender: mpsc::Sender<QueueMessage>,
    _marker: std::marker::PhantomData<K>,
}

impl<K> TransactionQueue<K>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
{
    /// Spawn the queue's worker task against the given cache's name
    /// and the global lock table it contests against.
    pub fn spawn(cache_name: String, locks: Arc<GlobalLocks<K>>) -> Self {
        let (tx, mut rx) = mpsc::channel::<QueueMessage>(1024);

        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                match msg {
                    QueueMessage::Exec { f, reply } => {
                        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f))
                            .map_err(|_| CacheError::Internal("exec panicked".into()));
                        let _ = reply.send(result);
                    }
                    QueueMessage::Transaction { keys, f, reply } => {
                        let owner = Owner::Transaction(Uuid::new_v4());
                        let typed_keys: Vec<K> = keys
                            .into_iter()
                            .map(|k| *k.downcast::<K>().expect("queue key type mismatch"))
                            .collect();

                        if let Err(e) = locks.lock(&cache_name, &typed_keys, owner) {
                            let _ = reply.send(Err(e));
                            continue;
                        }

                        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f))
                            .map_err(|_| CacheError::Internal("transaction panicked".into()));

                        locks.unlock(&cache_name, &typed_keys, owner);
                        let _ = reply.send(result);
                    }
                }
            }
        });

        Self {
            sender: tx,
            _marker: std::marker::PhantomData,
        }
    }

    /// Run `f` to completion with no key locking, serialized behind
    /// everything else already queued for this cache.
    pub async fn exec<F, R>(&self, f: F) -> CacheResult<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        let boxed: BoxedFn = Box::new(move || Box::new(f()) as Box<dyn Any + Send>);
        self.sender
            .send(QueueMessage::Exec { f: boxed, reply })
            .await
            .map_err(|_| CacheError::NotStarted)?;
        let result = rx.await.map_err(|_| CacheError::Internal("queue dropped reply".into()))??;
        Ok(*result.downcast::<R>().expect("exec result type mismatch"))
    }

    /// Lock `keys`, run `f`, unlock — strictly ordered against every
    /// other transaction/exec queued for this cache.
    pub async fn transaction<F, R>(&self, keys: Vec<K>, f: F) -> CacheResult<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        let boxed_keys: Vec<Box<dyn Any + Send>> = keys
            .into_iter()
            .map(|k| Box::new(k) as Box<dyn Any + Send>)
            .collect();
        let boxed: BoxedFn = Box::new(move || Box::new(f()) as Box<dyn Any + Send>);
        self.sender
            .send(QueueMessage::Transaction {
                keys: boxed_keys,
                f: boxed,
                reply,
            })
            .await
            .map_err(|_| CacheError::NotStarted)?;
        let result = rx.await.map_err(|_| CacheError::Internal("queue dropped reply".into()))??;
        Ok(*result.downcast::<R>().expect("transaction result type mismatch"))
    }
}
