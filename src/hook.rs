//! The Informant / Hook Runtime (spec §4.5): one independent observer
//! task per registered hook, with async (fire-and-forget) or sync
//! (send-and-wait-up-to-timeout) delivery, live config provisioning,
//! and the `reset` protocol.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

/// Which half of the action pipeline a hook observes (spec §3's Hook
/// descriptor `type` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookType {
    /// Delivered before the operation executes; may short-circuit it.
    Pre,
    /// Delivered after the operation executes, with its result.
    Post,
}

/// What a hook has declared it wants proactively re-delivered (spec
/// §4.5 "Provisions"). Modeled as a fixed tagged set rather than an
/// open capability list, per spec §9.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provision {
    /// Re-delivered a fresh `CacheConfig` snapshot whenever the
    /// Overseer commits an update.
    Cache,
}

/// The `(action_name, args)` notification every hook receives (spec
/// §4.4 step 2).
#[derive(Debug, Clone)]
pub struct Notification {
    pub action: &'static str,
    pub args: Vec<String>,
}

/// What a post-hook additionally receives: the notification plus the
/// action's outcome, rendered as a short debug string (hooks observe,
/// they don't need the full typed `Outcome<V>`).
#[derive(Debug, Clone)]
pub struct PostNotification {
    pub notification: Notification,
    pub result: String,
}

/// A message delivered into a hook's own mailbox.
#[derive(Debug, Clone)]
pub enum HookMessage {
    Pre(Notification),
    Post(PostNotification),
    /// `{reset, args}` — spec §4.5's reset protocol.
    Reset(Vec<String>),
    /// A fresh config snapshot, for hooks that provisioned `Cache`.
    Provision(Arc<str>),
}

/// A hook's identity: a module tag plus a unique instance id, so two
/// hooks registered under the same module name remain independently
/// addressable (this matters for the reset-protocol Open Question —
/// see `DESIGN.md`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(pub Uuid);

/// A registered hook descriptor (spec §3).
#[derive(Clone)]
pub struct HookSpec {
    pub id: HookId,
    pub module: String,
    pub kind: HookType,
    pub is_async: bool,
    pub timeout: Duration,
    pub max_timeout: Option<Duration>,
    pub args: Vec<String>,
    pub provisions: Vec<Provision>,
}

impl HookSpec {
    /// Register a new hook descriptor under `module`.
    pub fn new(module: impl Into<String>, kind: HookType) -> Self {
        Self {
            id: HookId(Uuid::new_v4()),
            module: module.into(),
            kind,
            is_async: true,
            timeout: Duration::from_millis(500),
            max_timeout: None,
            args: Vec::new(),
            provisions: Vec::new(),
        }
    }

    pub fn synchronous(mut self, timeout: Duration) -> Self {
        self.is_async = false;
        self.timeout = timeout;
        self
    }

    pub fn provide(mut self, provision: Provision) -> Self {
        self.provisions.push(provision);
        self
    }
}

/// A trait object implementing one hook's observation logic. Pre-hooks
/// may return `Some(short_circuit)` to replace the action's outcome
/// (spec §4.4 step 3); the short-circuit payload is rendered as a
/// string, mirroring how `PostNotification::result` carries outcomes
/// across the mailbox boundary.
#[async_trait::async_trait]
pub trait HookObserver: Send + Sync {
    async fn on_message(&self, message: HookMessage) -> Option<String>;
}

struct HookTask {
    spec: HookSpec,
    sender: mpsc::Sender<(HookMessage, Option<oneshot::Sender<Option<String>>>)>,
}

/// The per-cache supervisor of all registered hooks (spec §4.5's
/// Informant). Hook descriptors live in `CacheConfig`; this map from
/// id to running task handle is the other half of the arena+id scheme
/// spec §9 calls for — neither side owns the other's storage.
pub struct Informant {
    tasks: Mutex<Vec<HookTask>>,
}

impl Informant {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Start a hook's dedicated task and its mailbox.
    pub async fn register(&self, spec: HookSpec, observer: Arc<dyn HookObserver>) {
        let (tx, mut rx) =
            mpsc::channel::<(HookMessage, Option<oneshot::Sender<Option<String>>>)>(256);

        tokio::spawn(async move {
            while let Some((message, reply)) = rx.recv().await {
                let outcome = observer.on_message(message).await;
                if let Some(reply) = reply {
                    let _ = reply.send(outcome);
                }
            }
        });

        self.tasks.lock().await.push(HookTask { spec, sender: tx });
    }

    /// Dispatch a pre-hook notification to every registered pre-hook,
    /// in registration order. Returns the first short-circuit result
    /// encountered, if any (spec §4.4 step 3).
    pub async fn dispatch_pre(&self, notification: &Notification) -> Option<String> {
        let tasks = self.tasks.lock().await;
        for task in tasks.iter().filter(|t| t.spec.kind == HookType::Pre) {
            if let Some(result) =
                Self::deliver(task, HookMessage::Pre(notification.clone())).await
            {
                return Some(result);
            }
        }
        None
    }

    /// Dispatch a post-hook notification to every registered post-hook.
    /// A hook runtime fault is logged and otherwise ignored — per spec
    /// §4.4/§7 a post-hook fault never retroactively fails the action.
    pub async fn dispatch_post(&self, notification: Notification, result: String) {
        let tasks = self.tasks.lock().await;
        let post = PostNotification {
            notification,
            result,
        };
        for task in tasks.iter().filter(|t| t.spec.kind == HookType::Post) {
            let _ = Self::deliver(task, HookMessage::Post(post.clone())).await;
        }
    }

    async fn deliver(task: &HookTask, message: HookMessage) -> Option<String> {
        if task.spec.is_async {
            let _ = task.sender.send((message, None)).await;
            return None;
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        if task.sender.send((message, Some(reply_tx))).await.is_err() {
            return None;
        }

        match timeout(task.spec.timeout, reply_rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => None,
            Err(_) => {
                if let Some(max) = task.spec.max_timeout {
                    if task.spec.timeout > max {
                        warn!(hook = %task.spec.module, "hook exceeded max_timeout");
                    }
                }
                warn!(hook = %task.spec.module, "hook delivery timed out");
                None
            }
        }
    }

    /// Reset targeted hooks (`target` selects by module name, `None`
    /// means "all"). Every *instance* of a targeted module is reset —
    /// see `DESIGN.md` for why duplicate-module instances aren't
    /// collapsed to "reset only the first".
    pub async fn reset(&self, target: Option<&[String]>, args: Vec<String>) {
        let tasks = self.tasks.lock().await;
        for task in tasks.iter() {
            let matches = match target {
                None => true,
                Some(modules) => modules.iter().any(|m| m == &task.spec.module),
            };
            if matches {
                let _ = task
                    .sender
                    .send((HookMessage::Reset(args.clone()), None))
                    .await;
            }
        }
    }

    /// Push a fresh config snapshot to every hook that provisioned
    /// `Cache` (spec §4.5 Provisions), called by the Overseer after a
    /// successful `update`.
    pub async fn provision_config(&self, snapshot: Arc<str>) {
        let tasks = self.tasks.lock().await;
        for task in tasks
            .iter()
            .filter(|t| t.spec.provisions.contains(&Provision::Cache))
        {
            let _ = task
                .sender
                .send((HookMessage::Provision(snapshot.clone()), None))
                .await;
        }
    }
}

impl Default for Informant {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    struct Recorder {
        seen: Arc<StdMutex<Vec<String>>>,
    }

    #[async_trait::async_trait]
    impl HookObserver for Recorder {
        async fn on_message(&self, message: HookMessage) -> Option<String> {
            let label = match &message {
                HookMessage::Pre(n) => format!("pre:{}", n.action),
                HookMessage::Post(p) => format!("post:{}", p.notification.action),
                HookMessage::Reset(_) => "reset".to_string(),
                HookMessage::Provision(_) => "provision".to_string(),
            };
            self.seen.lock().unwrap().push(label);
            None
        }
    }

    struct SlowObserver {
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl HookObserver for SlowObserver {
        async fn on_message(&self, _message: HookMessage) -> Option<String> {
            tokio::time::sleep(self.delay).await;
            Some("too-late".to_string())
        }
    }

    #[tokio::test]
    async fn reset_hits_every_instance_of_a_duplicate_module() {
        let informant = Informant::new();
        let seen_a = Arc::new(StdMutex::new(Vec::new()));
        let seen_b = Arc::new(StdMutex::new(Vec::new()));

        informant
            .register(
                HookSpec::new("dup", HookType::Post),
                Arc::new(Recorder { seen: seen_a.clone() }),
            )
            .await;
        informant
            .register(
                HookSpec::new("dup", HookType::Post),
                Arc::new(Recorder { seen: seen_b.clone() }),
            )
            .await;

        informant.reset(None, vec![]).await;

        // give the fire-and-forget reset messages a chance to land
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(seen_a.lock().unwrap().as_slice(), ["reset"]);
        assert_eq!(seen_b.lock().unwrap().as_slice(), ["reset"]);
    }

    #[tokio::test]
    async fn reset_only_targets_named_modules_when_given() {
        let informant = Informant::new();
        let seen_dup = Arc::new(StdMutex::new(Vec::new()));
        let seen_other = Arc::new(StdMutex::new(Vec::new()));

        informant
            .register(
                HookSpec::new("dup", HookType::Post),
                Arc::new(Recorder { seen: seen_dup.clone() }),
            )
            .await;
        informant
            .register(
                HookSpec::new("other", HookType::Post),
                Arc::new(Recorder { seen: seen_other.clone() }),
            )
            .await;

        informant.reset(Some(&["dup".to_string()]), vec![]).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(seen_dup.lock().unwrap().as_slice(), ["reset"]);
        assert!(seen_other.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn sync_hook_delivery_times_out_without_blocking_the_action() {
        let informant = Informant::new();
        let spec = HookSpec::new("slow", HookType::Pre).synchronous(Duration::from_millis(10));
        informant
            .register(spec, Arc::new(SlowObserver { delay: Duration::from_millis(200) }))
            .await;

        let started = std::time::Instant::now();
        let result = informant
            .dispatch_pre(&Notification { action: "get", args: vec![] })
            .await;
        let elapsed = started.elapsed();

        assert!(result.is_none(), "a timed-out hook must not short-circuit the action");
        assert!(
            elapsed < Duration::from_millis(200),
            "dispatch_pre should return once the hook's own timeout elapses, not wait \
             for the slow observer: took {elapsed:?}"
        );
    }

    #[tokio::test]
    async fn provisioned_hook_receives_a_fresh_snapshot() {
        let informant = Informant::new();
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let spec = HookSpec::new("watcher", HookType::Post).provide(Provision::Cache);
        informant
            .register(spec, Arc::new(Recorder { seen: seen.clone() }))
            .await;

        informant.provision_config(Arc::from("cfg-snapshot")).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(seen.lock().unwrap().as_slice(), ["provision"]);
    }
}
