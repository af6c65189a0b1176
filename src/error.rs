//! Error taxonomy for the cache engine.
//!
//! Every action returns a tagged result (see [`crate::action::Outcome`]);
//! `CacheError` is the `error` tag's payload. No action panics or
//! propagates a Rust panic across its boundary — runtime faults inside
//! hooks, the transaction queue, or a fallback are caught and reported
//! through this type instead (spec §7).

use thiserror::Error;

/// Every externally visible error atom the engine can produce.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// No cache is registered under the given name.
    #[error("no cache registered under this name")]
    NoCache,

    /// The global Overseer/Locksmith singletons have not been started.
    #[error("cache subsystem not started")]
    NotStarted,

    /// A cache name failed validation (empty, duplicate, ...).
    #[error("invalid cache name")]
    InvalidName,

    /// A generic option record failed validation.
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// A user command descriptor was malformed.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// An expiration option record was malformed.
    #[error("invalid expiration options: {0}")]
    InvalidExpiration(String),

    /// A fallback option record was malformed.
    #[error("invalid fallback options: {0}")]
    InvalidFallback(String),

    /// A hook descriptor was malformed.
    #[error("invalid hook: {0}")]
    InvalidHook(String),

    /// A limit/policy option record was malformed.
    #[error("invalid limit options: {0}")]
    InvalidLimit(String),

    /// A warmer descriptor was malformed.
    #[error("invalid warmer: {0}")]
    InvalidWarmer(String),

    /// A match/select predicate could not be applied.
    #[error("invalid match spec")]
    InvalidMatch,

    /// `inspect(janitor)` was called on a cache with no sweeper.
    #[error("janitor disabled for this cache")]
    JanitorDisabled,

    /// Statistics were requested on a cache that disabled them.
    #[error("statistics collection disabled for this cache")]
    StatsDisabled,

    /// A non-transactional writer lost a race for a locked key.
    #[error("key is locked by another transaction")]
    Locked,

    /// `incr`/`decr` was applied to a non-numeric stored value.
    #[error("stored value is not numeric")]
    NonNumericValue,

    /// `dump`/`load` could not reach the given file path.
    #[error("unreachable file: {0}")]
    UnreachableFile(String),

    /// A hook or fallback raised an internal fault; the action itself
    /// still completed (spec §7: "action succeeds, fault is reported").
    #[error("internal fault: {0}")]
    Internal(String),
}

impl From<std::io::Error> for CacheError {
    fn from(e: std::io::Error) -> Self {
        CacheError::UnreachableFile(e.to_string())
    }
}

impl From<bincode::Error> for CacheError {
    fn from(e: bincode::Error) -> Self {
        CacheError::Internal(format!("dump codec error: {e}"))
    }
}

/// Convenience alias used throughout the crate.
pub type CacheResult<T> = Result<T, CacheError>;
