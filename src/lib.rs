//! # wardenkv
//!
//! An embeddable, in-process key/value cache with per-entry TTL
//! expiration, policy-driven size bounds, transactional multi-key
//! operations, observable side-effects via hooks, and fallback-driven
//! value population on miss.
//!
//! ## Architecture
//!
//! - [`entry`]: the stored `{touched, ttl, value}` record.
//! - [`keyspace`]: the concurrent key→entry map (the Keyspace Table).
//! - [`locksmith`]: the global lock table and per-cache transaction
//!   queue.
//! - [`expiration`]: lazy purge-on-read plus the periodic Janitor
//!   sweeper.
//! - [`action`]: the uniform pre-hook → op → post-hook pipeline every
//!   public operation runs through.
//! - [`hook`]: the Informant hook runtime (pre/post observers).
//! - [`policy`]: the eviction policy interface and the reference LRW
//!   implementation.
//! - [`overseer`]: the named-cache directory.
//! - [`fallback`]: on-miss value population for read-through actions.
//! - [`warmer`]: startup pre-population routines.
//! - [`inspect`]: diagnostics, counters, and the `inspect`/`stats`
//!   actions' payload types.
//! - [`dump`]: the on-disk snapshot codec.
//! - [`config`]: the validated per-cache configuration record and its
//!   option-record building blocks.
//! - [`cache`]: the public `Cache<K, V>` facade tying every subsystem
//!   together.
//! - [`warden`]: the process-wide Overseer/Locksmith pairing.
//!
//! Configuration parsing/validation, disk import/export tooling beyond
//! the opaque dump codec, the statistics hook's presentation layer,
//! and a command-line/embedding surface are explicitly out of scope —
//! this crate is the engine underneath those, not the app around it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod action;
pub mod cache;
pub mod config;
pub mod dump;
pub mod entry;
pub mod error;
pub mod expiration;
pub mod fallback;
pub mod hook;
pub mod inspect;
pub mod keyspace;
pub mod locksmith;
pub mod overseer;
pub mod policy;
pub mod warden;
pub mod warmer;

pub use cache::{Cache, ResetTarget};
pub use config::CacheConfig;
pub use entry::Entry;
pub use error::{CacheError, CacheResult};
pub use warden::Warden;

/// Install a `tracing` subscriber reading its filter from `RUST_LOG`
/// (default `info`). Optional: an embedder already running its own
/// subscriber should skip this and just depend on the crate's
/// `tracing` events directly.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();
}

/// Re-export of the crate version, for embedders that want to log or
/// assert against it without depending on `CARGO_PKG_VERSION` directly.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
