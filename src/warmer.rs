//! Startup cache warmers (spec §4.8 / §6 `warmer{module, state, async?}`).

use async_trait::async_trait;

/// A startup routine that pre-populates a cache before it serves its
/// first request.
#[async_trait]
pub trait Warmer<K, V>: Send + Sync {
    /// Produce the initial `(key, value)` pairs to seed the cache
    /// with. Errors are logged and otherwise swallowed — a failing
    /// warmer should not prevent the cache from starting (spec §4.4's
    /// general "action errors never abort the cache" posture extends
    /// to startup warmers).
    async fn warm(&self) -> Vec<(K, V)>;
}

/// A registered warmer descriptor.
pub struct WarmerSpec<K, V> {
    pub module: String,
    pub is_async: bool,
    pub warmer: Box<dyn Warmer<K, V>>,
}

impl<K, V> WarmerSpec<K, V> {
    pub fn new(module: impl Into<String>, warmer: Box<dyn Warmer<K, V>>) -> Self {
        Self {
            module: module.into(),
            is_async: true,
            warmer,
        }
    }
}
