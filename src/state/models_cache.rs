use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::clock::Clock;
use crate::error::PlaygroundError;
use crate::protocol::ModelDescriptor;

struct CachedModels {
    models: Arc<[ModelDescriptor]>,
    expires_at_ms: u64,
}

/// TTL cache for the upstream model list.
///
/// The lock is never held across the fetch, so concurrent misses may fetch
/// twice; the last writer wins. Failed fetches are not cached.
pub struct ModelsCache {
    entry: RwLock<Option<CachedModels>>,
    ttl_ms: u64,
    clock: Arc<dyn Clock>,
}

impl ModelsCache {
    /// A `ttl_secs` of 0 disables caching.
    #[must_use]
    pub fn new(ttl_secs: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entry: RwLock::new(None),
            ttl_ms: ttl_secs.saturating_mul(1000),
            clock,
        }
    }

    /// The cached list if present and not expired.
    #[must_use]
    pub fn cached(&self) -> Option<Arc<[ModelDescriptor]>> {
        let now = self.clock.now_millis();
        let entry = self.entry.read();
        entry
            .as_ref()
            .filter(|cached| now < cached.expires_at_ms)
            .map(|cached| Arc::clone(&cached.models))
    }

    /// Return the cached list, or run `fetch` and cache its result.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `fetch`; nothing is cached in that case.
    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<Arc<[ModelDescriptor]>, PlaygroundError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<ModelDescriptor>, PlaygroundError>>,
    {
        if let Some(models) = self.cached() {
            tracing::debug!(count = models.len(), "returning cached models");
            return Ok(models);
        }

        let models: Arc<[ModelDescriptor]> = fetch().await?.into();
        if self.ttl_ms > 0 {
            let expires_at_ms = self.clock.now_millis().saturating_add(self.ttl_ms);
            *self.entry.write() = Some(CachedModels {
                models: Arc::clone(&models),
                expires_at_ms,
            });
        }
        tracing::info!(count = models.len(), "models fetched");
        Ok(models)
    }

    pub fn invalidate(&self) {
        tracing::info!("clearing models cache");
        *self.entry.write() = None;
    }
}
