mod models_cache;

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::error::PlaygroundError;
use crate::protocol::ModelDescriptor;
use crate::upstream::ModelApi;

pub use models_cache::ModelsCache;

/// Shared application state accessible to all handlers.
pub struct AppState {
    pub config: AppConfig,
    pub upstream: Arc<dyn ModelApi>,
    models_cache: ModelsCache,
}

impl AppState {
    #[must_use]
    pub fn new(config: AppConfig, upstream: Arc<dyn ModelApi>) -> Self {
        Self::with_clock(config, upstream, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(config: AppConfig, upstream: Arc<dyn ModelApi>, clock: Arc<dyn Clock>) -> Self {
        let models_cache = ModelsCache::new(config.server.models_cache_ttl_secs, clock);
        Self {
            config,
            upstream,
            models_cache,
        }
    }

    #[must_use]
    pub fn models_cache(&self) -> &ModelsCache {
        &self.models_cache
    }

    /// Model list through the TTL cache.
    ///
    /// # Errors
    ///
    /// Propagates the upstream error on a cache miss.
    pub async fn models(&self) -> Result<Arc<[ModelDescriptor]>, PlaygroundError> {
        let upstream = Arc::clone(&self.upstream);
        self.models_cache
            .get_or_fetch(|| async move { upstream.list_models().await })
            .await
    }
}
