use cachegate::{Backend, CacheDispatcher, StorageFactory};
use shared::config::Config;
use std::sync::Arc;

/// Server state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    pub dispatcher: Arc<CacheDispatcher>,
}

impl AppState {
    pub fn new(dispatcher: CacheDispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Connect both backends once. Any failure aborts startup.
    pub async fn from_config(config: &Config, factory: &dyn StorageFactory) -> shared::Result<Self> {
        let redis = factory.create(Backend::Redis, &config.redis).await?;
        let memcache = factory.create(Backend::Memcache, &config.memcache).await?;

        Ok(Self::new(CacheDispatcher::new([redis, memcache])))
    }
}
