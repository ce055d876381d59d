pub mod codec;
pub mod in_process;
pub mod memcache_store;
pub mod redis_store;

use async_trait::async_trait;
use cachegate::domain::Backend;
use cachegate::ports::{CacheStore, StorageFactory};
use shared::Result;
use shared::config::BackendConfig;
use std::sync::Arc;

pub use in_process::{InProcessMemcache, InProcessRedis};
pub use memcache_store::{MemcacheClient, MemcacheConnection, MemcacheStore};
pub use redis_store::{KeyExpiry, RedisClient, RedisConnection, RedisStore};

/// Builds the adapter for a backend: the network client for regular URLs, the
/// in-process stand-in for `memory://`.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnifiedStorageFactory;

#[async_trait]
impl StorageFactory for UnifiedStorageFactory {
    async fn create(
        &self,
        backend: Backend,
        config: &BackendConfig,
    ) -> Result<Arc<dyn CacheStore>> {
        let default_ttl = config.default_ttl;

        let store: Arc<dyn CacheStore> = match (backend, config.is_in_process()) {
            (Backend::Redis, true) => Arc::new(RedisStore::new(InProcessRedis::new(), default_ttl)),
            (Backend::Redis, false) => Arc::new(RedisStore::new(
                RedisClient::connect(&config.url, config.timeout).await?,
                default_ttl,
            )),
            (Backend::Memcache, true) => {
                Arc::new(MemcacheStore::new(InProcessMemcache::new(), default_ttl))
            }
            (Backend::Memcache, false) => Arc::new(MemcacheStore::new(
                MemcacheClient::connect(&config.url, config.timeout)?,
                default_ttl,
            )),
        };

        tracing::info!(
            "{} backend ready (in_process={}, default_ttl={}s)",
            backend,
            config.is_in_process(),
            default_ttl.0
        );
        Ok(store)
    }
}
