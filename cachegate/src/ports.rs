#![deny(clippy::all)]

use crate::domain::Backend;
use crate::domain::response::{
    ClearResponse, DeleteResponse, GetResponse, GetWithTtlResponse, SetResponse,
};
use async_trait::async_trait;
use serde_json::Value;
use shared::config::BackendConfig;
use shared::{Result, TtlSecs};
use std::sync::Arc;

// Ports are the pluggable extension points for the underlying cache backends

/// Port for creating a backend adapter from configuration
/// Called once per backend at startup; the returned store lives for the whole process
#[async_trait]
pub trait StorageFactory: Send + Sync + 'static {
    async fn create(&self, backend: Backend, config: &BackendConfig)
    -> Result<Arc<dyn CacheStore>>;
}

/// The contract every backend adapter satisfies.
///
/// Values are arbitrary JSON trees; each adapter owns the encoding it needs to
/// store them. A `ttl` of zero on [`CacheStore::set`] means "the backend's
/// configured default expiration", never "expire now" and never "keep forever".
///
/// Remaining-TTL precision is backend specific. Redis reports it natively;
/// memcached cannot, so its adapter derives it from the write time and the
/// gateway's clock, in whole seconds.
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    fn backend(&self) -> Backend;

    /// Fails with `NotFound` when the key is absent or expired.
    async fn get(&self, key: &str) -> Result<GetResponse>;

    async fn get_with_ttl(&self, key: &str) -> Result<GetWithTtlResponse>;

    async fn set(&self, key: &str, value: &Value, ttl: TtlSecs) -> Result<SetResponse>;

    /// Deleting an absent key succeeds with `deleted == false`.
    async fn delete(&self, key: &str) -> Result<DeleteResponse>;

    /// Removes every entry the backend holds, not only the ones written through this process.
    async fn clear_all(&self) -> Result<ClearResponse>;
}
