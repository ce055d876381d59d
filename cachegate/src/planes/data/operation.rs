use crate::domain::response::{
    ClearResponse, DeleteResponse, GetResponse, GetWithTtlResponse, SetResponse,
};
use async_trait::async_trait;
use serde_json::Value;
use shared::{Result, TtlSecs};

/// Application-level cache operations trait
/// Every call names the backend it targets; the implementation resolves it per call
#[async_trait]
pub trait CacheOperations: Send + Sync + 'static {
    async fn get(&self, backend: &str, key: &str) -> Result<GetResponse>;

    async fn get_with_ttl(&self, backend: &str, key: &str) -> Result<GetWithTtlResponse>;

    async fn set(&self, backend: &str, key: &str, value: &Value, ttl: TtlSecs)
    -> Result<SetResponse>;

    async fn delete(&self, backend: &str, key: &str) -> Result<DeleteResponse>;

    async fn clear_all(&self, backend: &str) -> Result<ClearResponse>;
}
