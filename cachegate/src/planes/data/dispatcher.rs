use crate::domain::Backend;
use crate::domain::response::{
    ClearResponse, DeleteResponse, GetResponse, GetWithTtlResponse, SetResponse,
};
use crate::planes::data::operation::CacheOperations;
use crate::ports::CacheStore;
use async_trait::async_trait;
use serde_json::Value;
use shared::{Error, Result, TtlSecs};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Routes each call to the adapter registered for its backend name and
/// serializes mutations.
///
/// `set`, `delete` and `clear_all` run under one process-wide lock shared by
/// every backend, so at most one mutating round-trip is in flight at a time.
/// Reads never take the lock.
pub struct CacheDispatcher {
    stores: HashMap<Backend, Arc<dyn CacheStore>>,
    write_lock: Mutex<()>,
}

impl CacheDispatcher {
    /// Build the lookup table once. A later store for the same backend replaces an earlier one.
    pub fn new(stores: impl IntoIterator<Item = Arc<dyn CacheStore>>) -> Self {
        let stores = stores
            .into_iter()
            .map(|store| (store.backend(), store))
            .collect();

        Self {
            stores,
            write_lock: Mutex::new(()),
        }
    }

    /// Resolve a logical backend name. Unknown or unconfigured names yield `UnsupportedBackend`.
    pub fn select_backend(&self, name: &str) -> Result<Arc<dyn CacheStore>> {
        let backend: Backend = name.parse()?;
        self.stores
            .get(&backend)
            .cloned()
            .ok_or_else(|| Error::UnsupportedBackend(name.to_string()))
    }

    pub fn backends(&self) -> Vec<Backend> {
        let mut backends: Vec<Backend> = self.stores.keys().copied().collect();
        backends.sort_by_key(|b| b.as_str());
        backends
    }
}

impl Debug for CacheDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheDispatcher")
            .field("backends", &self.backends())
            .finish()
    }
}

fn log_outcome<T>(op: &str, backend: Backend, key: &str, result: &Result<T>) {
    match result {
        Ok(_) => tracing::debug!("{} ok: backend={}, key={}", op, backend, key),
        Err(Error::NotFound) => tracing::debug!("{} miss: backend={}, key={}", op, backend, key),
        Err(e) => tracing::warn!("{} failed: backend={}, key={}: {}", op, backend, key, e),
    }
}

#[async_trait]
impl CacheOperations for CacheDispatcher {
    async fn get(&self, backend: &str, key: &str) -> Result<GetResponse> {
        let store = self.select_backend(backend)?;
        let result = store.get(key).await;
        log_outcome("GET", store.backend(), key, &result);
        result
    }

    async fn get_with_ttl(&self, backend: &str, key: &str) -> Result<GetWithTtlResponse> {
        let store = self.select_backend(backend)?;
        let result = store.get_with_ttl(key).await;
        log_outcome("GET_TTL", store.backend(), key, &result);
        result
    }

    async fn set(
        &self,
        backend: &str,
        key: &str,
        value: &Value,
        ttl: TtlSecs,
    ) -> Result<SetResponse> {
        let store = self.select_backend(backend)?;

        let result = {
            let _guard = self.write_lock.lock().await;
            store.set(key, value, ttl).await
        };

        log_outcome("SET", store.backend(), key, &result);
        result
    }

    async fn delete(&self, backend: &str, key: &str) -> Result<DeleteResponse> {
        let store = self.select_backend(backend)?;

        let result = {
            let _guard = self.write_lock.lock().await;
            store.delete(key).await
        };

        log_outcome("DELETE", store.backend(), key, &result);
        result
    }

    async fn clear_all(&self, backend: &str) -> Result<ClearResponse> {
        let store = self.select_backend(backend)?;
        tracing::warn!("Clearing every entry in backend '{}'", store.backend());

        let result = {
            let _guard = self.write_lock.lock().await;
            store.clear_all().await
        };

        log_outcome("CLEAR", store.backend(), "*", &result);
        result
    }
}
