use crate::codec::{decode, encode};
use async_trait::async_trait;
use cachegate::domain::Backend;
use cachegate::domain::response::{
    ClearResponse, DeleteResponse, GetResponse, GetWithTtlResponse, SetResponse,
};
use cachegate::ports::CacheStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{Error, Result, TtlSecs};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

const BACKEND: &str = "memcache";

/// Memcached reads expirations above 30 days as absolute unix timestamps.
pub const RELATIVE_EXPIRATION_LIMIT_SECS: u64 = 60 * 60 * 24 * 30;

/// Byte-level access to a memcached cluster.
#[async_trait]
pub trait MemcacheConnection: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// `expiration` uses memcached semantics: 0 never expires, up to 30 days is
    /// relative seconds, anything larger is a unix timestamp.
    async fn set(&self, key: &str, payload: Vec<u8>, expiration: u32) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<bool>;

    async fn flush_all(&self) -> Result<()>;
}

/// Network client backed by the blocking, pooled `memcache` crate.
/// Each call runs on the blocking thread pool.
#[derive(Clone)]
pub struct MemcacheClient {
    client: Arc<memcache::Client>,
}

/// Add a socket `timeout` to the URL unless it already names one.
fn url_with_timeout(url: &str, timeout: Duration) -> String {
    let has_timeout = url
        .split_once('?')
        .is_some_and(|(_, query)| query.split('&').any(|pair| pair.starts_with("timeout=")));
    if has_timeout {
        return url.to_string();
    }

    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}timeout={}", url, separator, timeout.as_secs_f64())
}

impl MemcacheClient {
    /// Connect using a `memcache://host:port` URL. An explicit `?timeout=secs`
    /// in the URL wins over `timeout`.
    pub fn connect(url: &str, timeout: Duration) -> Result<Self> {
        let client = memcache::Client::connect(url_with_timeout(url, timeout))
            .map_err(|e| Error::unavailable(BACKEND, e))?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&memcache::Client) -> std::result::Result<T, memcache::MemcacheError>
            + Send
            + 'static,
    {
        let client = self.client.clone();
        tokio::task::spawn_blocking(move || op(&client))
            .await
            .map_err(|e| Error::unavailable(BACKEND, e))?
            .map_err(|e| Error::unavailable(BACKEND, e))
    }
}

impl Debug for MemcacheClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemcacheClient")
            .field("client", &"<memcache::Client>")
            .finish()
    }
}

#[async_trait]
impl MemcacheConnection for MemcacheClient {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let key = key.to_string();
        self.run(move |client| client.get::<Vec<u8>>(&key)).await
    }

    async fn set(&self, key: &str, payload: Vec<u8>, expiration: u32) -> Result<()> {
        let key = key.to_string();
        self.run(move |client| client.set(&key, payload.as_slice(), expiration))
            .await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let key = key.to_string();
        self.run(move |client| client.delete(&key)).await
    }

    async fn flush_all(&self) -> Result<()> {
        self.run(|client| client.flush()).await
    }
}

/// What the adapter actually stores under a key.
#[derive(Serialize, Deserialize)]
struct Envelope<V> {
    value: V,
    /// Unix seconds at write time, gateway clock.
    stored_at: i64,
    /// Requested lifetime in seconds, after default resolution.
    ttl: u64,
}

impl<V> Envelope<V> {
    /// Remaining lifetime, or `None` once it has run out on the gateway clock.
    fn remaining(&self, now: i64) -> Option<Duration> {
        let age = now.saturating_sub(self.stored_at).max(0) as u64;
        self.ttl.checked_sub(age).map(Duration::from_secs)
    }
}

/// Cache contract over memcached.
///
/// Memcached cannot report the remaining lifetime of an item, so every value is
/// wrapped in an envelope carrying its write time and requested TTL. Remaining
/// TTL is derived from those on read: whole seconds, measured on the gateway's
/// clock, within `0..=ttl`. Expiration itself is left to memcached.
pub struct MemcacheStore<C = MemcacheClient> {
    conn: C,
    default_ttl: TtlSecs,
}

impl<C: MemcacheConnection> MemcacheStore<C> {
    pub fn new(conn: C, default_ttl: TtlSecs) -> Self {
        Self { conn, default_ttl }
    }

    async fn load(&self, key: &str) -> Result<(Value, Duration)> {
        let bytes = self.conn.get(key).await?.ok_or(Error::NotFound)?;
        let envelope: Envelope<Value> = decode(&bytes)?;

        match envelope.remaining(chrono::Utc::now().timestamp()) {
            Some(remaining) => Ok((envelope.value, remaining)),
            None => {
                tracing::debug!("memcache key '{}' outlived its recorded ttl", key);
                Err(Error::NotFound)
            }
        }
    }
}

/// Expiration field to send for a resolved TTL.
fn expiration_for(ttl: TtlSecs, now: i64) -> u32 {
    let secs = if ttl.0 > RELATIVE_EXPIRATION_LIMIT_SECS {
        (now.max(0) as u64).saturating_add(ttl.0)
    } else {
        ttl.0
    };
    u32::try_from(secs).unwrap_or(u32::MAX)
}

#[async_trait]
impl<C: MemcacheConnection> CacheStore for MemcacheStore<C> {
    fn backend(&self) -> Backend {
        Backend::Memcache
    }

    async fn get(&self, key: &str) -> Result<GetResponse> {
        let (value, _) = self.load(key).await?;
        Ok(GetResponse::new(value))
    }

    async fn get_with_ttl(&self, key: &str) -> Result<GetWithTtlResponse> {
        let (value, remaining) = self.load(key).await?;
        Ok(GetWithTtlResponse::new(value, remaining))
    }

    async fn set(&self, key: &str, value: &Value, ttl: TtlSecs) -> Result<SetResponse> {
        let ttl = ttl.or_default(self.default_ttl);
        let now = chrono::Utc::now().timestamp();
        let payload = encode(&Envelope {
            value,
            stored_at: now,
            ttl: ttl.0,
        })?;

        tracing::debug!(
            "memcache SET key={} ttl={}s bytes={}",
            key,
            ttl.0,
            payload.len()
        );
        self.conn
            .set(key, payload, expiration_for(ttl, now))
            .await?;
        Ok(SetResponse::new(ttl.as_duration()))
    }

    async fn delete(&self, key: &str) -> Result<DeleteResponse> {
        let deleted = self.conn.delete(key).await?;
        Ok(DeleteResponse::new(deleted))
    }

    async fn clear_all(&self) -> Result<ClearResponse> {
        self.conn.flush_all().await?;
        tracing::warn!("memcache flushed");
        Ok(ClearResponse::new(Backend::Memcache))
    }
}

impl<C: Debug> Debug for MemcacheStore<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemcacheStore")
            .field("conn", &self.conn)
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}
