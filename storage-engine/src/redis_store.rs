use crate::codec::{decode, encode};
use async_trait::async_trait;
use cachegate::domain::Backend;
use cachegate::domain::response::{
    ClearResponse, DeleteResponse, GetResponse, GetWithTtlResponse, SetResponse,
};
use cachegate::ports::CacheStore;
use redis::AsyncCommands;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use serde_json::Value;
use shared::{Error, Result, TtlSecs};
use std::fmt::Debug;
use std::time::Duration;

const BACKEND: &str = "redis";

/// Answer of the Redis `TTL` command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyExpiry {
    /// `-2`: no such key.
    Missing,
    /// `-1`: the key exists without an expiry.
    Persistent,
    ExpiresIn(Duration),
}

impl KeyExpiry {
    pub fn from_reply(reply: i64) -> Self {
        match reply {
            -1 => KeyExpiry::Persistent,
            r if r < 0 => KeyExpiry::Missing,
            secs => KeyExpiry::ExpiresIn(Duration::from_secs(secs as u64)),
        }
    }
}

/// Byte-level access to a Redis database.
#[async_trait]
pub trait RedisConnection: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn set_ex(&self, key: &str, payload: Vec<u8>, ttl: Duration) -> Result<()>;

    async fn ttl(&self, key: &str) -> Result<KeyExpiry>;

    async fn del(&self, key: &str) -> Result<bool>;

    async fn flush_db(&self) -> Result<()>;
}

fn map_redis_error(err: redis::RedisError) -> Error {
    // The key holds something other than a string value
    if err.kind() == redis::ErrorKind::TypeError || err.code() == Some("WRONGTYPE") {
        return Error::Decode(err.to_string());
    }
    Error::unavailable(BACKEND, err)
}

/// Network client over a multiplexed, auto-reconnecting connection.
#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
}

impl RedisClient {
    /// Connect once; `timeout` bounds both connecting and every command reply.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(url).map_err(map_redis_error)?;
        let config = ConnectionManagerConfig::new()
            .set_connection_timeout(timeout)
            .set_response_timeout(timeout);
        let manager = client
            .get_connection_manager_with_config(config)
            .await
            .map_err(map_redis_error)?;
        Ok(Self { manager })
    }
}

impl Debug for RedisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisClient")
            .field("manager", &"<redis::aio::ConnectionManager>")
            .finish()
    }
}

#[async_trait]
impl RedisConnection for RedisClient {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.manager.clone();
        conn.get(key).await.map_err(map_redis_error)
    }

    async fn set_ex(&self, key: &str, payload: Vec<u8>, ttl: Duration) -> Result<()> {
        let mut conn = self.manager.clone();
        conn.set_ex(key, payload, ttl.as_secs())
            .await
            .map_err(map_redis_error)
    }

    async fn ttl(&self, key: &str) -> Result<KeyExpiry> {
        let mut conn = self.manager.clone();
        let reply: i64 = conn.ttl(key).await.map_err(map_redis_error)?;
        Ok(KeyExpiry::from_reply(reply))
    }

    async fn del(&self, key: &str) -> Result<bool> {
        let mut conn = self.manager.clone();
        let removed: u64 = conn.del(key).await.map_err(map_redis_error)?;
        Ok(removed > 0)
    }

    async fn flush_db(&self) -> Result<()> {
        let mut conn = self.manager.clone();
        let () = redis::cmd("FLUSHDB")
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }
}

/// Cache contract over Redis. Values are stored as JSON strings and every write
/// carries an explicit `EX`, so a zero TTL becomes the configured default rather
/// than a key that never expires.
pub struct RedisStore<C = RedisClient> {
    conn: C,
    default_ttl: TtlSecs,
}

impl<C: RedisConnection> RedisStore<C> {
    pub fn new(conn: C, default_ttl: TtlSecs) -> Self {
        Self { conn, default_ttl }
    }

    async fn load(&self, key: &str) -> Result<Value> {
        let bytes = self.conn.get(key).await?.ok_or(Error::NotFound)?;
        decode(&bytes)
    }
}

#[async_trait]
impl<C: RedisConnection> CacheStore for RedisStore<C> {
    fn backend(&self) -> Backend {
        Backend::Redis
    }

    async fn get(&self, key: &str) -> Result<GetResponse> {
        self.load(key).await.map(GetResponse::new)
    }

    async fn get_with_ttl(&self, key: &str) -> Result<GetWithTtlResponse> {
        let value = self.load(key).await?;

        let ttl_remaining = match self.conn.ttl(key).await? {
            // Expired or deleted between the two round-trips
            KeyExpiry::Missing => return Err(Error::NotFound),
            KeyExpiry::Persistent => Duration::ZERO,
            KeyExpiry::ExpiresIn(remaining) => remaining,
        };

        Ok(GetWithTtlResponse::new(value, ttl_remaining))
    }

    async fn set(&self, key: &str, value: &Value, ttl: TtlSecs) -> Result<SetResponse> {
        let ttl = ttl.or_default(self.default_ttl);
        let payload = encode(value)?;

        tracing::debug!(
            "redis SET key={} ttl={}s bytes={}",
            key,
            ttl.0,
            payload.len()
        );
        self.conn.set_ex(key, payload, ttl.as_duration()).await?;
        Ok(SetResponse::new(ttl.as_duration()))
    }

    async fn delete(&self, key: &str) -> Result<DeleteResponse> {
        let deleted = self.conn.del(key).await?;
        Ok(DeleteResponse::new(deleted))
    }

    async fn clear_all(&self) -> Result<ClearResponse> {
        self.conn.flush_db().await?;
        tracing::warn!("redis database flushed");
        Ok(ClearResponse::new(Backend::Redis))
    }
}

impl<C: Debug> Debug for RedisStore<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("conn", &self.conn)
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}
