//! In-process stand-ins for the memcached and Redis connections.
//!
//! Both are backed by a moka cache with per-entry expiry and are selected with a
//! `memory://` backend URL. They keep the adapters' behavior identical to the
//! network clients (bytes in, bytes out, backend-side expiration) without a server.

use crate::memcache_store::{MemcacheConnection, RELATIVE_EXPIRATION_LIMIT_SECS};
use crate::redis_store::{KeyExpiry, RedisConnection};
use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use shared::Result;
use std::fmt::Debug;
use std::time::{Duration, Instant};

#[derive(Clone)]
struct Slot {
    payload: Vec<u8>,
    ttl: Option<Duration>,
    stored_at: Instant,
}

impl Slot {
    fn remaining(&self) -> Option<Duration> {
        self.ttl.map(|ttl| ttl.saturating_sub(self.stored_at.elapsed()))
    }
}

struct SlotExpiry;

impl Expiry<String, Slot> for SlotExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        slot: &Slot,
        _created_at: Instant,
    ) -> Option<Duration> {
        slot.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        slot: &Slot,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        slot.ttl
    }
}

/// Expiring byte map shared by both stand-ins.
#[derive(Clone)]
struct ExpiringMap {
    slots: Cache<String, Slot>,
}

impl ExpiringMap {
    fn new() -> Self {
        Self {
            slots: Cache::builder().expire_after(SlotExpiry).build(),
        }
    }

    async fn get(&self, key: &str) -> Option<Slot> {
        self.slots.get(key).await
    }

    async fn insert(&self, key: &str, payload: Vec<u8>, ttl: Option<Duration>) {
        let slot = Slot {
            payload,
            ttl,
            stored_at: Instant::now(),
        };
        self.slots.insert(key.to_string(), slot).await;
    }

    async fn remove(&self, key: &str) -> bool {
        self.slots.remove(key).await.is_some()
    }

    fn clear(&self) {
        self.slots.invalidate_all();
    }
}

impl Debug for ExpiringMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiringMap")
            .field("entry_count", &self.slots.entry_count())
            .finish()
    }
}

/// Memcached stand-in. Expirations follow the memcached protocol rules.
#[derive(Clone, Debug)]
pub struct InProcessMemcache {
    map: ExpiringMap,
}

impl InProcessMemcache {
    pub fn new() -> Self {
        Self {
            map: ExpiringMap::new(),
        }
    }
}

impl Default for InProcessMemcache {
    fn default() -> Self {
        Self::new()
    }
}

/// Translate a memcached expiration field into a relative duration.
fn memcache_ttl(expiration: u32) -> Option<Duration> {
    let expiration = u64::from(expiration);
    if expiration == 0 {
        return None;
    }
    if expiration <= RELATIVE_EXPIRATION_LIMIT_SECS {
        return Some(Duration::from_secs(expiration));
    }
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    Some(Duration::from_secs(expiration.saturating_sub(now)))
}

#[async_trait]
impl MemcacheConnection for InProcessMemcache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.map.get(key).await.map(|slot| slot.payload))
    }

    async fn set(&self, key: &str, payload: Vec<u8>, expiration: u32) -> Result<()> {
        self.map.insert(key, payload, memcache_ttl(expiration)).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.map.remove(key).await)
    }

    async fn flush_all(&self) -> Result<()> {
        self.map.clear();
        Ok(())
    }
}

/// Redis stand-in with native remaining-TTL reporting.
#[derive(Clone, Debug)]
pub struct InProcessRedis {
    map: ExpiringMap,
}

impl InProcessRedis {
    pub fn new() -> Self {
        Self {
            map: ExpiringMap::new(),
        }
    }

    /// Store a key with no expiry, the way a plain `SET` from another client would.
    pub async fn set_persistent(&self, key: &str, payload: Vec<u8>) {
        self.map.insert(key, payload, None).await;
    }
}

impl Default for InProcessRedis {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RedisConnection for InProcessRedis {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.map.get(key).await.map(|slot| slot.payload))
    }

    async fn set_ex(&self, key: &str, payload: Vec<u8>, ttl: Duration) -> Result<()> {
        self.map.insert(key, payload, Some(ttl)).await;
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<KeyExpiry> {
        Ok(match self.map.get(key).await {
            None => KeyExpiry::Missing,
            Some(slot) => match slot.remaining() {
                None => KeyExpiry::Persistent,
                Some(remaining) => KeyExpiry::ExpiresIn(remaining),
            },
        })
    }

    async fn del(&self, key: &str) -> Result<bool> {
        Ok(self.map.remove(key).await)
    }

    async fn flush_db(&self) -> Result<()> {
        self.map.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn entries_expire_after_their_ttl() {
        let redis = InProcessRedis::new();
        redis
            .set_ex("short", b"1".to_vec(), Duration::from_millis(100))
            .await
            .unwrap();

        assert!(RedisConnection::get(&redis, "short").await.unwrap().is_some());

        sleep(Duration::from_millis(150)).await;

        assert!(RedisConnection::get(&redis, "short").await.unwrap().is_none());
        assert_eq!(redis.ttl("short").await.unwrap(), KeyExpiry::Missing);
    }

    #[tokio::test]
    async fn ttl_reports_persistent_keys() {
        let redis = InProcessRedis::new();
        redis.set_persistent("forever", b"1".to_vec()).await;

        assert_eq!(redis.ttl("forever").await.unwrap(), KeyExpiry::Persistent);
    }

    #[tokio::test]
    async fn flush_all_empties_memcache() {
        let memcache = InProcessMemcache::new();
        memcache.set("a", b"1".to_vec(), 60).await.unwrap();
        memcache.set("b", b"2".to_vec(), 0).await.unwrap();

        memcache.flush_all().await.unwrap();

        assert!(MemcacheConnection::get(&memcache, "a").await.unwrap().is_none());
        assert!(MemcacheConnection::get(&memcache, "b").await.unwrap().is_none());
    }

    #[test]
    fn memcache_expiration_rules() {
        assert_eq!(memcache_ttl(0), None);
        assert_eq!(memcache_ttl(30), Some(Duration::from_secs(30)));

        let in_an_hour = (chrono::Utc::now().timestamp() + 3600) as u32;
        let ttl = memcache_ttl(in_an_hour).unwrap();
        assert!(ttl <= Duration::from_secs(3600));
        assert!(ttl >= Duration::from_secs(3590));
    }
}
