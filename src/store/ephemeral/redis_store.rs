//! Shared, authoritative backend. CAS runs as a single Lua script so the
//! version check and the write land atomically from Redis's point of
//! view — no `WATCH`/`MULTI` round trip needed.

use crate::error::{AppError, AppResult};
use crate::store::ephemeral::traits::EphemeralStore;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use std::time::Duration;

/// KEYS[1] = target key, ARGV[1] = expected version, ARGV[2] = new
/// value, ARGV[3] = ttl seconds. Returns 1 on a swapped write, 0 if the
/// stored version (or absence of a key, for version 0) didn't match.
static CAS_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
        local current = redis.call('GET', KEYS[1])
        local expected_version = tonumber(ARGV[1])
        local matches
        if current then
            local ok, decoded = pcall(cjson.decode, current)
            matches = ok and decoded.version ~= nil and decoded.version == expected_version
        else
            matches = expected_version == 0
        end
        if matches then
            redis.call('SET', KEYS[1], ARGV[2], 'EX', ARGV[3])
            return 1
        else
            return 0
        end
        "#,
    )
});

pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> AppResult<Self> {
        let client = redis::Client::open(url).map_err(AppError::from)?;
        let conn = client.get_connection_manager().await.map_err(AppError::from)?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl EphemeralStore for RedisStore {
    async fn get_raw(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await.map_err(AppError::from)?;
        Ok(value)
    }

    async fn set_raw_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, ttl.as_secs().max(1)).await.map_err(AppError::from)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await.map_err(AppError::from)?;
        Ok(())
    }

    async fn compare_and_swap_raw(
        &self,
        key: &str,
        expected_version: u64,
        new_value: Vec<u8>,
        ttl: Duration,
    ) -> AppResult<bool> {
        let mut conn = self.conn.clone();
        let swapped: i32 = CAS_SCRIPT
            .key(key)
            .arg(expected_version)
            .arg(new_value)
            .arg(ttl.as_secs().max(1))
            .invoke_async(&mut conn)
            .await
            .map_err(AppError::from)?;
        Ok(swapped == 1)
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.zadd(key, member, score).await.map_err(AppError::from)?;
        Ok(())
    }

    async fn zrem(&self, key: &str, member: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.zrem(key, member).await.map_err(AppError::from)?;
        Ok(())
    }

    async fn zrange_by_score(&self, key: &str, min: f64, max: f64) -> AppResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let members: Vec<String> = conn.zrangebyscore(key, min, max).await.map_err(AppError::from)?;
        Ok(members)
    }
}
