//! The ephemeral-state contract: key/value with TTL plus a sorted set
//! for the matchmaking queue, CAS on a `version` field for every combat
//! mutation.

use crate::error::AppResult;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

#[async_trait]
pub trait EphemeralStore: Send + Sync {
    async fn get_raw(&self, key: &str) -> AppResult<Option<Vec<u8>>>;
    async fn set_raw_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> AppResult<()>;
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Compare-and-swap on a JSON blob's embedded `version` field.
    /// `expected_version` must match the stored value's current version
    /// or the write is rejected with `Ok(false)`.
    async fn compare_and_swap_raw(
        &self,
        key: &str,
        expected_version: u64,
        new_value: Vec<u8>,
        ttl: Duration,
    ) -> AppResult<bool>;

    async fn zadd(&self, key: &str, member: &str, score: f64) -> AppResult<()>;
    async fn zrem(&self, key: &str, member: &str) -> AppResult<()>;
    async fn zrange_by_score(&self, key: &str, min: f64, max: f64) -> AppResult<Vec<String>>;
}

/// Typed convenience helpers layered over the raw byte contract every
/// backend implements; kept out of the trait itself so `EphemeralStore`
/// stays object-safe.
pub async fn get_json<T: DeserializeOwned>(store: &dyn EphemeralStore, key: &str) -> AppResult<Option<T>> {
    match store.get_raw(key).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes).map_err(|e| {
            crate::error::AppError::Unavailable(format!("corrupt ephemeral value at {key}: {e}"))
        })?)),
        None => Ok(None),
    }
}

/// Pulls the `version` field out of a stored JSON blob without knowing
/// its concrete type; used by every backend's CAS implementation.
pub(crate) fn extract_version(bytes: &[u8]) -> Option<u64> {
    serde_json::from_slice::<serde_json::Value>(bytes)
        .ok()?
        .get("version")?
        .as_u64()
}

pub async fn set_json_with_ttl<T: Serialize + Sync>(
    store: &dyn EphemeralStore,
    key: &str,
    value: &T,
    ttl: Duration,
) -> AppResult<()> {
    let bytes = serde_json::to_vec(value).expect("ephemeral value serializes");
    store.set_raw_with_ttl(key, bytes, ttl).await
}
