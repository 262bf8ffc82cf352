//! Single-node fallback. Backed by `dashmap` so reads
//! and writes across keys don't serialize behind one mutex.

use crate::error::AppResult;
use crate::store::ephemeral::traits::{extract_version, EphemeralStore};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

pub struct LocalStore {
    kv: DashMap<String, Entry>,
    zsets: DashMap<String, BTreeMap<String, f64>>,
}

impl LocalStore {
    pub fn new() -> Self {
        tracing::warn!("ephemeral store running in single-node local mode; combat state is NOT shared across instances");
        Self { kv: DashMap::new(), zsets: DashMap::new() }
    }

    fn is_live(entry: &Entry) -> bool {
        Instant::now() < entry.expires_at
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EphemeralStore for LocalStore {
    async fn get_raw(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        Ok(self.kv.get(key).filter(|e| Self::is_live(e)).map(|e| e.value.clone()))
    }

    async fn set_raw_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> AppResult<()> {
        self.kv.insert(key.to_string(), Entry { value, expires_at: Instant::now() + ttl });
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.kv.remove(key);
        Ok(())
    }

    async fn compare_and_swap_raw(
        &self,
        key: &str,
        expected_version: u64,
        new_value: Vec<u8>,
        ttl: Duration,
    ) -> AppResult<bool> {
        let mut slot = self.kv.entry(key.to_string());
        let matches = match &slot {
            dashmap::mapref::entry::Entry::Occupied(occupied) if Self::is_live(occupied.get()) => {
                extract_version(&occupied.get().value) == Some(expected_version)
            }
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(_) => expected_version == 0,
        };
        if !matches {
            return Ok(false);
        }
        let entry = Entry { value: new_value, expires_at: Instant::now() + ttl };
        match slot {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                occupied.insert(entry);
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(entry);
            }
        }
        Ok(true)
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> AppResult<()> {
        self.zsets.entry(key.to_string()).or_default().insert(member.to_string(), score);
        Ok(())
    }

    async fn zrem(&self, key: &str, member: &str) -> AppResult<()> {
        if let Some(mut set) = self.zsets.get_mut(key) {
            set.remove(member);
        }
        Ok(())
    }

    async fn zrange_by_score(&self, key: &str, min: f64, max: f64) -> AppResult<Vec<String>> {
        Ok(self
            .zsets
            .get(key)
            .map(|set| set.iter().filter(|(_, &score)| score >= min && score <= max).map(|(m, _)| m.clone()).collect())
            .unwrap_or_default())
    }
}
