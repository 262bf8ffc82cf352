pub mod local_store;
pub mod redis_store;
pub mod traits;

use crate::error::AppResult;
use std::sync::Arc;
use traits::EphemeralStore;

pub mod ttl {
    use std::time::Duration;

    pub const COMBAT: Duration = Duration::from_secs(60 * 60);
    pub const AUTOFIGHT: Duration = Duration::from_secs(30 * 60);
    pub const QUEUE_ENTRY: Duration = Duration::from_secs(2 * 60);
    pub const SESSION: Duration = Duration::from_secs(5 * 60);
    pub const IDEMPOTENCY: Duration = Duration::from_secs(10 * 60);
}

pub mod keys {
    use crate::ids::{CharacterId, CombatId, UserId};

    pub fn combat(id: CombatId) -> String {
        format!("combat:{id}")
    }

    pub fn autofight(character_id: CharacterId) -> String {
        format!("autofight:{character_id}")
    }

    pub const PVP_QUEUE: &str = "pvpqueue";

    /// Sorted set of terminal combats whose `MatchRecord` append failed
    /// and needs the combat-sweep's retry.
    pub const PENDING_FINALIZE: &str = "combat:pending_finalize";

    pub fn session(user_id: UserId) -> String {
        format!("session:{user_id}")
    }

    pub fn idempotency(hash: &str) -> String {
        format!("idem:{hash}")
    }
}

/// `CACHE_URL` is optional; absence selects
/// the local single-node fallback rather than failing startup.
pub async fn connect(cache_url: Option<&str>) -> AppResult<Arc<dyn EphemeralStore>> {
    match cache_url {
        Some(url) => {
            let store = redis_store::RedisStore::connect(url).await?;
            Ok(Arc::new(store))
        }
        None => Ok(Arc::new(local_store::LocalStore::new())),
    }
}
