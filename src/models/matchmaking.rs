use crate::ids::{CharacterId, TicketId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueuePreferences {
    pub allow_bot_fallback: bool,
}

/// `pvpqueue` entry. At most one per
/// `user_id` — enforced by the queue store, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchmakingTicket {
    pub ticket_id: TicketId,
    pub user_id: UserId,
    pub character_id: CharacterId,
    pub rating_at_enqueue: i32,
    pub enqueued_at: DateTime<Utc>,
    pub preferences: QueuePreferences,
}

impl MatchmakingTicket {
    pub fn age_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.enqueued_at).num_seconds().max(0)
    }

    /// `window(a) = 50 + 25*floor(a/5s)`, capped at 500.
    pub fn window(age_seconds: i64) -> i32 {
        let steps = (age_seconds / 5) as i32;
        (50 + 25 * steps).min(500)
    }
}
