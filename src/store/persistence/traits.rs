//! The persistence contract. One trait, two backends (embedded SQLite
//! for development, networked Postgres for production) selected by
//! `DATABASE_URL`'s scheme at startup.

use crate::error::AppResult;
use crate::ids::{CharacterId, UserId};
use crate::models::{Character, MatchRecord, User};
use async_trait::async_trait;

#[async_trait]
pub trait Persistence: Send + Sync {
    async fn get_user(&self, username: &str) -> AppResult<Option<User>>;
    async fn get_user_by_id(&self, user_id: UserId) -> AppResult<Option<User>>;
    async fn create_user(&self, username: &str, password_hash: &str, email: Option<&str>) -> AppResult<User>;

    async fn get_character(&self, id: CharacterId) -> AppResult<Option<Character>>;
    async fn list_characters(&self, user_id: UserId) -> AppResult<Vec<Character>>;
    async fn upsert_character(&self, character: &Character) -> AppResult<()>;
    async fn delete_character(&self, id: CharacterId) -> AppResult<()>;

    async fn append_match(&self, record: &MatchRecord) -> AppResult<()>;
    async fn list_matches(&self, character_id: CharacterId, limit: u32) -> AppResult<Vec<MatchRecord>>;

    /// Updates a character's rating and win/loss counters and appends the
    /// match record in a single transaction.
    async fn finish_ranked_match(
        &self,
        a: CharacterId,
        a_new_rating: i32,
        a_won: bool,
        b: CharacterId,
        b_new_rating: i32,
        b_won: bool,
        record: &MatchRecord,
    ) -> AppResult<()>;
}
