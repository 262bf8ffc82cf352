//! Networked backend for production. Schema bootstrap is
//! the same `ensure_schema` idempotent-DDL approach as the SQLite
//! backend; a real deployment would run this once as part of image
//! startup rather than on every connection.

use crate::error::{AppError, AppResult};
use crate::ids::{CharacterId, UserId};
use crate::models::{Character, MatchRecord, User};
use crate::store::persistence::retry::with_retry;
use crate::store::persistence::traits::Persistence;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    pub async fn connect(url: &str) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(url)
            .await
            .map_err(|e| AppError::Unavailable(e.to_string()))?;
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                user_id UUID PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                email TEXT,
                created_at TIMESTAMPTZ NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS characters (
                character_id UUID PRIMARY KEY,
                user_id UUID NOT NULL REFERENCES users(user_id),
                body JSONB NOT NULL,
                rating INTEGER NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS characters_user_id_idx ON characters(user_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS match_history (
                match_id UUID PRIMARY KEY,
                participant_a UUID,
                participant_b UUID,
                body JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS match_history_a_idx ON match_history(participant_a)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS match_history_b_idx ON match_history(participant_b)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS daily_stats (
                day DATE NOT NULL,
                character_id UUID NOT NULL,
                matches_played INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (day, character_id)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl Persistence for PostgresPersistence {
    async fn get_user(&self, username: &str) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT user_id, username, password_hash, email, created_at FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(row_to_user))
    }

    async fn get_user_by_id(&self, user_id: UserId) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT user_id, username, password_hash, email, created_at FROM users WHERE user_id = $1")
            .bind(user_id.into_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(row_to_user))
    }

    async fn create_user(&self, username: &str, password_hash: &str, email: Option<&str>) -> AppResult<User> {
        let user = User {
            user_id: UserId::new(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            email: email.map(|e| e.to_string()),
            created_at: Utc::now(),
        };
        with_retry(|| {
            sqlx::query("INSERT INTO users (user_id, username, password_hash, email, created_at) VALUES ($1, $2, $3, $4, $5)")
                .bind(user.user_id.into_uuid())
                .bind(&user.username)
                .bind(&user.password_hash)
                .bind(&user.email)
                .bind(user.created_at)
                .execute(&self.pool)
        })
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("username already taken".into())
            } else {
                AppError::from(e)
            }
        })?;
        Ok(user)
    }

    async fn get_character(&self, id: CharacterId) -> AppResult<Option<Character>> {
        let row = sqlx::query("SELECT body FROM characters WHERE character_id = $1")
            .bind(id.into_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| serde_json::from_value(r.get::<serde_json::Value, _>("body")).expect("valid character json")))
    }

    async fn list_characters(&self, user_id: UserId) -> AppResult<Vec<Character>> {
        let rows = sqlx::query("SELECT body FROM characters WHERE user_id = $1")
            .bind(user_id.into_uuid())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| serde_json::from_value(r.get::<serde_json::Value, _>("body")).expect("valid character json"))
            .collect())
    }

    async fn upsert_character(&self, character: &Character) -> AppResult<()> {
        let body = serde_json::to_value(character).expect("character serializes");
        with_retry(|| {
            sqlx::query(
                r#"
                INSERT INTO characters (character_id, user_id, body, rating, updated_at)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (character_id) DO UPDATE SET body = excluded.body, rating = excluded.rating, updated_at = excluded.updated_at
                "#,
            )
            .bind(character.character_id.into_uuid())
            .bind(character.user_id.into_uuid())
            .bind(&body)
            .bind(character.rating)
            .bind(Utc::now())
            .execute(&self.pool)
        })
        .await?;
        Ok(())
    }

    async fn delete_character(&self, id: CharacterId) -> AppResult<()> {
        with_retry(|| sqlx::query("DELETE FROM characters WHERE character_id = $1").bind(id.into_uuid()).execute(&self.pool)).await?;
        Ok(())
    }

    async fn append_match(&self, record: &MatchRecord) -> AppResult<()> {
        let body = serde_json::to_value(record).expect("match record serializes");
        with_retry(|| {
            sqlx::query("INSERT INTO match_history (match_id, participant_a, participant_b, body, created_at) VALUES ($1, $2, $3, $4, $5)")
                .bind(record.match_id.into_uuid())
                .bind(record.participant_a.map(|c| c.into_uuid()))
                .bind(record.participant_b.map(|c| c.into_uuid()))
                .bind(&body)
                .bind(record.timestamp)
                .execute(&self.pool)
        })
        .await?;
        Ok(())
    }

    async fn list_matches(&self, character_id: CharacterId, limit: u32) -> AppResult<Vec<MatchRecord>> {
        let id = character_id.into_uuid();
        let rows = sqlx::query(
            "SELECT body FROM match_history WHERE participant_a = $1 OR participant_b = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| serde_json::from_value(r.get::<serde_json::Value, _>("body")).expect("valid match json"))
            .collect())
    }

    async fn finish_ranked_match(
        &self,
        a: CharacterId,
        a_new_rating: i32,
        a_won: bool,
        b: CharacterId,
        b_new_rating: i32,
        b_won: bool,
        record: &MatchRecord,
    ) -> AppResult<()> {
        with_retry(|| async {
            let mut tx = self.pool.begin().await?;

            for (character_id, new_rating, won) in [(a, a_new_rating, a_won), (b, b_new_rating, b_won)] {
                let row = sqlx::query("SELECT body FROM characters WHERE character_id = $1 FOR UPDATE")
                    .bind(character_id.into_uuid())
                    .fetch_optional(&mut *tx)
                    .await?
                    .ok_or(sqlx::Error::RowNotFound)?;
                let mut character: Character =
                    serde_json::from_value(row.get::<serde_json::Value, _>("body")).expect("valid character json");
                character.rating = new_rating.max(crate::models::MIN_RATING);
                if won {
                    character.wins += 1;
                } else {
                    character.losses += 1;
                }
                let body = serde_json::to_value(&character).expect("character serializes");
                sqlx::query("UPDATE characters SET body = $1, rating = $2, updated_at = $3 WHERE character_id = $4")
                    .bind(&body)
                    .bind(character.rating)
                    .bind(Utc::now())
                    .bind(character_id.into_uuid())
                    .execute(&mut *tx)
                    .await?;
            }

            let body = serde_json::to_value(record).expect("match record serializes");
            sqlx::query("INSERT INTO match_history (match_id, participant_a, participant_b, body, created_at) VALUES ($1, $2, $3, $4, $5)")
                .bind(record.match_id.into_uuid())
                .bind(record.participant_a.map(|c| c.into_uuid()))
                .bind(record.participant_b.map(|c| c.into_uuid()))
                .bind(&body)
                .bind(record.timestamp)
                .execute(&mut *tx)
                .await?;

            tx.commit().await
        })
        .await?;
        Ok(())
    }
}

fn row_to_user(row: sqlx::postgres::PgRow) -> User {
    User {
        user_id: UserId::from_uuid(row.get("user_id")),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        email: row.get("email"),
        created_at: row.get("created_at"),
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}
