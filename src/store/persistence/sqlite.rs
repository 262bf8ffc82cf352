//! Embedded single-file backend. Schema bootstrap runs at startup since migration
//! tooling is explicitly out of scope; this is the
//! self-contained dev path, not a replacement for one.

use crate::error::{AppError, AppResult};
use crate::ids::{CharacterId, UserId};
use crate::models::{Character, MatchRecord, User};
use crate::store::persistence::retry::with_retry;
use crate::store::persistence::traits::Persistence;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

pub struct SqlitePersistence {
    pool: SqlitePool,
}

impl SqlitePersistence {
    pub async fn connect(url: &str) -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(10)
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
                user_id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                email TEXT,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS characters (
                character_id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                body TEXT NOT NULL,
                rating INTEGER NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS match_history (
                match_id TEXT PRIMARY KEY,
                participant_a TEXT,
                participant_b TEXT,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS daily_stats (
                day TEXT NOT NULL,
                character_id TEXT NOT NULL,
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
impl Persistence for SqlitePersistence {
    async fn get_user(&self, username: &str) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT user_id, username, password_hash, email, created_at FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(row_to_user))
    }

    async fn get_user_by_id(&self, user_id: UserId) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT user_id, username, password_hash, email, created_at FROM users WHERE user_id = ?")
            .bind(user_id.to_string())
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
            sqlx::query("INSERT INTO users (user_id, username, password_hash, email, created_at) VALUES (?, ?, ?, ?, ?)")
                .bind(user.user_id.to_string())
                .bind(&user.username)
                .bind(&user.password_hash)
                .bind(&user.email)
                .bind(user.created_at.to_rfc3339())
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
        let row = sqlx::query("SELECT body FROM characters WHERE character_id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| serde_json::from_str(r.get::<String, _>("body").as_str()).expect("valid character json")))
    }

    async fn list_characters(&self, user_id: UserId) -> AppResult<Vec<Character>> {
        let rows = sqlx::query("SELECT body FROM characters WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| serde_json::from_str(r.get::<String, _>("body").as_str()).expect("valid character json"))
            .collect())
    }

    async fn upsert_character(&self, character: &Character) -> AppResult<()> {
        let body = serde_json::to_string(character).expect("character serializes");
        with_retry(|| {
            sqlx::query(
                r#"
                INSERT INTO characters (character_id, user_id, body, rating, updated_at)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(character_id) DO UPDATE SET body = excluded.body, rating = excluded.rating, updated_at = excluded.updated_at
                "#,
            )
            .bind(character.character_id.to_string())
            .bind(character.user_id.to_string())
            .bind(&body)
            .bind(character.rating)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
        })
        .await?;
        Ok(())
    }

    async fn delete_character(&self, id: CharacterId) -> AppResult<()> {
        with_retry(|| sqlx::query("DELETE FROM characters WHERE character_id = ?").bind(id.to_string()).execute(&self.pool)).await?;
        Ok(())
    }

    async fn append_match(&self, record: &MatchRecord) -> AppResult<()> {
        let body = serde_json::to_string(record).expect("match record serializes");
        with_retry(|| {
            sqlx::query("INSERT INTO match_history (match_id, participant_a, participant_b, body, created_at) VALUES (?, ?, ?, ?, ?)")
                .bind(record.match_id.to_string())
                .bind(record.participant_a.map(|c| c.to_string()))
                .bind(record.participant_b.map(|c| c.to_string()))
                .bind(&body)
                .bind(record.timestamp.to_rfc3339())
                .execute(&self.pool)
        })
        .await?;
        Ok(())
    }

    async fn list_matches(&self, character_id: CharacterId, limit: u32) -> AppResult<Vec<MatchRecord>> {
        let id = character_id.to_string();
        let rows = sqlx::query(
            "SELECT body FROM match_history WHERE participant_a = ? OR participant_b = ? ORDER BY created_at DESC LIMIT ?",
        )
        .bind(&id)
        .bind(&id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| serde_json::from_str(r.get::<String, _>("body").as_str()).expect("valid match json"))
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
                let row = sqlx::query("SELECT body FROM characters WHERE character_id = ?")
                    .bind(character_id.to_string())
                    .fetch_optional(&mut *tx)
                    .await?
                    .ok_or(sqlx::Error::RowNotFound)?;
                let mut character: Character =
                    serde_json::from_str(row.get::<String, _>("body").as_str()).expect("valid character json");
                character.rating = new_rating.max(crate::models::MIN_RATING);
                if won {
                    character.wins += 1;
                } else {
                    character.losses += 1;
                }
                let body = serde_json::to_string(&character).expect("character serializes");
                sqlx::query("UPDATE characters SET body = ?, rating = ?, updated_at = ? WHERE character_id = ?")
                    .bind(&body)
                    .bind(character.rating)
                    .bind(Utc::now().to_rfc3339())
                    .bind(character_id.to_string())
                    .execute(&mut *tx)
                    .await?;
            }

            let body = serde_json::to_string(record).expect("match record serializes");
            sqlx::query("INSERT INTO match_history (match_id, participant_a, participant_b, body, created_at) VALUES (?, ?, ?, ?, ?)")
                .bind(record.match_id.to_string())
                .bind(record.participant_a.map(|c| c.to_string()))
                .bind(record.participant_b.map(|c| c.to_string()))
                .bind(&body)
                .bind(record.timestamp.to_rfc3339())
                .execute(&mut *tx)
                .await?;

            tx.commit().await
        })
        .await?;
        Ok(())
    }
}

fn row_to_user(row: sqlx::sqlite::SqliteRow) -> User {
    User {
        user_id: row.get::<String, _>("user_id").parse().expect("valid uuid"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        email: row.get("email"),
        created_at: chrono::DateTime::parse_from_rfc3339(&row.get::<String, _>("created_at"))
            .expect("valid timestamp")
            .with_timezone(&Utc),
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("2067") || db.code().as_deref() == Some("1555"))
}
