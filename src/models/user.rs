use crate::ids::UserId;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{3,50}$").unwrap());

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Username: 3-50 chars, `[A-Za-z0-9_]`, case-preserving, lookup is
/// case-sensitive.
pub fn validate_username(username: &str) -> Result<(), String> {
    if USERNAME_RE.is_match(username) {
        Ok(())
    } else {
        Err("username must be 3-50 chars of letters, digits, or underscore".to_string())
    }
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() >= 8 && password.len() <= 256 {
        Ok(())
    } else {
        Err("password must be 8-256 characters".to_string())
    }
}
