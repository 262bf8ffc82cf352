//! Bearer tokens: HS256 JWTs carrying `sub`, `exp`, `iat`,
//! `token_use`. The validator accepts a ring of keys (current +
//! previous) so a secret rotation doesn't invalidate live sessions.

use crate::error::{AppError, AppResult};
use crate::ids::UserId;
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub const ACCESS_TOKEN_TTL_HOURS: i64 = 24;
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenUse {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub iat: i64,
    pub exp: i64,
    pub token_use: TokenUse,
}

pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub fn issue_token_pair(user_id: UserId, signing_key: &[u8]) -> AppResult<TokenPair> {
    let access_token = issue(user_id, TokenUse::Access, ChronoDuration::hours(ACCESS_TOKEN_TTL_HOURS), signing_key)?;
    let refresh_token = issue(user_id, TokenUse::Refresh, ChronoDuration::days(REFRESH_TOKEN_TTL_DAYS), signing_key)?;
    Ok(TokenPair { access_token, refresh_token })
}

fn issue(user_id: UserId, token_use: TokenUse, ttl: ChronoDuration, signing_key: &[u8]) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims { sub: user_id, iat: now.timestamp(), exp: (now + ttl).timestamp(), token_use };
    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(signing_key))
        .map_err(|e| AppError::Unavailable(format!("token signing failed: {e}")))
}

/// Validates `token` against every key in `key_ring` (current first),
/// accepting the first that verifies.
pub fn validate_token(token: &str, key_ring: &[Vec<u8>], expected_use: TokenUse) -> AppResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    for key in key_ring {
        if let Ok(data) = decode::<Claims>(token, &DecodingKey::from_secret(key), &validation) {
            if data.claims.token_use != expected_use {
                return Err(AppError::Unauthenticated);
            }
            return Ok(data.claims);
        }
    }
    Err(AppError::Unauthenticated)
}
