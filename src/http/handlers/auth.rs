//! `/api/register`, `/api/login`, `/api/auth/refresh`.

use crate::auth::password::{hash_password, verify_or_dummy};
use crate::auth::token::{issue_token_pair, validate_token, TokenUse};
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::ids::UserId;
use crate::models::user::{validate_password, validate_username};
use axum::extract::{ConnectInfo, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub user_id: UserId,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

pub async fn register(
    State(ctx): State<AppContext>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    ctx.rate_limiters.check_register(addr.ip())?;
    validate_username(&body.username).map_err(AppError::Validation)?;
    validate_password(&body.password).map_err(AppError::Validation)?;

    let password_hash = hash_password(&body.password).map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    let user = ctx.db.create_user(&body.username, &password_hash, body.email.as_deref()).await?;
    let tokens = issue_token_pair(user.user_id, &ctx.config.jwt_secret)?;
    Ok(Json(AuthResponse { user_id: user.user_id, access_token: tokens.access_token, refresh_token: tokens.refresh_token }))
}

pub async fn login(
    State(ctx): State<AppContext>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    ctx.rate_limiters.check_login(addr.ip())?;
    let user = ctx.db.get_user(&body.username).await?;
    let hash = user.as_ref().map(|u| u.password_hash.as_str());
    if !verify_or_dummy(&body.password, hash) {
        return Err(AppError::Unauthenticated);
    }
    let user = user.expect("verify_or_dummy only succeeds when a user was found");
    let tokens = issue_token_pair(user.user_id, &ctx.config.jwt_secret)?;
    Ok(Json(AuthResponse { user_id: user.user_id, access_token: tokens.access_token, refresh_token: tokens.refresh_token }))
}

pub async fn refresh(State(ctx): State<AppContext>, Json(body): Json<RefreshRequest>) -> AppResult<Json<RefreshResponse>> {
    let claims = validate_token(&body.refresh_token, &ctx.config.jwt_secret_ring, TokenUse::Refresh)?;
    // A refreshed access token only needs to verify the user still exists.
    ctx.db.get_user_by_id(claims.sub).await?.ok_or(AppError::Unauthenticated)?;
    let tokens = issue_token_pair(claims.sub, &ctx.config.jwt_secret)?;
    Ok(Json(RefreshResponse { access_token: tokens.access_token }))
}
