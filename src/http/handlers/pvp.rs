//! `/api/pvp/queue`. Pairing itself happens out-of-band
//! in the queue-sweep; these handlers only manage a user's own
//! ticket.

use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::http::middleware::AuthUser;
use crate::ids::CharacterId;
use crate::matchmaking;
use crate::models::matchmaking::QueuePreferences;
use crate::store::ephemeral::keys;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct EnqueueRequest {
    pub character_id: CharacterId,
    #[serde(default)]
    pub allow_bot_fallback: bool,
}

#[derive(Serialize)]
pub struct EnqueueResponse {
    pub ticket_id: crate::ids::TicketId,
    pub position: usize,
}

pub async fn enqueue(
    State(ctx): State<AppContext>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<EnqueueRequest>,
) -> AppResult<Json<EnqueueResponse>> {
    let character = ctx.db.get_character(body.character_id).await?.ok_or_else(|| AppError::NotFound("character".into()))?;
    if character.user_id != user_id {
        return Err(AppError::Forbidden);
    }
    if character.active_combat.is_some() {
        return Err(AppError::Conflict("character already in an active combat".into()));
    }

    let preferences = QueuePreferences { allow_bot_fallback: body.allow_bot_fallback };
    let ticket = matchmaking::enqueue(&ctx, user_id, body.character_id, character.rating, preferences).await?;

    let members = ctx.cache.zrange_by_score(keys::PVP_QUEUE, f64::MIN, character.rating as f64).await?;
    Ok(Json(EnqueueResponse { ticket_id: ticket.ticket_id, position: members.len() }))
}

pub async fn cancel(State(ctx): State<AppContext>, AuthUser(user_id): AuthUser) -> AppResult<Json<serde_json::Value>> {
    matchmaking::cancel(&ctx, user_id).await?;
    Ok(Json(serde_json::json!({ "cancelled": true })))
}

/// Queue status poll: whether the user's ticket has been paired yet.
/// Pairing itself is a side effect of the queue-sweep, so this handler
/// only reports state, it never pairs synchronously.
pub async fn status(State(ctx): State<AppContext>, AuthUser(user_id): AuthUser) -> AppResult<Json<serde_json::Value>> {
    let in_queue = ctx
        .cache
        .zrange_by_score(keys::PVP_QUEUE, f64::MIN, f64::MAX)
        .await?
        .iter()
        .any(|m| m.parse::<crate::ids::UserId>().map(|u| u == user_id).unwrap_or(false));
    Ok(Json(serde_json::json!({ "queued": in_queue })))
}
