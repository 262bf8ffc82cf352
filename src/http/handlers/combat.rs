//! `/api/combat/*`: start, fetch, submit an action, and list a
//! character's match history. Each mutating handler loads state,
//! validates ownership, dispatches into the pure simulator, writes
//! back under CAS, and maps the result onto the public combat-state
//! payload.

use crate::combat::{snapshot_participant, start_combat, submit_action};
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::http::middleware::AuthUser;
use crate::ids::{CharacterId, CombatId};
use crate::models::combat::{
    ActionKind, ActiveStatus, CombatAction, CombatMode, CombatState, ParticipantKind, ParticipantSlot,
};
use crate::pve::catalog::enemy_by_id;
use crate::store::ephemeral::{keys, ttl};
use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

#[derive(Serialize)]
pub struct ParticipantView {
    pub id: Option<CharacterId>,
    pub name: String,
    pub hp: u32,
    pub max_hp: u32,
    pub statuses: Vec<StatusView>,
    pub cooldowns: HashMap<&'static str, u32>,
}

#[derive(Serialize)]
pub struct StatusView {
    pub kind: crate::models::ability::StatusKind,
    pub duration: u32,
}

#[derive(Serialize)]
pub struct CombatStateView {
    pub combat_id: CombatId,
    pub turn: u32,
    pub current_actor: ParticipantSlot,
    pub participants: Vec<ParticipantView>,
    pub log: Vec<crate::models::combat::ActionLogEvent>,
    pub status: &'static str,
    pub winner: Option<ParticipantSlot>,
}

impl From<&CombatState> for CombatStateView {
    fn from(state: &CombatState) -> Self {
        let mut participants = Vec::with_capacity(2);
        for slot in [ParticipantSlot::A, ParticipantSlot::B] {
            let p = &state.participants[&slot];
            participants.push(ParticipantView {
                id: p.character_id,
                name: p.name.clone(),
                hp: p.current_hp,
                max_hp: p.max_hp(),
                statuses: p.statuses.iter().map(|s: &ActiveStatus| StatusView { kind: s.kind, duration: s.duration }).collect(),
                cooldowns: p.cooldowns.clone(),
            });
        }
        Self {
            combat_id: state.combat_id,
            turn: state.turn,
            current_actor: state.current_actor,
            participants,
            log: state.log.clone(),
            status: if state.is_terminal() { "terminal" } else { "ongoing" },
            winner: state.winner,
        }
    }
}

#[derive(Deserialize)]
pub struct StartCombatRequest {
    pub character_id: CharacterId,
    pub mode: CombatMode,
    pub enemy_id: Option<String>,
}

/// `PvP` combats are never started synchronously here — they're only
/// ever instantiated by the matchmaking queue sweep. A client asking
/// for `PvP` through this endpoint gets routed to the queue instead so
/// the one public "start a fight" entry point stays coherent across
/// modes.
pub async fn start(
    State(ctx): State<AppContext>,
    AuthUser(user_id): AuthUser,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    Json(body): Json<StartCombatRequest>,
) -> AppResult<Json<CombatStateView>> {
    ctx.rate_limiters.check_combat_start(addr.ip())?;
    let character = ctx.db.get_character(body.character_id).await?.ok_or_else(|| AppError::NotFound("character".into()))?;
    if character.user_id != user_id {
        return Err(AppError::Forbidden);
    }
    if character.active_combat.is_some() {
        return Err(AppError::Conflict("character already in an active combat".into()));
    }

    match body.mode {
        CombatMode::PvE => {
            let enemy_id = body.enemy_id.ok_or_else(|| AppError::Validation("enemy_id required for PvE".into()))?;
            let enemy = enemy_by_id(&enemy_id).ok_or_else(|| AppError::Validation("unknown enemy_id".into()))?;

            let equipment_total = crate::stats::sum_equipment_modifiers(character.equipped.values().map(|e| &e.modifiers));
            let player_derived = crate::stats::derive_stats(&character.base_stats, &equipment_total, character.level, character.faction);
            let player = snapshot_participant(
                ParticipantKind::Player,
                Some(character.character_id),
                character.name.clone(),
                character.faction,
                player_derived,
                character.active_loadout.clone(),
            );

            let enemy_derived = crate::stats::derive_stats(&enemy.base_stats, &Default::default(), enemy.level, enemy.faction);
            let enemy_loadout = enemy.faction.ability_ids().iter().map(|s| s.to_string()).collect();
            let enemy_participant =
                snapshot_participant(ParticipantKind::Enemy, None, enemy.name.to_string(), enemy.faction, enemy_derived, enemy_loadout);

            let mut combat = start_combat(user_id, CombatMode::PvE, player, enemy_participant, Utc::now().timestamp());
            combat.enemy_id = Some(enemy_id);

            let mut updated = character;
            updated.active_combat = Some(combat.combat_id);
            ctx.db.upsert_character(&updated).await?;
            crate::store::ephemeral::traits::set_json_with_ttl(ctx.cache.as_ref(), &keys::combat(combat.combat_id), &combat, ttl::COMBAT).await?;
            ctx.metrics.record_combat_started();
            Ok(Json(CombatStateView::from(&combat)))
        }
        CombatMode::PvP => Err(AppError::Validation("PvP combats are started by enqueueing via /api/pvp/queue".into())),
        CombatMode::AutoFight => {
            let enemy_id = body.enemy_id.ok_or_else(|| AppError::Validation("enemy_id required for auto-fight".into()))?;
            let session = crate::pve::autofight::start(&ctx, body.character_id, &enemy_id).await?;
            Ok(Json(CombatStateView::from(&session.combat)))
        }
    }
}

pub async fn get(State(ctx): State<AppContext>, AuthUser(user_id): AuthUser, Path(combat_id): Path<CombatId>) -> AppResult<Json<CombatStateView>> {
    let state: CombatState = crate::store::ephemeral::traits::get_json(ctx.cache.as_ref(), &keys::combat(combat_id))
        .await?
        .ok_or_else(|| AppError::NotFound("combat".into()))?;
    if state.owner != user_id {
        return Err(AppError::Forbidden);
    }
    Ok(Json(CombatStateView::from(&state)))
}

#[derive(Deserialize)]
pub struct SubmitActionRequest {
    pub action_type: ActionKind,
    pub ability_id: Option<String>,
}

/// Idempotency key: `(combat_id, turn, actor, action_hash)`. A retried
/// request with the same key returns the cached response instead of
/// re-submitting the action.
fn idempotency_key(combat_id: CombatId, turn: u32, actor: ParticipantSlot, action: &SubmitActionRequest) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{:?}", action.action_type).as_bytes());
    hasher.update(action.ability_id.as_deref().unwrap_or("").as_bytes());
    let digest = hasher.finalize();
    keys::idempotency(&format!("{combat_id}:{turn}:{actor:?}:{digest:x}"))
}

pub async fn submit(
    State(ctx): State<AppContext>,
    AuthUser(user_id): AuthUser,
    Path(combat_id): Path<CombatId>,
    Json(body): Json<SubmitActionRequest>,
) -> AppResult<Json<CombatStateView>> {
    let mut state: CombatState = crate::store::ephemeral::traits::get_json(ctx.cache.as_ref(), &keys::combat(combat_id))
        .await?
        .ok_or_else(|| AppError::NotFound("combat".into()))?;
    if state.owner != user_id {
        return Err(AppError::Forbidden);
    }
    if state.mode == CombatMode::AutoFight {
        return Err(AppError::Validation("auto-fight combats don't take manual actions".into()));
    }

    let actor_slot = state.current_actor;
    let idem_key = idempotency_key(combat_id, state.turn, actor_slot, &body);
    if let Some(cached) = crate::store::ephemeral::traits::get_json::<CombatStateView>(ctx.cache.as_ref(), &idem_key).await? {
        return Ok(Json(cached));
    }

    let expected_version = state.version;
    let action = CombatAction { kind: body.action_type, ability_id: body.ability_id };
    submit_action(&mut state, actor_slot, action)?;

    let swapped = ctx
        .cache
        .compare_and_swap_raw(
            &keys::combat(combat_id),
            expected_version,
            serde_json::to_vec(&state).expect("combat state serializes"),
            ttl::COMBAT,
        )
        .await?;
    if !swapped {
        return Err(AppError::Conflict("combat state changed concurrently, retry".into()));
    }

    crate::combat::finalize_if_terminal(&ctx, &state).await?;

    let view = CombatStateView::from(&state);
    crate::store::ephemeral::traits::set_json_with_ttl(ctx.cache.as_ref(), &idem_key, &view, ttl::IDEMPOTENCY).await?;
    Ok(Json(view))
}

pub async fn history(
    State(ctx): State<AppContext>,
    AuthUser(user_id): AuthUser,
    Path(character_id): Path<CharacterId>,
) -> AppResult<Json<Vec<crate::models::combat::MatchRecord>>> {
    let character = ctx.db.get_character(character_id).await?.ok_or_else(|| AppError::NotFound("character".into()))?;
    if character.user_id != user_id {
        return Err(AppError::Forbidden);
    }
    Ok(Json(ctx.db.list_matches(character_id, 50).await?))
}

/// Cooperative cancellation point for auto-fight.
pub async fn cancel_autofight(
    State(ctx): State<AppContext>,
    AuthUser(user_id): AuthUser,
    Path(character_id): Path<CharacterId>,
) -> AppResult<Json<serde_json::Value>> {
    let character = ctx.db.get_character(character_id).await?.ok_or_else(|| AppError::NotFound("character".into()))?;
    if character.user_id != user_id {
        return Err(AppError::Forbidden);
    }
    crate::pve::autofight::cancel(&ctx, character_id).await?;
    Ok(Json(serde_json::json!({ "cancelled": true })))
}

pub async fn poll_autofight(
    State(ctx): State<AppContext>,
    AuthUser(user_id): AuthUser,
    Path(character_id): Path<CharacterId>,
) -> AppResult<Json<CombatStateView>> {
    let character = ctx.db.get_character(character_id).await?.ok_or_else(|| AppError::NotFound("character".into()))?;
    if character.user_id != user_id {
        return Err(AppError::Forbidden);
    }
    let session = crate::pve::autofight::advance(&ctx, character_id).await?;
    Ok(Json(CombatStateView::from(&session.combat)))
}
