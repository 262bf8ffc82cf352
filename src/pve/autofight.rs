//! Server-driven PvE loop: runs turns at a capped rate until terminal
//! or cancelled, checkpointing progress to the ephemeral store after
//! each turn. The same turn-dispatch path used by the interactive
//! combat handlers drives both sides, since neither participant is
//! waiting on client input here.

use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::ids::CharacterId;
use crate::models::ability::ability_by_id;
use crate::models::combat::{ActionKind, CombatAction, CombatMode, CombatState, ParticipantKind, ParticipantSlot};
use crate::pve::catalog::enemy_by_id;
use crate::pve::rewards;
use crate::store::ephemeral::{keys, ttl};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum wall-clock spacing between simulated turns.
const MIN_TURN_INTERVAL_MS: i64 = 200;
const MAX_TURNS_PER_POLL: u32 = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoFightSession {
    pub character_id: CharacterId,
    pub enemy_id: String,
    pub combat: CombatState,
    pub last_tick_at: DateTime<Utc>,
    pub cancelled: bool,
}

/// Picks an off-cooldown, predicate-satisfied ability if one is
/// available, otherwise a basic attack. Deterministic given the combat
/// state so auto-fight stays reproducible from the same seed.
fn choose_action(state: &CombatState, slot: ParticipantSlot) -> CombatAction {
    let actor = &state.participants[&slot];
    let target_slot = slot.other();
    for ability_id in &actor.loadout {
        if ability_id == "basic_strike" {
            continue;
        }
        let Some(ability) = ability_by_id(ability_id) else { continue };
        if actor.cooldowns.get(ability.id).copied().unwrap_or(0) > 0 {
            continue;
        }
        let predicates_ok = ability.predicates.iter().all(|p| match p {
            crate::models::ability::ConditionalPredicate::RequiresInvisible => {
                actor.has_status(crate::models::ability::StatusKind::Invisible)
            }
            crate::models::ability::ConditionalPredicate::RequiresTargetHasStatus(kind) => {
                state.participants[&target_slot].has_status(*kind)
            }
        });
        if predicates_ok {
            return CombatAction { kind: ActionKind::Ability, ability_id: Some(ability.id.to_string()) };
        }
    }
    CombatAction { kind: ActionKind::Attack, ability_id: None }
}

pub async fn start(ctx: &AppContext, character_id: CharacterId, enemy_id: &str) -> AppResult<AutoFightSession> {
    let character = ctx
        .db
        .get_character(character_id)
        .await?
        .ok_or_else(|| AppError::NotFound("character".into()))?;
    if character.active_combat.is_some() {
        return Err(AppError::Conflict("character already in an active combat".into()));
    }
    let enemy = enemy_by_id(enemy_id).ok_or_else(|| AppError::Validation("unknown enemy_id".into()))?;

    let equipment_total = crate::stats::sum_equipment_modifiers(character.equipped.values().map(|e| &e.modifiers));
    let player_derived = crate::stats::derive_stats(&character.base_stats, &equipment_total, character.level, character.faction);
    let player = crate::combat::snapshot_participant(
        ParticipantKind::Player,
        Some(character.character_id),
        character.name.clone(),
        character.faction,
        player_derived,
        character.active_loadout.clone(),
    );

    let enemy_derived = crate::stats::derive_stats(&enemy.base_stats, &Default::default(), enemy.level, enemy.faction);
    let enemy_loadout = enemy.faction.ability_ids().iter().map(|s| s.to_string()).collect();
    let enemy_participant = crate::combat::snapshot_participant(
        ParticipantKind::Enemy,
        None,
        enemy.name.to_string(),
        enemy.faction,
        enemy_derived,
        enemy_loadout,
    );

    let mut combat = crate::combat::start_combat(character.user_id, CombatMode::AutoFight, player, enemy_participant, Utc::now().timestamp());
    combat.enemy_id = Some(enemy_id.to_string());

    let session = AutoFightSession {
        character_id,
        enemy_id: enemy_id.to_string(),
        combat,
        last_tick_at: Utc::now(),
        cancelled: false,
    };
    crate::store::ephemeral::traits::set_json_with_ttl(ctx.cache.as_ref(), &keys::autofight(character_id), &session, ttl::AUTOFIGHT).await?;
    Ok(session)
}

/// Advances the session by as many turns as the elapsed wall-clock
/// time allows, capped at `MAX_TURNS_PER_POLL` per call so one slow
/// poll can't replay an unbounded backlog of turns at once.
pub async fn advance(ctx: &AppContext, character_id: CharacterId) -> AppResult<AutoFightSession> {
    let key = keys::autofight(character_id);
    let mut session: AutoFightSession = crate::store::ephemeral::traits::get_json(ctx.cache.as_ref(), &key)
        .await?
        .ok_or_else(|| AppError::NotFound("no active auto-fight session".into()))?;

    if session.cancelled || session.combat.is_terminal() {
        return Ok(session);
    }

    let now = Utc::now();
    let elapsed_ms = (now - session.last_tick_at).num_milliseconds().max(0);
    let allowed_turns = ((elapsed_ms / MIN_TURN_INTERVAL_MS) as u32).min(MAX_TURNS_PER_POLL);

    for _ in 0..allowed_turns {
        if session.combat.is_terminal() {
            break;
        }
        let actor = session.combat.current_actor;
        let action = choose_action(&session.combat, actor);
        crate::combat::submit_action(&mut session.combat, actor, action)?;
    }
    if allowed_turns > 0 {
        session.last_tick_at = now;
    }

    if session.combat.is_terminal() {
        rewards::settle(ctx, session.character_id, &session.enemy_id, &session.combat, CombatMode::AutoFight).await?;
        ctx.cache.delete(&key).await?;
    } else {
        crate::store::ephemeral::traits::set_json_with_ttl(ctx.cache.as_ref(), &key, &session, ttl::AUTOFIGHT).await?;
    }
    Ok(session)
}

/// Idempotent: cancelling a session that's already gone is a no-op
/// success, not an error.
pub async fn cancel(ctx: &AppContext, character_id: CharacterId) -> AppResult<()> {
    let key = keys::autofight(character_id);
    ctx.cache.delete(&key).await?;
    Ok(())
}
