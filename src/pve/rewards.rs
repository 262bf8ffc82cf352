//! Shared PvE settlement. Used by
//! both the manual one-off `StartPvE` handler and the auto-fight loop
//! so the two code paths can't drift.

use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::ids::{CharacterId, MatchId};
use crate::models::character::Character;
use crate::models::combat::{CombatMode, CombatState, MatchRecord, ParticipantSlot, TerminationReason};
use crate::pve::catalog::{enemy_by_id, RewardTable};
use chrono::Utc;

const XP_PER_LEVEL: u64 = 100;

pub async fn settle(ctx: &AppContext, character_id: CharacterId, enemy_id: &str, combat: &CombatState, mode: CombatMode) -> AppResult<()> {
    let won = combat.winner == Some(ParticipantSlot::A);
    let mut character = ctx
        .db
        .get_character(character_id)
        .await?
        .ok_or_else(|| AppError::NotFound("character".into()))?;

    if won {
        if let Some(enemy) = enemy_by_id(enemy_id) {
            apply_rewards(&mut character, &enemy.rewards);
        }
    } else {
        character.current_hp = character.max_hp_cache;
    }
    character.active_combat = None;
    ctx.db.upsert_character(&character).await?;

    let record = MatchRecord {
        match_id: MatchId::new(),
        combat_id: combat.combat_id,
        mode,
        participant_a: Some(character_id),
        participant_b: None,
        winner: if won { Some(character_id) } else { None },
        rating_delta_a: 0,
        rating_delta_b: 0,
        duration_turns: combat.turn,
        termination_reason: combat.termination_reason.unwrap_or(TerminationReason::TurnCap),
        timestamp: Utc::now(),
    };
    ctx.db.append_match(&record).await
}

fn apply_rewards(character: &mut Character, rewards: &RewardTable) {
    character.xp += rewards.xp;
    character.gold += rewards.gold;
    character.current_hp = character.max_hp_cache;

    while character.xp >= character.level as u64 * XP_PER_LEVEL && character.level < 100 {
        character.xp -= character.level as u64 * XP_PER_LEVEL;
        character.level += 1;
        character.unspent_points += 3;
    }
    character.sync_learned_abilities();
}
