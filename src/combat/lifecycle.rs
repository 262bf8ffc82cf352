//! Glue between the pure state machine and the stores: archiving a
//! terminal combat to C1 and clearing it from C2.

use crate::context::AppContext;
use crate::error::AppResult;
use crate::models::combat::{CombatMode, CombatState};
use crate::store::ephemeral::keys;
use chrono::Utc;

/// Archives `state` if it has reached a terminal phase; a no-op
/// otherwise. On success the combat's C2 entry and `pending_finalize`
/// marker (if any) are cleared and both characters' `active_combat` is
/// unset. On failure the combat is left in C2 and queued for the
/// combat-sweep's retry.
pub async fn finalize_if_terminal(ctx: &AppContext, state: &CombatState) -> AppResult<()> {
    if !state.is_terminal() {
        return Ok(());
    }

    let result = match state.mode {
        CombatMode::PvP => crate::matchmaking::finalize_pvp_match(ctx, state).await,
        CombatMode::PvE => match (
            state.participants[&crate::models::combat::ParticipantSlot::A].character_id,
            state.enemy_id.as_deref(),
        ) {
            (Some(character_id), Some(enemy_id)) => crate::pve::rewards::settle(ctx, character_id, enemy_id, state, CombatMode::PvE).await,
            _ => Ok(()),
        },
        CombatMode::AutoFight => Ok(()), // settled by the auto-fight loop itself
    };

    match result {
        Ok(()) => {
            ctx.cache.delete(&keys::combat(state.combat_id)).await?;
            ctx.cache.zrem(keys::PENDING_FINALIZE, &state.combat_id.to_string()).await?;
            ctx.metrics.record_combat_finished();
        }
        Err(e) => {
            tracing::warn!(combat_id = %state.combat_id, error = ?e, "deferring combat finalization to the combat sweep");
            ctx.cache.zadd(keys::PENDING_FINALIZE, &state.combat_id.to_string(), Utc::now().timestamp() as f64).await?;
        }
    }
    Ok(())
}
