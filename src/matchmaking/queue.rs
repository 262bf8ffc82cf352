//! PvP queue: a `pvpqueue` sorted set keyed by rating, plus
//! one ticket blob per waiting user. Pairing and bot fallback run from
//! `run_pairing_pass`, invoked by the queue-sweep background loop
//! every 2 seconds.

use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::ids::{CharacterId, TicketId, UserId};
use crate::matchmaking::rating;
use crate::models::combat::{CombatMode, MatchRecord, ParticipantKind, ParticipantSlot};
use crate::models::matchmaking::{MatchmakingTicket, QueuePreferences};
use crate::store::ephemeral::{keys, ttl};
use chrono::Utc;

const BOT_FALLBACK_AFTER_SECONDS: i64 = 60;

fn ticket_key(user_id: UserId) -> String {
    format!("pvpqueue:ticket:{user_id}")
}

pub async fn enqueue(
    ctx: &AppContext,
    user_id: UserId,
    character_id: CharacterId,
    rating_at_enqueue: i32,
    preferences: QueuePreferences,
) -> AppResult<MatchmakingTicket> {
    if crate::store::ephemeral::traits::get_json::<MatchmakingTicket>(ctx.cache.as_ref(), &ticket_key(user_id)).await?.is_some() {
        return Err(AppError::Conflict("user already has a ticket in the matchmaking queue".into()));
    }
    let ticket = MatchmakingTicket {
        ticket_id: TicketId::new(),
        user_id,
        character_id,
        rating_at_enqueue,
        enqueued_at: Utc::now(),
        preferences,
    };
    crate::store::ephemeral::traits::set_json_with_ttl(ctx.cache.as_ref(), &ticket_key(user_id), &ticket, ttl::QUEUE_ENTRY).await?;
    ctx.cache.zadd(keys::PVP_QUEUE, &user_id.to_string(), rating_at_enqueue as f64).await?;
    Ok(ticket)
}

/// Idempotent: leaving a queue you're not in is a no-op success.
pub async fn cancel(ctx: &AppContext, user_id: UserId) -> AppResult<()> {
    ctx.cache.zrem(keys::PVP_QUEUE, &user_id.to_string()).await?;
    ctx.cache.delete(&ticket_key(user_id)).await?;
    Ok(())
}

pub struct PairedMatch {
    pub combat: crate::models::combat::CombatState,
}

/// Runs one pairing pass over the whole queue. Returns the combats instantiated
/// this pass; callers persist them to C2 themselves.
pub async fn run_pairing_pass(ctx: &AppContext) -> AppResult<Vec<PairedMatch>> {
    let member_ids = ctx.cache.zrange_by_score(keys::PVP_QUEUE, f64::MIN, f64::MAX).await?;
    let mut tickets = Vec::new();
    for member in &member_ids {
        let Ok(user_id) = member.parse::<UserId>() else { continue };
        if let Some(ticket) = crate::store::ephemeral::traits::get_json::<MatchmakingTicket>(ctx.cache.as_ref(), &ticket_key(user_id)).await? {
            tickets.push(ticket);
        }
    }

    let now = Utc::now();
    // Oldest first, tie-break by lower user_id.
    tickets.sort_by(|a, b| a.enqueued_at.cmp(&b.enqueued_at).then(a.user_id.cmp(&b.user_id)));

    let mut paired = vec![false; tickets.len()];
    let mut results = Vec::new();

    for i in 0..tickets.len() {
        if paired[i] {
            continue;
        }
        let age = tickets[i].age_seconds(now);
        let window = MatchmakingTicket::window(age) as i32;

        let mut best: Option<usize> = None;
        for j in 0..tickets.len() {
            if j == i || paired[j] {
                continue;
            }
            let diff = (tickets[i].rating_at_enqueue - tickets[j].rating_at_enqueue).abs();
            if diff > window {
                continue;
            }
            match best {
                None => best = Some(j),
                Some(b) => {
                    let best_diff = (tickets[i].rating_at_enqueue - tickets[b].rating_at_enqueue).abs();
                    if diff < best_diff {
                        best = Some(j);
                    }
                }
            }
        }

        if let Some(j) = best {
            paired[i] = true;
            paired[j] = true;
            match pair_tickets(ctx, &tickets[i], &tickets[j]).await {
                Ok(Some(m)) => results.push(m),
                Ok(None) => tracing::info!("dropped stale PvP ticket(s): character already in active combat"),
                Err(e) => tracing::warn!(error = ?e, "failed to instantiate paired PvP combat"),
            }
        } else if age >= BOT_FALLBACK_AFTER_SECONDS && tickets[i].preferences.allow_bot_fallback {
            paired[i] = true;
            match pair_with_bot(ctx, &tickets[i]).await {
                Ok(Some(m)) => results.push(m),
                Ok(None) => tracing::info!("dropped stale PvP ticket: character already in active combat"),
                Err(e) => tracing::warn!(error = ?e, "failed to instantiate bot-fallback PvP combat"),
            }
        }
    }

    for (idx, ticket) in tickets.iter().enumerate() {
        if paired[idx] {
            cancel(ctx, ticket.user_id).await.ok();
        }
    }

    Ok(results)
}

async fn load_participant(ctx: &AppContext, character_id: CharacterId) -> AppResult<(crate::models::character::Character, crate::models::combat::Participant)> {
    let character = ctx.db.get_character(character_id).await?.ok_or_else(|| AppError::NotFound("character".into()))?;
    let equipment_total = crate::stats::sum_equipment_modifiers(character.equipped.values().map(|e| &e.modifiers));
    let derived = crate::stats::derive_stats(&character.base_stats, &equipment_total, character.level, character.faction);
    let participant = crate::combat::snapshot_participant(
        ParticipantKind::Player,
        Some(character.character_id),
        character.name.clone(),
        character.faction,
        derived,
        character.active_loadout.clone(),
    );
    Ok((character, participant))
}

/// Re-validates that neither ticket's character has entered another
/// combat since enqueueing — a ticket can go stale between the
/// enqueue-time check and this pairing pass running.
fn still_available(character: &crate::models::character::Character) -> bool {
    character.active_combat.is_none()
}

async fn pair_tickets(ctx: &AppContext, a: &MatchmakingTicket, b: &MatchmakingTicket) -> AppResult<Option<PairedMatch>> {
    let (ca, pa) = load_participant(ctx, a.character_id).await?;
    let (cb, pb) = load_participant(ctx, b.character_id).await?;
    if !still_available(&ca) || !still_available(&cb) {
        return Ok(None);
    }
    let combat = crate::combat::start_combat(a.user_id, CombatMode::PvP, pa, pb, Utc::now().timestamp());
    Ok(Some(PairedMatch { combat }))
}

/// Rating-appropriate bot: a PvE-styled opponent mirroring the waiting
/// player's own derived stats.
async fn pair_with_bot(ctx: &AppContext, ticket: &MatchmakingTicket) -> AppResult<Option<PairedMatch>> {
    let (ca, pa) = load_participant(ctx, ticket.character_id).await?;
    if !still_available(&ca) {
        return Ok(None);
    }
    let mut bot = pa.clone();
    bot.kind = ParticipantKind::Enemy;
    bot.character_id = None;
    bot.name = format!("{} (mirror)", pa.name);
    let combat = crate::combat::start_combat(ticket.user_id, CombatMode::PvP, pa, bot, Utc::now().timestamp());
    Ok(Some(PairedMatch { combat }))
}

/// Applies the rating update and archives the match once a PvP combat
/// (real or bot) has reached its terminal state.
pub async fn finalize_pvp_match(ctx: &AppContext, combat: &crate::models::combat::CombatState) -> AppResult<()> {
    let a = &combat.participants[&ParticipantSlot::A];
    let b = &combat.participants[&ParticipantSlot::B];
    let a_won = combat.winner == Some(ParticipantSlot::A);

    let match_id = crate::ids::MatchId::new();
    let record = MatchRecord {
        match_id,
        combat_id: combat.combat_id,
        mode: CombatMode::PvP,
        participant_a: a.character_id,
        participant_b: b.character_id,
        winner: if a_won { a.character_id } else { b.character_id },
        rating_delta_a: 0,
        rating_delta_b: 0,
        duration_turns: combat.turn,
        termination_reason: combat.termination_reason.unwrap_or(crate::models::combat::TerminationReason::TurnCap),
        timestamp: Utc::now(),
    };

    match (a.character_id, b.character_id) {
        (Some(a_id), Some(b_id)) => {
            let character_a = ctx.db.get_character(a_id).await?.ok_or_else(|| AppError::NotFound("character".into()))?;
            let character_b = ctx.db.get_character(b_id).await?.ok_or_else(|| AppError::NotFound("character".into()))?;
            let (new_a, new_b) = rating::apply_match(character_a.rating, character_b.rating, a_won);
            let mut record = record;
            record.rating_delta_a = new_a - character_a.rating;
            record.rating_delta_b = new_b - character_b.rating;
            ctx.db.finish_ranked_match(a_id, new_a, a_won, b_id, new_b, !a_won, &record).await
        }
        (Some(a_id), None) => {
            // Bot opponent: treat the bot's rating as equal to the player's
            // own at match time so the update is a fair E=0.5 baseline.
            let character_a = ctx.db.get_character(a_id).await?.ok_or_else(|| AppError::NotFound("character".into()))?;
            let (new_a, _) = rating::apply_match(character_a.rating, character_a.rating, a_won);
            let mut updated = character_a.clone();
            updated.rating = new_a;
            if a_won {
                updated.wins += 1;
            } else {
                updated.losses += 1;
            }
            let mut record = record;
            record.rating_delta_a = new_a - character_a.rating;
            ctx.db.upsert_character(&updated).await?;
            ctx.db.append_match(&record).await
        }
        _ => ctx.db.append_match(&record).await,
    }
}
