//! Combat lifecycle: `start_combat` and `submit_action`. Validates
//! turn/state/cooldown, dispatches into the data-driven `Ability`
//! catalog, mutates state, then checks for a terminal outcome.

use crate::combat::effective_stats::effective_value;
use crate::combat::rng::{seed_from, CombatRng};
use crate::combat::resolution::{apply_status, pre_action_tick, resolve_hit, tick_turn_end};
use crate::error::{AppError, AppResult};
use crate::ids::CombatId;
use crate::models::ability::{ability_by_id, AbilityEffect, ConditionalPredicate, StatusKind, TargetRule};
use crate::models::combat::{
    ActionKind, ActionLogEvent, CombatAction, CombatMode, CombatPhase, CombatState, Participant,
    ParticipantSlot, StatDelta, TerminationReason,
};
use crate::models::faction::Faction;
use crate::stats::DerivedStatKind;
use chrono::Utc;
use std::collections::HashMap;

pub const TURN_CAP: u32 = 200;

pub fn start_combat(
    owner: crate::ids::UserId,
    mode: CombatMode,
    a: Participant,
    b: Participant,
    server_epoch: i64,
) -> CombatState {
    let combat_id = CombatId::new();
    let seed = seed_from(&combat_id.to_string(), server_epoch);

    let a_initiative = effective_value(&a, DerivedStatKind::Speed) + a.base_derived.turn_meter_bonus;
    let b_initiative = effective_value(&b, DerivedStatKind::Speed) + b.base_derived.turn_meter_bonus;
    let current_actor = if b_initiative > a_initiative { ParticipantSlot::B } else { ParticipantSlot::A };

    let mut participants = HashMap::new();
    participants.insert(ParticipantSlot::A, a);
    participants.insert(ParticipantSlot::B, b);

    CombatState {
        combat_id,
        owner,
        mode,
        participants,
        turn: 1,
        current_actor,
        seed,
        rng_cursor: 0,
        phase: CombatPhase::AwaitingAction,
        winner: None,
        termination_reason: None,
        log: Vec::new(),
        version: 0,
        created_at: Utc::now(),
        enemy_id: None,
    }
}

fn pick_power(attacker: &Participant, scaling_stat: crate::models::character::StatKind, multiplier: f64) -> f64 {
    use crate::models::character::StatKind;
    let base = match scaling_stat {
        StatKind::Arcana | StatKind::Insight => effective_value(attacker, DerivedStatKind::SpellPower),
        _ => effective_value(attacker, DerivedStatKind::AttackPower),
    };
    base * multiplier
}

fn faction_modifiers(attacker: &Participant, defender: &Participant) -> (f64, f64) {
    let (dealt, _taken_self) = attacker.faction.passive_modifiers();
    let (_dealt_def, taken) = defender.faction.passive_modifiers();
    (dealt, taken)
}

/// Validates and resolves a single submitted action against `state`,
/// mutating it in place. Callers are responsible for the CAS write-back;
/// on any `Err` the state passed in must be discarded unmodified by the
/// caller (we never partially mutate a caller-visible copy — see
/// `http::handlers::combat`).
pub fn submit_action(state: &mut CombatState, actor_slot: ParticipantSlot, action: CombatAction) -> AppResult<()> {
    if state.is_terminal() {
        return Err(AppError::Conflict("combat already terminal".into()));
    }
    if actor_slot != state.current_actor {
        return Err(AppError::Validation("not this participant's turn".into()));
    }

    let target_slot = actor_slot.other();

    {
        let actor = state.participants.get(&actor_slot).ok_or_else(|| AppError::NotFound("participant".into()))?;
        if !actor.is_alive() {
            return Err(AppError::Validation("actor is not alive".into()));
        }
        if actor.statuses.iter().any(|s| s.kind.blocks_attacks_and_abilities()) {
            return Err(AppError::Validation("actor is disabled by a status effect".into()));
        }
        if action.kind == ActionKind::Ability && actor.statuses.iter().any(|s| s.kind.blocks_abilities_only()) {
            return Err(AppError::Validation("actor cannot use abilities while slowed".into()));
        }
    }

    let ability = match (&action.kind, &action.ability_id) {
        (ActionKind::Ability, Some(id)) => {
            let ability = ability_by_id(id).ok_or_else(|| AppError::Validation("unknown ability".into()))?;
            let actor = state.participants.get(&actor_slot).unwrap();
            if !actor.can_use_ability(ability.id) {
                return Err(AppError::Validation("ability not in actor's active loadout".into()));
            }
            if actor.cooldowns.get(ability.id).copied().unwrap_or(0) > 0 {
                return Err(AppError::Validation("ability on cooldown".into()));
            }
            for predicate in &ability.predicates {
                let satisfied = match predicate {
                    ConditionalPredicate::RequiresInvisible => actor.has_status(StatusKind::Invisible),
                    ConditionalPredicate::RequiresTargetHasStatus(kind) => {
                        state.participants.get(&target_slot).map(|t| t.has_status(*kind)).unwrap_or(false)
                    }
                };
                if !satisfied {
                    return Err(AppError::Validation("ability predicate not satisfied".into()));
                }
            }
            Some(ability)
        }
        (ActionKind::Ability, None) => return Err(AppError::Validation("ability action missing ability_id".into())),
        _ => None,
    };

    state.phase = CombatPhase::Resolving;

    {
        let actor = state.participants.get_mut(&actor_slot).unwrap();
        pre_action_tick(actor);
        if !actor.is_alive() {
            finalize_termination(state, target_slot, TerminationReason::Kill);
            state.version += 1;
            return Ok(());
        }
    }

    let mut rng = CombatRng::resume(state.seed, state.rng_cursor);
    let mut event = ActionLogEvent {
        turn: state.turn,
        actor: actor_slot,
        kind: action.kind,
        ability_id: action.ability_id.clone(),
        target: target_slot,
        hit: true,
        crit: false,
        damage: None,
        healed: None,
        status_applied: None,
        cooldown_set: None,
    };

    let mut execute_killed = false;

    match action.kind {
        ActionKind::Defend => {
            let actor = state.participants.get_mut(&actor_slot).unwrap();
            actor.stat_deltas.push(StatDelta { stat: DerivedStatKind::Defense, magnitude: 10.0, duration: 2 });
        }
        ActionKind::Attack => {
            resolve_damage_action(state, &mut rng, actor_slot, target_slot, crate::models::character::StatKind::Might, 1.0, &mut event)?;
        }
        ActionKind::Ability => {
            let ability = ability.unwrap();
            match &ability.effect {
                AbilityEffect::Execute { threshold_pct, scaling_stat, power_multiplier } => {
                    let target_ratio = {
                        let target = state.participants.get(&target_slot).unwrap();
                        target.current_hp as f64 / target.max_hp().max(1) as f64
                    };
                    if target_ratio <= *threshold_pct {
                        let target = state.participants.get_mut(&target_slot).unwrap();
                        target.current_hp = 0;
                        event.hit = true;
                        event.damage = Some(target.max_hp());
                        execute_killed = true;
                    } else {
                        resolve_damage_action(state, &mut rng, actor_slot, target_slot, *scaling_stat, *power_multiplier, &mut event)?;
                    }
                }
                AbilityEffect::Damage { scaling_stat, power_multiplier } => {
                    resolve_damage_action(state, &mut rng, actor_slot, target_slot, *scaling_stat, *power_multiplier, &mut event)?;
                }
                AbilityEffect::Heal { scaling_stat, power_multiplier } => {
                    let heal_target = if ability.target == TargetRule::SelfTarget { actor_slot } else { target_slot };
                    let amount = {
                        let actor = state.participants.get(&actor_slot).unwrap();
                        pick_power(actor, *scaling_stat, *power_multiplier)
                    };
                    let target = state.participants.get_mut(&heal_target).unwrap();
                    let healed = amount.round() as u32;
                    target.current_hp = (target.current_hp + healed).min(target.max_hp());
                    event.damage = None;
                    event.healed = Some(healed);
                }
                AbilityEffect::Buff { stat, magnitude, duration } => {
                    let actor = state.participants.get_mut(&actor_slot).unwrap();
                    actor.stat_deltas.push(StatDelta { stat: *stat, magnitude: *magnitude, duration: duration + 1 });
                }
                AbilityEffect::Debuff { stat, magnitude, duration } => {
                    let target = state.participants.get_mut(&target_slot).unwrap();
                    target.stat_deltas.push(StatDelta { stat: *stat, magnitude: *magnitude, duration: *duration });
                }
                AbilityEffect::Control { status, duration } => {
                    let self_target = ability.target == TargetRule::SelfTarget;
                    let (owner_slot, apply_slot, dur) = if self_target {
                        (actor_slot, actor_slot, duration + 1)
                    } else {
                        (actor_slot, target_slot, *duration)
                    };
                    let source = owner_slot;
                    let participant = state.participants.get_mut(&apply_slot).unwrap();
                    apply_status(participant, *status, dur, 1.0, source);
                    event.status_applied = Some(*status);
                }
            }
            // On-hit status application, independent of the
            // ability's primary effect category.
            if let Some((kind, duration, magnitude)) = ability.on_hit_status {
                if event.hit {
                    let source = actor_slot;
                    let target = state.participants.get_mut(&target_slot).unwrap();
                    apply_status(target, kind, duration, magnitude, source);
                    event.status_applied = Some(kind);
                }
            }
        }
    }

    // Set the acting ability's cooldown.
    if let Some(ability) = ability {
        let actor = state.participants.get_mut(&actor_slot).unwrap();
        actor.cooldowns.insert(ability.id, ability.cooldown);
        event.cooldown_set = Some(ability.cooldown);
    }

    state.rng_cursor = rng.cursor;
    state.log.push(event);

    let target_dead = !state.participants.get(&target_slot).unwrap().is_alive();
    if target_dead {
        let reason = if execute_killed { TerminationReason::Execute } else { TerminationReason::Kill };
        finalize_termination(state, actor_slot, reason);
        state.version += 1;
        return Ok(());
    }

    advance_turn(state);
    state.version += 1;
    Ok(())
}

fn resolve_damage_action(
    state: &mut CombatState,
    rng: &mut CombatRng,
    actor_slot: ParticipantSlot,
    target_slot: ParticipantSlot,
    scaling_stat: crate::models::character::StatKind,
    power_multiplier: f64,
    event: &mut ActionLogEvent,
) -> AppResult<()> {
    let (dealt_mult, taken_mult) = {
        let actor = state.participants.get(&actor_slot).unwrap();
        let target = state.participants.get(&target_slot).unwrap();
        faction_modifiers(actor, target)
    };
    let power = {
        let actor = state.participants.get(&actor_slot).unwrap();
        pick_power(actor, scaling_stat, power_multiplier)
    };
    let outcome = {
        let actor = state.participants.get(&actor_slot).unwrap();
        let target = state.participants.get(&target_slot).unwrap();
        resolve_hit(rng, actor, target, power, dealt_mult, taken_mult)
    };

    event.hit = outcome.hit && !outcome.parried;
    event.crit = outcome.crit;

    if outcome.hit && !outcome.parried {
        let target = state.participants.get_mut(&target_slot).unwrap();
        target.current_hp = target.current_hp.saturating_sub(outcome.damage);
        target.damage_taken += outcome.damage as u64;
        event.damage = Some(outcome.damage);

        let actor = state.participants.get_mut(&actor_slot).unwrap();
        actor.damage_dealt += outcome.damage as u64;
        if outcome.lifesteal_healed > 0 {
            let max_hp = actor.max_hp();
            actor.current_hp = (actor.current_hp + outcome.lifesteal_healed).min(max_hp);
        }
    }
    Ok(())
}

fn advance_turn(state: &mut CombatState) {
    let acting = state.current_actor;
    for slot in [acting, acting.other()] {
        let participant = state.participants.get_mut(&slot).unwrap();
        tick_turn_end(participant);
    }
    state.turn += 1;
    state.current_actor = acting.other();
    state.phase = CombatPhase::AwaitingAction;

    if state.turn > TURN_CAP {
        let a_hp_pct = hp_pct(state, ParticipantSlot::A);
        let b_hp_pct = hp_pct(state, ParticipantSlot::B);
        let winner = if a_hp_pct >= b_hp_pct { ParticipantSlot::A } else { ParticipantSlot::B };
        finalize_termination(state, winner, TerminationReason::TurnCap);
    }
}

fn hp_pct(state: &CombatState, slot: ParticipantSlot) -> f64 {
    let p = state.participants.get(&slot).unwrap();
    p.current_hp as f64 / p.max_hp().max(1) as f64
}

fn finalize_termination(state: &mut CombatState, winner: ParticipantSlot, reason: TerminationReason) {
    state.phase = CombatPhase::Terminal;
    state.winner = Some(winner);
    state.termination_reason = Some(reason);
}

pub fn snapshot_participant(
    kind: crate::models::combat::ParticipantKind,
    character_id: Option<crate::ids::CharacterId>,
    name: String,
    faction: Faction,
    derived: crate::stats::DerivedStats,
    loadout: Vec<String>,
) -> Participant {
    Participant {
        kind,
        character_id,
        name,
        faction,
        base_derived: derived,
        current_hp: derived.max_hp,
        loadout,
        cooldowns: HashMap::new(),
        statuses: Vec::new(),
        stat_deltas: Vec::new(),
        damage_dealt: 0,
        damage_taken: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::character::{BaseStats};
    use crate::models::combat::ParticipantKind;
    use crate::models::equipment::StatModifiers;
    use crate::stats::derive_stats;

    fn make_participant(faction: Faction, base: BaseStats) -> Participant {
        let derived = derive_stats(&base, &StatModifiers::default(), 10, faction);
        let loadout = faction.ability_ids().iter().map(|s| s.to_string()).collect();
        snapshot_participant(ParticipantKind::Player, None, "test".into(), faction, derived, loadout)
    }

    #[test]
    fn turn_cap_picks_higher_hp_percentage_winner() {
        let a = make_participant(Faction::Solarian, BaseStats { might: 1, fortitude: 200, ..Default::default() });
        let b = make_participant(Faction::Umbral, BaseStats { might: 1, fortitude: 200, ..Default::default() });
        let mut state = start_combat(crate::ids::UserId::new(), CombatMode::PvP, a, b, 1);
        state.turn = TURN_CAP + 1;
        advance_turn_for_test(&mut state);
        assert!(state.is_terminal());
        assert_eq!(state.termination_reason, Some(TerminationReason::TurnCap));
    }

    fn advance_turn_for_test(state: &mut CombatState) {
        if state.turn > TURN_CAP {
            let a_hp_pct = hp_pct(state, ParticipantSlot::A);
            let b_hp_pct = hp_pct(state, ParticipantSlot::B);
            let winner = if a_hp_pct >= b_hp_pct { ParticipantSlot::A } else { ParticipantSlot::B };
            finalize_termination(state, winner, TerminationReason::TurnCap);
        }
    }

    #[test]
    fn rejects_action_from_non_current_participant() {
        let a = make_participant(Faction::Solarian, BaseStats { might: 50, ..Default::default() });
        let b = make_participant(Faction::Umbral, BaseStats { might: 50, ..Default::default() });
        let mut state = start_combat(crate::ids::UserId::new(), CombatMode::PvP, a, b, 1);
        let not_current = state.current_actor.other();
        let result = submit_action(&mut state, not_current, CombatAction { kind: ActionKind::Attack, ability_id: None });
        assert!(result.is_err());
    }

    #[test]
    fn rejects_ability_outside_actors_loadout() {
        let mut a = make_participant(Faction::Solarian, BaseStats { might: 50, finesse: 50, ..Default::default() });
        a.loadout = vec!["basic_strike".to_string()];
        let b = make_participant(Faction::Umbral, BaseStats { might: 50, ..Default::default() });
        let mut state = start_combat(crate::ids::UserId::new(), CombatMode::PvP, a, b, 1);
        state.current_actor = ParticipantSlot::A;
        let result = submit_action(
            &mut state,
            ParticipantSlot::A,
            CombatAction { kind: ActionKind::Ability, ability_id: Some("judgment".to_string()) },
        );
        assert!(result.is_err());
    }

    #[test]
    fn cooldowns_decay_for_both_participants_each_turn() {
        let a = make_participant(Faction::Solarian, BaseStats { might: 50, ..Default::default() });
        let b = make_participant(Faction::Umbral, BaseStats { might: 50, finesse: 50, ..Default::default() });
        let mut state = start_combat(crate::ids::UserId::new(), CombatMode::PvP, a, b, 1);
        state.current_actor = ParticipantSlot::A;

        submit_action(
            &mut state,
            ParticipantSlot::A,
            CombatAction { kind: ActionKind::Ability, ability_id: Some("divine_strike".to_string()) },
        )
        .unwrap();
        // The cooldown is set to 3 then immediately ticked once by this
        // action's own turn advancement.
        assert_eq!(state.participants[&ParticipantSlot::A].cooldowns.get("divine_strike").copied(), Some(2));

        submit_action(&mut state, ParticipantSlot::B, CombatAction { kind: ActionKind::Attack, ability_id: None }).unwrap();
        assert_eq!(state.participants[&ParticipantSlot::A].cooldowns.get("divine_strike").copied(), Some(1));
    }

    #[test]
    fn determinism_same_seed_same_actions_same_outcome() {
        let a1 = make_participant(Faction::Solarian, BaseStats { might: 100, finesse: 50, ..Default::default() });
        let b1 = make_participant(Faction::Umbral, BaseStats { fortitude: 100, ..Default::default() });
        let mut s1 = start_combat(crate::ids::UserId::new(), CombatMode::PvP, a1, b1, 99);
        s1.seed = 0xDEAD_BEEF;

        let a2 = make_participant(Faction::Solarian, BaseStats { might: 100, finesse: 50, ..Default::default() });
        let b2 = make_participant(Faction::Umbral, BaseStats { fortitude: 100, ..Default::default() });
        let mut s2 = start_combat(crate::ids::UserId::new(), CombatMode::PvP, a2, b2, 99);
        s2.seed = 0xDEAD_BEEF;
        s1.current_actor = ParticipantSlot::A;
        s2.current_actor = ParticipantSlot::A;

        for _ in 0..3 {
            let actor = s1.current_actor;
            submit_action(&mut s1, actor, CombatAction { kind: ActionKind::Attack, ability_id: None }).unwrap();
            let actor2 = s2.current_actor;
            submit_action(&mut s2, actor2, CombatAction { kind: ActionKind::Attack, ability_id: None }).unwrap();
        }

        assert_eq!(s1.participants[&ParticipantSlot::A].current_hp, s2.participants[&ParticipantSlot::A].current_hp);
        assert_eq!(s1.participants[&ParticipantSlot::B].current_hp, s2.participants[&ParticipantSlot::B].current_hp);
        assert_eq!(s1.log.len(), s2.log.len());
    }
}
