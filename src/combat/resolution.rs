//! The per-action resolution pipeline.

use crate::combat::effective_stats::effective_value;
use crate::combat::rng::CombatRng;
use crate::models::ability::StatusKind;
use crate::models::combat::{ActiveStatus, Participant, ParticipantSlot};
use crate::stats::DerivedStatKind;

#[derive(Debug, Clone, Copy, Default)]
pub struct HitOutcome {
    pub hit: bool,
    pub parried: bool,
    pub crit: bool,
    pub damage: u32,
    pub lifesteal_healed: u32,
}

/// Pre-action status tick: poison/bleed damage,
/// regen healing, shield decay. Applied silently — it is not itself a
/// logged `ActionLogEvent`, only the action that follows is.
pub fn pre_action_tick(p: &mut Participant) {
    let max_hp = p.max_hp();
    for status in p.statuses.clone() {
        match status.kind {
            StatusKind::Poison | StatusKind::Bleed => {
                let dmg = (max_hp as f64 * status.magnitude).round() as u32;
                p.current_hp = p.current_hp.saturating_sub(dmg);
            }
            StatusKind::Regen => {
                let heal = (max_hp as f64 * status.magnitude).round() as u32;
                p.current_hp = (p.current_hp + heal).min(max_hp);
            }
            _ => {}
        }
    }
    // Shield decays by a fixed fraction of its remaining absorption each tick.
    for status in p.statuses.iter_mut() {
        if status.kind == StatusKind::Shield {
            status.magnitude = (status.magnitude * 0.7).max(0.0);
        }
    }
}

/// Resolves a single damage-dealing hit of `power` against `defender`,
/// given `attacker`'s current effective stats. `spell` selects whether
/// `power` scales off attack power or spell power (caller already
/// multiplied the ability's `power_multiplier` in).
pub fn resolve_hit(
    rng: &mut CombatRng,
    attacker: &Participant,
    defender: &Participant,
    power: f64,
    attacker_dealt_mult: f64,
    defender_taken_mult: f64,
) -> HitOutcome {
    let dodge_chance = if defender.has_status(StatusKind::Root) {
        0.0
    } else {
        effective_value(defender, DerivedStatKind::DodgeChance)
    };
    let accuracy = effective_value(attacker, DerivedStatKind::Accuracy);
    let dodge_threshold = (dodge_chance - accuracy * 0.5).max(0.0);
    let roll = rng.next_unit();
    if roll < dodge_threshold {
        return HitOutcome { hit: false, ..Default::default() };
    }

    let parry_chance = effective_value(defender, DerivedStatKind::ParryChance);
    if parry_chance > 0.0 && rng.next_bool(parry_chance) {
        return HitOutcome { hit: true, parried: true, ..Default::default() };
    }

    let crit_chance = effective_value(attacker, DerivedStatKind::CritChance);
    let crit = rng.next_bool(crit_chance);
    let crit_multiplier = effective_value(attacker, DerivedStatKind::CritMultiplier);

    let defense = effective_value(defender, DerivedStatKind::Defense);
    let armor_pen = effective_value(attacker, DerivedStatKind::ArmorPen);
    let mut base = (power - (defense * (1.0 - armor_pen)).max(0.0)).max(1.0);
    if crit {
        base *= crit_multiplier;
    }

    base *= attacker_dealt_mult * defender_taken_mult;

    if defender.has_status(StatusKind::Shield) {
        let absorbed = defender.shield_remaining();
        base *= 1.0 - absorbed;
    }

    let damage = base.round().max(1.0) as u32;
    let lifesteal_pct = effective_value(attacker, DerivedStatKind::LifestealPct);
    let lifesteal_healed = (damage as f64 * lifesteal_pct).round() as u32;

    HitOutcome { hit: true, parried: false, crit, damage, lifesteal_healed }
}

pub fn apply_status(target: &mut Participant, kind: StatusKind, duration: u32, magnitude: f64, source: ParticipantSlot) {
    if let Some(existing) = target.statuses.iter_mut().find(|s| s.kind == kind) {
        existing.duration = existing.duration.max(duration);
        existing.magnitude = magnitude;
    } else {
        target.statuses.push(ActiveStatus { kind, duration, magnitude, source });
    }
}

/// End-of-turn decrement for the participant whose turn just ended
///: cooldowns floor at 0, statuses decrement and are
/// removed at 0, buff/debuff deltas share the same duration bookkeeping.
pub fn tick_turn_end(p: &mut Participant) {
    for cd in p.cooldowns.values_mut() {
        *cd = cd.saturating_sub(1);
    }
    p.statuses.retain_mut(|s| {
        s.duration = s.duration.saturating_sub(1);
        s.duration > 0
    });
    p.stat_deltas.retain_mut(|d| {
        d.duration = d.duration.saturating_sub(1);
        d.duration > 0
    });
    let regen_heal = (p.max_hp() as f64 * p.base_derived.hp_regen_pct).round() as u32;
    if regen_heal > 0 {
        p.current_hp = (p.current_hp + regen_heal).min(p.max_hp());
    }
}
