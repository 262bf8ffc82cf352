//! Folds a participant's active buff/debuff deltas onto its snapshotted
//! `DerivedStats` at the moment they're read.

use crate::models::combat::Participant;
use crate::stats::DerivedStatKind;

pub fn effective_value(p: &Participant, stat: DerivedStatKind) -> f64 {
    let base = base_value(p, stat);
    let delta: f64 = p
        .stat_deltas
        .iter()
        .filter(|d| d.stat == stat)
        .map(|d| d.magnitude)
        .sum();
    base + delta
}

fn base_value(p: &Participant, stat: DerivedStatKind) -> f64 {
    let d = &p.base_derived;
    match stat {
        DerivedStatKind::MaxHp => d.max_hp as f64,
        DerivedStatKind::AttackPower => d.attack_power as f64,
        DerivedStatKind::SpellPower => d.spell_power as f64,
        DerivedStatKind::Defense => d.defense as f64,
        DerivedStatKind::CritChance => d.crit_chance,
        DerivedStatKind::CritMultiplier => d.crit_multiplier,
        DerivedStatKind::DodgeChance => d.dodge_chance,
        DerivedStatKind::ParryChance => d.parry_chance,
        DerivedStatKind::ArmorPen => d.armor_pen,
        DerivedStatKind::Accuracy => d.accuracy,
        DerivedStatKind::Speed => d.speed as f64,
        DerivedStatKind::HpRegenPct => d.hp_regen_pct,
        DerivedStatKind::LifestealPct => d.lifesteal_pct,
        DerivedStatKind::CooldownReductionPct => d.cooldown_reduction_pct,
        DerivedStatKind::TurnMeterBonus => d.turn_meter_bonus,
    }
}
