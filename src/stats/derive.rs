//! Pure stat derivation.
//!
//! `derive_stats` is the one function in this module: given a base stat
//! vector, level, equipped item modifiers, and faction, it returns the
//! full derived combat stat block. No I/O, no randomness, no time —
//! identical inputs always produce identical outputs, which is what lets
//! the combat simulator snapshot a participant once per combat and
//! never re-derive mid-fight.

use crate::models::equipment::StatModifiers;
use crate::models::faction::Faction;
use crate::models::character::{BaseStats, StatKind, BREAKPOINTS};
use serde::{Deserialize, Serialize};

/// Derived combat stats a `Participant` snapshot carries into combat.
/// Percentage fields are fractions in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedStats {
    pub max_hp: u32,
    pub attack_power: u32,
    pub spell_power: u32,
    pub defense: u32,
    pub crit_chance: f64,
    pub crit_multiplier: f64,
    pub dodge_chance: f64,
    pub parry_chance: f64,
    pub armor_pen: f64,
    pub accuracy: f64,
    pub speed: u32,
    pub hp_regen_pct: f64,
    pub lifesteal_pct: f64,
    pub cooldown_reduction_pct: f64,
    pub turn_meter_bonus: f64,
}

/// Derived stats a `Buff`/`Debuff` effect can target additively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedStatKind {
    MaxHp,
    AttackPower,
    SpellPower,
    Defense,
    CritChance,
    CritMultiplier,
    DodgeChance,
    ParryChance,
    ArmorPen,
    Accuracy,
    Speed,
    HpRegenPct,
    LifestealPct,
    CooldownReductionPct,
    TurnMeterBonus,
}

// Documented scaling coefficients (Open Question in: the source
// mixes several inconsistent rating/stat tables; these are fixed here as
// the single data-driven source of truth — see DESIGN.md).
const DODGE_CAP: f64 = 0.40;
const COOLDOWN_REDUCTION_CAP: f64 = 0.50;
const CRIT_CHANCE_CAP: f64 = 0.75;
const PARRY_CAP: f64 = 0.30;
const ARMOR_PEN_CAP: f64 = 0.75;
const HP_REGEN_CAP: f64 = 0.20;
const LIFESTEAL_CAP: f64 = 0.25;

fn breakpoints_crossed(value: u32) -> u32 {
    BREAKPOINTS.iter().filter(|&&b| value >= b).count() as u32
}

/// Pure function: `(base stats, equipment modifiers, level, faction) ->
/// derived combat stats`. Safe under `i64` intermediates for level <=
/// 100 and any single stat <= 300.
pub fn derive_stats(
    base: &BaseStats,
    equipment_total: &StatModifiers,
    level: u32,
    _faction: Faction,
) -> DerivedStats {
    let eff = |stat: StatKind, modifier: i32| -> i64 {
        (base.get(stat) as i64 + modifier as i64).max(0)
    };

    let might = eff(StatKind::Might, equipment_total.might);
    let finesse = eff(StatKind::Finesse, equipment_total.finesse);
    let fortitude = eff(StatKind::Fortitude, equipment_total.fortitude);
    let arcana = eff(StatKind::Arcana, equipment_total.arcana);
    let insight = eff(StatKind::Insight, equipment_total.insight);
    let presence = eff(StatKind::Presence, equipment_total.presence);
    let level = level as i64;

    let max_hp = (100 + fortitude * 5 + might + (level - 1) * 10).max(1) as u32;
    let attack_power = (10 + might * 2 + level).max(0) as u32;
    let spell_power = (10 + arcana * 2 + level).max(0) as u32;
    let defense = (5 + fortitude * 2 + presence / 2).max(0) as u32;
    let speed = (50 + finesse * 2 + level).max(0) as u32;

    let crit_chance =
        (finesse as f64 * 0.0008 + insight as f64 * 0.0002).clamp(0.0, CRIT_CHANCE_CAP);
    let crit_multiplier =
        1.5 + breakpoints_crossed(insight.max(0) as u32) as f64 * 0.1;
    let dodge_chance = (finesse as f64 * 0.0005).clamp(0.0, DODGE_CAP);
    let parry_chance = (presence as f64 * 0.0004).clamp(0.0, PARRY_CAP);
    let armor_pen =
        (might as f64 * 0.0003 + insight as f64 * 0.0002).clamp(0.0, ARMOR_PEN_CAP);
    let accuracy =
        (0.5 + insight as f64 * 0.001 + finesse as f64 * 0.0005).clamp(0.0, 1.0);
    let hp_regen_pct =
        (presence as f64 * 0.0005 + fortitude as f64 * 0.0002).clamp(0.0, HP_REGEN_CAP);
    let lifesteal_pct = (presence as f64 * 0.0003).clamp(0.0, LIFESTEAL_CAP);
    let cooldown_reduction_pct =
        (insight as f64 * 0.0006).clamp(0.0, COOLDOWN_REDUCTION_CAP);
    let turn_meter_bonus = (presence as f64 * 0.001).clamp(0.0, 0.5);

    DerivedStats {
        max_hp,
        attack_power,
        spell_power,
        defense,
        crit_chance,
        crit_multiplier,
        dodge_chance,
        parry_chance,
        armor_pen,
        accuracy,
        speed,
        hp_regen_pct,
        lifesteal_pct,
        cooldown_reduction_pct,
        turn_meter_bonus,
    }
}

pub fn sum_equipment_modifiers<'a>(
    items: impl Iterator<Item = &'a crate::models::equipment::StatModifiers>,
) -> StatModifiers {
    let mut total = StatModifiers::default();
    for m in items {
        total.might += m.might;
        total.finesse += m.finesse;
        total.fortitude += m.fortitude;
        total.arcana += m.arcana;
        total.insight += m.insight;
        total.presence += m.presence;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_inputs_give_identical_outputs() {
        let base = BaseStats { might: 100, finesse: 50, fortitude: 80, arcana: 0, insight: 30, presence: 20 };
        let eq = StatModifiers::default();
        let a = derive_stats(&base, &eq, 10, Faction::Solarian);
        let b = derive_stats(&base, &eq, 10, Faction::Solarian);
        assert_eq!(a, b);
    }

    #[test]
    fn dodge_is_capped() {
        let base = BaseStats { might: 0, finesse: 5000, fortitude: 0, arcana: 0, insight: 0, presence: 0 };
        let d = derive_stats(&base, &StatModifiers::default(), 100, Faction::Umbral);
        assert!(d.dodge_chance <= DODGE_CAP);
    }

    #[test]
    fn cooldown_reduction_is_capped() {
        let base = BaseStats { might: 0, finesse: 0, fortitude: 0, arcana: 0, insight: 5000, presence: 0 };
        let d = derive_stats(&base, &StatModifiers::default(), 100, Faction::Verdant);
        assert!(d.cooldown_reduction_pct <= COOLDOWN_REDUCTION_CAP);
    }

    #[test]
    fn no_overflow_at_max_level_and_stats() {
        let base = BaseStats { might: 300, finesse: 300, fortitude: 300, arcana: 300, insight: 300, presence: 300 };
        let d = derive_stats(&base, &StatModifiers::default(), 100, Faction::Solarian);
        assert!(d.max_hp > 0);
        assert!(d.attack_power > 0);
    }
}
