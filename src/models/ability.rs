//! Static ability catalog: a data-driven table of tagged
//! `AbilityEffect` variants rather than hardcoded per-action branches,
//! so adding an ability never touches the resolution pipeline.

use crate::models::character::StatKind;
use crate::models::faction::Faction;
use crate::stats::DerivedStatKind;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityCategory {
    Damage,
    Heal,
    Buff,
    Debuff,
    Control,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetRule {
    SelfTarget,
    Opponent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Poison,
    Bleed,
    Stun,
    Slow,
    Invisible,
    Shield,
    Root,
    Regen,
}

impl StatusKind {
    /// Stun and root disable normal actions; slow permits acting but not
    /// using an ability.
    pub fn blocks_attacks_and_abilities(self) -> bool {
        matches!(self, StatusKind::Stun | StatusKind::Root)
    }

    pub fn blocks_abilities_only(self) -> bool {
        matches!(self, StatusKind::Slow)
    }
}

/// Per-category typed ability parameters, one strongly typed record per
/// category. `Execute` is its own terminal branch, not a sentinel
/// damage value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbilityEffect {
    Damage {
        scaling_stat: StatKind,
        power_multiplier: f64,
    },
    Heal {
        scaling_stat: StatKind,
        power_multiplier: f64,
    },
    Buff {
        stat: DerivedStatKind,
        magnitude: f64,
        duration: u32,
    },
    Debuff {
        stat: DerivedStatKind,
        magnitude: f64,
        duration: u32,
    },
    Control {
        status: StatusKind,
        duration: u32,
    },
    /// Instant kill if `target_hp / target_max_hp <= threshold_pct`,
    /// otherwise falls through to a normal scaled damage hit.
    Execute {
        threshold_pct: f64,
        scaling_stat: StatKind,
        power_multiplier: f64,
    },
}

impl AbilityEffect {
    pub fn category(&self) -> AbilityCategory {
        match self {
            AbilityEffect::Damage { .. } => AbilityCategory::Damage,
            AbilityEffect::Heal { .. } => AbilityCategory::Heal,
            AbilityEffect::Buff { .. } => AbilityCategory::Buff,
            AbilityEffect::Debuff { .. } => AbilityCategory::Debuff,
            AbilityEffect::Control { .. } => AbilityCategory::Control,
            AbilityEffect::Execute { .. } => AbilityCategory::Damage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionalPredicate {
    RequiresInvisible,
    RequiresTargetHasStatus(StatusKind),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ability {
    pub id: &'static str,
    pub name: &'static str,
    pub cooldown: u32,
    pub target: TargetRule,
    pub effect: AbilityEffect,
    pub predicates: Vec<ConditionalPredicate>,
    /// Status the ability applies to its target on a successful hit,
    /// in addition to its primary effect.
    pub on_hit_status: Option<(StatusKind, u32, f64)>,
}

impl Ability {
    pub fn category(&self) -> AbilityCategory {
        self.effect.category()
    }
}

pub static ABILITY_CATALOG: Lazy<HashMap<&'static str, Ability>> = Lazy::new(|| {
    let abilities = vec![
        Ability {
            id: "basic_strike",
            name: "Basic Strike",
            cooldown: 0,
            target: TargetRule::Opponent,
            effect: AbilityEffect::Damage { scaling_stat: StatKind::Might, power_multiplier: 1.0 },
            predicates: vec![],
            on_hit_status: None,
        },
        Ability {
            id: "divine_strike",
            name: "Divine Strike",
            cooldown: 3,
            target: TargetRule::Opponent,
            effect: AbilityEffect::Damage { scaling_stat: StatKind::Might, power_multiplier: 1.8 },
            predicates: vec![],
            on_hit_status: None,
        },
        Ability {
            id: "shield_of_faith",
            name: "Shield of Faith",
            cooldown: 5,
            target: TargetRule::SelfTarget,
            // Magnitude is data.
            effect: AbilityEffect::Buff { stat: DerivedStatKind::MaxHp, magnitude: 0.0, duration: 3 },
            predicates: vec![],
            on_hit_status: Some((StatusKind::Shield, 3, 0.80)),
        },
        Ability {
            id: "radiant_heal",
            name: "Radiant Heal",
            cooldown: 4,
            target: TargetRule::SelfTarget,
            effect: AbilityEffect::Heal { scaling_stat: StatKind::Presence, power_multiplier: 2.2 },
            predicates: vec![],
            on_hit_status: None,
        },
        Ability {
            id: "solar_flare",
            name: "Solar Flare",
            cooldown: 4,
            target: TargetRule::Opponent,
            effect: AbilityEffect::Debuff { stat: DerivedStatKind::Accuracy, magnitude: -0.15, duration: 2 },
            predicates: vec![],
            on_hit_status: Some((StatusKind::Bleed, 2, 0.08)),
        },
        Ability {
            id: "judgment",
            name: "Judgment",
            cooldown: 6,
            target: TargetRule::Opponent,
            effect: AbilityEffect::Execute { threshold_pct: 0.20, scaling_stat: StatKind::Might, power_multiplier: 2.0 },
            predicates: vec![],
            on_hit_status: None,
        },
        Ability {
            id: "shadow_stab",
            name: "Shadow Stab",
            cooldown: 2,
            target: TargetRule::Opponent,
            effect: AbilityEffect::Damage { scaling_stat: StatKind::Finesse, power_multiplier: 1.5 },
            predicates: vec![],
            on_hit_status: None,
        },
        Ability {
            id: "venom_bite",
            name: "Venom Bite",
            cooldown: 3,
            target: TargetRule::Opponent,
            effect: AbilityEffect::Damage { scaling_stat: StatKind::Finesse, power_multiplier: 1.1 },
            predicates: vec![],
            on_hit_status: Some((StatusKind::Poison, 3, 0.06)),
        },
        Ability {
            id: "vanish",
            name: "Vanish",
            cooldown: 5,
            target: TargetRule::SelfTarget,
            effect: AbilityEffect::Control { status: StatusKind::Invisible, duration: 2 },
            predicates: vec![],
            on_hit_status: None,
        },
        Ability {
            id: "assassinate",
            name: "Assassinate",
            cooldown: 6,
            target: TargetRule::Opponent,
            effect: AbilityEffect::Execute { threshold_pct: 0.30, scaling_stat: StatKind::Finesse, power_multiplier: 2.2 },
            predicates: vec![ConditionalPredicate::RequiresInvisible],
            on_hit_status: None,
        },
        Ability {
            id: "night_terror",
            name: "Night Terror",
            cooldown: 5,
            target: TargetRule::Opponent,
            effect: AbilityEffect::Control { status: StatusKind::Stun, duration: 1 },
            predicates: vec![],
            on_hit_status: None,
        },
        Ability {
            id: "thorn_lash",
            name: "Thorn Lash",
            cooldown: 2,
            target: TargetRule::Opponent,
            effect: AbilityEffect::Damage { scaling_stat: StatKind::Arcana, power_multiplier: 1.2 },
            predicates: vec![],
            on_hit_status: Some((StatusKind::Bleed, 2, 0.05)),
        },
        Ability {
            id: "regrowth",
            name: "Regrowth",
            cooldown: 4,
            target: TargetRule::SelfTarget,
            effect: AbilityEffect::Control { status: StatusKind::Regen, duration: 4 },
            predicates: vec![],
            on_hit_status: None,
        },
        Ability {
            id: "entangling_roots",
            name: "Entangling Roots",
            cooldown: 5,
            target: TargetRule::Opponent,
            effect: AbilityEffect::Control { status: StatusKind::Root, duration: 2 },
            predicates: vec![],
            on_hit_status: None,
        },
        Ability {
            id: "natures_wrath",
            name: "Nature's Wrath",
            cooldown: 4,
            target: TargetRule::Opponent,
            effect: AbilityEffect::Damage { scaling_stat: StatKind::Arcana, power_multiplier: 1.9 },
            predicates: vec![ConditionalPredicate::RequiresTargetHasStatus(StatusKind::Root)],
            on_hit_status: None,
        },
        Ability {
            id: "overgrowth",
            name: "Overgrowth",
            cooldown: 6,
            target: TargetRule::SelfTarget,
            effect: AbilityEffect::Buff { stat: DerivedStatKind::Defense, magnitude: 25.0, duration: 3 },
            predicates: vec![],
            on_hit_status: None,
        },
    ];
    abilities.into_iter().map(|a| (a.id, a)).collect()
});

pub fn ability_by_id(id: &str) -> Option<&'static Ability> {
    ABILITY_CATALOG.get(id)
}

pub fn abilities_for_faction(faction: Faction) -> Vec<&'static Ability> {
    faction
        .ability_ids()
        .iter()
        .filter_map(|id| ability_by_id(id))
        .collect()
}
