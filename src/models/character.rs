use crate::ids::{CharacterId, UserId};
use crate::models::equipment::{Equipment, EquipmentSlot};
use crate::models::faction::Faction;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_ ]{1,50}$").unwrap());

/// The six base stats a character allocates points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    Might,
    Finesse,
    Fortitude,
    Arcana,
    Insight,
    Presence,
}

impl StatKind {
    pub const ALL: [StatKind; 6] = [
        StatKind::Might,
        StatKind::Finesse,
        StatKind::Fortitude,
        StatKind::Arcana,
        StatKind::Insight,
        StatKind::Presence,
    ];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    pub might: u32,
    pub finesse: u32,
    pub fortitude: u32,
    pub arcana: u32,
    pub insight: u32,
    pub presence: u32,
}

impl BaseStats {
    pub fn get(&self, stat: StatKind) -> u32 {
        match stat {
            StatKind::Might => self.might,
            StatKind::Finesse => self.finesse,
            StatKind::Fortitude => self.fortitude,
            StatKind::Arcana => self.arcana,
            StatKind::Insight => self.insight,
            StatKind::Presence => self.presence,
        }
    }

    pub fn sum(&self) -> u64 {
        self.might as u64
            + self.finesse as u64
            + self.fortitude as u64
            + self.arcana as u64
            + self.insight as u64
            + self.presence as u64
    }
}

/// A named threshold-gated passive unlocked once a base stat crosses
/// 50/100/200/300.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PassiveFlag {
    pub stat: StatKind,
    pub threshold: u32,
}

pub const BREAKPOINTS: [u32; 4] = [50, 100, 200, 300];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub character_id: CharacterId,
    pub user_id: UserId,
    pub name: String,
    pub level: u32,
    pub xp: u64,
    pub faction: Faction,
    pub base_stats: BaseStats,
    pub unspent_points: u32,
    pub gold: u64,
    pub inventory: Vec<Equipment>,
    pub equipped: HashMap<EquipmentSlot, Equipment>,
    pub rating: i32,
    pub wins: u32,
    pub losses: u32,
    pub current_hp: u32,
    pub max_hp_cache: u32,
    pub active_combat: Option<crate::ids::CombatId>,
    /// Ids into this character's faction ability list, in the order
    /// unlocked at level checkpoints. Always a prefix of
    /// `faction.ability_ids()`.
    pub learned_abilities: Vec<String>,
    /// Up to 4 of `learned_abilities`, the set usable in combat.
    pub active_loadout: Vec<String>,
}

/// Checkpoint levels at which the next faction ability unlocks, on top
/// of `basic_strike` known from level 1. Five entries cover the
/// remaining five abilities in a faction's six-ability list.
pub const ABILITY_CHECKPOINTS: [u32; 5] = [5, 10, 20, 30, 45];

/// How many of `faction.ability_ids()` a character at `level` has
/// learned so far (always at least 1, for `basic_strike`).
pub fn learned_ability_count(level: u32) -> usize {
    1 + ABILITY_CHECKPOINTS.iter().filter(|&&checkpoint| level >= checkpoint).count()
}

/// The ordered prefix of `faction.ability_ids()` learned by `level`.
pub fn learned_abilities_for(faction: Faction, level: u32) -> Vec<String> {
    let count = learned_ability_count(level).min(faction.ability_ids().len());
    faction.ability_ids()[..count].iter().map(|s| s.to_string()).collect()
}

pub const STARTING_RATING: i32 = 1000;
pub const MIN_RATING: i32 = 100;

impl Character {
    pub fn new(user_id: UserId, name: String, faction: Faction) -> Self {
        let learned_abilities = learned_abilities_for(faction, 1);
        let active_loadout = learned_abilities.clone();
        Self {
            character_id: CharacterId::new(),
            user_id,
            name,
            level: 1,
            xp: 0,
            faction,
            base_stats: BaseStats::default(),
            unspent_points: 0,
            gold: 0,
            inventory: Vec::new(),
            equipped: HashMap::new(),
            rating: STARTING_RATING,
            wins: 0,
            losses: 0,
            current_hp: 1,
            max_hp_cache: 1,
            active_combat: None,
            learned_abilities,
            active_loadout,
        }
    }

    /// Grows `learned_abilities` to match the character's current level,
    /// leaving `active_loadout` untouched — it remains a valid subset
    /// since the learned set only ever grows.
    pub fn sync_learned_abilities(&mut self) {
        let target = learned_abilities_for(self.faction, self.level);
        if target.len() > self.learned_abilities.len() {
            self.learned_abilities = target;
        }
    }

    /// Validates a proposed active loadout: nonempty, at most 4
    /// abilities, no duplicates, and every id already learned.
    pub fn validate_loadout(&self, loadout: &[String]) -> Result<(), String> {
        if loadout.is_empty() {
            return Err("active loadout must include at least one ability".to_string());
        }
        if loadout.len() > 4 {
            return Err("active loadout cannot exceed 4 abilities".to_string());
        }
        let mut seen = std::collections::HashSet::new();
        for id in loadout {
            if !seen.insert(id) {
                return Err(format!("ability '{id}' listed more than once in loadout"));
            }
            if !self.learned_abilities.iter().any(|learned| learned == id) {
                return Err(format!("ability '{id}' is not learned by this character"));
            }
        }
        Ok(())
    }

    /// Earned stat points: `3*(level-1) + unspent`. Allocated
    /// points (`base_stats.sum()`) must never exceed this.
    pub fn earned_points(&self) -> u64 {
        3 * (self.level.saturating_sub(1)) as u64 + self.unspent_points as u64
    }

    pub fn validate_allocation(&self) -> Result<(), String> {
        if self.base_stats.sum() > self.earned_points() {
            return Err("allocated stat points exceed earned stat points".to_string());
        }
        Ok(())
    }

    /// Validates a proposed stat-point spend before it's applied: must
    /// not exceed the character's unspent pool.
    pub fn validate_spend(&self, points: u32) -> Result<(), String> {
        if points == 0 {
            return Err("points must be greater than zero".to_string());
        }
        if points > self.unspent_points {
            return Err("points exceed unspent stat points".to_string());
        }
        Ok(())
    }

    pub fn active_passives(&self) -> Vec<PassiveFlag> {
        let mut flags = Vec::new();
        for stat in StatKind::ALL {
            let value = self.base_stats.get(stat);
            for threshold in BREAKPOINTS {
                if value >= threshold {
                    flags.push(PassiveFlag { stat, threshold });
                }
            }
        }
        flags
    }
}

pub fn validate_character_name(name: &str) -> Result<(), String> {
    if NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err("character name must be 1-50 chars of letters, digits, underscore, or space".to_string())
    }
}

pub fn validate_level(level: u32) -> Result<(), String> {
    if (1..=100).contains(&level) {
        Ok(())
    } else {
        Err("level must be between 1 and 100".to_string())
    }
}
