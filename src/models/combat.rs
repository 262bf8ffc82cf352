use crate::ids::{CharacterId, CombatId, UserId};
use crate::models::ability::StatusKind;
use crate::models::faction::Faction;
use crate::stats::DerivedStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatMode {
    PvE,
    PvP,
    AutoFight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantKind {
    Player,
    Enemy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveStatus {
    pub kind: StatusKind,
    pub duration: u32,
    pub magnitude: f64,
    pub source: ParticipantSlot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantSlot {
    A,
    B,
}

impl ParticipantSlot {
    pub fn other(self) -> Self {
        match self {
            ParticipantSlot::A => ParticipantSlot::B,
            ParticipantSlot::B => ParticipantSlot::A,
        }
    }
}

/// A combatant's full in-combat snapshot. Derived stats are taken once at `StartCombat` and
/// never re-derived mid-fight — only `current_hp`, cooldowns, statuses,
/// and buffs move during resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub kind: ParticipantKind,
    pub character_id: Option<CharacterId>,
    pub name: String,
    pub faction: Faction,
    pub base_derived: DerivedStats,
    pub current_hp: u32,
    /// Abilities usable in this combat. Players are restricted to their
    /// character's active loadout; enemies carry their full faction set
    /// since they have no equipped-set concept.
    pub loadout: Vec<String>,
    pub cooldowns: HashMap<&'static str, u32>,
    pub statuses: Vec<ActiveStatus>,
    /// Additive buff/debuff deltas layered on top of `base_derived`,
    /// keyed by the stat they modify; cleared when their status entry
    /// (tracked separately by duration) expires.
    pub stat_deltas: Vec<StatDelta>,
    pub damage_dealt: u64,
    pub damage_taken: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatDelta {
    pub stat: crate::stats::DerivedStatKind,
    pub magnitude: f64,
    pub duration: u32,
}

impl Participant {
    pub fn max_hp(&self) -> u32 {
        self.base_derived.max_hp
    }

    pub fn is_alive(&self) -> bool {
        self.current_hp > 0
    }

    pub fn has_status(&self, kind: StatusKind) -> bool {
        self.statuses.iter().any(|s| s.kind == kind)
    }

    pub fn can_use_ability(&self, ability_id: &str) -> bool {
        self.loadout.iter().any(|id| id == ability_id)
    }

    pub fn shield_remaining(&self) -> f64 {
        self.statuses
            .iter()
            .find(|s| s.kind == StatusKind::Shield)
            .map(|s| s.magnitude)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatPhase {
    Initializing,
    AwaitingAction,
    Resolving,
    Terminal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    Kill,
    Execute,
    TurnCap,
    Forfeit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Attack,
    Ability,
    Defend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatAction {
    pub kind: ActionKind,
    pub ability_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLogEvent {
    pub turn: u32,
    pub actor: ParticipantSlot,
    pub kind: ActionKind,
    pub ability_id: Option<String>,
    pub target: ParticipantSlot,
    pub hit: bool,
    pub crit: bool,
    pub damage: Option<u32>,
    pub healed: Option<u32>,
    pub status_applied: Option<StatusKind>,
    pub cooldown_set: Option<u32>,
}

/// `combat:{id}`. `version` backs the CAS protocol every
/// mutation goes through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatState {
    pub combat_id: CombatId,
    pub owner: UserId,
    pub mode: CombatMode,
    pub participants: HashMap<ParticipantSlot, Participant>,
    pub turn: u32,
    pub current_actor: ParticipantSlot,
    pub seed: u64,
    pub rng_cursor: u64,
    pub phase: CombatPhase,
    pub winner: Option<ParticipantSlot>,
    pub termination_reason: Option<TerminationReason>,
    pub log: Vec<ActionLogEvent>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    /// Set for `CombatMode::PvE`/`AutoFight` so termination handling can
    /// look up the enemy's reward table without re-deriving it from the
    /// opponent's display name.
    pub enemy_id: Option<String>,
}

impl CombatState {
    pub fn is_terminal(&self) -> bool {
        self.phase == CombatPhase::Terminal
    }
}

/// Append-only archival record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: crate::ids::MatchId,
    pub combat_id: CombatId,
    pub mode: CombatMode,
    pub participant_a: Option<CharacterId>,
    pub participant_b: Option<CharacterId>,
    pub winner: Option<CharacterId>,
    pub rating_delta_a: i32,
    pub rating_delta_b: i32,
    pub duration_turns: u32,
    pub termination_reason: TerminationReason,
    pub timestamp: DateTime<Utc>,
}
