use serde::{Deserialize, Serialize};

/// Static catalog of three factions, each naming an ordered ability set
/// resolved against the data-driven ability catalog rather than
/// hardcoded per-faction stat blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    Solarian,
    Umbral,
    Verdant,
}

impl Faction {
    pub fn all() -> [Faction; 3] {
        [Faction::Solarian, Faction::Umbral, Faction::Verdant]
    }

    /// Ordered ability ids available to characters of this faction, in
    /// the order they're offered at level-up.
    pub fn ability_ids(self) -> &'static [&'static str] {
        match self {
            Faction::Solarian => &[
                "basic_strike",
                "divine_strike",
                "shield_of_faith",
                "radiant_heal",
                "solar_flare",
                "judgment",
            ],
            Faction::Umbral => &[
                "basic_strike",
                "shadow_stab",
                "venom_bite",
                "vanish",
                "assassinate",
                "night_terror",
            ],
            Faction::Verdant => &[
                "basic_strike",
                "thorn_lash",
                "regrowth",
                "entangling_roots",
                "natures_wrath",
                "overgrowth",
            ],
        }
    }

    /// Passive faction modifier applied during damage resolution.
    /// Expressed as a damage-dealt multiplier and a damage-taken
    /// multiplier, both 1.0 by default.
    pub fn passive_modifiers(self) -> (f64, f64) {
        match self {
            Faction::Solarian => (1.00, 0.95), // sturdier
            Faction::Umbral => (1.08, 1.00),   // harder hitting
            Faction::Verdant => (1.00, 1.00),  // baseline, regen-focused
        }
    }
}
