//! Static enemy catalog. Every enemy is
//! a data row, not a bespoke Rust type — the resolution pipeline reads
//! them through the same `Participant`/`Ability` machinery a player
//! character goes through.

use crate::models::character::BaseStats;
use crate::models::faction::Faction;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardTable {
    pub xp: u64,
    pub gold: u64,
    pub drop_chance_common: f64,
    pub drop_chance_rare: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub enemy_id: &'static str,
    pub name: &'static str,
    pub level: u32,
    pub faction: Faction,
    pub base_stats: BaseStats,
    pub rewards: RewardTable,
}

fn stats(might: u32, finesse: u32, fortitude: u32, arcana: u32, insight: u32, presence: u32) -> BaseStats {
    BaseStats { might, finesse, fortitude, arcana, insight, presence }
}

fn rewards(level: u32) -> RewardTable {
    RewardTable {
        xp: 20 + level as u64 * 8,
        gold: 10 + level as u64 * 4,
        drop_chance_common: 0.35,
        drop_chance_rare: (0.02 + level as f64 * 0.001).min(0.15),
    }
}

pub static ENEMY_CATALOG: Lazy<HashMap<&'static str, Enemy>> = Lazy::new(|| {
    let enemies = vec![
        Enemy { enemy_id: "tideling_whelp", name: "Tideling Whelp", level: 1, faction: Faction::Verdant, base_stats: stats(4, 6, 4, 2, 2, 2), rewards: rewards(1) },
        Enemy { enemy_id: "cave_rat", name: "Cave Rat", level: 1, faction: Faction::Umbral, base_stats: stats(5, 8, 3, 0, 1, 1), rewards: rewards(1) },
        Enemy { enemy_id: "ember_imp", name: "Ember Imp", level: 2, faction: Faction::Solarian, base_stats: stats(6, 5, 4, 6, 3, 2), rewards: rewards(2) },
        Enemy { enemy_id: "moss_crawler", name: "Moss Crawler", level: 2, faction: Faction::Verdant, base_stats: stats(5, 4, 10, 2, 2, 3), rewards: rewards(2) },
        Enemy { enemy_id: "shade_wisp", name: "Shade Wisp", level: 3, faction: Faction::Umbral, base_stats: stats(4, 10, 3, 8, 4, 2), rewards: rewards(3) },
        Enemy { enemy_id: "brass_sentinel", name: "Brass Sentinel", level: 3, faction: Faction::Solarian, base_stats: stats(10, 3, 12, 2, 2, 4), rewards: rewards(3) },
        Enemy { enemy_id: "bog_lurker", name: "Bog Lurker", level: 4, faction: Faction::Verdant, base_stats: stats(8, 6, 10, 4, 3, 3), rewards: rewards(4) },
        Enemy { enemy_id: "dust_scavenger", name: "Dust Scavenger", level: 4, faction: Faction::Umbral, base_stats: stats(9, 9, 6, 2, 4, 2), rewards: rewards(4) },
        Enemy { enemy_id: "sun_acolyte", name: "Sun Acolyte", level: 5, faction: Faction::Solarian, base_stats: stats(7, 4, 8, 10, 8, 6), rewards: rewards(5) },
        Enemy { enemy_id: "thorned_bramble", name: "Thorned Bramble", level: 5, faction: Faction::Verdant, base_stats: stats(10, 5, 12, 6, 3, 4), rewards: rewards(5) },
        Enemy { enemy_id: "night_stalker", name: "Night Stalker", level: 6, faction: Faction::Umbral, base_stats: stats(10, 14, 6, 4, 5, 3), rewards: rewards(6) },
        Enemy { enemy_id: "iron_golem", name: "Iron Golem", level: 6, faction: Faction::Solarian, base_stats: stats(14, 2, 20, 2, 2, 4), rewards: rewards(6) },
        Enemy { enemy_id: "marsh_hag", name: "Marsh Hag", level: 7, faction: Faction::Verdant, base_stats: stats(8, 6, 10, 14, 10, 6), rewards: rewards(7) },
        Enemy { enemy_id: "void_whelp", name: "Void Whelp", level: 7, faction: Faction::Umbral, base_stats: stats(11, 12, 8, 8, 6, 4), rewards: rewards(7) },
        Enemy { enemy_id: "radiant_guard", name: "Radiant Guard", level: 8, faction: Faction::Solarian, base_stats: stats(14, 6, 16, 6, 4, 10), rewards: rewards(8) },
        Enemy { enemy_id: "fen_serpent", name: "Fen Serpent", level: 8, faction: Faction::Verdant, base_stats: stats(13, 14, 10, 6, 5, 4), rewards: rewards(8) },
        Enemy { enemy_id: "gloom_assassin", name: "Gloom Assassin", level: 9, faction: Faction::Umbral, base_stats: stats(14, 20, 8, 6, 8, 4), rewards: rewards(9) },
        Enemy { enemy_id: "stone_warden", name: "Stone Warden", level: 9, faction: Faction::Solarian, base_stats: stats(16, 5, 24, 4, 4, 8), rewards: rewards(9) },
        Enemy { enemy_id: "root_elemental", name: "Root Elemental", level: 10, faction: Faction::Verdant, base_stats: stats(16, 6, 20, 14, 8, 6), rewards: rewards(10) },
        Enemy { enemy_id: "ash_revenant", name: "Ash Revenant", level: 10, faction: Faction::Umbral, base_stats: stats(16, 16, 12, 10, 8, 6), rewards: rewards(10) },
        Enemy { enemy_id: "dawnblade_knight", name: "Dawnblade Knight", level: 12, faction: Faction::Solarian, base_stats: stats(22, 10, 22, 8, 6, 12), rewards: rewards(12) },
        Enemy { enemy_id: "bramblewood_ent", name: "Bramblewood Ent", level: 12, faction: Faction::Verdant, base_stats: stats(20, 6, 30, 16, 10, 8), rewards: rewards(12) },
        Enemy { enemy_id: "nightshade_weaver", name: "Nightshade Weaver", level: 14, faction: Faction::Umbral, base_stats: stats(18, 22, 14, 16, 12, 6), rewards: rewards(14) },
        Enemy { enemy_id: "solar_phoenix", name: "Solar Phoenix", level: 14, faction: Faction::Solarian, base_stats: stats(20, 14, 18, 20, 14, 14), rewards: rewards(14) },
        Enemy { enemy_id: "verdant_matriarch", name: "Verdant Matriarch", level: 16, faction: Faction::Verdant, base_stats: stats(22, 12, 28, 22, 18, 16), rewards: rewards(16) },
        Enemy { enemy_id: "umbral_harbinger", name: "Umbral Harbinger", level: 16, faction: Faction::Umbral, base_stats: stats(24, 26, 16, 18, 16, 10), rewards: rewards(16) },
        Enemy { enemy_id: "obsidian_colossus", name: "Obsidian Colossus", level: 18, faction: Faction::Solarian, base_stats: stats(30, 8, 40, 10, 8, 16), rewards: rewards(18) },
        Enemy { enemy_id: "thornspire_dryad", name: "Thornspire Dryad", level: 18, faction: Faction::Verdant, base_stats: stats(24, 16, 26, 28, 20, 16), rewards: rewards(18) },
        Enemy { enemy_id: "eclipse_stalker", name: "Eclipse Stalker", level: 20, faction: Faction::Umbral, base_stats: stats(26, 32, 18, 20, 18, 12), rewards: rewards(20) },
        Enemy { enemy_id: "sunforge_titan", name: "Sunforge Titan", level: 22, faction: Faction::Solarian, base_stats: stats(34, 12, 36, 24, 20, 22), rewards: rewards(22) },
    ];
    enemies.into_iter().map(|e| (e.enemy_id, e)).collect()
});

pub fn enemy_by_id(id: &str) -> Option<&'static Enemy> {
    ENEMY_CATALOG.get(id)
}

pub fn all_enemies() -> Vec<&'static Enemy> {
    ENEMY_CATALOG.values().collect()
}
