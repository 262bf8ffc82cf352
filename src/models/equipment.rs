use crate::ids::{CharacterId, ItemId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentSlot {
    Weapon,
    Head,
    Chest,
    Legs,
    Hands,
    Feet,
    Trinket,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentKind {
    WeaponSword,
    WeaponStaff,
    WeaponBow,
    WeaponDagger,
    ArmorHead,
    ArmorChest,
    ArmorLegs,
    ArmorHands,
    ArmorFeet,
    Trinket,
}

impl EquipmentKind {
    pub fn slot(self) -> EquipmentSlot {
        match self {
            EquipmentKind::WeaponSword
            | EquipmentKind::WeaponStaff
            | EquipmentKind::WeaponBow
            | EquipmentKind::WeaponDagger => EquipmentSlot::Weapon,
            EquipmentKind::ArmorHead => EquipmentSlot::Head,
            EquipmentKind::ArmorChest => EquipmentSlot::Chest,
            EquipmentKind::ArmorLegs => EquipmentSlot::Legs,
            EquipmentKind::ArmorHands => EquipmentSlot::Hands,
            EquipmentKind::ArmorFeet => EquipmentSlot::Feet,
            EquipmentKind::Trinket => EquipmentSlot::Trinket,
        }
    }
}

/// Six rarity tiers, each scaling the stat roll
/// budget a generated item gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Mythic,
}

impl Rarity {
    pub fn stat_budget(self) -> u32 {
        match self {
            Rarity::Common => 5,
            Rarity::Uncommon => 12,
            Rarity::Rare => 22,
            Rarity::Epic => 35,
            Rarity::Legendary => 52,
            Rarity::Mythic => 75,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatModifiers {
    pub might: i32,
    pub finesse: i32,
    pub fortitude: i32,
    pub arcana: i32,
    pub insight: i32,
    pub presence: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Equipment {
    pub item_id: ItemId,
    pub owner: CharacterId,
    pub kind: EquipmentKind,
    pub rarity: Rarity,
    pub modifiers: StatModifiers,
}
