//! Character CRUD, stat allocation, and equipment.

use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::http::middleware::AuthUser;
use crate::ids::{CharacterId, ItemId};
use crate::models::character::{validate_character_name, BaseStats, Character, StatKind};
use crate::models::equipment::EquipmentSlot;
use crate::models::faction::Faction;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct CharacterSummary {
    pub character_id: CharacterId,
    pub name: String,
    pub level: u32,
    pub xp: u64,
}

impl From<&Character> for CharacterSummary {
    fn from(c: &Character) -> Self {
        Self { character_id: c.character_id, name: c.name.clone(), level: c.level, xp: c.xp }
    }
}

pub async fn list(State(ctx): State<AppContext>, AuthUser(user_id): AuthUser) -> AppResult<Json<Vec<CharacterSummary>>> {
    let characters = ctx.db.list_characters(user_id).await?;
    Ok(Json(characters.iter().map(CharacterSummary::from).collect()))
}

#[derive(Deserialize)]
pub struct CreateCharacterRequest {
    pub name: String,
    pub faction: Faction,
}

pub async fn create(
    State(ctx): State<AppContext>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateCharacterRequest>,
) -> AppResult<Json<Character>> {
    validate_character_name(&body.name).map_err(AppError::Validation)?;
    let existing = ctx.db.list_characters(user_id).await?;
    if existing.iter().any(|c| c.name.eq_ignore_ascii_case(&body.name)) {
        return Err(AppError::Conflict("character name already in use".into()));
    }
    let character = Character::new(user_id, body.name, body.faction);
    ctx.db.upsert_character(&character).await?;
    Ok(Json(character))
}

async fn load_owned(ctx: &AppContext, user_id: crate::ids::UserId, character_id: CharacterId) -> AppResult<Character> {
    let character = ctx.db.get_character(character_id).await?.ok_or_else(|| AppError::NotFound("character".into()))?;
    if character.user_id != user_id {
        return Err(AppError::Forbidden);
    }
    Ok(character)
}

pub async fn get(
    State(ctx): State<AppContext>,
    AuthUser(user_id): AuthUser,
    Path(character_id): Path<CharacterId>,
) -> AppResult<Json<Character>> {
    Ok(Json(load_owned(&ctx, user_id, character_id).await?))
}

pub async fn delete(
    State(ctx): State<AppContext>,
    AuthUser(user_id): AuthUser,
    Path(character_id): Path<CharacterId>,
) -> AppResult<Json<serde_json::Value>> {
    load_owned(&ctx, user_id, character_id).await?;
    ctx.db.delete_character(character_id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

#[derive(Deserialize)]
pub struct AllocateRequest {
    pub stat: StatKind,
    pub points: u32,
}

pub async fn allocate_stats(
    State(ctx): State<AppContext>,
    AuthUser(user_id): AuthUser,
    Path(character_id): Path<CharacterId>,
    Json(body): Json<AllocateRequest>,
) -> AppResult<Json<Character>> {
    let mut character = load_owned(&ctx, user_id, character_id).await?;
    character.validate_spend(body.points).map_err(AppError::Validation)?;
    apply_allocation(&mut character.base_stats, body.stat, body.points);
    character.unspent_points -= body.points;
    ctx.db.upsert_character(&character).await?;
    Ok(Json(character))
}

fn apply_allocation(stats: &mut BaseStats, stat: StatKind, points: u32) {
    match stat {
        StatKind::Might => stats.might += points,
        StatKind::Finesse => stats.finesse += points,
        StatKind::Fortitude => stats.fortitude += points,
        StatKind::Arcana => stats.arcana += points,
        StatKind::Insight => stats.insight += points,
        StatKind::Presence => stats.presence += points,
    }
}

#[derive(Deserialize)]
pub struct EquipRequest {
    pub item_id: ItemId,
}

pub async fn equip(
    State(ctx): State<AppContext>,
    AuthUser(user_id): AuthUser,
    Path(character_id): Path<CharacterId>,
    Json(body): Json<EquipRequest>,
) -> AppResult<Json<Character>> {
    let mut character = load_owned(&ctx, user_id, character_id).await?;
    let position = character
        .inventory
        .iter()
        .position(|i| i.item_id == body.item_id)
        .ok_or_else(|| AppError::NotFound("item not in inventory".into()))?;
    let item = character.inventory.remove(position);
    let slot: EquipmentSlot = item.kind.slot();
    if let Some(displaced) = character.equipped.insert(slot, item) {
        character.inventory.push(displaced);
    }
    ctx.db.upsert_character(&character).await?;
    Ok(Json(character))
}

#[derive(Deserialize)]
pub struct UnequipRequest {
    pub slot: EquipmentSlot,
}

pub async fn unequip(
    State(ctx): State<AppContext>,
    AuthUser(user_id): AuthUser,
    Path(character_id): Path<CharacterId>,
    Json(body): Json<UnequipRequest>,
) -> AppResult<Json<Character>> {
    let mut character = load_owned(&ctx, user_id, character_id).await?;
    if let Some(item) = character.equipped.remove(&body.slot) {
        character.inventory.push(item);
    }
    ctx.db.upsert_character(&character).await?;
    Ok(Json(character))
}

#[derive(Deserialize)]
pub struct SetLoadoutRequest {
    pub ability_ids: Vec<String>,
}

/// Chooses which up-to-4 learned abilities are usable in combat.
pub async fn set_loadout(
    State(ctx): State<AppContext>,
    AuthUser(user_id): AuthUser,
    Path(character_id): Path<CharacterId>,
    Json(body): Json<SetLoadoutRequest>,
) -> AppResult<Json<Character>> {
    let mut character = load_owned(&ctx, user_id, character_id).await?;
    character.validate_loadout(&body.ability_ids).map_err(AppError::Validation)?;
    character.active_loadout = body.ability_ids;
    ctx.db.upsert_character(&character).await?;
    Ok(Json(character))
}
