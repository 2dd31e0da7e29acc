use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    BuildingId, CityId, CivicId, DiplomaticStatus, GridPos, ImprovementId, PlayerId,
    ProductionTarget, PromotionId, ResourceId, TechId, TerrainId, UnitId, UnitTypeId, WorkOrder,
};

/// Full game state in flat record form, for save/restore and rejoin.
///
/// Trade routes and available resources are derived and are not carried;
/// restoring recomputes them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub turn: u32,
    pub active_player: PlayerId,
    pub map: MapSnapshot,
    pub players: Vec<PlayerSnapshot>,
    pub units: Vec<UnitSnapshot>,
    pub cities: Vec<CitySnapshot>,
    #[serde(default)]
    pub scenario: Option<ScenarioSnapshot>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapSnapshot {
    pub width: u32,
    pub height: u32,
    pub tiles: Vec<TileSnapshot>, // row-major
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileSnapshot {
    pub terrain: TerrainId,
    #[serde(default)]
    pub improvement: Option<ImprovementId>,
    #[serde(default)]
    pub resource: Option<ResourceId>,
    #[serde(default)]
    pub road: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub is_ai: bool,
    #[serde(default)]
    pub known_techs: Vec<TechId>,
    #[serde(default)]
    pub researching: Option<TechId>,
    #[serde(default)]
    pub research_progress: i32,
    /// Category → adopted civic.
    #[serde(default)]
    pub civics: BTreeMap<String, CivicId>,
    #[serde(default)]
    pub diplomacy: BTreeMap<PlayerId, DiplomaticStatus>,
    /// Explored tiles (row-major).
    #[serde(default)]
    pub explored: Vec<bool>,
    /// Tiles visible at the last fog pass (row-major).
    #[serde(default)]
    pub visible: Vec<bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub id: UnitId,
    pub type_id: UnitTypeId,
    pub owner: PlayerId,
    pub position: GridPos,
    pub moves: i32,
    pub moves_left: i32,
    pub health: i32,
    pub max_health: i32,
    #[serde(default)]
    pub work: Option<WorkOrder>,
    #[serde(default)]
    pub promotions: Vec<PromotionId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CitySnapshot {
    pub id: CityId,
    pub name: String,
    pub owner: PlayerId,
    pub position: GridPos,
    pub population: u32,
    pub food_stored: i32,
    pub production_stored: i32,
    pub base_food: i32,
    pub base_production: i32,
    #[serde(default)]
    pub production_target: Option<ProductionTarget>,
    #[serde(default)]
    pub production_queue: Vec<ProductionTarget>,
    #[serde(default)]
    pub buildings: Vec<BuildingId>,
    #[serde(default)]
    pub health: i32,
    #[serde(default)]
    pub max_health: i32,
    #[serde(default)]
    pub under_siege: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSnapshot {
    pub id: String,
    #[serde(default)]
    pub markers: BTreeMap<String, i32>,
}
