use std::collections::HashMap;

use serde::Deserialize;
use sovereign_protocol::{
    BuildingId, CivicId, DataId, ImprovementId, ProductionTarget, PromotionId, ResourceId, TechId,
    TerrainId, UnitTypeId,
};

use crate::catalog::CatalogError;

/// Movement cost used when a terrain entry is missing.
pub const DEFAULT_MOVE_COST: i32 = 1;
/// Attack used when a unit type entry is missing.
pub const DEFAULT_ATTACK: i32 = 1;
/// Defense used when a unit type entry is missing.
pub const DEFAULT_DEFENSE: i32 = 1;
/// Range used when a unit type entry is missing.
pub const DEFAULT_RANGE: i32 = 1;

/// All type definitions, indexed by runtime id. Entries keep the order they
/// were declared in, which is the order research auto-selection walks.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub terrains: Vec<TerrainType>,
    pub unit_types: Vec<UnitType>,
    pub improvements: Vec<ImprovementType>,
    pub resources: Vec<ResourceType>,
    pub techs: Vec<Technology>,
    pub buildings: Vec<BuildingType>,
    pub civics: Vec<Civic>,
    pub promotions: Vec<Promotion>,

    pub terrain_ids: HashMap<DataId, TerrainId>,
    pub unit_type_ids: HashMap<DataId, UnitTypeId>,
    pub improvement_ids: HashMap<DataId, ImprovementId>,
    pub resource_ids: HashMap<DataId, ResourceId>,
    pub tech_ids: HashMap<DataId, TechId>,
    pub building_ids: HashMap<DataId, BuildingId>,
    pub civic_ids: HashMap<DataId, CivicId>,
    pub promotion_ids: HashMap<DataId, PromotionId>,
}

impl Catalog {
    pub fn terrain(&self, id: TerrainId) -> Option<&TerrainType> {
        self.terrains.get(id.index())
    }

    pub fn unit_type(&self, id: UnitTypeId) -> Option<&UnitType> {
        self.unit_types.get(id.index())
    }

    pub fn improvement(&self, id: ImprovementId) -> Option<&ImprovementType> {
        self.improvements.get(id.index())
    }

    pub fn resource(&self, id: ResourceId) -> Option<&ResourceType> {
        self.resources.get(id.index())
    }

    pub fn tech(&self, id: TechId) -> Option<&Technology> {
        self.techs.get(id.index())
    }

    pub fn building(&self, id: BuildingId) -> Option<&BuildingType> {
        self.buildings.get(id.index())
    }

    pub fn civic(&self, id: CivicId) -> Option<&Civic> {
        self.civics.get(id.index())
    }

    pub fn promotion(&self, id: PromotionId) -> Option<&Promotion> {
        self.promotions.get(id.index())
    }

    pub fn terrain_id(&self, data_id: &str) -> Option<TerrainId> {
        self.terrain_ids.get(data_id).copied()
    }

    pub fn unit_type_id(&self, data_id: &str) -> Option<UnitTypeId> {
        self.unit_type_ids.get(data_id).copied()
    }

    pub fn improvement_id(&self, data_id: &str) -> Option<ImprovementId> {
        self.improvement_ids.get(data_id).copied()
    }

    pub fn resource_id(&self, data_id: &str) -> Option<ResourceId> {
        self.resource_ids.get(data_id).copied()
    }

    pub fn tech_id(&self, data_id: &str) -> Option<TechId> {
        self.tech_ids.get(data_id).copied()
    }

    pub fn building_id(&self, data_id: &str) -> Option<BuildingId> {
        self.building_ids.get(data_id).copied()
    }

    pub fn civic_id(&self, data_id: &str) -> Option<CivicId> {
        self.civic_ids.get(data_id).copied()
    }

    pub fn promotion_id(&self, data_id: &str) -> Option<PromotionId> {
        self.promotion_ids.get(data_id).copied()
    }

    /// Tech ids in catalog order.
    pub fn tech_order(&self) -> impl Iterator<Item = TechId> + '_ {
        (0..self.techs.len()).map(|i| TechId::new(i as u16))
    }

    /// Resolve a production identifier: unit types first, then buildings.
    pub fn resolve_production(&self, data_id: &str) -> ProductionTarget {
        let data_id = data_id.trim();
        if let Some(id) = self.unit_type_id(data_id) {
            ProductionTarget::Unit(id)
        } else if let Some(id) = self.building_id(data_id) {
            ProductionTarget::Building(id)
        } else {
            ProductionTarget::Unknown(data_id.to_string())
        }
    }

    /// Cost of a production target, or 0 when it cannot be built at all.
    pub fn production_cost(&self, target: &ProductionTarget) -> i32 {
        match target {
            ProductionTarget::Unit(id) => self.unit_type(*id).map_or(0, |u| u.cost),
            ProductionTarget::Building(id) => self.building(*id).map_or(0, |b| b.cost),
            ProductionTarget::Unknown(_) => 0,
        }
    }

    pub fn move_cost(&self, terrain: TerrainId) -> i32 {
        self.terrain(terrain)
            .map_or(DEFAULT_MOVE_COST, |t| t.move_cost)
    }
}

/// Split a comma-separated requirement list. Empty or whitespace means "none".
pub fn parse_id_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn resolve_list<T: Copy>(
    list: &str,
    ids: &HashMap<DataId, T>,
) -> Result<Vec<T>, CatalogError> {
    parse_id_list(list)
        .map(|id| {
            ids.get(id)
                .copied()
                .ok_or_else(|| CatalogError::MissingId(id.to_string()))
        })
        .collect()
}

fn default_move_cost() -> i32 {
    DEFAULT_MOVE_COST
}

fn default_unit_health() -> i32 {
    10
}

fn default_range() -> i32 {
    DEFAULT_RANGE
}

fn default_build_turns() -> u8 {
    3
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTerrainType {
    pub name: String,
    #[serde(default = "default_move_cost")]
    pub move_cost: i32,
    #[serde(default)]
    pub defense_bonus: i32,
    #[serde(default)]
    pub impassable: bool,
    #[serde(default)]
    pub water: bool,
}

impl RawTerrainType {
    pub fn compile(self, data_id: DataId) -> TerrainType {
        TerrainType {
            data_id,
            name: self.name,
            move_cost: self.move_cost.max(1),
            defense_bonus: self.defense_bonus,
            impassable: self.impassable,
            water: self.water,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TerrainType {
    pub data_id: DataId,
    pub name: String,
    pub move_cost: i32,
    pub defense_bonus: i32,
    pub impassable: bool,
    pub water: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawUnitType {
    pub name: String,
    pub attack: i32,
    pub defense: i32,
    pub moves: i32,
    #[serde(default = "default_unit_health")]
    pub health: i32,
    #[serde(default = "default_range")]
    pub range: i32,
    pub cost: i32,
    #[serde(default)]
    pub required_tech: String,
    #[serde(default)]
    pub required_resource: String,
    #[serde(default)]
    pub can_found_city: bool,
    #[serde(default)]
    pub is_worker: bool,
}

impl RawUnitType {
    pub fn compile(
        self,
        data_id: DataId,
        tech_ids: &HashMap<DataId, TechId>,
        resource_ids: &HashMap<DataId, ResourceId>,
    ) -> Result<UnitType, CatalogError> {
        Ok(UnitType {
            data_id,
            name: self.name,
            attack: self.attack,
            defense: self.defense,
            moves: self.moves.max(0),
            health: self.health.max(1),
            range: self.range.max(1),
            cost: self.cost.max(0),
            required_techs: resolve_list(&self.required_tech, tech_ids)?,
            required_resources: resolve_list(&self.required_resource, resource_ids)?,
            can_found_city: self.can_found_city,
            is_worker: self.is_worker,
        })
    }
}

#[derive(Debug, Clone)]
pub struct UnitType {
    pub data_id: DataId,
    pub name: String,
    pub attack: i32,
    pub defense: i32,
    pub moves: i32,
    pub health: i32,
    pub range: i32,
    pub cost: i32,
    pub required_techs: Vec<TechId>,
    pub required_resources: Vec<ResourceId>,
    pub can_found_city: bool,
    pub is_worker: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawImprovementType {
    pub name: String,
    #[serde(default)]
    pub food_bonus: i32,
    #[serde(default)]
    pub production_bonus: i32,
    #[serde(default = "default_build_turns")]
    pub build_turns: u8,
    #[serde(default)]
    pub required_tech: String,
    /// If empty, improvement can be built on any land terrain.
    #[serde(default)]
    pub allowed_terrain: String,
}

impl RawImprovementType {
    pub fn compile(
        self,
        data_id: DataId,
        tech_ids: &HashMap<DataId, TechId>,
        terrain_ids: &HashMap<DataId, TerrainId>,
    ) -> Result<ImprovementType, CatalogError> {
        Ok(ImprovementType {
            data_id,
            name: self.name,
            food_bonus: self.food_bonus,
            production_bonus: self.production_bonus,
            build_turns: self.build_turns.max(1),
            required_techs: resolve_list(&self.required_tech, tech_ids)?,
            allowed_terrain: resolve_list(&self.allowed_terrain, terrain_ids)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ImprovementType {
    pub data_id: DataId,
    pub name: String,
    pub food_bonus: i32,
    pub production_bonus: i32,
    pub build_turns: u8,
    pub required_techs: Vec<TechId>,
    pub allowed_terrain: Vec<TerrainId>,
}

impl ImprovementType {
    pub fn allows(&self, terrain: TerrainId) -> bool {
        self.allowed_terrain.is_empty() || self.allowed_terrain.contains(&terrain)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawResourceType {
    pub name: String,
    #[serde(default)]
    pub food_bonus: i32,
    #[serde(default)]
    pub production_bonus: i32,
    #[serde(default)]
    pub science_bonus: i32,
}

impl RawResourceType {
    pub fn compile(self, data_id: DataId) -> ResourceType {
        ResourceType {
            data_id,
            name: self.name,
            food_bonus: self.food_bonus,
            production_bonus: self.production_bonus,
            science_bonus: self.science_bonus,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResourceType {
    pub data_id: DataId,
    pub name: String,
    pub food_bonus: i32,
    pub production_bonus: i32,
    pub science_bonus: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTechnology {
    pub name: String,
    pub cost: i32,
    #[serde(default)]
    pub prerequisites: String,
}

impl RawTechnology {
    pub fn compile(
        self,
        data_id: DataId,
        tech_ids: &HashMap<DataId, TechId>,
    ) -> Result<Technology, CatalogError> {
        Ok(Technology {
            data_id,
            name: self.name,
            cost: self.cost.max(1),
            prerequisites: resolve_list(&self.prerequisites, tech_ids)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Technology {
    pub data_id: DataId,
    pub name: String,
    pub cost: i32,
    pub prerequisites: Vec<TechId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawBuildingType {
    pub name: String,
    pub cost: i32,
    #[serde(default)]
    pub required_tech: String,
    #[serde(default)]
    pub food_bonus: i32,
    #[serde(default)]
    pub production_bonus: i32,
    #[serde(default)]
    pub science_bonus: i32,
    #[serde(default)]
    pub defense_bonus: i32,
}

impl RawBuildingType {
    pub fn compile(
        self,
        data_id: DataId,
        tech_ids: &HashMap<DataId, TechId>,
    ) -> Result<BuildingType, CatalogError> {
        Ok(BuildingType {
            data_id,
            name: self.name,
            cost: self.cost.max(0),
            required_techs: resolve_list(&self.required_tech, tech_ids)?,
            bonus: crate::yields::Yields {
                food: self.food_bonus,
                production: self.production_bonus,
                science: self.science_bonus,
                defense: self.defense_bonus,
            },
        })
    }
}

#[derive(Debug, Clone)]
pub struct BuildingType {
    pub data_id: DataId,
    pub name: String,
    pub cost: i32,
    pub required_techs: Vec<TechId>,
    pub bonus: crate::yields::Yields,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCivic {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub food_bonus: i32,
    #[serde(default)]
    pub production_bonus: i32,
    #[serde(default)]
    pub required_tech: String,
}

impl RawCivic {
    pub fn compile(
        self,
        data_id: DataId,
        tech_ids: &HashMap<DataId, TechId>,
    ) -> Result<Civic, CatalogError> {
        Ok(Civic {
            data_id,
            name: self.name,
            category: self.category,
            food_bonus: self.food_bonus,
            production_bonus: self.production_bonus,
            required_techs: resolve_list(&self.required_tech, tech_ids)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Civic {
    pub data_id: DataId,
    pub name: String,
    pub category: String,
    pub food_bonus: i32,
    pub production_bonus: i32,
    pub required_techs: Vec<TechId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPromotion {
    pub name: String,
    #[serde(default)]
    pub attack_bonus: i32,
    #[serde(default)]
    pub defense_bonus: i32,
    /// Extra defense that only applies against ranged attacks.
    #[serde(default)]
    pub ranged_defense_bonus: i32,
    #[serde(default)]
    pub damage_reduction: i32,
    #[serde(default)]
    pub prerequisites: String,
}

impl RawPromotion {
    pub fn compile(
        self,
        data_id: DataId,
        promotion_ids: &HashMap<DataId, PromotionId>,
    ) -> Result<Promotion, CatalogError> {
        Ok(Promotion {
            data_id,
            name: self.name,
            attack_bonus: self.attack_bonus,
            defense_bonus: self.defense_bonus,
            ranged_defense_bonus: self.ranged_defense_bonus,
            damage_reduction: self.damage_reduction.max(0),
            prerequisites: resolve_list(&self.prerequisites, promotion_ids)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Promotion {
    pub data_id: DataId,
    pub name: String,
    pub attack_bonus: i32,
    pub defense_bonus: i32,
    pub ranged_defense_bonus: i32,
    pub damage_reduction: i32,
    pub prerequisites: Vec<PromotionId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_lists_ignore_blanks_and_whitespace() {
        assert_eq!(parse_id_list("").count(), 0);
        assert_eq!(parse_id_list("   ").count(), 0);
        let ids: Vec<_> = parse_id_list(" pottery , writing,, ").collect();
        assert_eq!(ids, vec!["pottery", "writing"]);
    }

    #[test]
    fn unknown_requirement_is_reported() {
        let ids: HashMap<DataId, TechId> = HashMap::new();
        let err = resolve_list("bronze_working", &ids).unwrap_err();
        assert!(matches!(err, CatalogError::MissingId(id) if id == "bronze_working"));
    }
}
