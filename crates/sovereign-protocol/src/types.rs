use serde::{Deserialize, Serialize};

use crate::{BuildingId, CityId, GridPos, ImprovementId, UnitTypeId};

/// What a city is building, resolved once from a catalog identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id")]
pub enum ProductionTarget {
    Unit(UnitTypeId),
    Building(BuildingId),
    /// An identifier the catalog knows nothing about. Skipped every turn.
    Unknown(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id")]
pub enum WorkKind {
    Improvement(ImprovementId),
    Road,
}

/// Worker task in progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub target: GridPos,
    pub kind: WorkKind,
    pub turns_remaining: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRoute {
    pub from: CityId,
    pub to: CityId,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiplomaticStatus {
    pub at_war: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatOutcome {
    AttackerWon,
    DefenderWon,
}
