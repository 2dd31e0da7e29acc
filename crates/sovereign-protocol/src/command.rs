use serde::{Deserialize, Serialize};

use crate::{CityId, CivicId, GridPos, ImprovementId, PlayerId, PromotionId, TechId, UnitId};

/// Everything the presentation layer can ask the engine to do. Fully serializable.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    // Unit commands
    MoveUnit { unit: UnitId, to: GridPos },
    AttackUnit { attacker: UnitId, defender: UnitId },
    ChoosePromotion { unit: UnitId, promotion: PromotionId },

    // Worker commands
    BuildImprovement { unit: UnitId, improvement: ImprovementId },
    BuildRoad { unit: UnitId },

    // City commands
    FoundCity { settler: UnitId, name: String },
    /// `item` is a unit or building data id; unknown ids are accepted and skipped.
    SetProduction { city: CityId, item: String },
    EnqueueProduction { city: CityId, item: String },

    // Player commands
    SetResearch { tech: TechId },
    AdoptCivic { civic: CivicId },
    EndTurn,

    // Diplomacy
    DeclareWar { target: PlayerId },
    MakePeace { target: PlayerId },
}
