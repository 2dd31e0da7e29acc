use serde::{Deserialize, Serialize};

use crate::{
    BuildingId, CityId, CivicId, CombatOutcome, GridPos, PlayerId, PromotionId, TechId, UnitId,
    UnitTypeId, WorkKind,
};

/// Everything the engine reports back. Fully serializable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // Game flow
    TurnEnded {
        turn: u32,
        player: PlayerId,
    },
    TurnStarted {
        turn: u32,
        player: PlayerId,
    },

    // Units
    UnitCreated {
        unit: UnitId,
        type_id: UnitTypeId,
        owner: PlayerId,
        at: GridPos,
    },
    UnitMoved {
        unit: UnitId,
        from: GridPos,
        to: GridPos,
        moves_left: i32,
    },
    UnitDied {
        unit: UnitId,
        owner: PlayerId,
    },
    UnitPromoted {
        unit: UnitId,
        promotion: PromotionId,
    },
    CombatResolved {
        attacker: UnitId,
        defender: UnitId,
        outcome: CombatOutcome,
        damage: i32,
        ranged: bool,
    },
    WorkStarted {
        unit: UnitId,
        at: GridPos,
        kind: WorkKind,
        turns: u8,
    },
    WorkCompleted {
        unit: UnitId,
        at: GridPos,
        kind: WorkKind,
    },

    // Cities
    CityFounded {
        city: CityId,
        owner: PlayerId,
        name: String,
        at: GridPos,
    },
    CityGrew {
        city: CityId,
        population: u32,
    },
    BuildingConstructed {
        city: CityId,
        building: BuildingId,
    },
    ProductionChanged {
        city: CityId,
        cost: i32,
    },

    // Research & civics
    ResearchSet {
        player: PlayerId,
        tech: TechId,
    },
    TechResearched {
        player: PlayerId,
        tech: TechId,
    },
    CivicAdopted {
        player: PlayerId,
        civic: CivicId,
    },

    // Trade
    TradeRoutesRefreshed {
        player: PlayerId,
        routes: u32,
        resources: u32,
    },

    // Diplomacy
    WarDeclared {
        aggressor: PlayerId,
        target: PlayerId,
    },
    PeaceMade {
        a: PlayerId,
        b: PlayerId,
    },
}
