use std::collections::VecDeque;

use sovereign_protocol::{BuildingId, GridPos, PlayerId, ProductionTarget};

use crate::yields::Yields;

#[derive(Clone, Debug, PartialEq)]
pub struct City {
    pub name: String,
    pub owner: PlayerId,
    pub position: GridPos,
    pub population: u32,
    pub food_stored: i32,
    pub production_stored: i32,
    pub base_food: i32,
    pub base_production: i32,

    // Derived each turn by the production engine.
    pub food_per_turn: i32,
    pub production_per_turn: i32,
    pub science_per_turn: i32,
    pub building_bonus: Yields,

    pub production_target: Option<ProductionTarget>,
    pub production_queue: VecDeque<ProductionTarget>,
    /// Cost of the active target, 0 when there is nothing to build.
    pub production_cost: i32,
    /// Insertion-ordered set.
    pub buildings: Vec<BuildingId>,

    /// `max_health == 0` means no baseline has been set yet.
    pub health: i32,
    pub max_health: i32,
    pub under_siege: bool,
}

impl City {
    pub fn new(name: String, owner: PlayerId, position: GridPos) -> Self {
        Self {
            name,
            owner,
            position,
            population: 1,
            food_stored: 0,
            production_stored: 0,
            base_food: 1,
            base_production: 1,
            food_per_turn: 1,
            production_per_turn: 1,
            science_per_turn: 0,
            building_bonus: Yields::default(),
            production_target: None,
            production_queue: VecDeque::new(),
            production_cost: 0,
            buildings: Vec::new(),
            health: 0,
            max_health: 0,
            under_siege: false,
        }
    }

    pub fn has_building(&self, id: BuildingId) -> bool {
        self.buildings.contains(&id)
    }

    pub fn add_building(&mut self, id: BuildingId) -> bool {
        if self.has_building(id) {
            return false;
        }
        self.buildings.push(id);
        true
    }

    /// Queue head if any, else the standing target.
    pub fn active_target(&self) -> Option<&ProductionTarget> {
        self.production_queue
            .front()
            .or(self.production_target.as_ref())
    }

    /// Drop the active target after it completes.
    pub fn pop_active_target(&mut self) {
        if self.production_queue.pop_front().is_none() {
            self.production_target = None;
        }
    }

    /// Skip queued buildings that already stand in this city.
    pub fn skip_redundant_targets(&mut self) {
        while let Some(ProductionTarget::Building(id)) = self.production_queue.front() {
            if !self.has_building(*id) {
                break;
            }
            self.production_queue.pop_front();
        }
        if self.production_queue.is_empty() {
            if let Some(ProductionTarget::Building(id)) = self.production_target {
                if self.has_building(id) {
                    self.production_target = None;
                }
            }
        }
    }

    pub fn growth_requirement(&self) -> i32 {
        5 + 2 * self.population as i32
    }
}
