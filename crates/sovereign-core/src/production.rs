use std::sync::Arc;

use sovereign_protocol::{CityId, Event, GridPos, PlayerId, ProductionTarget};
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::city::City;
use crate::state::GameState;
use crate::yields::Yields;

/// Fallback health per population point for cities without a baseline.
const HEALTH_PER_POP: i32 = 10;

pub struct ProductionEngine {
    catalog: Arc<Catalog>,
}

/// Per-turn yields derived for one city.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CityYields {
    pub food: i32,
    pub production: i32,
    pub science: i32,
    pub buildings: Yields,
}

impl ProductionEngine {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Run one turn of yields, health, production and growth for every city `player` owns.
    pub fn advance_cities(&self, state: &mut GameState, player: PlayerId) -> Vec<Event> {
        let mut events = Vec::new();
        for city_id in state.player_city_ids(player) {
            self.advance_city(state, player, city_id, &mut events);
        }
        events
    }

    fn advance_city(
        &self,
        state: &mut GameState,
        player: PlayerId,
        city_id: CityId,
        events: &mut Vec<Event>,
    ) {
        let Some(city) = state.cities.get(city_id) else {
            return;
        };
        let yields = self.city_yields(state, city);
        let under_siege = is_under_siege(state, player, city.position);

        let Some(city) = state.cities.get_mut(city_id) else {
            return;
        };
        city.food_per_turn = yields.food;
        city.production_per_turn = yields.production;
        city.science_per_turn = yields.science;
        city.building_bonus = yields.buildings;

        city.under_siege = under_siege;
        if city.max_health == 0 {
            city.max_health = HEALTH_PER_POP * city.population.max(1) as i32;
            city.health = city.max_health;
        } else if !city.under_siege {
            city.health = (city.health + 1).min(city.max_health);
        }

        city.food_stored += city.food_per_turn;
        city.production_stored += city.production_per_turn;

        self.complete_production(state, player, city_id, events);

        let Some(city) = state.cities.get_mut(city_id) else {
            return;
        };
        let needed = city.growth_requirement();
        if city.food_stored >= needed {
            city.food_stored -= needed;
            city.population += 1;
            debug!(city = %city.name, population = city.population, "city grew");
            events.push(Event::CityGrew {
                city: city_id,
                population: city.population,
            });
        }
    }

    /// Base yields plus civics, worked tiles in the 3x3 around the city, and buildings.
    pub fn city_yields(&self, state: &GameState, city: &City) -> CityYields {
        let mut food = city.base_food;
        let mut production = city.base_production;

        if let Some(owner) = state.player(city.owner) {
            for civic in owner.civics.values().filter_map(|id| self.catalog.civic(*id)) {
                food += civic.food_bonus;
                production += civic.production_bonus;
            }
        }

        for pos in state.map.positions_in_radius(city.position, 1) {
            let Some(tile) = state.map.tile(pos) else {
                continue;
            };
            if let Some(improvement) = tile.improvement.and_then(|id| self.catalog.improvement(id)) {
                food += improvement.food_bonus;
                production += improvement.production_bonus;
            }
            if !tile.resource_connected() {
                continue;
            }
            if let Some(resource) = tile.resource.and_then(|id| self.catalog.resource(id)) {
                food += resource.food_bonus;
                production += resource.production_bonus;
            }
        }

        let buildings: Yields = city
            .buildings
            .iter()
            .filter_map(|id| self.catalog.building(*id))
            .map(|b| b.bonus)
            .sum();

        CityYields {
            food: (food + buildings.food).max(1),
            production: (production + buildings.production).max(1),
            science: buildings.science,
            buildings,
        }
    }

    /// Recompute the cached cost of the city's active target.
    pub fn refresh_cost(&self, city: &mut City) {
        city.production_cost = city
            .active_target()
            .map_or(0, |t| self.catalog.production_cost(t));
    }

    fn complete_production(
        &self,
        state: &mut GameState,
        player: PlayerId,
        city_id: CityId,
        events: &mut Vec<Event>,
    ) {
        let Some(city) = state.cities.get_mut(city_id) else {
            return;
        };
        city.skip_redundant_targets();
        self.refresh_cost(city);
        let Some(target) = city.active_target().cloned() else {
            return;
        };
        let position = city.position;
        let stored = city.production_stored;
        let cost = city.production_cost;

        if !self.target_unlocked(state, player, &target) {
            return;
        }
        if stored < cost {
            return;
        }

        match target {
            ProductionTarget::Unknown(_) => return,
            ProductionTarget::Unit(type_id) => {
                if state.player_unit_at(player, position).is_some() {
                    debug!(city = city_id.index, "unit spawn withheld, city tile occupied");
                    return;
                }
                let unit = state.spawn_unit(&self.catalog, type_id, player, position);
                events.push(Event::UnitCreated {
                    unit,
                    type_id,
                    owner: player,
                    at: position,
                });
            }
            ProductionTarget::Building(building) => {
                let Some(city) = state.cities.get_mut(city_id) else {
                    return;
                };
                city.add_building(building);
                info!(city = %city.name, building = building.raw, "building constructed");
                events.push(Event::BuildingConstructed {
                    city: city_id,
                    building,
                });
            }
        }

        let Some(city) = state.cities.get_mut(city_id) else {
            return;
        };
        city.production_stored -= cost;
        city.pop_active_target();
        city.skip_redundant_targets();
        self.refresh_cost(city);
        events.push(Event::ProductionChanged {
            city: city_id,
            cost: city.production_cost,
        });
    }

    /// Tech and resource gates for a target. `Unknown` is never unlocked.
    pub fn target_unlocked(
        &self,
        state: &GameState,
        player: PlayerId,
        target: &ProductionTarget,
    ) -> bool {
        let Some(p) = state.player(player) else {
            return false;
        };
        match target {
            ProductionTarget::Unit(id) => self.catalog.unit_type(*id).is_some_and(|u| {
                p.knows_all(&u.required_techs) && p.has_all_resources(&u.required_resources)
            }),
            ProductionTarget::Building(id) => self
                .catalog
                .building(*id)
                .is_some_and(|b| p.knows_all(&b.required_techs)),
            ProductionTarget::Unknown(_) => false,
        }
    }
}

/// An at-war enemy unit stands on or next to the city.
pub fn is_under_siege(state: &GameState, owner: PlayerId, position: GridPos) -> bool {
    state.units.iter_ordered().any(|(_, u)| {
        u.owner != owner
            && u.position.chebyshev_distance(position) <= 1
            && state.at_war(owner, u.owner)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{load_catalog, CatalogSource};
    use crate::map::WorldMap;

    struct Fixture {
        catalog: Arc<Catalog>,
        engine: ProductionEngine,
        state: GameState,
        player: PlayerId,
        city: CityId,
    }

    fn fixture() -> Fixture {
        let catalog = Arc::new(load_catalog(CatalogSource::Embedded).expect("catalog load"));
        let plains = catalog.terrain_id("plains").unwrap();
        let mut state = GameState::new(WorldMap::new(7, 7, plains).unwrap());
        let player = state.add_player("A".to_string(), false).unwrap();
        let city = state.found_city("Capital".to_string(), player, GridPos::new(3, 3));
        Fixture {
            engine: ProductionEngine::new(catalog.clone()),
            catalog,
            state,
            player,
            city,
        }
    }

    #[test]
    fn city_grows_once_threshold_is_met() {
        let mut f = fixture();
        f.state.cities.get_mut(f.city).unwrap().food_stored = 6;
        let events = f.engine.advance_cities(&mut f.state, f.player);
        let city = f.state.cities.get(f.city).unwrap();
        assert_eq!(city.population, 2);
        assert_eq!(city.food_stored, 0);
        assert!(events.contains(&Event::CityGrew {
            city: f.city,
            population: 2
        }));
    }

    #[test]
    fn yields_include_worked_tiles_civics_and_buildings() {
        let mut f = fixture();
        let farm = f.catalog.improvement_id("farm").unwrap();
        let wheat = f.catalog.resource_id("wheat").unwrap();
        let iron = f.catalog.resource_id("iron").unwrap();
        let monument = f.catalog.building_id("monument").unwrap();
        let chiefdom = f.catalog.civic_id("chiefdom").unwrap();

        let tile = f.state.map.tile_mut(GridPos::new(2, 2)).unwrap();
        tile.improvement = Some(farm);
        tile.resource = Some(wheat);
        // Unworked resource contributes nothing.
        f.state.map.tile_mut(GridPos::new(4, 4)).unwrap().resource = Some(iron);
        f.state
            .player_mut(f.player)
            .unwrap()
            .civics
            .insert("government".to_string(), chiefdom);
        f.state.cities.get_mut(f.city).unwrap().add_building(monument);

        let city = f.state.cities.get(f.city).unwrap();
        let yields = f.engine.city_yields(&f.state, city);
        assert_eq!(yields.food, 1 + 1 + 1);
        assert_eq!(yields.production, 1 + 1 + 1);
        assert_eq!(yields.buildings.production, 1);
    }

    #[test]
    fn building_completes_and_queue_skips_built_entries() {
        let mut f = fixture();
        let monument = f.catalog.building_id("monument").unwrap();
        let warrior = f.catalog.unit_type_id("warrior").unwrap();
        {
            let city = f.state.cities.get_mut(f.city).unwrap();
            city.production_stored = 50;
            city.production_queue.push_back(ProductionTarget::Building(monument));
            city.production_queue.push_back(ProductionTarget::Building(monument));
            city.production_queue.push_back(ProductionTarget::Unit(warrior));
        }
        f.engine.advance_cities(&mut f.state, f.player);

        let city = f.state.cities.get(f.city).unwrap();
        assert!(city.has_building(monument));
        assert_eq!(city.production_queue.len(), 1);
        assert_eq!(city.active_target(), Some(&ProductionTarget::Unit(warrior)));
        assert_eq!(city.production_cost, 10);
        assert_eq!(city.production_stored, 50 + 1 - 20);
    }

    #[test]
    fn unit_spawn_is_withheld_when_tile_is_occupied() {
        let mut f = fixture();
        let warrior = f.catalog.unit_type_id("warrior").unwrap();
        f.state
            .spawn_unit(&f.catalog, warrior, f.player, GridPos::new(3, 3));
        {
            let city = f.state.cities.get_mut(f.city).unwrap();
            city.production_stored = 30;
            city.production_target = Some(ProductionTarget::Unit(warrior));
        }
        let events = f.engine.advance_cities(&mut f.state, f.player);
        assert!(!events.iter().any(|e| matches!(e, Event::UnitCreated { .. })));
        let city = f.state.cities.get(f.city).unwrap();
        assert_eq!(city.production_stored, 31);
        assert!(city.production_target.is_some());

        let blocker = f.state.player_unit_ids(f.player)[0];
        f.state.units.get_mut(blocker).unwrap().position = GridPos::new(1, 1);
        let events = f.engine.advance_cities(&mut f.state, f.player);
        assert!(events.iter().any(|e| matches!(e, Event::UnitCreated { .. })));
        let city = f.state.cities.get(f.city).unwrap();
        assert_eq!(city.production_stored, 32 - 10);
        assert!(city.production_target.is_none());
        assert_eq!(city.production_cost, 0);
    }

    #[test]
    fn gated_targets_wait_for_tech_and_resources() {
        let mut f = fixture();
        let horseman = f.catalog.unit_type_id("horseman").unwrap();
        let riding = f.catalog.tech_id("horseback_riding").unwrap();
        let horses = f.catalog.resource_id("horses").unwrap();
        {
            let city = f.state.cities.get_mut(f.city).unwrap();
            city.production_stored = 100;
            city.production_target = Some(ProductionTarget::Unit(horseman));
        }
        f.engine.advance_cities(&mut f.state, f.player);
        assert_eq!(f.state.player_unit_ids(f.player).len(), 0);

        f.state.player_mut(f.player).unwrap().learn_tech(riding);
        f.engine.advance_cities(&mut f.state, f.player);
        assert_eq!(f.state.player_unit_ids(f.player).len(), 0);

        f.state
            .player_mut(f.player)
            .unwrap()
            .available_resources
            .push(horses);
        f.engine.advance_cities(&mut f.state, f.player);
        assert_eq!(f.state.player_unit_ids(f.player).len(), 1);
    }

    #[test]
    fn unknown_target_is_skipped() {
        let mut f = fixture();
        {
            let city = f.state.cities.get_mut(f.city).unwrap();
            city.production_stored = 100;
            city.production_target = Some(ProductionTarget::Unknown("palace".to_string()));
        }
        let events = f.engine.advance_cities(&mut f.state, f.player);
        assert!(!events
            .iter()
            .any(|e| matches!(e, Event::ProductionChanged { .. })));
        let city = f.state.cities.get(f.city).unwrap();
        assert_eq!(city.production_stored, 101);
        assert_eq!(city.production_cost, 0);
    }

    #[test]
    fn health_baseline_then_heal_unless_besieged() {
        let mut f = fixture();
        let warrior = f.catalog.unit_type_id("warrior").unwrap();
        f.engine.advance_cities(&mut f.state, f.player);
        let city = f.state.cities.get(f.city).unwrap();
        assert_eq!(city.max_health, 10);
        assert_eq!(city.health, 10);

        f.state.cities.get_mut(f.city).unwrap().health = 5;
        f.engine.advance_cities(&mut f.state, f.player);
        assert_eq!(f.state.cities.get(f.city).unwrap().health, 6);

        let enemy = f.state.add_player("B".to_string(), true).unwrap();
        f.state.spawn_unit(&f.catalog, warrior, enemy, GridPos::new(4, 4));
        f.engine.advance_cities(&mut f.state, f.player);
        let city = f.state.cities.get(f.city).unwrap();
        assert!(!city.under_siege, "peace means no siege");
        assert_eq!(city.health, 7);

        f.state.set_war(f.player, enemy, true);
        f.engine.advance_cities(&mut f.state, f.player);
        let city = f.state.cities.get(f.city).unwrap();
        assert!(city.under_siege);
        assert_eq!(city.health, 7);
    }
}
