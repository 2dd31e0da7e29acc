use std::sync::Arc;

use sovereign_protocol::{Event, PlayerId, WorkKind};
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::production::ProductionEngine;
use crate::research::ResearchTracker;
use crate::state::GameState;
use crate::trade::TradeNetwork;

/// Runs the end-of-turn phases for the player who just acted, then hands the turn on.
pub struct TurnOrchestrator {
    catalog: Arc<Catalog>,
    production: ProductionEngine,
    trade: TradeNetwork,
    research: ResearchTracker,
}

impl TurnOrchestrator {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            production: ProductionEngine::new(catalog.clone()),
            trade: TradeNetwork::new(),
            research: ResearchTracker::new(catalog.clone()),
            catalog,
        }
    }

    pub fn production(&self) -> &ProductionEngine {
        &self.production
    }

    pub fn trade(&self) -> &TradeNetwork {
        &self.trade
    }

    pub fn research(&self) -> &ResearchTracker {
        &self.research
    }

    /// Workers, production, trade and research for the active player; then the
    /// next player's turn begins with full movement. No-op without players.
    pub fn end_turn(&self, state: &mut GameState) -> Vec<Event> {
        let Some(player) = state.active_player() else {
            return Vec::new();
        };

        let mut events = vec![Event::TurnEnded {
            turn: state.turn,
            player,
        }];

        events.extend(self.advance_workers(state, player));
        events.extend(self.production.advance_cities(state, player));
        self.refresh_trade(state, player, &mut events);
        self.advance_research(state, player, &mut events);

        if state.advance_active_player() {
            info!(turn = state.turn, "new turn");
        }
        let Some(next) = state.active_player() else {
            return events;
        };
        state.reset_movement(next);

        events.push(Event::TurnStarted {
            turn: state.turn,
            player: next,
        });
        events
    }

    /// Count down work orders of units standing on their target; finished work lands on the tile.
    pub fn advance_workers(&self, state: &mut GameState, player: PlayerId) -> Vec<Event> {
        let mut events = Vec::new();
        for unit_id in state.player_unit_ids(player) {
            let Some(unit) = state.units.get_mut(unit_id) else {
                continue;
            };
            let Some(order) = unit.work.as_mut() else {
                continue;
            };
            if unit.position != order.target || order.turns_remaining == 0 {
                continue;
            }
            order.turns_remaining -= 1;
            if order.turns_remaining > 0 {
                continue;
            }
            let order = *order;
            unit.work = None;

            let Some(tile) = state.map.tile_mut(order.target) else {
                continue;
            };
            match order.kind {
                WorkKind::Road => tile.road = true,
                WorkKind::Improvement(id) => tile.improvement = Some(id),
            }
            debug!(unit = unit_id.index, x = order.target.x, y = order.target.y, "work completed");
            events.push(Event::WorkCompleted {
                unit: unit_id,
                at: order.target,
                kind: order.kind,
            });
        }
        events
    }

    fn refresh_trade(&self, state: &mut GameState, player: PlayerId, events: &mut Vec<Event>) {
        self.trade.refresh(state, player);
        if let Some(p) = state.player(player) {
            events.push(Event::TradeRoutesRefreshed {
                player,
                routes: p.trade_routes.len() as u32,
                resources: p.available_resources.len() as u32,
            });
        }
    }

    /// Science bonus summed for the tracker: building science plus connected resource science.
    pub fn science_bonus(&self, state: &GameState, player: PlayerId) -> i32 {
        let buildings: i32 = state
            .cities
            .iter_ordered()
            .filter(|(_, c)| c.owner == player)
            .map(|(_, c)| c.science_per_turn)
            .sum();
        let resources: i32 = state.player(player).map_or(0, |p| {
            p.available_resources
                .iter()
                .filter_map(|id| self.catalog.resource(*id))
                .map(|r| r.science_bonus)
                .sum()
        });
        buildings + resources
    }

    fn advance_research(&self, state: &mut GameState, player: PlayerId, events: &mut Vec<Event>) {
        let bonus = self.science_bonus(state, player);
        let city_count = state.city_count(player);
        let Some(p) = state.player_mut(player) else {
            return;
        };
        if let Some(tech) = self.research.advance(p, city_count, bonus) {
            events.push(Event::TechResearched { player, tech });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{load_catalog, CatalogSource};
    use crate::map::WorldMap;
    use sovereign_protocol::{GridPos, ProductionTarget, WorkOrder};

    fn setup(players: usize) -> (Arc<Catalog>, TurnOrchestrator, GameState) {
        let catalog = Arc::new(load_catalog(CatalogSource::Embedded).expect("catalog load"));
        let plains = catalog.terrain_id("plains").unwrap();
        let mut state = GameState::new(WorldMap::new(8, 8, plains).unwrap());
        for i in 0..players {
            state.add_player(format!("P{i}"), i > 0).unwrap();
        }
        (catalog.clone(), TurnOrchestrator::new(catalog), state)
    }

    #[test]
    fn no_players_is_a_no_op() {
        let (_, turns, mut state) = setup(0);
        assert!(turns.end_turn(&mut state).is_empty());
        assert_eq!(state.turn, 1);
    }

    #[test]
    fn turn_counter_advances_on_wrap() {
        let (_, turns, mut state) = setup(2);
        turns.end_turn(&mut state);
        assert_eq!((state.turn, state.active_player_index()), (1, 1));
        turns.end_turn(&mut state);
        assert_eq!((state.turn, state.active_player_index()), (2, 0));
    }

    #[test]
    fn movement_resets_for_the_next_player_only() {
        let (catalog, turns, mut state) = setup(2);
        let worker = catalog.unit_type_id("worker").unwrap();
        let mine = state.spawn_unit(&catalog, worker, PlayerId(0), GridPos::new(1, 1));
        let theirs = state.spawn_unit(&catalog, worker, PlayerId(1), GridPos::new(5, 5));
        state.units.get_mut(mine).unwrap().moves_left = 0;
        state.units.get_mut(theirs).unwrap().moves_left = 0;

        turns.end_turn(&mut state);
        assert_eq!(state.units.get(mine).unwrap().moves_left, 0);
        assert_eq!(state.units.get(theirs).unwrap().moves_left, 2);
    }

    #[test]
    fn workers_finish_roads_in_place() {
        let (catalog, turns, mut state) = setup(1);
        let worker = catalog.unit_type_id("worker").unwrap();
        let at = GridPos::new(2, 2);
        let unit = state.spawn_unit(&catalog, worker, PlayerId(0), at);
        state.units.get_mut(unit).unwrap().work = Some(WorkOrder {
            target: at,
            kind: WorkKind::Road,
            turns_remaining: 2,
        });

        turns.end_turn(&mut state);
        assert!(!state.map.tile(at).unwrap().road);
        let events = turns.end_turn(&mut state);
        assert!(state.map.tile(at).unwrap().road);
        assert!(state.units.get(unit).unwrap().work.is_none());
        assert!(events.contains(&Event::WorkCompleted {
            unit,
            at,
            kind: WorkKind::Road
        }));
    }

    #[test]
    fn workers_off_target_do_not_progress() {
        let (catalog, turns, mut state) = setup(1);
        let worker = catalog.unit_type_id("worker").unwrap();
        let unit = state.spawn_unit(&catalog, worker, PlayerId(0), GridPos::new(1, 1));
        state.units.get_mut(unit).unwrap().work = Some(WorkOrder {
            target: GridPos::new(2, 2),
            kind: WorkKind::Road,
            turns_remaining: 1,
        });
        turns.end_turn(&mut state);
        assert_eq!(
            state.units.get(unit).unwrap().work.map(|w| w.turns_remaining),
            Some(1)
        );
    }

    #[test]
    fn building_lands_after_one_end_turn() {
        let (catalog, turns, mut state) = setup(1);
        let monument = catalog.building_id("monument").unwrap();
        let city = state.found_city("Capital".to_string(), PlayerId(0), GridPos::new(4, 4));
        {
            let c = state.cities.get_mut(city).unwrap();
            c.production_target = Some(ProductionTarget::Building(monument));
            c.production_stored = 20;
            c.production_cost = 20;
        }
        turns.end_turn(&mut state);
        assert!(state.cities.get(city).unwrap().has_building(monument));
    }

    #[test]
    fn research_counts_cities_and_science_sources() {
        let (catalog, turns, mut state) = setup(1);
        state.found_city("Capital".to_string(), PlayerId(0), GridPos::new(4, 4));
        turns.end_turn(&mut state);
        turns.end_turn(&mut state);
        assert_eq!(state.players[0].research_progress, 4);

        let gems = catalog.resource_id("gems").unwrap();
        let tile = state.map.tile_mut(GridPos::new(5, 5)).unwrap();
        tile.resource = Some(gems);
        tile.road = true;
        turns.end_turn(&mut state);
        // 4 + (1 + 1 city + 1 gems) = 7
        assert_eq!(state.players[0].research_progress, 7);
    }
}
