use std::sync::Arc;

use sovereign_protocol::{
    CitySnapshot, MapSnapshot, PlayerId, PlayerSnapshot, ScenarioSnapshot, Snapshot,
    TileSnapshot, UnitSnapshot,
};
use thiserror::Error;

use crate::catalog::Catalog;
use crate::city::City;
use crate::config::EngineConfig;
use crate::entities::EntityStore;
use crate::fog::PlayerVisibility;
use crate::game::GameEngine;
use crate::map::{MapError, Tile, WorldMap};
use crate::player::Player;
use crate::production::ProductionEngine;
use crate::state::{GameState, Scenario};
use crate::trade::TradeNetwork;
use crate::unit::Unit;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RestoreError {
    #[error("invalid map: {0}")]
    Map(#[from] MapError),
    #[error("player {found:?} listed at position {expected}")]
    PlayerOutOfOrder { expected: usize, found: PlayerId },
    #[error("unknown owner {0:?}")]
    UnknownOwner(PlayerId),
    #[error("active player {0:?} out of range")]
    ActivePlayerOutOfRange(PlayerId),
    #[error("two units share an id")]
    DuplicateUnitId,
    #[error("two cities share an id")]
    DuplicateCityId,
}

impl GameState {
    pub fn to_snapshot(&self) -> Snapshot {
        let tiles = self
            .map
            .tiles()
            .iter()
            .map(|t| TileSnapshot {
                terrain: t.terrain,
                improvement: t.improvement,
                resource: t.resource,
                road: t.road,
            })
            .collect();

        let players = self
            .players
            .iter()
            .map(|p| {
                let layer = self.visibility(p.id);
                PlayerSnapshot {
                    id: p.id,
                    name: p.name.clone(),
                    is_ai: p.is_ai,
                    known_techs: p.known_techs.clone(),
                    researching: p.researching,
                    research_progress: p.research_progress,
                    civics: p.civics.clone(),
                    diplomacy: p.diplomacy.clone(),
                    explored: layer.map(|l| l.explored().to_vec()).unwrap_or_default(),
                    visible: layer.map(|l| l.visible().to_vec()).unwrap_or_default(),
                }
            })
            .collect();

        let units = self
            .units
            .iter_ordered()
            .map(|(id, u)| UnitSnapshot {
                id,
                type_id: u.type_id,
                owner: u.owner,
                position: u.position,
                moves: u.moves,
                moves_left: u.moves_left,
                health: u.health,
                max_health: u.max_health,
                work: u.work,
                promotions: u.promotions.clone(),
            })
            .collect();

        let cities = self
            .cities
            .iter_ordered()
            .map(|(id, c)| CitySnapshot {
                id,
                name: c.name.clone(),
                owner: c.owner,
                position: c.position,
                population: c.population,
                food_stored: c.food_stored,
                production_stored: c.production_stored,
                base_food: c.base_food,
                base_production: c.base_production,
                production_target: c.production_target.clone(),
                production_queue: c.production_queue.iter().cloned().collect(),
                buildings: c.buildings.clone(),
                health: c.health,
                max_health: c.max_health,
                under_siege: c.under_siege,
            })
            .collect();

        Snapshot {
            turn: self.turn,
            active_player: self.active_player().unwrap_or(PlayerId(0)),
            map: MapSnapshot {
                width: self.map.width(),
                height: self.map.height(),
                tiles,
            },
            players,
            units,
            cities,
            scenario: self.scenario.as_ref().map(|s| ScenarioSnapshot {
                id: s.id.clone(),
                markers: s.markers.clone(),
            }),
        }
    }

    /// Rebuild a state from a snapshot. Derived data (trade routes, available
    /// resources, city yields and production costs) is recomputed.
    pub fn restore(snapshot: &Snapshot, catalog: &Arc<Catalog>) -> Result<Self, RestoreError> {
        let tiles = snapshot
            .map
            .tiles
            .iter()
            .map(|t| Tile {
                terrain: t.terrain,
                improvement: t.improvement,
                resource: t.resource,
                road: t.road,
            })
            .collect();
        let map = WorldMap::from_tiles(snapshot.map.width, snapshot.map.height, tiles)?;
        let tile_count = map.len();

        let mut players = Vec::with_capacity(snapshot.players.len());
        let mut visibility = Vec::with_capacity(snapshot.players.len());
        for (index, p) in snapshot.players.iter().enumerate() {
            if p.id.index() != index {
                return Err(RestoreError::PlayerOutOfOrder {
                    expected: index,
                    found: p.id,
                });
            }
            let mut player = Player::new(p.id, p.name.clone(), p.is_ai);
            player.known_techs = p.known_techs.clone();
            player.researching = p.researching;
            player.research_progress = p.research_progress;
            player.civics = p.civics.clone();
            player.diplomacy = p.diplomacy.clone();
            players.push(player);
            visibility.push(PlayerVisibility::from_layers(
                tile_count,
                p.explored.clone(),
                p.visible.clone(),
            ));
        }
        let known_owner = |owner: PlayerId| {
            if owner.index() < players.len() {
                Ok(())
            } else {
                Err(RestoreError::UnknownOwner(owner))
            }
        };

        let mut units = Vec::with_capacity(snapshot.units.len());
        for u in &snapshot.units {
            known_owner(u.owner)?;
            units.push((
                u.id,
                Unit {
                    type_id: u.type_id,
                    owner: u.owner,
                    position: u.position,
                    moves: u.moves,
                    moves_left: u.moves_left,
                    health: u.health,
                    max_health: u.max_health,
                    work: u.work,
                    promotions: u.promotions.clone(),
                },
            ));
        }
        let units = EntityStore::from_entries(units).ok_or(RestoreError::DuplicateUnitId)?;

        let mut cities = Vec::with_capacity(snapshot.cities.len());
        for c in &snapshot.cities {
            known_owner(c.owner)?;
            let mut city = City::new(c.name.clone(), c.owner, c.position);
            city.population = c.population;
            city.food_stored = c.food_stored;
            city.production_stored = c.production_stored;
            city.base_food = c.base_food;
            city.base_production = c.base_production;
            city.production_target = c.production_target.clone();
            city.production_queue = c.production_queue.iter().cloned().collect();
            city.buildings = c.buildings.clone();
            city.health = c.health;
            city.max_health = c.max_health;
            city.under_siege = c.under_siege;
            cities.push((c.id, city));
        }
        let cities = EntityStore::from_entries(cities).ok_or(RestoreError::DuplicateCityId)?;

        let mut state = GameState::new(map);
        state.players = players;
        state.visibility = visibility;
        state.units = units;
        state.cities = cities;
        state.turn = snapshot.turn.max(1);
        state.scenario = snapshot.scenario.as_ref().map(|s| Scenario {
            id: s.id.clone(),
            markers: s.markers.clone(),
        });
        if !state.players.is_empty()
            && !state.set_active_player_index(snapshot.active_player.index())
        {
            return Err(RestoreError::ActivePlayerOutOfRange(snapshot.active_player));
        }

        let trade = TradeNetwork::new();
        let seated: Vec<PlayerId> = state.players.iter().map(|p| p.id).collect();
        for player in seated {
            trade.refresh(&mut state, player);
        }
        let production = ProductionEngine::new(catalog.clone());
        let ids: Vec<_> = state.cities.iter_ordered().map(|(id, _)| id).collect();
        for id in ids {
            let Some(city) = state.cities.get(id) else {
                continue;
            };
            let yields = production.city_yields(&state, city);
            if let Some(city) = state.cities.get_mut(id) {
                city.food_per_turn = yields.food;
                city.production_per_turn = yields.production;
                city.science_per_turn = yields.science;
                city.building_bonus = yields.buildings;
                production.refresh_cost(city);
            }
        }

        Ok(state)
    }
}

impl GameEngine {
    pub fn snapshot(&self) -> Snapshot {
        self.state().to_snapshot()
    }

    pub fn from_snapshot(
        catalog: Arc<Catalog>,
        config: EngineConfig,
        snapshot: &Snapshot,
    ) -> Result<Self, RestoreError> {
        let state = GameState::restore(snapshot, &catalog)?;
        Ok(Self::new(catalog, config, state))
    }
}
