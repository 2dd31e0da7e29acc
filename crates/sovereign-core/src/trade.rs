use std::collections::VecDeque;

use sovereign_protocol::{GridPos, PlayerId, ResourceId, TradeRoute};
use tracing::debug;

use crate::map::WorldMap;
use crate::state::GameState;

/// Rebuilds a player's trade routes and connected resources from the map.
#[derive(Clone, Copy, Debug, Default)]
pub struct TradeNetwork;

impl TradeNetwork {
    pub fn new() -> Self {
        Self
    }

    /// Clear and rebuild `player`'s routes and available resources. Idempotent.
    pub fn refresh(&self, state: &mut GameState, player: PlayerId) {
        if state.player(player).is_none() {
            return;
        }

        let cities: Vec<_> = state
            .player_city_ids(player)
            .into_iter()
            .filter_map(|id| state.cities.get(id).map(|c| (id, c.position)))
            .collect();
        let city_tiles: Vec<GridPos> = cities.iter().map(|(_, pos)| *pos).collect();

        let mut routes = Vec::new();
        for (i, (from, from_pos)) in cities.iter().enumerate() {
            for (to, to_pos) in &cities[i + 1..] {
                if cities_connected(&state.map, &city_tiles, *from_pos, *to_pos) {
                    routes.push(TradeRoute {
                        from: *from,
                        to: *to,
                    });
                }
            }
        }

        let mut resources: Vec<ResourceId> = Vec::new();
        for pos in &city_tiles {
            for p in state.map.positions_in_radius(*pos, 1) {
                let Some(tile) = state.map.tile(p) else {
                    continue;
                };
                if let Some(resource) = tile.resource {
                    if tile.resource_connected() && !resources.contains(&resource) {
                        resources.push(resource);
                    }
                }
            }
        }

        debug!(
            player = player.0,
            routes = routes.len(),
            resources = resources.len(),
            "trade refreshed"
        );
        if let Some(p) = state.player_mut(player) {
            p.trade_routes = routes;
            p.available_resources = resources;
        }
    }
}

/// Breadth-first search over road tiles and the given city tiles (8-neighborhood).
pub fn cities_connected(map: &WorldMap, city_tiles: &[GridPos], from: GridPos, to: GridPos) -> bool {
    let (Some(start), Some(goal)) = (map.index_of(from), map.index_of(to)) else {
        return false;
    };
    if start == goal {
        return true;
    }

    let traversable = |pos: GridPos| {
        city_tiles.contains(&pos) || map.tile(pos).is_some_and(|t| t.road)
    };

    let mut seen = vec![false; map.len()];
    seen[start] = true;
    let mut queue = VecDeque::from([from]);

    while let Some(pos) = queue.pop_front() {
        for next in map.neighbors(pos) {
            let Some(index) = map.index_of(next) else {
                continue;
            };
            if seen[index] || !traversable(next) {
                continue;
            }
            if index == goal {
                return true;
            }
            seen[index] = true;
            queue.push_back(next);
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{load_catalog, CatalogSource};

    fn setup() -> (GameState, PlayerId) {
        let catalog = load_catalog(CatalogSource::Embedded).expect("catalog load");
        let plains = catalog.terrain_id("plains").unwrap();
        let mut state = GameState::new(WorldMap::new(8, 5, plains).unwrap());
        let p0 = state.add_player("A".to_string(), false).unwrap();
        state.found_city("West".to_string(), p0, GridPos::new(1, 2));
        state.found_city("East".to_string(), p0, GridPos::new(5, 2));
        (state, p0)
    }

    #[test]
    fn road_connected_cities_trade() {
        let (mut state, p0) = setup();
        for x in 2..5 {
            state.map.tile_mut(GridPos::new(x, 2)).unwrap().road = true;
        }
        TradeNetwork::new().refresh(&mut state, p0);
        let routes = &state.player(p0).unwrap().trade_routes;
        assert_eq!(routes.len(), 1);
        let ids = state.player_city_ids(p0);
        assert_eq!(routes[0], TradeRoute { from: ids[0], to: ids[1] });
    }

    #[test]
    fn diagonal_roads_connect() {
        let (mut state, p0) = setup();
        for (x, y) in [(2, 1), (3, 0), (4, 1)] {
            state.map.tile_mut(GridPos::new(x, y)).unwrap().road = true;
        }
        TradeNetwork::new().refresh(&mut state, p0);
        assert_eq!(state.player(p0).unwrap().trade_routes.len(), 1);
    }

    #[test]
    fn broken_road_means_no_route() {
        let (mut state, p0) = setup();
        state.map.tile_mut(GridPos::new(2, 2)).unwrap().road = true;
        state.map.tile_mut(GridPos::new(4, 2)).unwrap().road = true;
        TradeNetwork::new().refresh(&mut state, p0);
        assert!(state.player(p0).unwrap().trade_routes.is_empty());
    }

    #[test]
    fn only_worked_resources_near_cities_are_available() {
        let catalog = load_catalog(CatalogSource::Embedded).expect("catalog load");
        let wheat = catalog.resource_id("wheat").unwrap();
        let horses = catalog.resource_id("horses").unwrap();
        let iron = catalog.resource_id("iron").unwrap();
        let farm = catalog.improvement_id("farm").unwrap();
        let (mut state, p0) = setup();

        let tile = state.map.tile_mut(GridPos::new(0, 1)).unwrap();
        tile.resource = Some(wheat);
        tile.improvement = Some(farm);
        let tile = state.map.tile_mut(GridPos::new(2, 3)).unwrap();
        tile.resource = Some(horses);
        tile.road = true;
        // Unworked.
        state.map.tile_mut(GridPos::new(6, 2)).unwrap().resource = Some(iron);
        // Second wheat, worked, must not duplicate.
        let tile = state.map.tile_mut(GridPos::new(4, 3)).unwrap();
        tile.resource = Some(wheat);
        tile.road = true;

        let network = TradeNetwork::new();
        network.refresh(&mut state, p0);
        network.refresh(&mut state, p0);
        assert_eq!(
            state.player(p0).unwrap().available_resources,
            vec![wheat, horses]
        );
    }
}
