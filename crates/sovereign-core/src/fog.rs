use sovereign_protocol::{GridPos, PlayerId};
use tracing::debug;

use crate::state::GameState;

pub const DEFAULT_FOG_RADIUS: i32 = 2;

/// One player's view of the map, indexed like the tile vector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerVisibility {
    explored: Vec<bool>,
    visible: Vec<bool>,
}

impl PlayerVisibility {
    pub fn new(tile_count: usize) -> Self {
        Self {
            explored: vec![false; tile_count],
            visible: vec![false; tile_count],
        }
    }

    /// Rebuild from stored layers. Missing or short layers are padded with
    /// `false`; visible tiles are forced explored.
    pub fn from_layers(tile_count: usize, mut explored: Vec<bool>, mut visible: Vec<bool>) -> Self {
        explored.resize(tile_count, false);
        visible.resize(tile_count, false);
        for (e, v) in explored.iter_mut().zip(&visible) {
            *e |= *v;
        }
        Self { explored, visible }
    }

    pub fn is_explored(&self, index: usize) -> bool {
        self.explored.get(index).copied().unwrap_or(false)
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.visible.get(index).copied().unwrap_or(false)
    }

    pub fn explored(&self) -> &[bool] {
        &self.explored
    }

    pub fn visible(&self) -> &[bool] {
        &self.visible
    }

    fn clear_visible(&mut self) {
        self.visible.iter_mut().for_each(|v| *v = false);
    }

    fn reveal(&mut self, index: usize) {
        if let (Some(v), Some(e)) = (self.visible.get_mut(index), self.explored.get_mut(index)) {
            *v = true;
            *e = true;
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FogOfWar {
    radius: i32,
}

impl Default for FogOfWar {
    fn default() -> Self {
        Self::new(DEFAULT_FOG_RADIUS)
    }
}

impl FogOfWar {
    pub fn new(radius: i32) -> Self {
        Self {
            radius: radius.max(0),
        }
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    /// Recompute the active player's visible tiles from their units and cities.
    pub fn apply(&self, state: &mut GameState) {
        if let Some(player) = state.active_player() {
            self.apply_for(state, player);
        }
    }

    /// Same as [`FogOfWar::apply`] for an explicit player, e.g. when seating a new game.
    pub fn apply_for(&self, state: &mut GameState, player: PlayerId) {
        let sources: Vec<GridPos> = state
            .units
            .iter_ordered()
            .filter(|(_, u)| u.owner == player)
            .map(|(_, u)| u.position)
            .chain(
                state
                    .cities
                    .iter_ordered()
                    .filter(|(_, c)| c.owner == player)
                    .map(|(_, c)| c.position),
            )
            .collect();

        let indices: Vec<usize> = sources
            .iter()
            .flat_map(|pos| state.map.positions_in_radius(*pos, self.radius))
            .filter_map(|pos| state.map.index_of(pos))
            .collect();

        let Some(layer) = state.visibility.get_mut(player.index()) else {
            return;
        };
        layer.clear_visible();
        for index in indices {
            layer.reveal(index);
        }
        debug!(player = player.0, sources = sources.len(), "fog applied");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{load_catalog, CatalogSource};
    use crate::map::WorldMap;

    #[test]
    fn reveal_is_chebyshev_square_and_explored_sticks() {
        let catalog = load_catalog(CatalogSource::Embedded).expect("catalog load");
        let plains = catalog.terrain_id("plains").unwrap();
        let warrior = catalog.unit_type_id("warrior").unwrap();
        let map = WorldMap::new(7, 7, plains).unwrap();
        let mut state = GameState::new(map);
        let p0 = state.add_player("A".to_string(), false).unwrap();
        let unit = state.spawn_unit(&catalog, warrior, p0, GridPos::new(3, 3));

        let fog = FogOfWar::new(2);
        fog.apply(&mut state);

        let at = |state: &GameState, x, y| state.map.index_of(GridPos::new(x, y)).unwrap();
        let layer = state.visibility(p0).unwrap();
        assert!(layer.is_visible(at(&state, 3, 3)));
        assert!(layer.is_visible(at(&state, 5, 5)));
        assert!(layer.is_explored(at(&state, 1, 1)));
        assert!(!layer.is_visible(at(&state, 0, 0)));
        assert!(!layer.is_explored(at(&state, 0, 0)));

        state.units.get_mut(unit).unwrap().position = GridPos::new(6, 6);
        fog.apply(&mut state);
        let layer = state.visibility(p0).unwrap();
        assert!(!layer.is_visible(at(&state, 1, 1)));
        assert!(layer.is_explored(at(&state, 1, 1)));
        assert!(layer.is_visible(at(&state, 6, 6)));
    }

    #[test]
    fn other_players_view_is_untouched() {
        let catalog = load_catalog(CatalogSource::Embedded).expect("catalog load");
        let plains = catalog.terrain_id("plains").unwrap();
        let warrior = catalog.unit_type_id("warrior").unwrap();
        let mut state = GameState::new(WorldMap::new(5, 5, plains).unwrap());
        let p0 = state.add_player("A".to_string(), false).unwrap();
        let p1 = state.add_player("B".to_string(), true).unwrap();
        state.spawn_unit(&catalog, warrior, p0, GridPos::new(2, 2));
        state.spawn_unit(&catalog, warrior, p1, GridPos::new(0, 0));

        FogOfWar::default().apply(&mut state);
        let other = state.visibility(PlayerId(1)).unwrap();
        assert!(other.visible().iter().all(|v| !v));
        assert!(other.explored().iter().all(|e| !e));
    }
}
