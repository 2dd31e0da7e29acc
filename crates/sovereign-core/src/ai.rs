//! Placeholder AI: every unit of the active player tries one random step.

use rand::Rng;
use sovereign_protocol::{Command, Event, GridPos};

use crate::game::GameEngine;

/// Try one random adjacent move for each of the active player's units.
///
/// Illegal moves (water, off-map, enemy-occupied) are simply skipped.
pub fn run_random_walk<R: Rng + ?Sized>(engine: &mut GameEngine, rng: &mut R) -> Vec<Event> {
    let Some(player) = engine.state().active_player() else {
        return Vec::new();
    };

    let mut events = Vec::new();
    for unit in engine.state().player_unit_ids(player) {
        let Some(from) = engine.state().units.get(unit).map(|u| u.position) else {
            continue;
        };
        let step = GridPos::DIRECTIONS[rng.gen_range(0..GridPos::DIRECTIONS.len())];
        events.extend(engine.apply_command(Command::MoveUnit {
            unit,
            to: from + step,
        }));
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{load_catalog, CatalogSource};
    use crate::config::EngineConfig;
    use crate::map::WorldMap;
    use crate::state::GameState;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    #[test]
    fn units_move_at_most_one_step() {
        let catalog = Arc::new(load_catalog(CatalogSource::Embedded).expect("catalog load"));
        let plains = catalog.terrain_id("plains").unwrap();
        let warrior = catalog.unit_type_id("warrior").unwrap();
        let mut state = GameState::new(WorldMap::new(9, 9, plains).unwrap());
        let p0 = state.add_player("A".to_string(), true).unwrap();
        let a = state.spawn_unit(&catalog, warrior, p0, GridPos::new(4, 4));
        let b = state.spawn_unit(&catalog, warrior, p0, GridPos::new(2, 6));
        let mut engine = GameEngine::new(catalog, EngineConfig::default(), state);

        let mut rng = StdRng::seed_from_u64(5);
        let events = run_random_walk(&mut engine, &mut rng);
        assert_eq!(events.len(), 2);
        for (id, start) in [(a, GridPos::new(4, 4)), (b, GridPos::new(2, 6))] {
            let unit = engine.state().units.get(id).unwrap();
            assert_eq!(unit.position.chebyshev_distance(start), 1);
            assert_eq!(unit.moves_left, 0);
        }

        // Out of moves: nothing happens until the next turn.
        assert!(run_random_walk(&mut engine, &mut rng).is_empty());
    }
}
