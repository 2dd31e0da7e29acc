use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use sovereign_core::{
    generate_map, load_catalog, Catalog, CatalogSource, CombatResolver, FogOfWar, GameState,
    MapGenConfig, Player, ResearchTracker, TradeNetwork, TurnOrchestrator, WorldMap,
};
use sovereign_protocol::{GridPos, PlayerId, ProductionTarget};

fn catalog() -> Arc<Catalog> {
    Arc::new(load_catalog(CatalogSource::Embedded).expect("catalog load"))
}

fn plains_state(catalog: &Catalog, width: u32, height: u32) -> GameState {
    let plains = catalog.terrain_id("plains").unwrap();
    GameState::new(WorldMap::new(width, height, plains).unwrap())
}

#[test]
fn map_generation_is_deterministic_per_seed() {
    let catalog = catalog();
    for (width, height) in [(3, 3), (10, 7), (32, 20)] {
        let config = MapGenConfig {
            width,
            height,
            seed: 1234,
            ..Default::default()
        };
        let a = generate_map(&catalog, &config).unwrap();
        let b = generate_map(&catalog, &config).unwrap();
        assert_eq!(a.len(), (width * height) as usize);
        assert_eq!(a.tiles(), b.tiles());
    }
}

#[test]
fn world_map_tile_count_is_width_times_height() {
    let catalog = catalog();
    for (w, h) in [(1, 1), (5, 9), (64, 1)] {
        assert_eq!(plains_state(&catalog, w, h).map.len(), (w * h) as usize);
    }
}

#[test]
fn end_turn_resets_movement_for_next_player() {
    let catalog = catalog();
    let mut state = plains_state(&catalog, 6, 6);
    let p0 = state.add_player("A".to_string(), false).unwrap();
    let warrior = catalog.unit_type_id("warrior").unwrap();
    let unit = state.spawn_unit(&catalog, warrior, p0, GridPos::new(2, 2));
    state.units.get_mut(unit).unwrap().moves_left = -4;

    TurnOrchestrator::new(catalog.clone()).end_turn(&mut state);
    let unit = state.units.get(unit).unwrap();
    assert_eq!(unit.moves_left, unit.moves);
}

#[test]
fn funded_building_is_constructed_in_one_end_turn() {
    let catalog = catalog();
    let mut state = plains_state(&catalog, 6, 6);
    let p0 = state.add_player("A".to_string(), false).unwrap();
    let library = catalog.building_id("library").unwrap();
    let writing = catalog.tech_id("writing").unwrap();
    state.player_mut(p0).unwrap().learn_tech(writing);
    let city = state.found_city("Capital".to_string(), p0, GridPos::new(3, 3));
    {
        let city = state.cities.get_mut(city).unwrap();
        city.production_target = Some(ProductionTarget::Building(library));
        city.production_stored = 40;
    }

    TurnOrchestrator::new(catalog.clone()).end_turn(&mut state);
    let city = state.cities.get(city).unwrap();
    assert!(city.has_building(library));
    assert_eq!(city.science_per_turn, 0, "bonus applies from the next turn");
}

#[test]
fn research_with_one_city_accumulates_four_in_two_advances() {
    let catalog = catalog();
    let tracker = ResearchTracker::new(catalog.clone());
    let mut player = Player::new(PlayerId(0), "A".to_string(), false);
    tracker.advance(&mut player, 1, 0);
    tracker.advance(&mut player, 1, 0);
    assert_eq!(player.research_progress, 4);

    let mut bonused = Player::new(PlayerId(1), "B".to_string(), false);
    tracker.advance(&mut bonused, 1, 1);
    tracker.advance(&mut bonused, 1, 1);
    assert_eq!(bonused.research_progress, 6);
}

#[test]
fn city_at_threshold_grows_and_empties_store() {
    let catalog = catalog();
    let mut state = plains_state(&catalog, 6, 6);
    let p0 = state.add_player("A".to_string(), false).unwrap();
    let city = state.found_city("Capital".to_string(), p0, GridPos::new(3, 3));
    state.cities.get_mut(city).unwrap().food_stored = 6;

    TurnOrchestrator::new(catalog.clone()).end_turn(&mut state);
    let city = state.cities.get(city).unwrap();
    assert_eq!(city.food_per_turn, 1);
    assert_eq!(city.population, 2);
    assert_eq!(city.food_stored, 0);
}

#[test]
fn fog_radius_two_on_seven_by_seven() {
    let catalog = catalog();
    let mut state = plains_state(&catalog, 7, 7);
    let p0 = state.add_player("A".to_string(), false).unwrap();
    let warrior = catalog.unit_type_id("warrior").unwrap();
    state.spawn_unit(&catalog, warrior, p0, GridPos::new(3, 3));

    FogOfWar::new(2).apply(&mut state);
    let layer = state.visibility(p0).unwrap();
    let index = |x, y| state.map.index_of(GridPos::new(x, y)).unwrap();
    assert!(layer.is_visible(index(3, 3)));
    assert!(layer.is_explored(index(1, 1)));
    assert!(!layer.is_visible(index(0, 0)));
    for (i, visible) in layer.visible().iter().enumerate() {
        assert!(!visible || layer.is_explored(i));
    }
}

#[test]
fn road_path_makes_a_trade_route() {
    let catalog = catalog();
    let mut state = plains_state(&catalog, 10, 4);
    let p0 = state.add_player("A".to_string(), false).unwrap();
    state.found_city("A".to_string(), p0, GridPos::new(1, 1));
    state.found_city("B".to_string(), p0, GridPos::new(8, 1));
    state.found_city("C".to_string(), p0, GridPos::new(4, 2));

    for x in 2..8 {
        state.map.tile_mut(GridPos::new(x, 1)).unwrap().road = true;
    }
    TradeNetwork::new().refresh(&mut state, p0);
    let cities = state.player_city_ids(p0);
    let routes = &state.player(p0).unwrap().trade_routes;
    assert_eq!(routes.len(), 3, "C sits next to the road");
    assert_eq!((routes[0].from, routes[0].to), (cities[0], cities[1]));

    for x in 2..8 {
        state.map.tile_mut(GridPos::new(x, 1)).unwrap().road = false;
    }
    TradeNetwork::new().refresh(&mut state, p0);
    assert!(state.player(p0).unwrap().trade_routes.is_empty());
}

#[test]
fn combat_damages_exactly_one_side_and_removes_the_dead() {
    let catalog = catalog();
    let resolver = CombatResolver::new(catalog.clone());
    let warrior = catalog.unit_type_id("warrior").unwrap();
    let mut deaths = 0;

    for seed in 0..100 {
        let mut state = plains_state(&catalog, 5, 5);
        let a = state.add_player("A".to_string(), false).unwrap();
        let b = state.add_player("B".to_string(), false).unwrap();
        state.set_war(a, b, true);
        let att = state.spawn_unit(&catalog, warrior, a, GridPos::new(1, 1));
        let def = state.spawn_unit(&catalog, warrior, b, GridPos::new(2, 2));
        state.units.get_mut(att).unwrap().health = 3;
        state.units.get_mut(def).unwrap().health = 3;

        let mut rng = StdRng::seed_from_u64(seed);
        let report = resolver
            .resolve(&mut state, att, def, 1, &mut rng)
            .unwrap();
        let att_hp = state.units.get(att).map_or(0, |u| u.health);
        let def_hp = state.units.get(def).map_or(0, |u| u.health);
        let att_lost = 3 - att_hp;
        let def_lost = 3 - def_hp;

        assert!((att_lost >= 1) ^ (def_lost >= 1), "seed {seed}");
        if report.attacker_died || report.defender_died {
            deaths += 1;
        }
        assert_eq!(report.attacker_died, state.units.get(att).is_none());
        assert_eq!(report.defender_died, state.units.get(def).is_none());
    }
    assert!(deaths > 0);
}
