use std::collections::BTreeMap;

use sovereign_protocol::{
    CityId, DiplomaticStatus, GridPos, PlayerId, UnitId, UnitTypeId,
};

use crate::catalog::Catalog;
use crate::city::City;
use crate::entities::EntityStore;
use crate::fog::PlayerVisibility;
use crate::map::WorldMap;
use crate::player::Player;
use crate::unit::Unit;

/// Seats available in one game; player ids are a single byte.
pub const MAX_PLAYERS: usize = u8::MAX as usize + 1;

/// Scenario bookkeeping carried through save/restore untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Scenario {
    pub id: String,
    pub markers: BTreeMap<String, i32>,
}

#[derive(Clone, Debug)]
pub struct GameState {
    pub map: WorldMap,
    pub players: Vec<Player>,
    /// One layer per player, same order as `players`.
    pub visibility: Vec<PlayerVisibility>,
    pub units: EntityStore<Unit>,
    pub cities: EntityStore<City>,
    pub turn: u32,
    active_player: usize,
    pub scenario: Option<Scenario>,
}

impl GameState {
    pub fn new(map: WorldMap) -> Self {
        Self {
            map,
            players: Vec::new(),
            visibility: Vec::new(),
            units: EntityStore::default(),
            cities: EntityStore::default(),
            turn: 1,
            active_player: 0,
            scenario: None,
        }
    }

    /// Add a player at peace with everyone already seated. Returns `None`
    /// once [`MAX_PLAYERS`] seats are taken.
    pub fn add_player(&mut self, name: String, is_ai: bool) -> Option<PlayerId> {
        let id = PlayerId(u8::try_from(self.players.len()).ok()?);
        let mut player = Player::new(id, name, is_ai);
        for other in &mut self.players {
            other.diplomacy.insert(id, DiplomaticStatus::default());
            player
                .diplomacy
                .insert(other.id, DiplomaticStatus::default());
        }
        self.players.push(player);
        self.visibility.push(PlayerVisibility::new(self.map.len()));
        Some(id)
    }

    pub fn active_player_index(&self) -> usize {
        self.active_player
    }

    pub fn active_player(&self) -> Option<PlayerId> {
        self.players.get(self.active_player).map(|p| p.id)
    }

    /// Returns `false` and leaves the pointer alone when `index` is out of range.
    pub fn set_active_player_index(&mut self, index: usize) -> bool {
        if index >= self.players.len() {
            return false;
        }
        self.active_player = index;
        true
    }

    /// Step to the next player; returns `true` when the turn wrapped.
    pub(crate) fn advance_active_player(&mut self) -> bool {
        let count = self.players.len();
        if count == 0 {
            return false;
        }
        self.active_player = (self.active_player + 1) % count;
        if self.active_player == 0 {
            self.turn += 1;
            true
        } else {
            false
        }
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id.index())
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id.index())
    }

    pub fn visibility(&self, id: PlayerId) -> Option<&PlayerVisibility> {
        self.visibility.get(id.index())
    }

    pub fn at_war(&self, a: PlayerId, b: PlayerId) -> bool {
        self.player(a).is_some_and(|p| p.is_at_war_with(b))
    }

    pub fn set_war(&mut self, a: PlayerId, b: PlayerId, at_war: bool) {
        if let Some(p) = self.player_mut(a) {
            p.diplomacy.entry(b).or_default().at_war = at_war;
        }
        if let Some(p) = self.player_mut(b) {
            p.diplomacy.entry(a).or_default().at_war = at_war;
        }
    }

    /// The player's units in store order. Collected so callers can mutate while walking it.
    pub fn player_unit_ids(&self, owner: PlayerId) -> Vec<UnitId> {
        self.units
            .iter_ordered()
            .filter(|(_, u)| u.owner == owner)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn player_city_ids(&self, owner: PlayerId) -> Vec<CityId> {
        self.cities
            .iter_ordered()
            .filter(|(_, c)| c.owner == owner)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn city_count(&self, owner: PlayerId) -> usize {
        self.cities
            .iter_ordered()
            .filter(|(_, c)| c.owner == owner)
            .count()
    }

    pub fn unit_at(&self, pos: GridPos) -> Option<UnitId> {
        self.units
            .iter_ordered()
            .find_map(|(id, u)| (u.position == pos).then_some(id))
    }

    pub fn player_unit_at(&self, owner: PlayerId, pos: GridPos) -> Option<UnitId> {
        self.units
            .iter_ordered()
            .find_map(|(id, u)| (u.owner == owner && u.position == pos).then_some(id))
    }

    pub fn city_at(&self, pos: GridPos) -> Option<CityId> {
        self.cities
            .iter_ordered()
            .find_map(|(id, c)| (c.position == pos).then_some(id))
    }

    pub fn spawn_unit(
        &mut self,
        catalog: &Catalog,
        type_id: UnitTypeId,
        owner: PlayerId,
        position: GridPos,
    ) -> UnitId {
        self.units
            .insert(Unit::new(type_id, owner, position, catalog))
    }

    pub fn found_city(&mut self, name: String, owner: PlayerId, position: GridPos) -> CityId {
        self.cities.insert(City::new(name, owner, position))
    }

    pub fn reset_movement(&mut self, owner: PlayerId) {
        for (_, unit) in self.units.iter_ordered_mut() {
            if unit.owner == owner {
                unit.reset_movement();
            }
        }
    }
}
