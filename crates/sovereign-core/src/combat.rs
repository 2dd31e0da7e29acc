use std::sync::Arc;

use rand::Rng;
use sovereign_protocol::{CombatOutcome, GridPos, UnitId};
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::state::GameState;
use crate::unit::Unit;

pub const MIN_DAMAGE: i32 = 1;
pub const MAX_DAMAGE: i32 = 6;
/// Each roll adds a uniform draw from `0..DIE_SIDES`.
const DIE_SIDES: i32 = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CombatReport {
    pub outcome: CombatOutcome,
    pub ranged: bool,
    /// Rolled damage before the loser's damage reduction.
    pub damage: i32,
    /// Health actually removed from the loser.
    pub damage_dealt: i32,
    pub attacker_died: bool,
    pub defender_died: bool,
    /// Set when a melee attacker moved onto the defender's tile.
    pub advanced_to: Option<GridPos>,
}

pub struct CombatResolver {
    catalog: Arc<Catalog>,
}

impl CombatResolver {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Ranged when the attacker's range exceeds 1 and the target is within it (Manhattan).
    pub fn is_ranged(&self, attacker: &Unit, defender: &Unit) -> bool {
        let range = attacker.range(&self.catalog);
        range > 1 && attacker.position.manhattan_distance(defender.position) <= range
    }

    pub fn attack_strength(&self, attacker: &Unit) -> i32 {
        attacker.attack_strength(&self.catalog)
    }

    /// Unit defense plus the defender's terrain bonus.
    pub fn defense_strength(&self, state: &GameState, defender: &Unit, ranged: bool) -> i32 {
        let terrain_bonus = state
            .map
            .tile(defender.position)
            .and_then(|t| self.catalog.terrain(t.terrain))
            .map_or(0, |t| t.defense_bonus);
        defender.defense_strength(&self.catalog, ranged) + terrain_bonus
    }

    /// Resolve one attack. Exactly one side takes damage; a side at 0 health is removed.
    ///
    /// Returns `None` if either unit does not exist.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        state: &mut GameState,
        attacker_id: UnitId,
        defender_id: UnitId,
        move_cost: i32,
        rng: &mut R,
    ) -> Option<CombatReport> {
        if attacker_id == defender_id {
            return None;
        }
        let attacker = state.units.get(attacker_id)?;
        let defender = state.units.get(defender_id)?;

        let ranged = self.is_ranged(attacker, defender);
        let attack = self.attack_strength(attacker);
        let defense = self.defense_strength(state, defender, ranged);
        let target_tile = defender.position;
        let attacker_owner = attacker.owner;

        let attack_roll = attack + rng.gen_range(0..DIE_SIDES);
        let defense_roll = defense + rng.gen_range(0..DIE_SIDES);
        let damage = (attack_roll - defense_roll + 1).clamp(MIN_DAMAGE, MAX_DAMAGE);
        let attacker_won = attack_roll >= defense_roll;
        debug!(attack_roll, defense_roll, damage, ranged, "combat rolled");

        let (loser_id, outcome) = if attacker_won {
            (defender_id, CombatOutcome::AttackerWon)
        } else {
            (attacker_id, CombatOutcome::DefenderWon)
        };

        let loser = state.units.get_mut(loser_id)?;
        let dealt = (damage - loser.damage_reduction(&self.catalog)).max(MIN_DAMAGE);
        loser.health -= dealt;
        let loser_died = !loser.is_alive();
        if loser_died {
            if let Some(dead) = state.units.remove(loser_id) {
                info!(unit = loser_id.index, owner = dead.owner.0, "unit died in combat");
            }
        }

        // Only a vacated tile can be taken; stacked defenders hold it.
        let mut advanced_to = None;
        let tile_held = state
            .units
            .iter_ordered()
            .any(|(_, u)| u.position == target_tile && u.owner != attacker_owner);
        if attacker_won && loser_died && !ranged && !tile_held {
            if let Some(unit) = state.units.get_mut(attacker_id) {
                unit.position = target_tile;
                unit.moves_left = (unit.moves_left - move_cost).max(0);
                advanced_to = Some(target_tile);
            }
        }

        Some(CombatReport {
            outcome,
            ranged,
            damage,
            damage_dealt: dealt,
            attacker_died: !attacker_won && loser_died,
            defender_died: attacker_won && loser_died,
            advanced_to,
        })
    }
}
