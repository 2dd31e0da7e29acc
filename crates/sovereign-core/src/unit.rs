use sovereign_protocol::{GridPos, PlayerId, PromotionId, UnitTypeId, WorkOrder};

use crate::catalog::{Catalog, DEFAULT_ATTACK, DEFAULT_DEFENSE, DEFAULT_RANGE};

/// Movement cap for units whose type is missing from the catalog.
const FALLBACK_MOVES: i32 = 1;
const FALLBACK_HEALTH: i32 = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unit {
    pub type_id: UnitTypeId,
    pub owner: PlayerId,
    pub position: GridPos,
    pub moves: i32,
    pub moves_left: i32,
    pub health: i32,
    pub max_health: i32,
    pub work: Option<WorkOrder>,
    /// Insertion-ordered set.
    pub promotions: Vec<PromotionId>,
}

impl Unit {
    pub fn new(type_id: UnitTypeId, owner: PlayerId, position: GridPos, catalog: &Catalog) -> Self {
        let (moves, health) = catalog
            .unit_type(type_id)
            .map_or((FALLBACK_MOVES, FALLBACK_HEALTH), |t| (t.moves, t.health));
        Self {
            type_id,
            owner,
            position,
            moves,
            moves_left: moves,
            health,
            max_health: health,
            work: None,
            promotions: Vec::new(),
        }
    }

    pub fn reset_movement(&mut self) {
        self.moves_left = self.moves;
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn has_promotion(&self, id: PromotionId) -> bool {
        self.promotions.contains(&id)
    }

    /// Returns `false` if the unit already had it.
    pub fn add_promotion(&mut self, id: PromotionId) -> bool {
        if self.has_promotion(id) {
            return false;
        }
        self.promotions.push(id);
        true
    }

    pub fn range(&self, catalog: &Catalog) -> i32 {
        catalog
            .unit_type(self.type_id)
            .map_or(DEFAULT_RANGE, |t| t.range)
    }

    pub fn attack_strength(&self, catalog: &Catalog) -> i32 {
        let base = catalog
            .unit_type(self.type_id)
            .map_or(DEFAULT_ATTACK, |t| t.attack);
        base + self.promotion_sum(catalog, |p| p.attack_bonus)
    }

    /// Unit defense before terrain. Ranged-only bonuses apply when `ranged`.
    pub fn defense_strength(&self, catalog: &Catalog, ranged: bool) -> i32 {
        let base = catalog
            .unit_type(self.type_id)
            .map_or(DEFAULT_DEFENSE, |t| t.defense);
        let ranged_bonus = if ranged {
            self.promotion_sum(catalog, |p| p.ranged_defense_bonus)
        } else {
            0
        };
        base + self.promotion_sum(catalog, |p| p.defense_bonus) + ranged_bonus
    }

    pub fn damage_reduction(&self, catalog: &Catalog) -> i32 {
        self.promotion_sum(catalog, |p| p.damage_reduction)
    }

    fn promotion_sum(
        &self,
        catalog: &Catalog,
        field: impl Fn(&crate::catalog::Promotion) -> i32,
    ) -> i32 {
        self.promotions
            .iter()
            .filter_map(|id| catalog.promotion(*id))
            .map(field)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{load_catalog, CatalogSource};

    #[test]
    fn reset_movement_restores_cap() {
        let catalog = load_catalog(CatalogSource::Embedded).expect("catalog load");
        let worker = catalog.unit_type_id("worker").unwrap();
        let mut unit = Unit::new(worker, PlayerId(0), GridPos::new(1, 1), &catalog);
        unit.moves_left = -3;
        unit.reset_movement();
        assert_eq!(unit.moves_left, 2);
        unit.moves_left = 0;
        unit.reset_movement();
        assert_eq!(unit.moves_left, unit.moves);
    }

    #[test]
    fn promotions_stack_and_are_set_like() {
        let catalog = load_catalog(CatalogSource::Embedded).expect("catalog load");
        let warrior = catalog.unit_type_id("warrior").unwrap();
        let combat1 = catalog.promotion_id("combat1").unwrap();
        let combat2 = catalog.promotion_id("combat2").unwrap();
        let cover = catalog.promotion_id("cover").unwrap();

        let mut unit = Unit::new(warrior, PlayerId(0), GridPos::new(0, 0), &catalog);
        assert!(unit.add_promotion(combat1));
        assert!(!unit.add_promotion(combat1));
        unit.add_promotion(combat2);
        unit.add_promotion(cover);

        assert_eq!(unit.attack_strength(&catalog), 2 + 1 + 2);
        assert_eq!(unit.defense_strength(&catalog, false), 2 + 1 + 2);
        assert_eq!(unit.defense_strength(&catalog, true), 2 + 1 + 2 + 1);
        assert_eq!(unit.promotions, vec![combat1, combat2, cover]);
    }

    #[test]
    fn missing_unit_type_uses_fallbacks() {
        let catalog = load_catalog(CatalogSource::Embedded).expect("catalog load");
        let unit = Unit::new(UnitTypeId::new(999), PlayerId(0), GridPos::new(0, 0), &catalog);
        assert_eq!(unit.attack_strength(&catalog), DEFAULT_ATTACK);
        assert_eq!(unit.defense_strength(&catalog, false), DEFAULT_DEFENSE);
        assert_eq!(unit.range(&catalog), DEFAULT_RANGE);
        assert_eq!(unit.moves, 1);
    }
}
