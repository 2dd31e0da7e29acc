use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// Flat per-turn bonuses. Used for building bonuses and derived city yields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Yields {
    pub food: i32,
    pub production: i32,
    pub science: i32,
    pub defense: i32,
}

impl Add for Yields {
    type Output = Yields;

    fn add(self, other: Yields) -> Yields {
        Yields {
            food: self.food + other.food,
            production: self.production + other.production,
            science: self.science + other.science,
            defense: self.defense + other.defense,
        }
    }
}

impl AddAssign for Yields {
    fn add_assign(&mut self, other: Yields) {
        *self = *self + other;
    }
}

impl std::iter::Sum for Yields {
    fn sum<I: Iterator<Item = Yields>>(iter: I) -> Self {
        iter.fold(Yields::default(), Add::add)
    }
}
