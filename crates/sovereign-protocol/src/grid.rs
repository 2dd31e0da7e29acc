use serde::{Deserialize, Serialize};

/// Integer square-grid coordinate. `x` grows east, `y` grows south.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    /// The eight king-move offsets, clockwise from north.
    pub const DIRECTIONS: [GridPos; 8] = [
        GridPos { x: 0, y: -1 },
        GridPos { x: 1, y: -1 },
        GridPos { x: 1, y: 0 },
        GridPos { x: 1, y: 1 },
        GridPos { x: 0, y: 1 },
        GridPos { x: -1, y: 1 },
        GridPos { x: -1, y: 0 },
        GridPos { x: -1, y: -1 },
    ];

    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn chebyshev_distance(self, other: GridPos) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    #[inline]
    pub fn manhattan_distance(self, other: GridPos) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn neighbors(self) -> impl Iterator<Item = GridPos> {
        Self::DIRECTIONS.into_iter().map(move |d| self + d)
    }

    /// All positions with Chebyshev distance `<= radius`, row-major, center included.
    ///
    /// Positions are not bounds-checked; callers filter through the map.
    pub fn square(self, radius: i32) -> impl Iterator<Item = GridPos> {
        let radius = radius.max(0);
        (-radius..=radius).flat_map(move |dy| {
            (-radius..=radius).map(move |dx| GridPos {
                x: self.x + dx,
                y: self.y + dy,
            })
        })
    }

    pub fn is_adjacent(self, other: GridPos) -> bool {
        self != other && self.chebyshev_distance(other) <= 1
    }
}

impl std::ops::Add for GridPos {
    type Output = GridPos;

    fn add(self, other: GridPos) -> GridPos {
        GridPos {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl std::fmt::Display for GridPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
