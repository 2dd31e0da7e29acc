use sovereign_protocol::{GridPos, ImprovementId, ResourceId, TerrainId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("map dimensions must be positive (got {width}x{height})")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("expected {expected} tiles, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("terrain `{0}` is not in the catalog")]
    UnknownTerrain(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    pub terrain: TerrainId,
    pub improvement: Option<ImprovementId>,
    pub resource: Option<ResourceId>,
    pub road: bool,
}

impl Tile {
    pub fn new(terrain: TerrainId) -> Self {
        Self {
            terrain,
            improvement: None,
            resource: None,
            road: false,
        }
    }

    /// Resources on this tile count toward yields and trade only once worked.
    pub fn resource_connected(&self) -> bool {
        self.improvement.is_some() || self.road
    }
}

/// Square grid of tiles, stored row-major (`y * width + x`).
#[derive(Clone, Debug)]
pub struct WorldMap {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl WorldMap {
    pub fn new(width: u32, height: u32, default_terrain: TerrainId) -> Result<Self, MapError> {
        if width == 0 || height == 0 {
            return Err(MapError::InvalidDimensions { width, height });
        }
        let tiles = vec![Tile::new(default_terrain); (width as usize) * (height as usize)];
        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    pub fn from_tiles(width: u32, height: u32, tiles: Vec<Tile>) -> Result<Self, MapError> {
        if width == 0 || height == 0 {
            return Err(MapError::InvalidDimensions { width, height });
        }
        let expected = (width as usize) * (height as usize);
        if tiles.len() != expected {
            return Err(MapError::TileCountMismatch {
                expected,
                actual: tiles.len(),
            });
        }
        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    pub fn index_of(&self, pos: GridPos) -> Option<usize> {
        if !self.contains(pos) {
            return None;
        }
        Some((pos.y as usize) * (self.width as usize) + (pos.x as usize))
    }

    pub fn pos_at_index(&self, index: usize) -> Option<GridPos> {
        if index >= self.tiles.len() {
            return None;
        }
        let x = (index % self.width as usize) as i32;
        let y = (index / self.width as usize) as i32;
        Some(GridPos::new(x, y))
    }

    pub fn is_border(&self, pos: GridPos) -> bool {
        pos.x == 0
            || pos.y == 0
            || pos.x == self.width as i32 - 1
            || pos.y == self.height as i32 - 1
    }

    /// `None` when `pos` is off the map.
    pub fn tile(&self, pos: GridPos) -> Option<&Tile> {
        self.index_of(pos).map(|i| &self.tiles[i])
    }

    pub fn tile_mut(&mut self, pos: GridPos) -> Option<&mut Tile> {
        self.index_of(pos).map(move |i| &mut self.tiles[i])
    }

    /// In-bounds positions within Chebyshev `radius` of `center`, row-major.
    pub fn positions_in_radius(
        &self,
        center: GridPos,
        radius: i32,
    ) -> impl Iterator<Item = GridPos> + '_ {
        center.square(radius).filter(move |p| self.contains(*p))
    }

    /// In-bounds 8-neighbors of `pos`.
    pub fn neighbors(&self, pos: GridPos) -> impl Iterator<Item = GridPos> + '_ {
        pos.neighbors().filter(move |p| self.contains(*p))
    }
}
