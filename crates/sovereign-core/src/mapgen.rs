//! Deterministic square-grid map generation.
//!
//! Each tile consumes exactly two values from the generator, terrain first and
//! resource second, so the same seed always produces the same map.

use serde::{Deserialize, Serialize};
use sovereign_protocol::{GridPos, ResourceId, TerrainId};
use tracing::debug;

use crate::catalog::Catalog;
use crate::map::{MapError, Tile, WorldMap};
use crate::rng::GameRng;

/// A resource placed on `terrain` when the resource draw falls in `[min, max)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceBand {
    pub terrain: String,
    pub resource: String,
    pub min: f64,
    pub max: f64,
}

impl ResourceBand {
    fn new(terrain: &str, resource: &str, min: f64, max: f64) -> Self {
        Self {
            terrain: terrain.to_string(),
            resource: resource.to_string(),
            min,
            max,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapGenConfig {
    pub width: u32,
    pub height: u32,
    pub seed: u64,
    pub default_terrain: String,
    pub hills_terrain: String,
    pub water_terrain: String,
    /// Terrain draws above this become hills.
    pub hills_threshold: f64,
    /// Terrain draws below this become water.
    pub water_threshold: f64,
    pub resource_bands: Vec<ResourceBand>,
}

impl Default for MapGenConfig {
    fn default() -> Self {
        Self {
            width: 24,
            height: 16,
            seed: 1,
            default_terrain: "plains".to_string(),
            hills_terrain: "hills".to_string(),
            water_terrain: "water".to_string(),
            hills_threshold: 0.8,
            water_threshold: 0.08,
            resource_bands: default_resource_bands(),
        }
    }
}

pub fn default_resource_bands() -> Vec<ResourceBand> {
    vec![
        ResourceBand::new("plains", "wheat", 0.00, 0.06),
        ResourceBand::new("plains", "horses", 0.06, 0.10),
        ResourceBand::new("hills", "iron", 0.00, 0.08),
        ResourceBand::new("hills", "copper", 0.08, 0.14),
        ResourceBand::new("hills", "gems", 0.14, 0.18),
        ResourceBand::new("water", "fish", 0.00, 0.10),
    ]
}

#[derive(Clone, Copy, Debug)]
struct TerrainPalette {
    default: TerrainId,
    hills: TerrainId,
    water: TerrainId,
}

impl TerrainPalette {
    fn from_catalog(catalog: &Catalog, config: &MapGenConfig) -> Result<Self, MapError> {
        let default = catalog
            .terrain_id(&config.default_terrain)
            .ok_or_else(|| MapError::UnknownTerrain(config.default_terrain.clone()))?;
        Ok(Self {
            default,
            hills: catalog.terrain_id(&config.hills_terrain).unwrap_or(default),
            water: catalog.terrain_id(&config.water_terrain).unwrap_or(default),
        })
    }
}

/// Bands compiled against the catalog. Bands naming missing ids are dropped.
struct CompiledBand {
    terrain: TerrainId,
    resource: ResourceId,
    min: f64,
    max: f64,
}

fn compile_bands(catalog: &Catalog, bands: &[ResourceBand]) -> Vec<CompiledBand> {
    bands
        .iter()
        .filter_map(|band| {
            Some(CompiledBand {
                terrain: catalog.terrain_id(&band.terrain)?,
                resource: catalog.resource_id(&band.resource)?,
                min: band.min,
                max: band.max,
            })
        })
        .collect()
}

pub fn generate_map(catalog: &Catalog, config: &MapGenConfig) -> Result<WorldMap, MapError> {
    let palette = TerrainPalette::from_catalog(catalog, config)?;
    let bands = compile_bands(catalog, &config.resource_bands);
    let mut map = WorldMap::new(config.width, config.height, palette.default)?;
    let mut rng = GameRng::seed_from_u64(config.seed);

    for y in 0..config.height as i32 {
        for x in 0..config.width as i32 {
            let pos = GridPos::new(x, y);
            let terrain_roll = rng.next_f64();
            let resource_roll = rng.next_f64();

            let terrain = if map.is_border(pos) || terrain_roll < config.water_threshold {
                palette.water
            } else if terrain_roll > config.hills_threshold {
                palette.hills
            } else {
                palette.default
            };
            let resource = bands
                .iter()
                .find(|b| {
                    b.terrain == terrain && resource_roll >= b.min && resource_roll < b.max
                })
                .map(|b| b.resource);

            if let Some(tile) = map.tile_mut(pos) {
                *tile = Tile {
                    resource,
                    ..Tile::new(terrain)
                };
            }
        }
    }

    debug!(
        width = config.width,
        height = config.height,
        seed = config.seed,
        "map generated"
    );
    Ok(map)
}

/// Pick up to `count` spread-out starting tiles on passable land.
///
/// Candidates are scored by how much passable land and how many resources
/// surround them; the best ones far enough from each other win. If the map
/// cannot fit `count` well-spaced starts, the spacing requirement is dropped.
pub fn find_start_positions(catalog: &Catalog, map: &WorldMap, count: usize) -> Vec<GridPos> {
    let is_land = |pos: GridPos| {
        map.tile(pos).is_some_and(|tile| {
            catalog
                .terrain(tile.terrain)
                .map_or(true, |t| !t.water && !t.impassable)
        })
    };

    let mut candidates: Vec<(GridPos, i32)> = (0..map.len())
        .filter_map(|index| map.pos_at_index(index))
        .filter(|pos| is_land(*pos))
        .map(|pos| {
            let score = map
                .positions_in_radius(pos, 1)
                .map(|p| {
                    let land = i32::from(is_land(p));
                    let resource = map
                        .tile(p)
                        .map_or(0, |t| i32::from(t.resource.is_some()));
                    land + 2 * resource
                })
                .sum::<i32>();
            (pos, score)
        })
        .collect();

    // Stable sort keeps row-major order among equal scores.
    candidates.sort_by(|a, b| b.1.cmp(&a.1));

    let min_distance = ((map.width() + map.height()) as usize / (count + 1)).max(2) as i32;
    let mut positions: Vec<GridPos> = Vec::with_capacity(count);
    for &(pos, _) in &candidates {
        if positions.len() >= count {
            break;
        }
        if positions
            .iter()
            .all(|other| other.chebyshev_distance(pos) >= min_distance)
        {
            positions.push(pos);
        }
    }
    for &(pos, _) in &candidates {
        if positions.len() >= count {
            break;
        }
        if !positions.contains(&pos) {
            positions.push(pos);
        }
    }
    positions
}
