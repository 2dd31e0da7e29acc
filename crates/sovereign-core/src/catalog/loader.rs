use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use sovereign_protocol::{
    BuildingId, CivicId, DataId, ImprovementId, PromotionId, ResourceId, RuntimeId, TechId,
    TerrainId, UnitTypeId,
};
use thiserror::Error;
use tracing::debug;

use crate::catalog::{
    Catalog, RawBuildingType, RawCivic, RawImprovementType, RawPromotion, RawResourceType,
    RawTechnology, RawTerrainType, RawUnitType,
};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("missing referenced id: {0}")]
    MissingId(String),
    #[error("catalog keys must be strings")]
    NonStringKey,
    #[error("too many entries in {0} (max 65535)")]
    TooManyEntries(&'static str),
    #[error("utf-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub enum CatalogSource<'a> {
    Embedded,
    Path(PathBuf),
    Bytes(CatalogBytes<'a>),
}

/// Raw YAML documents, one per kind. Optional kinds default to empty.
#[derive(Clone, Copy, Debug, Default)]
pub struct CatalogBytes<'a> {
    pub terrain: &'a [u8],
    pub units: &'a [u8],
    pub techs: &'a [u8],
    pub buildings: &'a [u8],
    pub improvements: Option<&'a [u8]>,
    pub resources: Option<&'a [u8]>,
    pub civics: Option<&'a [u8]>,
    pub promotions: Option<&'a [u8]>,
}

struct RawCatalog {
    terrains: Vec<(DataId, RawTerrainType)>,
    units: Vec<(DataId, RawUnitType)>,
    improvements: Vec<(DataId, RawImprovementType)>,
    resources: Vec<(DataId, RawResourceType)>,
    techs: Vec<(DataId, RawTechnology)>,
    buildings: Vec<(DataId, RawBuildingType)>,
    civics: Vec<(DataId, RawCivic)>,
    promotions: Vec<(DataId, RawPromotion)>,
}

struct CatalogDocs<'s> {
    terrain: &'s str,
    units: &'s str,
    techs: &'s str,
    buildings: &'s str,
    improvements: Option<&'s str>,
    resources: Option<&'s str>,
    civics: Option<&'s str>,
    promotions: Option<&'s str>,
}

pub fn load_catalog(source: CatalogSource<'_>) -> Result<Catalog, CatalogError> {
    let raw = match source {
        CatalogSource::Embedded => parse_raw_catalog(CatalogDocs {
            terrain: include_str!("../../data/base/terrain.yaml"),
            units: include_str!("../../data/base/units.yaml"),
            techs: include_str!("../../data/base/techs.yaml"),
            buildings: include_str!("../../data/base/buildings.yaml"),
            improvements: Some(include_str!("../../data/base/improvements.yaml")),
            resources: Some(include_str!("../../data/base/resources.yaml")),
            civics: Some(include_str!("../../data/base/civics.yaml")),
            promotions: Some(include_str!("../../data/base/promotions.yaml")),
        })?,
        CatalogSource::Path(dir) => {
            let terrain = read_required(&dir, "terrain.yaml")?;
            let units = read_required(&dir, "units.yaml")?;
            let techs = read_required(&dir, "techs.yaml")?;
            let buildings = read_required(&dir, "buildings.yaml")?;
            let improvements = read_optional(&dir, "improvements.yaml");
            let resources = read_optional(&dir, "resources.yaml");
            let civics = read_optional(&dir, "civics.yaml");
            let promotions = read_optional(&dir, "promotions.yaml");
            parse_raw_catalog(CatalogDocs {
                terrain: &terrain,
                units: &units,
                techs: &techs,
                buildings: &buildings,
                improvements: improvements.as_deref(),
                resources: resources.as_deref(),
                civics: civics.as_deref(),
                promotions: promotions.as_deref(),
            })?
        }
        CatalogSource::Bytes(bytes) => parse_raw_catalog(CatalogDocs {
            terrain: std::str::from_utf8(bytes.terrain)?,
            units: std::str::from_utf8(bytes.units)?,
            techs: std::str::from_utf8(bytes.techs)?,
            buildings: std::str::from_utf8(bytes.buildings)?,
            improvements: bytes.improvements.map(std::str::from_utf8).transpose()?,
            resources: bytes.resources.map(std::str::from_utf8).transpose()?,
            civics: bytes.civics.map(std::str::from_utf8).transpose()?,
            promotions: bytes.promotions.map(std::str::from_utf8).transpose()?,
        })?,
    };

    compile_catalog(raw)
}

fn read_required(dir: &Path, file: &str) -> Result<String, CatalogError> {
    let path = dir.join(file);
    std::fs::read_to_string(&path).map_err(|source| CatalogError::Io { path, source })
}

fn read_optional(dir: &Path, file: &str) -> Option<String> {
    std::fs::read_to_string(dir.join(file)).ok()
}

fn parse_raw_catalog(docs: CatalogDocs<'_>) -> Result<RawCatalog, CatalogError> {
    Ok(RawCatalog {
        terrains: ordered_entries(docs.terrain)?,
        units: ordered_entries(docs.units)?,
        techs: ordered_entries(docs.techs)?,
        buildings: ordered_entries(docs.buildings)?,
        improvements: optional_entries(docs.improvements)?,
        resources: optional_entries(docs.resources)?,
        civics: optional_entries(docs.civics)?,
        promotions: optional_entries(docs.promotions)?,
    })
}

/// Parse a YAML mapping of `id: record`, keeping document order.
fn ordered_entries<T: DeserializeOwned>(yaml: &str) -> Result<Vec<(DataId, T)>, CatalogError> {
    if yaml.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mapping: serde_yaml::Mapping = serde_yaml::from_str(yaml)?;
    mapping
        .into_iter()
        .map(|(key, value)| {
            let key = key.as_str().ok_or(CatalogError::NonStringKey)?.to_string();
            let record = serde_yaml::from_value(value)?;
            Ok((key, record))
        })
        .collect()
}

fn optional_entries<T: DeserializeOwned>(
    yaml: Option<&str>,
) -> Result<Vec<(DataId, T)>, CatalogError> {
    match yaml {
        Some(s) => ordered_entries(s),
        None => Ok(Vec::new()),
    }
}

fn id_map<R, T>(
    kind: &'static str,
    entries: &[(DataId, R)],
) -> Result<HashMap<DataId, RuntimeId<T>>, CatalogError> {
    if entries.len() > usize::from(u16::MAX) {
        return Err(CatalogError::TooManyEntries(kind));
    }
    Ok(entries
        .iter()
        .enumerate()
        .map(|(i, (k, _))| (k.clone(), RuntimeId::new(i as u16)))
        .collect())
}

fn compile_catalog(raw: RawCatalog) -> Result<Catalog, CatalogError> {
    let terrain_ids: HashMap<DataId, TerrainId> = id_map("terrain", &raw.terrains)?;
    let unit_type_ids: HashMap<DataId, UnitTypeId> = id_map("units", &raw.units)?;
    let improvement_ids: HashMap<DataId, ImprovementId> =
        id_map("improvements", &raw.improvements)?;
    let resource_ids: HashMap<DataId, ResourceId> = id_map("resources", &raw.resources)?;
    let tech_ids: HashMap<DataId, TechId> = id_map("techs", &raw.techs)?;
    let building_ids: HashMap<DataId, BuildingId> = id_map("buildings", &raw.buildings)?;
    let civic_ids: HashMap<DataId, CivicId> = id_map("civics", &raw.civics)?;
    let promotion_ids: HashMap<DataId, PromotionId> = id_map("promotions", &raw.promotions)?;

    let terrains = raw
        .terrains
        .into_iter()
        .map(|(id, t)| t.compile(id))
        .collect::<Vec<_>>();
    let unit_types = raw
        .units
        .into_iter()
        .map(|(id, u)| u.compile(id, &tech_ids, &resource_ids))
        .collect::<Result<Vec<_>, _>>()?;
    let improvements = raw
        .improvements
        .into_iter()
        .map(|(id, i)| i.compile(id, &tech_ids, &terrain_ids))
        .collect::<Result<Vec<_>, _>>()?;
    let resources = raw
        .resources
        .into_iter()
        .map(|(id, r)| r.compile(id))
        .collect::<Vec<_>>();
    let techs = raw
        .techs
        .into_iter()
        .map(|(id, t)| t.compile(id, &tech_ids))
        .collect::<Result<Vec<_>, _>>()?;
    let buildings = raw
        .buildings
        .into_iter()
        .map(|(id, b)| b.compile(id, &tech_ids))
        .collect::<Result<Vec<_>, _>>()?;
    let civics = raw
        .civics
        .into_iter()
        .map(|(id, c)| c.compile(id, &tech_ids))
        .collect::<Result<Vec<_>, _>>()?;
    let promotions = raw
        .promotions
        .into_iter()
        .map(|(id, p)| p.compile(id, &promotion_ids))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        terrains = terrains.len(),
        units = unit_types.len(),
        techs = techs.len(),
        buildings = buildings.len(),
        "catalog compiled"
    );

    Ok(Catalog {
        terrains,
        unit_types,
        improvements,
        resources,
        techs,
        buildings,
        civics,
        promotions,
        terrain_ids,
        unit_type_ids,
        improvement_ids,
        resource_ids,
        tech_ids,
        building_ids,
        civic_ids,
        promotion_ids,
    })
}
