//! Sovereign CLI - headless driver for the rules engine.
//!
//! - `sovereign simulate` - play AI-only games and print a JSON report
//! - `sovereign map` - render a generated map as ASCII
//! - `sovereign catalog` - validate a catalog directory

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use sovereign_core::{
    generate_map, load_catalog, Catalog, CatalogSource, EngineConfig, SimulationConfig, WorldMap,
};
use sovereign_protocol::GridPos;

#[derive(Parser)]
#[command(name = "sovereign")]
#[command(about = "Turn-based strategy rules engine", version)]
struct Cli {
    /// Catalog directory; the built-in rules are used when omitted
    #[arg(short, long, global = true)]
    catalog: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play an AI-only game and print the report as JSON
    Simulate {
        #[arg(long, default_value_t = 24)]
        width: u32,

        #[arg(long, default_value_t = 16)]
        height: u32,

        #[arg(long, default_value_t = 2)]
        players: u32,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        #[arg(long, default_value_t = 50)]
        turns: u32,

        /// Pretty-print the report
        #[arg(long)]
        pretty: bool,
    },

    /// Generate a map and print it
    Map {
        /// Engine config file; its `mapgen` section is used
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        width: Option<u32>,

        #[arg(long)]
        height: Option<u32>,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Load the catalog and print what it contains
    Catalog,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let catalog = Arc::new(load(cli.catalog.as_ref())?);

    match cli.command {
        Commands::Simulate {
            width,
            height,
            players,
            seed,
            turns,
            pretty,
        } => {
            let config = SimulationConfig {
                width,
                height,
                players,
                seed,
                turns,
            };
            simulate(catalog, &config, pretty)
        }
        Commands::Map {
            config,
            width,
            height,
            seed,
        } => {
            let mut engine_config = match config {
                Some(path) => EngineConfig::from_path(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => EngineConfig::default(),
            };
            let mapgen = &mut engine_config.mapgen;
            mapgen.width = width.unwrap_or(mapgen.width);
            mapgen.height = height.unwrap_or(mapgen.height);
            mapgen.seed = seed.unwrap_or(mapgen.seed);
            let map = generate_map(&catalog, &engine_config.mapgen).context("generating map")?;
            print!("{}", render_map(&catalog, &map));
            Ok(())
        }
        Commands::Catalog => {
            show_catalog(&catalog);
            Ok(())
        }
    }
}

fn load(dir: Option<&PathBuf>) -> Result<Catalog> {
    match dir {
        Some(dir) => load_catalog(CatalogSource::Path(dir.clone()))
            .with_context(|| format!("loading catalog from {}", dir.display())),
        None => load_catalog(CatalogSource::Embedded).context("loading built-in catalog"),
    }
}

fn simulate(catalog: Arc<Catalog>, config: &SimulationConfig, pretty: bool) -> Result<()> {
    info!(
        players = config.players,
        turns = config.turns,
        seed = config.seed,
        "starting simulation"
    );
    let report = sovereign_core::run_simulation(catalog, config).context("running simulation")?;
    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}

/// One glyph per tile: water `~`, otherwise the terrain's initial, upper-cased
/// when the tile carries a resource.
fn render_map(catalog: &Catalog, map: &WorldMap) -> String {
    let mut out = String::with_capacity((map.width() as usize + 1) * map.height() as usize);
    for y in 0..map.height() as i32 {
        for x in 0..map.width() as i32 {
            let Some(tile) = map.tile(GridPos::new(x, y)) else {
                out.push(' ');
                continue;
            };
            let glyph = match catalog.terrain(tile.terrain) {
                Some(t) if t.water => '~',
                Some(t) => t.data_id.chars().next().unwrap_or('?'),
                None => '?',
            };
            if tile.resource.is_some() {
                out.push(glyph.to_ascii_uppercase());
            } else {
                out.push(glyph);
            }
        }
        out.push('\n');
    }
    out
}

fn show_catalog(catalog: &Catalog) {
    println!("terrains:     {}", catalog.terrains.len());
    println!("units:        {}", catalog.unit_types.len());
    println!("improvements: {}", catalog.improvements.len());
    println!("resources:    {}", catalog.resources.len());
    println!("techs:        {}", catalog.techs.len());
    println!("buildings:    {}", catalog.buildings.len());
    println!("civics:       {}", catalog.civics.len());
    println!("promotions:   {}", catalog.promotions.len());

    let order: Vec<&str> = catalog
        .tech_order()
        .filter_map(|id| catalog.tech(id))
        .map(|t| t.data_id.as_str())
        .collect();
    println!("research order: {}", order.join(" -> "));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_simulate_flags() {
        let cli = Cli::parse_from(["sovereign", "-v", "simulate", "--seed", "7", "--turns", "3"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Simulate { seed, turns, .. } => {
                assert_eq!(seed, 7);
                assert_eq!(turns, 3);
            }
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn map_renders_one_line_per_row() {
        let catalog = load_catalog(CatalogSource::Embedded).expect("catalog load");
        let config = sovereign_core::MapGenConfig {
            width: 10,
            height: 6,
            ..Default::default()
        };
        let map = generate_map(&catalog, &config).unwrap();
        let text = render_map(&catalog, &map);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines.iter().all(|l| l.chars().count() == 10));
        assert!(lines[0].chars().all(|c| c == '~'));
    }
}
