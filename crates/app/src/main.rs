//! Headless world generator.
//!
//! Generates one world, prints its statistics and an ASCII overview, and can
//! walk a viewpoint across it to exercise the streaming queries.
//!
//! ```text
//! tileworld [--config world.json] [--seed N] [--size N] [--walk STEPS]
//!           [--dump-config] [--no-map]
//! ```

mod walk;

use std::process::ExitCode;

use bevy::log::LogPlugin;
use bevy::prelude::*;

use worldgen::ascii_map::build_overview_map;
use worldgen::{GenerationStats, TileGrid, WorldGenConfig, WorldGenPlugin};

/// Overview maps are scaled down to at most this many columns.
const OVERVIEW_COLUMNS: usize = 128;

#[derive(Debug, Default)]
struct Args {
    config: Option<String>,
    seed: Option<u64>,
    size: Option<usize>,
    walk: Option<u32>,
    dump_config: bool,
    no_map: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut parsed = Args::default();
    while let Some(arg) = args.next() {
        let mut value = |name: &str| args.next().ok_or_else(|| format!("{name} needs a value"));
        match arg.as_str() {
            "--config" => parsed.config = Some(value("--config")?),
            "--seed" => {
                parsed.seed = Some(value("--seed")?.parse().map_err(|e| format!("--seed: {e}"))?);
            }
            "--size" => {
                parsed.size = Some(value("--size")?.parse().map_err(|e| format!("--size: {e}"))?);
            }
            "--walk" => {
                parsed.walk = Some(value("--walk")?.parse().map_err(|e| format!("--walk: {e}"))?);
            }
            "--dump-config" => parsed.dump_config = true,
            "--no-map" => parsed.no_map = true,
            other => return Err(format!("unknown argument '{other}'")),
        }
    }
    Ok(parsed)
}

fn load_config(args: &Args) -> Result<WorldGenConfig, String> {
    let mut config = match &args.config {
        Some(path) => WorldGenConfig::load(path).map_err(|e| format!("{path}: {e}"))?,
        None => WorldGenConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(size) = args.size {
        config.width = size;
        config.height = size;
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn main() -> ExitCode {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("tileworld: {e}");
            return ExitCode::FAILURE;
        }
    };
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("tileworld: {e}");
            return ExitCode::FAILURE;
        }
    };

    if args.dump_config {
        match serde_json::to_string_pretty(&config) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("tileworld: {e}");
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    let mut app = App::new();
    app.add_plugins((MinimalPlugins, LogPlugin::default()))
        .insert_resource(config)
        .add_plugins(WorldGenPlugin);
    // One update runs the Startup generation.
    app.update();

    let world = app.world();
    let (Some(grid), Some(stats)) = (
        world.get_resource::<TileGrid>(),
        world.get_resource::<GenerationStats>(),
    ) else {
        eprintln!("tileworld: generation produced no world");
        return ExitCode::FAILURE;
    };

    println!("{}", stats.summary());
    if !args.no_map {
        let block = grid.width.div_ceil(OVERVIEW_COLUMNS).max(1);
        println!();
        println!("{}", build_overview_map(grid, block));
    }

    if let Some(steps) = args.walk {
        println!();
        println!("{}", walk::walk(world, steps));
    }

    ExitCode::SUCCESS
}
