//! Ordered generation stages after terrain synthesis.
//!
//! Each stage reads and mutates the one [`TileGrid`] in sequence, so stage
//! order is part of the contract:
//!
//! 1. rivers: needs classified terrain; carves Water.
//! 2. cities: needs final natural terrain; stamps City footprints and grows
//!    CityRoad networks inside them.
//! 3. roads: needs every city footprint; turns Grass/Terrain into Road.
//! 4. houses: needs city roads; turns remaining City blocks into House.
//! 5. trees: needs the final grid; emits objects only.

use std::time::Instant;

use bevy::prelude::*;

use crate::cities::{place_cities, City};
use crate::city_roads::generate_city_roads;
use crate::config::WorldGenConfig;
use crate::grid::TileGrid;
use crate::houses::generate_houses;
use crate::intercity_roads::generate_roads;
use crate::objects::{validate_spawns, ObjectSpawn, TileObject};
use crate::pipeline::GenerationStats;
use crate::rivers::generate_rivers;
use crate::rng::WorldRng;
use crate::trees::generate_trees;

/// State threaded through every stage.
pub struct WorldGenContext<'a> {
    pub config: &'a WorldGenConfig,
    pub rng: WorldRng,
    /// Filled by the city stage; empty before it runs.
    pub cities: Vec<City>,
    pub stats: GenerationStats,
}

impl<'a> WorldGenContext<'a> {
    pub fn new(config: &'a WorldGenConfig, rng: WorldRng) -> Self {
        Self {
            config,
            rng,
            cities: Vec::new(),
            stats: GenerationStats::default(),
        }
    }
}

/// Objects a stage proposes. Validated once all stages have run.
#[derive(Debug, Clone, Default)]
pub struct GeneratedObjects {
    pub spawns: Vec<ObjectSpawn>,
}

impl GeneratedObjects {
    pub fn none() -> Self {
        Self::default()
    }
}

pub trait Generator: Send + Sync {
    fn name(&self) -> &'static str;
    fn generate(&self, grid: &mut TileGrid, ctx: &mut WorldGenContext<'_>) -> GeneratedObjects;
}

// ---------------------------------------------------------------------------
// Standard stages
// ---------------------------------------------------------------------------

pub struct RiverStage;

impl Generator for RiverStage {
    fn name(&self) -> &'static str {
        "rivers"
    }

    fn generate(&self, grid: &mut TileGrid, ctx: &mut WorldGenContext<'_>) -> GeneratedObjects {
        ctx.stats.rivers = generate_rivers(grid, &ctx.config.rivers, &mut ctx.rng);
        GeneratedObjects::none()
    }
}

/// Placement plus the L-system network of every placed city.
pub struct CityStage;

impl Generator for CityStage {
    fn name(&self) -> &'static str {
        "cities"
    }

    fn generate(&self, grid: &mut TileGrid, ctx: &mut WorldGenContext<'_>) -> GeneratedObjects {
        let placement = place_cities(grid, &ctx.config.cities, &mut ctx.rng);
        ctx.stats.cities_failed = placement.failed_sizes.len();
        for city in &placement.cities {
            let report = generate_city_roads(grid, city, &ctx.config.city_roads, &mut ctx.rng);
            ctx.stats.city_road_tiles += report.tiles_applied;
        }
        ctx.cities = placement.cities;
        GeneratedObjects::none()
    }
}

pub struct RoadStage;

impl Generator for RoadStage {
    fn name(&self) -> &'static str {
        "roads"
    }

    fn generate(&self, grid: &mut TileGrid, ctx: &mut WorldGenContext<'_>) -> GeneratedObjects {
        ctx.stats.roads = generate_roads(grid, &ctx.cities, &ctx.config.roads, &mut ctx.rng);
        GeneratedObjects::none()
    }
}

pub struct HouseStage;

impl Generator for HouseStage {
    fn name(&self) -> &'static str {
        "houses"
    }

    fn generate(&self, grid: &mut TileGrid, ctx: &mut WorldGenContext<'_>) -> GeneratedObjects {
        for city in &ctx.cities {
            let report = generate_houses(grid, city, &ctx.config.houses, &mut ctx.rng);
            ctx.stats.houses += report.houses;
        }
        info!("Houses: {} across {} cities", ctx.stats.houses, ctx.cities.len());
        GeneratedObjects::none()
    }
}

pub struct TreeStage;

impl Generator for TreeStage {
    fn name(&self) -> &'static str {
        "trees"
    }

    fn generate(&self, grid: &mut TileGrid, ctx: &mut WorldGenContext<'_>) -> GeneratedObjects {
        let (spawns, report) = generate_trees(
            grid,
            &ctx.cities,
            &ctx.config.trees,
            ctx.config.streaming.chunk_size,
            &mut ctx.rng,
        );
        ctx.stats.trees = report;
        GeneratedObjects { spawns }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct GeneratorRegistry {
    generators: Vec<Box<dyn Generator>>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard stage list, skipping stages the config disables.
    pub fn standard(config: &WorldGenConfig) -> Self {
        let mut registry = Self::new();
        if config.rivers.enabled {
            registry.register(RiverStage);
        }
        if config.cities.enabled {
            registry.register(CityStage);
        }
        if config.roads.enabled {
            registry.register(RoadStage);
        }
        if config.houses.enabled {
            registry.register(HouseStage);
        }
        if config.trees.enabled {
            registry.register(TreeStage);
        }
        registry
    }

    pub fn register(&mut self, generator: impl Generator + 'static) -> &mut Self {
        self.generators.push(Box::new(generator));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.generators.iter().map(|g| g.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// Run every stage in registration order, then validate the collected
    /// objects. Malformed objects are dropped and counted.
    pub fn generate_all(&self, grid: &mut TileGrid, ctx: &mut WorldGenContext<'_>) -> Vec<TileObject> {
        let mut spawns = Vec::new();
        for generator in &self.generators {
            let start = Instant::now();
            let produced = generator.generate(grid, ctx);
            let elapsed = start.elapsed().as_secs_f64() * 1000.0;
            debug!(
                "Stage '{}' finished in {:.2}ms with {} objects",
                generator.name(),
                elapsed,
                produced.spawns.len()
            );
            ctx.stats.stage_ms.push((generator.name(), elapsed));
            spawns.extend(produced.spawns);
        }
        let (objects, dropped) = validate_spawns(spawns, grid);
        ctx.stats.objects_dropped = dropped;
        objects
    }
}
