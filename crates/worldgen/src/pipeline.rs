//! End-to-end world generation.

use std::time::Instant;

use bevy::prelude::*;

use crate::cities::CityRegistry;
use crate::config::WorldGenConfig;
use crate::error::ConfigError;
use crate::generators::{GeneratorRegistry, WorldGenContext};
use crate::grid::{TileGrid, TileType, TypeCounts};
use crate::height_normalization::NormalizationReport;
use crate::intercity_roads::RoadReport;
use crate::rivers::RiverReport;
use crate::rng::WorldRng;
use crate::spatial_query::WorldObjects;
use crate::terrain_generation::generate_terrain;
use crate::trees::TreeReport;

/// Counts and timings for one generation run.
#[derive(Resource, Debug, Clone, Default)]
pub struct GenerationStats {
    pub type_counts: TypeCounts,
    pub mountains: usize,
    pub normalization: NormalizationReport,
    pub rivers: RiverReport,
    pub cities: usize,
    pub cities_failed: usize,
    pub city_road_tiles: usize,
    pub roads: RoadReport,
    pub houses: usize,
    pub trees: TreeReport,
    pub objects: usize,
    pub objects_dropped: usize,
    /// `(stage, elapsed ms)` in run order, terrain first.
    pub stage_ms: Vec<(&'static str, f64)>,
}

impl GenerationStats {
    pub fn total_ms(&self) -> f64 {
        self.stage_ms.iter().map(|(_, ms)| ms).sum()
    }

    /// Multi-line human-readable summary.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        lines.push("Tile counts:".to_string());
        for t in TileType::ALL {
            lines.push(format!("  {:<10}{:>9}", t.name(), self.type_counts.get(t)));
        }
        lines.push(format!("Mountains: {}", self.mountains));
        lines.push(format!(
            "Normalization: avg delta {:.4} -> {:.4} over {} pairs",
            self.normalization.before,
            self.normalization.after(),
            self.normalization.pair_count
        ));
        lines.push(format!(
            "Rivers: {} from {} water bodies ({} tiles)",
            self.rivers.rivers, self.rivers.water_bodies, self.rivers.tiles_applied
        ));
        lines.push(format!(
            "Cities: {} placed, {} failed, {} city-road tiles",
            self.cities, self.cities_failed, self.city_road_tiles
        ));
        lines.push(format!(
            "Roads: {} tiles, {}/{} paths, {} cities connected",
            self.roads.tiles_applied,
            self.roads.paths_found,
            self.roads.paths_found + self.roads.paths_failed,
            self.roads.connected_cities
        ));
        lines.push(format!("Houses: {}", self.houses));
        lines.push(format!(
            "Objects: {} ({} trees, {} dropped)",
            self.objects,
            self.trees.total(),
            self.objects_dropped
        ));
        for (stage, ms) in &self.stage_ms {
            lines.push(format!("  {stage:<10}{ms:>9.2}ms"));
        }
        lines.push(format!("Total: {:.2}ms", self.total_ms()));
        lines.join("\n")
    }
}

/// Everything a generation run produces.
#[derive(Debug, Clone)]
pub struct GeneratedWorld {
    pub grid: TileGrid,
    pub cities: CityRegistry,
    pub objects: WorldObjects,
    pub stats: GenerationStats,
    /// Where a player should start, in tile units.
    pub spawn: (f32, f32),
}

pub struct WorldGenerator;

impl WorldGenerator {
    /// Generate a world with the standard stage list.
    pub fn generate(config: &WorldGenConfig) -> Result<GeneratedWorld, ConfigError> {
        Self::generate_with(config, &GeneratorRegistry::standard(config))
    }

    /// Terrain synthesis and normalization, then every stage of `registry`.
    ///
    /// The config is validated first. Once it passes, generation cannot fail:
    /// placement and pathfinding misses only show up in the stats.
    pub fn generate_with(
        config: &WorldGenConfig,
        registry: &GeneratorRegistry,
    ) -> Result<GeneratedWorld, ConfigError> {
        config.validate()?;
        info!(
            "Generating {}x{} world with seed {} ({} stages)",
            config.width,
            config.height,
            config.seed,
            registry.len()
        );
        let mut rng = WorldRng::from_seed_u64(config.seed);

        let start = Instant::now();
        let terrain = generate_terrain(config, &mut rng);
        let terrain_ms = start.elapsed().as_secs_f64() * 1000.0;
        let mut grid = terrain.grid;

        let mut ctx = WorldGenContext::new(config, rng);
        ctx.stats.stage_ms.push(("terrain", terrain_ms));
        ctx.stats.mountains = terrain.mountain_count;
        ctx.stats.normalization = terrain.normalization;

        let objects = registry.generate_all(&mut grid, &mut ctx);

        let WorldGenContext {
            cities,
            mut rng,
            mut stats,
            ..
        } = ctx;
        stats.type_counts = grid.type_counts();
        stats.cities = cities.len();
        stats.objects = objects.len();

        let cities = CityRegistry::new(cities);
        let spawn = cities.spawn_position(&grid, &mut rng);
        let objects = WorldObjects::new(objects, grid.width, grid.height, config.streaming.chunk_size);

        info!(
            "World ready in {:.2}ms: {} cities, {} houses, {} objects, spawn at ({:.1}, {:.1})",
            stats.total_ms(),
            stats.cities,
            stats.houses,
            stats.objects,
            spawn.0,
            spawn.1
        );

        Ok(GeneratedWorld {
            grid,
            cities,
            objects,
            stats,
            spawn,
        })
    }
}
