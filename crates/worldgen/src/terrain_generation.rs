//! Terrain synthesis: height lattice, per-tile sampling, classification, and
//! normalization.
//!
//! Postcondition: every tile is Water, Grass, Terrain or Rock and the
//! level-group relaxation has run. Later stages only overwrite tiles.

use std::time::Instant;

use bevy::prelude::*;
use rand::Rng;

use crate::config::{TerrainParams, WorldGenConfig};
use crate::grid::{TileGrid, TileKind};
use crate::height_normalization::{normalize_heights, NormalizationReport};
use crate::heightfield::HeightLattice;
use crate::noise_field::NoiseField;
use crate::rng::WorldRng;

#[derive(Debug, Clone)]
pub struct TerrainOutput {
    pub grid: TileGrid,
    pub normalization: NormalizationReport,
    pub mountain_count: usize,
}

/// Map a raw height to one of the four natural tile kinds.
pub fn classify_height(height: f32, params: &TerrainParams) -> TileKind {
    if height < params.water_level {
        TileKind::Water
    } else if height > params.rock_threshold {
        TileKind::Rock
    } else if height > params.terrain_threshold {
        TileKind::Terrain
    } else {
        TileKind::Grass
    }
}

/// Build and classify the tile grid from a lattice and a detail noise field.
pub fn populate_grid(
    width: usize,
    height: usize,
    lattice: &HeightLattice,
    detail: &NoiseField,
    params: &TerrainParams,
) -> TileGrid {
    TileGrid::from_fn(width, height, |x, z| {
        let base = lattice.sample_tile(x, z, width, height) * params.height_scale as f64;
        let variation = detail.sample(x as f64 * params.detail_scale, z as f64 * params.detail_scale)
            * params.detail_amplitude;
        let h = (base + variation) as f32;
        (h, classify_height(h, params))
    })
}

/// Run the full terrain stage. Three noise fields are seeded from `rng` in a
/// fixed order: lattice base, mountain shape, tile detail.
pub fn generate_terrain(config: &WorldGenConfig, rng: &mut WorldRng) -> TerrainOutput {
    let start = Instant::now();
    let params = &config.terrain;

    let base = NoiseField::new(rng.0.gen());
    let shape = NoiseField::new(rng.0.gen());
    let detail = NoiseField::new(rng.0.gen());

    let (lattice, mountains) = HeightLattice::synthesize(params, &base, &shape, rng);
    info!(
        "Height lattice {}x{} generated with {} mountains",
        lattice.size(),
        lattice.size(),
        mountains.len()
    );

    let mut grid = populate_grid(config.width, config.height, &lattice, &detail, params);
    let normalization = normalize_heights(&mut grid, &config.normalization);
    info!(
        "Terrain {}x{} classified and normalized in {:.2}ms (avg group delta {:.3} -> {:.3})",
        config.width,
        config.height,
        start.elapsed().as_secs_f64() * 1000.0,
        normalization.before,
        normalization.after()
    );

    TerrainOutput {
        grid,
        normalization,
        mountain_count: mountains.len(),
    }
}
