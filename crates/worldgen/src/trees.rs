//! Tree scattering.
//!
//! Precondition: the grid is final (roads and houses applied). Three passes
//! append to one spawn list, in order: chunk scatter, roadside, city edges.

use std::sync::Arc;

use bevy::prelude::*;

use crate::cities::City;
use crate::config::{ObjectConfig, TreeParams};
use crate::grid::{TileGrid, TileType};
use crate::objects::ObjectSpawn;
use crate::rng::WorldRng;

pub const TREE_KIND: &str = "tree";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeReport {
    pub chunks_total: usize,
    pub chunks_selected: usize,
    pub scattered: usize,
    pub roadside: usize,
    pub city_edge: usize,
}

impl TreeReport {
    pub fn total(&self) -> usize {
        self.scattered + self.roadside + self.city_edge
    }
}

fn allowed_at(grid: &TileGrid, config: &ObjectConfig, x: i32, z: i32) -> bool {
    grid.type_at(x, z).is_some_and(|t| config.allows(t))
}

/// A jittered position inside tile `(x, z)`.
fn jittered(x: i32, z: i32, jitter: f32, rng: &mut WorldRng) -> (f32, f32) {
    (
        x as f32 + 0.5 + rng.jitter(jitter),
        z as f32 + 0.5 + rng.jitter(jitter),
    )
}

/// Pass (a): pick a random subset of chunks and fill each with
/// `floor(valid * spawn_probability)` trees on distinct valid tiles.
pub fn scatter_chunks(
    grid: &TileGrid,
    params: &TreeParams,
    config: &Arc<ObjectConfig>,
    chunk_size: usize,
    rng: &mut WorldRng,
    out: &mut Vec<ObjectSpawn>,
    report: &mut TreeReport,
) {
    let chunk_size = chunk_size.max(1);
    let chunks_x = grid.width.div_ceil(chunk_size);
    let chunks_z = grid.height.div_ceil(chunk_size);
    report.chunks_total = chunks_x * chunks_z;

    let mut selected = Vec::new();
    for cz in 0..chunks_z {
        for cx in 0..chunks_x {
            if rng.chance(params.chunk_selection_rate) {
                selected.push((cx, cz));
            }
        }
    }
    report.chunks_selected = selected.len();

    let mut valid: Vec<(i32, i32)> = Vec::with_capacity(chunk_size * chunk_size);
    for (cx, cz) in selected {
        let min_x = cx * chunk_size;
        let min_z = cz * chunk_size;
        let max_x = (min_x + chunk_size).min(grid.width);
        let max_z = (min_z + chunk_size).min(grid.height);

        valid.clear();
        for z in min_z..max_z {
            for x in min_x..max_x {
                if allowed_at(grid, config, x as i32, z as i32) {
                    valid.push((x as i32, z as i32));
                }
            }
        }

        let count = (valid.len() as f32 * config.spawn_probability).floor() as usize;
        for _ in 0..count {
            if valid.is_empty() {
                break;
            }
            let (x, z) = valid.swap_remove(rng.index(valid.len()));
            let (px, pz) = jittered(x, z, params.jitter, rng);
            out.push(ObjectSpawn::new(px, pz, TREE_KIND, config));
            report.scattered += 1;
        }
    }
}

fn near_road(grid: &TileGrid, x: i32, z: i32, distance: i32) -> bool {
    (z - distance..=z + distance).any(|nz| {
        (x - distance..=x + distance).any(|nx| grid.type_at(nx, nz) == Some(TileType::Road))
    })
}

/// Pass (b): every `road_stride`-th tile near a Road tile may get a tree.
pub fn scatter_along_roads(
    grid: &TileGrid,
    params: &TreeParams,
    config: &Arc<ObjectConfig>,
    rng: &mut WorldRng,
    out: &mut Vec<ObjectSpawn>,
    report: &mut TreeReport,
) {
    let stride = params.road_stride.max(1);
    for z in (0..grid.height as i32).step_by(stride) {
        for x in (0..grid.width as i32).step_by(stride) {
            if !allowed_at(grid, config, x, z) || !near_road(grid, x, z, params.road_distance) {
                continue;
            }
            if rng.chance(params.road_probability) {
                let (px, pz) = jittered(x, z, params.jitter, rng);
                out.push(ObjectSpawn::new(px, pz, TREE_KIND, config));
                report.roadside += 1;
            }
        }
    }
}

/// Pass (c): a ring of trees just outside each city's four edges. Candidates
/// closer than `min_spacing` to any tree already placed are rejected.
pub fn scatter_around_cities(
    grid: &TileGrid,
    cities: &[City],
    params: &TreeParams,
    config: &Arc<ObjectConfig>,
    rng: &mut WorldRng,
    out: &mut Vec<ObjectSpawn>,
    report: &mut TreeReport,
) {
    let band = params.city_max_distance - params.city_buffer;
    let min_spacing_sq = params.min_spacing * params.min_spacing;
    for city in cities {
        let (x0, z0) = (city.x as f32, city.z as f32);
        let size = city.size as f32;
        for edge in 0..4 {
            for _ in 0..params.city_attempts_per_edge {
                let along = rng.unit() as f32 * size;
                let out_by = params.city_buffer + rng.unit() as f32 * band;
                let (px, pz) = match edge {
                    0 => (x0 + along, z0 - out_by),
                    1 => (x0 + along, z0 + size + out_by),
                    2 => (x0 - out_by, z0 + along),
                    _ => (x0 + size + out_by, z0 + along),
                };
                if !allowed_at(grid, config, px.floor() as i32, pz.floor() as i32) {
                    continue;
                }
                let crowded = out.iter().any(|t| {
                    let (dx, dz) = (t.x - px, t.z - pz);
                    dx * dx + dz * dz < min_spacing_sq
                });
                if crowded {
                    continue;
                }
                out.push(ObjectSpawn::new(px, pz, TREE_KIND, config));
                report.city_edge += 1;
            }
        }
    }
}

pub fn generate_trees(
    grid: &TileGrid,
    cities: &[City],
    params: &TreeParams,
    chunk_size: usize,
    rng: &mut WorldRng,
) -> (Vec<ObjectSpawn>, TreeReport) {
    let config = Arc::new(params.object.clone());
    let mut spawns = Vec::new();
    let mut report = TreeReport::default();

    scatter_chunks(grid, params, &config, chunk_size, rng, &mut spawns, &mut report);
    scatter_along_roads(grid, params, &config, rng, &mut spawns, &mut report);
    scatter_around_cities(grid, cities, params, &config, rng, &mut spawns, &mut report);

    info!(
        "Trees: {} scattered in {}/{} chunks, {} roadside, {} at city edges",
        report.scattered, report.chunks_selected, report.chunks_total, report.roadside, report.city_edge
    );
    (spawns, report)
}
