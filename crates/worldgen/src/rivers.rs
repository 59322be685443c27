//! Rivers linking nearby water bodies.
//!
//! Precondition: terrain classification has run. Postcondition: river tiles
//! are Water at the configured bed height. Runs before city placement so
//! cities see rivers as ordinary water.

use std::collections::HashSet;

use bevy::prelude::*;

use crate::config::RiverParams;
use crate::grid::{tile_key, unpack_tile_key, Tile, TileGrid, TileKind, TileType};
use crate::road_pathfinding::{find_grid_path, GridPath, TilePos};
use crate::rng::WorldRng;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RiverReport {
    pub water_bodies: usize,
    pub rivers: usize,
    pub tiles_applied: usize,
}

/// Water-body seeds found by strided sampling. After each hit, the sample
/// points within `body_suppress_radius` are skipped so one lake yields one
/// seed.
pub fn find_water_bodies(grid: &TileGrid, params: &RiverParams) -> Vec<TilePos> {
    let stride = params.sample_stride.max(1);
    let r = params.body_suppress_radius;
    let mut suppressed: HashSet<u64> = HashSet::new();
    let mut bodies = Vec::new();

    for z in (0..grid.height).step_by(stride) {
        for x in (0..grid.width).step_by(stride) {
            let (x, z) = (x as i32, z as i32);
            if suppressed.contains(&tile_key(x, z)) {
                continue;
            }
            if grid.type_at(x, z) != Some(TileType::Water) {
                continue;
            }
            bodies.push((x, z));
            for oz in -r..=r {
                for ox in -r..=r {
                    suppressed.insert(tile_key(x + ox, z + oz));
                }
            }
        }
    }
    bodies
}

fn distance(a: TilePos, b: TilePos) -> f32 {
    let dx = (a.0 - b.0) as f32;
    let dz = (a.1 - b.1) as f32;
    (dx * dx + dz * dz).sqrt()
}

/// Price of carving a river through `tile`: existing water and river tiles
/// are cheap, low ground is preferred, rock is avoided, and everything else
/// gets dearer with height.
pub fn river_step_cost(tile: &Tile, claimed: &HashSet<u64>) -> f32 {
    if tile.tile_type() == TileType::Water || claimed.contains(&tile_key(tile.x, tile.z)) {
        0.1
    } else if tile.height < 0.0 {
        0.5
    } else if tile.tile_type() == TileType::Rock {
        50.0
    } else {
        (1.0 + tile.height * 2.0).max(0.1)
    }
}

fn find_river_path(
    grid: &TileGrid,
    start: TilePos,
    goal: TilePos,
    claimed: &HashSet<u64>,
    params: &RiverParams,
) -> Option<GridPath> {
    find_grid_path(
        grid,
        start,
        goal,
        params.max_iterations,
        |tile, _| river_step_cost(tile, claimed),
        |pos| distance(pos, goal) < params.arrive_distance,
    )
}

pub fn generate_rivers(grid: &mut TileGrid, params: &RiverParams, rng: &mut WorldRng) -> RiverReport {
    let bodies = find_water_bodies(grid, params);
    let mut report = RiverReport {
        water_bodies: bodies.len(),
        ..RiverReport::default()
    };
    if bodies.len() < 2 {
        debug!("Rivers: only {} water bodies, nothing to connect", bodies.len());
        return report;
    }

    let mut claimed: HashSet<u64> = HashSet::new();
    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            let dist = distance(bodies[i], bodies[j]);
            if dist >= params.max_distance || dist <= params.min_distance {
                continue;
            }
            if !rng.chance(params.link_probability) {
                continue;
            }
            let Some(path) = find_river_path(grid, bodies[i], bodies[j], &claimed, params) else {
                debug!("Rivers: no path between {:?} and {:?}", bodies[i], bodies[j]);
                continue;
            };
            for &(x, z) in &path.tiles {
                claimed.insert(tile_key(x, z));
                if rng.chance(params.widen_probability) {
                    claimed.insert(tile_key(x + 1, z));
                    claimed.insert(tile_key(x - 1, z));
                }
            }
            report.rivers += 1;
        }
    }

    // Sorted so application order never depends on hash iteration order.
    let mut keys: Vec<u64> = claimed.into_iter().collect();
    keys.sort_unstable();
    for key in keys {
        let (x, z) = unpack_tile_key(key);
        let Some(tile) = grid.get_mut(x, z) else {
            continue;
        };
        if tile.tile_type() != TileType::Water {
            tile.kind = TileKind::Water;
            tile.height = params.bed_height;
            report.tiles_applied += 1;
        }
    }
    report
}
