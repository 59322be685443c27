//! House subdivision of city blocks.
//!
//! Precondition: city roads have been rasterized, so the remaining City tiles
//! of a footprint split into blocks bounded by CityRoad. Postcondition: each
//! house is an axis-aligned rectangle of House tiles inside one block, and
//! every tile of the rectangle carries the same [`HouseInfo`].

use std::collections::{HashSet, VecDeque};

use bevy::prelude::*;

use crate::cities::City;
use crate::config::HouseParams;
use crate::grid::{tile_key, HouseInfo, TileGrid, TileKind, TileType};
use crate::road_pathfinding::TilePos;
use crate::rng::WorldRng;

/// A 4-connected region of City tiles inside one footprint.
#[derive(Debug, Clone)]
pub struct Block {
    /// Row-major (z, then x).
    pub tiles: Vec<TilePos>,
    members: HashSet<u64>,
    max_x: i32,
    max_z: i32,
}

impl Block {
    fn from_tiles(mut tiles: Vec<TilePos>) -> Self {
        tiles.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        let members = tiles.iter().map(|&(x, z)| tile_key(x, z)).collect();
        let max_x = tiles.iter().map(|t| t.0).max().unwrap_or(0);
        let max_z = tiles.iter().map(|t| t.1).max().unwrap_or(0);
        Self {
            tiles,
            members,
            max_x,
            max_z,
        }
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn contains(&self, x: i32, z: i32) -> bool {
        self.members.contains(&tile_key(x, z))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HouseRect {
    pub x: i32,
    pub z: i32,
    pub width: u32,
    pub depth: u32,
}

/// Flood-fill the City tiles of `city`'s footprint into blocks. Blocks with
/// fewer than `min_tiles` tiles are dropped and stay City.
pub fn find_blocks(grid: &TileGrid, city: &City, min_tiles: usize) -> Vec<Block> {
    let footprint = city.footprint();
    let is_open = |x: i32, z: i32| footprint.contains(x, z) && grid.type_at(x, z) == Some(TileType::City);

    let mut visited: HashSet<u64> = HashSet::new();
    let mut blocks = Vec::new();
    for (sx, sz) in footprint.tiles() {
        if !is_open(sx, sz) || !visited.insert(tile_key(sx, sz)) {
            continue;
        }
        let mut tiles = Vec::new();
        let mut queue = VecDeque::from([(sx, sz)]);
        while let Some((x, z)) = queue.pop_front() {
            tiles.push((x, z));
            let (neighbors, count) = grid.neighbors4(x, z);
            for &(nx, nz) in &neighbors[..count] {
                if is_open(nx, nz) && visited.insert(tile_key(nx, nz)) {
                    queue.push_back((nx, nz));
                }
            }
        }
        if tiles.len() >= min_tiles {
            blocks.push(Block::from_tiles(tiles));
        }
    }
    blocks
}

/// Largest rectangle anchored at `start` that fits in `block` without touching
/// `used`. Widths and depths are tried from large to small and the first
/// strictly larger area wins. `None` if not even `min x min` fits.
pub fn largest_rectangle(
    start: TilePos,
    block: &Block,
    used: &HashSet<u64>,
    params: &HouseParams,
) -> Option<HouseRect> {
    let max_w = (params.max_footprint as i32).min(block.max_x - start.0 + 1);
    let max_d = (params.max_footprint as i32).min(block.max_z - start.1 + 1);
    let min = params.min_footprint as i32;

    let fits = |w: i32, d: i32| {
        (start.1..start.1 + d).all(|z| {
            (start.0..start.0 + w).all(|x| block.contains(x, z) && !used.contains(&tile_key(x, z)))
        })
    };

    let mut best: Option<HouseRect> = None;
    let mut best_area = 0;
    for w in (min..=max_w).rev() {
        for d in (min..=max_d).rev() {
            let area = w * d;
            if area <= best_area {
                continue;
            }
            if fits(w, d) {
                best = Some(HouseRect {
                    x: start.0,
                    z: start.1,
                    width: w as u32,
                    depth: d as u32,
                });
                best_area = area;
            }
        }
    }
    best
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HouseReport {
    pub blocks: usize,
    pub houses: usize,
    pub courtyards: usize,
}

/// Greedily pack one block with houses.
pub fn fill_block(
    grid: &mut TileGrid,
    block: &Block,
    params: &HouseParams,
    rng: &mut WorldRng,
    report: &mut HouseReport,
) {
    let mut used: HashSet<u64> = HashSet::new();
    for &(x, z) in &block.tiles {
        let key = tile_key(x, z);
        if used.contains(&key) {
            continue;
        }
        if rng.chance(params.courtyard_probability) {
            used.insert(key);
            report.courtyards += 1;
            continue;
        }
        let Some(rect) = largest_rectangle((x, z), block, &used, params) else {
            used.insert(key);
            continue;
        };

        let info = HouseInfo {
            height: rng.in_bounds_f32(&params.height),
            width: rect.width,
            depth: rect.depth,
            origin_x: rect.x,
            origin_z: rect.z,
        };
        for hz in rect.z..rect.z + rect.depth as i32 {
            for hx in rect.x..rect.x + rect.width as i32 {
                if let Some(tile) = grid.get_mut(hx, hz) {
                    tile.kind = TileKind::House(info);
                }
                used.insert(tile_key(hx, hz));
            }
        }
        report.houses += 1;
    }
}

pub fn generate_houses(
    grid: &mut TileGrid,
    city: &City,
    params: &HouseParams,
    rng: &mut WorldRng,
) -> HouseReport {
    let blocks = find_blocks(grid, city, params.min_block_tiles);
    let mut report = HouseReport {
        blocks: blocks.len(),
        ..HouseReport::default()
    };
    for block in &blocks {
        fill_block(grid, block, params, rng, &mut report);
    }
    debug!(
        "Houses for {0}x{0} city at ({1}, {2}): {3} houses in {4} blocks",
        city.size, city.x, city.z, report.houses, report.blocks
    );
    report
}
