//! Intra-city road networks grown by an L-system.
//!
//! Segments live in city-local coordinates `[0, size)`. A work queue starts
//! from a cross-shaped axiom plus border-parallel minor streets; each accepted
//! segment is rasterized into a visited set that later segments collide
//! against, and production rules enqueue perpendicular branches and
//! colinear extensions.
//!
//! Precondition: the city footprint has been stamped as City. Postcondition:
//! rasterized road tiles that were City are CityRoad at height 0; nothing
//! else in the grid changes.

use std::collections::{HashSet, VecDeque};
use std::f64::consts::{FRAC_PI_2, PI};

use bevy::prelude::*;

use crate::cities::City;
use crate::config::CityRoadParams;
use crate::grid::{tile_key, unpack_tile_key, TileGrid, TileKind, TileType};
use crate::rng::WorldRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentType {
    Major,
    Minor,
    Side,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadSegment {
    pub x: f64,
    pub z: f64,
    pub angle: f64,
    pub length: f64,
    pub kind: SegmentType,
    pub generation: u32,
}

impl RoadSegment {
    #[inline]
    pub fn point_at(&self, t: f64) -> (f64, f64) {
        (
            self.x + self.angle.cos() * self.length * t,
            self.z + self.angle.sin() * self.length * t,
        )
    }

    pub fn end(&self) -> (f64, f64) {
        self.point_at(1.0)
    }

    #[inline]
    fn cell_at(&self, t: f64) -> (i32, i32) {
        let (x, z) = self.point_at(t);
        (x.floor() as i32, z.floor() as i32)
    }
}

/// Iteration cap by city size.
pub fn max_iterations(size: u32) -> u32 {
    match size {
        0..=8 => 20,
        9..=16 => 100,
        17..=32 => 300,
        33..=64 => 600,
        _ => 1000,
    }
}

/// Four majors out of the centre plus, when the city is large enough, minor
/// streets at regular offsets parallel to the borders.
pub fn create_axiom(size: u32) -> Vec<RoadSegment> {
    let s = size as f64;
    let center = s / 2.0;
    let mut axiom: Vec<RoadSegment> = [0.0, FRAC_PI_2, PI, PI * 3.0 / 2.0]
        .into_iter()
        .map(|angle| RoadSegment {
            x: center,
            z: center,
            angle,
            length: s / 2.0 - 1.0,
            kind: SegmentType::Major,
            generation: 0,
        })
        .collect();

    let spacing = size / 6;
    if spacing == 0 {
        return axiom;
    }
    let minor = |x: f64, z: f64, angle: f64| RoadSegment {
        x,
        z,
        angle,
        length: s - 1.0,
        kind: SegmentType::Minor,
        generation: 0,
    };
    let mut offset = spacing;
    while (offset as f64) < center {
        let o = offset as f64;
        axiom.push(minor(o, 0.0, FRAC_PI_2));
        axiom.push(minor(s - o, 0.0, FRAC_PI_2));
        axiom.push(minor(0.0, o, 0.0));
        axiom.push(minor(0.0, s - o, 0.0));
        offset += spacing;
    }
    axiom
}

/// Grows one city's segment list. Holds the visited point set between steps.
pub struct LSystem<'a> {
    size: u32,
    params: &'a CityRoadParams,
    visited: HashSet<u64>,
}

impl<'a> LSystem<'a> {
    pub fn new(size: u32, params: &'a CityRoadParams) -> Self {
        Self {
            size,
            params,
            visited: HashSet::new(),
        }
    }

    fn in_local_bounds(&self, x: f64, z: f64) -> bool {
        let s = self.size as f64;
        x >= 0.0 && x < s && z >= 0.0 && z < s
    }

    /// Bounds, minimum length and collision checks. A collision past the
    /// junction cutoff shortens `segment` to the collision point instead of
    /// rejecting it.
    pub fn check_local_constraints(&self, segment: &mut RoadSegment) -> bool {
        let (end_x, end_z) = segment.end();
        if !self.in_local_bounds(segment.x, segment.z) || !self.in_local_bounds(end_x, end_z) {
            return false;
        }
        if segment.length < self.params.min_segment_length {
            return false;
        }

        let steps = (segment.length * 2.0).ceil() as u32;
        for i in 1..steps {
            let t = i as f64 / steps as f64;
            let (cx, cz) = segment.cell_at(t);
            if self.visited.contains(&tile_key(cx, cz)) {
                if i as f64 > steps as f64 * self.params.junction_cutoff {
                    segment.length *= t;
                    return segment.length >= self.params.min_segment_length;
                }
                return false;
            }
        }
        true
    }

    pub fn mark_visited(&mut self, segment: &RoadSegment) {
        let steps = (segment.length * 2.0).ceil() as u32;
        if steps == 0 {
            let (cx, cz) = segment.cell_at(0.0);
            self.visited.insert(tile_key(cx, cz));
            return;
        }
        for i in 0..=steps {
            let (cx, cz) = segment.cell_at(i as f64 / steps as f64);
            self.visited.insert(tile_key(cx, cz));
        }
    }

    /// Rule 1 (perpendicular branches) and rule 2 (side-road extension).
    pub fn apply_production_rules(&self, segment: &RoadSegment, rng: &mut WorldRng) -> Vec<RoadSegment> {
        let s = self.size as f64;
        let p = self.params;
        let mut out = Vec::new();

        if segment.generation < p.max_branch_generation {
            let spacing = if segment.kind == SegmentType::Major {
                s / 8.0
            } else {
                s / 12.0
            };
            let branch_length = if segment.kind == SegmentType::Major {
                s / 4.0
            } else {
                s / 6.0
            };
            let count = if spacing > 0.0 {
                (segment.length / spacing).floor() as u32
            } else {
                0
            };
            for b in 1..=count {
                let t = b as f64 / (count + 1) as f64;
                let (bx, bz) = segment.point_at(t);
                for angle in [segment.angle + FRAC_PI_2, segment.angle - FRAC_PI_2] {
                    if rng.chance(p.branch_probability) {
                        out.push(RoadSegment {
                            x: bx,
                            z: bz,
                            angle,
                            length: branch_length,
                            kind: SegmentType::Side,
                            generation: segment.generation + 1,
                        });
                    }
                }
            }
        }

        if segment.kind == SegmentType::Side
            && segment.generation < p.max_extend_generation
            && rng.chance(p.extend_probability)
        {
            let (ex, ez) = segment.end();
            out.push(RoadSegment {
                x: ex,
                z: ez,
                angle: segment.angle,
                length: s / 10.0,
                kind: SegmentType::Side,
                generation: segment.generation + 1,
            });
        }
        out
    }

    /// Run the queue to exhaustion or the size-dependent cap.
    /// Returns accepted segments and iterations used.
    pub fn grow(&mut self, rng: &mut WorldRng) -> (Vec<RoadSegment>, u32) {
        let mut queue: VecDeque<RoadSegment> = create_axiom(self.size).into();
        let cap = max_iterations(self.size);
        let mut accepted = Vec::new();
        let mut iterations = 0;

        while iterations < cap {
            let Some(mut segment) = queue.pop_front() else {
                break;
            };
            iterations += 1;
            if !self.check_local_constraints(&mut segment) {
                continue;
            }
            self.mark_visited(&segment);
            queue.extend(self.apply_production_rules(&segment, rng));
            accepted.push(segment);
        }
        (accepted, iterations)
    }
}

/// Rasterize segments into world tile keys at ~3 samples per unit. Young
/// majors get one parallel tile on their left-hand side.
pub fn segments_to_tiles(
    segments: &[RoadSegment],
    city: &City,
    grid: &TileGrid,
    params: &CityRoadParams,
) -> HashSet<u64> {
    let mut tiles = HashSet::new();
    for segment in segments {
        let steps = (segment.length * 3.0).ceil().max(1.0) as u32;
        let wide = segment.kind == SegmentType::Major && segment.generation < params.wide_major_generations;
        let perp = (
            (-segment.angle.sin()).round() as i32,
            segment.angle.cos().round() as i32,
        );
        for i in 0..=steps {
            let (lx, lz) = segment.cell_at(i as f64 / steps as f64);
            let (wx, wz) = (city.x + lx, city.z + lz);
            if !grid.in_bounds(wx, wz) {
                continue;
            }
            tiles.insert(tile_key(wx, wz));
            if wide {
                tiles.insert(tile_key(wx + perp.0, wz + perp.1));
            }
        }
    }
    tiles
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CityRoadReport {
    pub segments: usize,
    pub iterations: u32,
    pub tiles_applied: usize,
}

pub fn generate_city_roads(
    grid: &mut TileGrid,
    city: &City,
    params: &CityRoadParams,
    rng: &mut WorldRng,
) -> CityRoadReport {
    let mut lsystem = LSystem::new(city.size, params);
    let (segments, iterations) = lsystem.grow(rng);
    let tiles = segments_to_tiles(&segments, city, grid, params);

    let mut keys: Vec<u64> = tiles.into_iter().collect();
    keys.sort_unstable();
    let mut applied = 0;
    for key in keys {
        let (x, z) = unpack_tile_key(key);
        if let Some(tile) = grid.get_mut(x, z) {
            if tile.tile_type() == TileType::City {
                tile.kind = TileKind::CityRoad;
                tile.height = 0.0;
                applied += 1;
            }
        }
    }

    debug!(
        "City roads for {0}x{0} city at ({1}, {2}): {3} tiles from {4} segments in {5} iterations",
        city.size,
        city.x,
        city.z,
        applied,
        segments.len(),
        iterations
    );
    CityRoadReport {
        segments: segments.len(),
        iterations,
        tiles_applied: applied,
    }
}
