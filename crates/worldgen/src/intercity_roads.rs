//! Inter-city road network.
//!
//! Three passes share one claimed-tile set:
//! 1. Prim's MST over city centres: the nearest unconnected city searches
//!    toward its connected partner.
//! 2. Random destination points on open ground, each linked to the nearest
//!    earlier destination or road point.
//! 3. Random redundant links between nearby destinations.
//!
//! Searches stop early on touching any claimed tile, so later roads merge into
//! earlier ones. Claimed tiles are applied at the end: only Grass and Terrain
//! become Road.
//!
//! Precondition: cities and their internal roads exist. Postcondition: every
//! city reported as connected is linked to the first city through Road,
//! CityRoad and City tiles. The count comes from a flood fill over the
//! written grid.

use std::collections::HashSet;

use bevy::prelude::*;

use crate::cities::City;
use crate::config::{Bounds, RoadParams};
use crate::grid::{tile_key, unpack_tile_key, Tile, TileGrid, TileKind, TileType};
use crate::road_pathfinding::{find_grid_path, GridPath, TilePos};
use crate::rng::WorldRng;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoadReport {
    pub mst_links: usize,
    pub connected_cities: usize,
    pub destinations: usize,
    pub paths_found: usize,
    pub paths_failed: usize,
    pub tiles_claimed: usize,
    pub tiles_applied: usize,
}

/// Tile types a finished road can be walked across.
#[inline]
pub fn is_road_traversable(tile_type: TileType) -> bool {
    matches!(
        tile_type,
        TileType::Grass | TileType::Terrain | TileType::Road | TileType::CityRoad | TileType::City
    )
}

pub fn road_step_cost(tile: &Tile, claimed: &HashSet<u64>, params: &RoadParams) -> f32 {
    if claimed.contains(&tile_key(tile.x, tile.z)) {
        return params.cost_road;
    }
    match tile.tile_type() {
        TileType::Road | TileType::CityRoad => params.cost_road,
        TileType::Grass | TileType::Terrain => params.cost_open,
        TileType::Water | TileType::Rock => params.cost_obstacle,
        TileType::City | TileType::House => params.cost_other,
    }
}

/// A* from `start` that stops at `goal` or at the first claimed tile other
/// than `start` itself.
pub fn find_road_path(
    grid: &TileGrid,
    start: TilePos,
    goal: TilePos,
    claimed: &HashSet<u64>,
    params: &RoadParams,
) -> Option<GridPath> {
    find_grid_path(
        grid,
        start,
        goal,
        params.max_iterations,
        |tile, _| road_step_cost(tile, claimed, params),
        |pos| pos == goal || (pos != start && claimed.contains(&tile_key(pos.0, pos.1))),
    )
}

fn distance(a: TilePos, b: TilePos) -> f32 {
    let dx = (a.0 - b.0) as f32;
    let dz = (a.1 - b.1) as f32;
    (dx * dx + dz * dz).sqrt()
}

struct RoadBuilder<'a> {
    grid: &'a TileGrid,
    params: &'a RoadParams,
    claimed: HashSet<u64>,
    path_points: Vec<TilePos>,
    report: RoadReport,
}

impl<'a> RoadBuilder<'a> {
    fn new(grid: &'a TileGrid, params: &'a RoadParams) -> Self {
        Self {
            grid,
            params,
            claimed: HashSet::new(),
            path_points: Vec::new(),
            report: RoadReport::default(),
        }
    }

    fn traversable(&self, pos: TilePos) -> bool {
        self.grid
            .type_at(pos.0, pos.1)
            .is_some_and(is_road_traversable)
    }

    /// Search, widen and claim one road. Returns false when no path exists.
    fn link(&mut self, start: TilePos, goal: TilePos, widths: &Bounds<u32>, rng: &mut WorldRng) -> bool {
        let Some(path) = find_road_path(self.grid, start, goal, &self.claimed, self.params) else {
            debug!("Roads: no path from {:?} to {:?}", start, goal);
            self.report.paths_failed += 1;
            return false;
        };
        self.report.paths_found += 1;

        let width = rng.in_bounds_u32(widths);
        for pos in self.widen(&path.tiles, width, rng) {
            self.claimed.insert(tile_key(pos.0, pos.1));
        }
        self.path_points.extend_from_slice(&path.tiles);
        true
    }

    /// Expand a centre path into the tiles a road of `width` claims.
    fn widen(&self, path: &[TilePos], width: u32, rng: &mut WorldRng) -> Vec<TilePos> {
        let mut out = path.to_vec();

        if width == 1 && path.len() > self.params.wiggle_min_path_len {
            for i in 1..path.len() - 1 {
                let (prev, curr) = (path[i - 1], path[i]);
                if !rng.chance(self.params.wiggle_probability) {
                    continue;
                }
                let step = if rng.chance(0.5) { 1 } else { -1 };
                let offset = if curr.0 != prev.0 {
                    (curr.0, curr.1 + step)
                } else {
                    (curr.0 + step, curr.1)
                };
                out.push(offset);
            }
        }

        if width > 1 {
            let half = (width / 2) as i32;
            for i in 1..path.len() {
                let (prev, curr) = (path[i - 1], path[i]);
                let perp = if curr.0 != prev.0 { (0, 1) } else { (1, 0) };
                for w in 1..=half {
                    out.push((curr.0 + perp.0 * w, curr.1 + perp.1 * w));
                    if width % 2 == 0 && w == half {
                        continue;
                    }
                    out.push((curr.0 - perp.0 * w, curr.1 - perp.1 * w));
                }
            }
        }
        out
    }

    /// Prim's MST over city centres.
    fn connect_cities(&mut self, cities: &[City], rng: &mut WorldRng) {
        let params = self.params;
        let n = cities.len();
        if n == 0 {
            return;
        }
        let mut connected = vec![false; n];
        connected[0] = true;

        let mut attempts = 0;
        while connected.iter().any(|c| !c) && attempts < n * 2 {
            attempts += 1;
            let mut best: Option<(usize, usize, f32)> = None;
            for i in (0..n).filter(|&i| connected[i]) {
                for j in (0..n).filter(|&j| !connected[j]) {
                    let d = cities[i].center_distance(&cities[j]);
                    if best.map_or(true, |(_, _, bd)| d < bd) {
                        best = Some((i, j, d));
                    }
                }
            }
            let Some((i, j, _)) = best else {
                break;
            };

            // The unconnected city searches toward the network so the early
            // exit lands on existing road rather than next to its own start.
            let found = self.link(
                cities[j].center_tile(),
                cities[i].center_tile(),
                &params.trunk_width,
                rng,
            );
            connected[j] = true;
            if found {
                self.report.mst_links += 1;
            } else {
                warn!(
                    "Roads: city at ({}, {}) could not be connected",
                    cities[j].x, cities[j].z
                );
            }
        }
    }

    fn find_destination_points(&self, seeds: &[TilePos], rng: &mut WorldRng) -> Vec<TilePos> {
        let p = self.params;
        let mut points: Vec<TilePos> = Vec::new();
        if self.grid.width == 0 || self.grid.height == 0 {
            return points;
        }
        let attempts = p.destination_count * p.attempts_per_destination;
        for _ in 0..attempts {
            if points.len() >= p.destination_count as usize {
                break;
            }
            let pos = (
                rng.index(self.grid.width) as i32,
                rng.index(self.grid.height) as i32,
            );
            if !matches!(
                self.grid.type_at(pos.0, pos.1),
                Some(TileType::Grass | TileType::Terrain)
            ) {
                continue;
            }
            let too_close = seeds
                .iter()
                .chain(points.iter())
                .any(|&other| distance(pos, other) < p.destination_spacing);
            if !too_close {
                points.push(pos);
            }
        }
        points
    }

    /// Nearest earlier destination or accepted road point to `from`.
    fn nearest_target(&self, from: TilePos, earlier: &[TilePos]) -> Option<TilePos> {
        earlier
            .iter()
            .chain(self.path_points.iter())
            .map(|&pos| (pos, distance(from, pos)))
            .fold(None, |best: Option<(TilePos, f32)>, (pos, d)| match best {
                Some((_, bd)) if bd <= d => best,
                _ => Some((pos, d)),
            })
            .map(|(pos, _)| pos)
    }

    fn finish(self) -> (HashSet<u64>, RoadReport) {
        (self.claimed, self.report)
    }
}

/// Tiles reachable from `from` through Road, CityRoad and City tiles,
/// as packed keys. `from` itself is always included.
pub fn road_network_from(grid: &TileGrid, from: TilePos) -> HashSet<u64> {
    let mut seen = HashSet::from([tile_key(from.0, from.1)]);
    let mut stack = vec![from];
    while let Some((x, z)) = stack.pop() {
        let (n, count) = grid.neighbors4(x, z);
        for &(nx, nz) in &n[..count] {
            let on_network = matches!(
                grid.type_at(nx, nz),
                Some(TileType::Road | TileType::CityRoad | TileType::City)
            );
            if on_network && seen.insert(tile_key(nx, nz)) {
                stack.push((nx, nz));
            }
        }
    }
    seen
}

/// Number of cities whose footprint touches the network around the first city.
pub fn count_connected_cities(grid: &TileGrid, cities: &[City]) -> usize {
    let Some(first) = cities.first() else {
        return 0;
    };
    let network = road_network_from(grid, first.center_tile());
    cities
        .iter()
        .filter(|city| {
            city.footprint()
                .tiles()
                .any(|(x, z)| network.contains(&tile_key(x, z)))
        })
        .count()
}

/// Write claimed tiles into the grid. Only Grass and Terrain become Road.
fn apply_claimed(grid: &mut TileGrid, claimed: HashSet<u64>, report: &mut RoadReport) {
    let mut keys: Vec<u64> = claimed.into_iter().collect();
    keys.sort_unstable();
    report.tiles_claimed = keys.len();
    for key in keys {
        let (x, z) = unpack_tile_key(key);
        if let Some(tile) = grid.get_mut(x, z) {
            if matches!(tile.tile_type(), TileType::Grass | TileType::Terrain) {
                tile.kind = TileKind::Road;
                tile.height = 0.0;
                report.tiles_applied += 1;
            }
        }
    }
}

/// Build the inter-city network and write it into `grid`.
pub fn generate_roads(
    grid: &mut TileGrid,
    cities: &[City],
    params: &RoadParams,
    rng: &mut WorldRng,
) -> RoadReport {
    let mut builder = RoadBuilder::new(grid, params);

    builder.connect_cities(cities, rng);

    // Destinations: city centres first, then random open-ground points.
    let mut destinations: Vec<TilePos> = cities.iter().map(City::center_tile).collect();
    let new_points = builder.find_destination_points(&destinations, rng);
    builder.report.destinations = new_points.len();
    let first_new = destinations.len().max(1);
    destinations.extend(new_points);

    for k in first_new..destinations.len() {
        let from = destinations[k];
        let Some(target) = builder.nearest_target(from, &destinations[..k]) else {
            continue;
        };
        builder.link(from, target, &params.branch_width, rng);
    }

    for i in 0..destinations.len() {
        for j in (i + 2)..destinations.len() {
            let (a, b) = (destinations[i], destinations[j]);
            if distance(a, b) >= params.extra_link_distance || !rng.chance(params.extra_link_probability) {
                continue;
            }
            builder.link(a, b, &params.extra_width, rng);
        }
    }

    let (claimed, mut report) = builder.finish();
    apply_claimed(grid, claimed, &mut report);
    report.connected_cities = count_connected_cities(grid, cities);
    info!(
        "Roads: {} MST links, {}/{} cities connected, {} destinations, {} paths ({} failed), {} tiles applied",
        report.mst_links,
        report.connected_cities,
        cities.len(),
        report.destinations,
        report.paths_found,
        report.paths_failed,
        report.tiles_applied
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cities::apply_city_to_grid;

    fn params() -> RoadParams {
        RoadParams::default()
    }

    fn quiet_params() -> RoadParams {
        RoadParams {
            destination_count: 0,
            extra_link_probability: 0.0,
            wiggle_probability: 0.0,
            trunk_width: Bounds::new(1, 1),
            ..RoadParams::default()
        }
    }

    #[test]
    fn test_cost_model() {
        let p = params();
        let claimed = HashSet::from([tile_key(9, 9)]);
        let tile = |x, kind| Tile {
            x,
            z: 0,
            height: 0.0,
            kind,
        };
        assert_eq!(road_step_cost(&tile(0, TileKind::Grass), &claimed, &p), 1.0);
        assert_eq!(road_step_cost(&tile(0, TileKind::Terrain), &claimed, &p), 1.0);
        assert_eq!(road_step_cost(&tile(0, TileKind::Road), &claimed, &p), 0.3);
        assert_eq!(road_step_cost(&tile(0, TileKind::CityRoad), &claimed, &p), 0.3);
        assert_eq!(road_step_cost(&tile(0, TileKind::Water), &claimed, &p), 100.0);
        assert_eq!(road_step_cost(&tile(0, TileKind::Rock), &claimed, &p), 100.0);
        assert_eq!(road_step_cost(&tile(0, TileKind::City), &claimed, &p), 5.0);
        let claimed_grass = Tile {
            x: 9,
            z: 9,
            height: 0.0,
            kind: TileKind::Grass,
        };
        assert_eq!(road_step_cost(&claimed_grass, &claimed, &p), 0.3);
    }

    #[test]
    fn test_path_stops_at_claimed_road() {
        let grid = TileGrid::new(30, 5);
        let claimed: HashSet<u64> = (0..5).map(|z| tile_key(10, z)).collect();
        let path = find_road_path(&grid, (0, 2), (29, 2), &claimed, &params()).expect("path");
        assert_eq!(path.end().0, 10);
    }

    #[test]
    fn test_claimed_start_does_not_stop() {
        let grid = TileGrid::new(10, 1);
        let claimed = HashSet::from([tile_key(0, 0)]);
        let path = find_road_path(&grid, (0, 0), (9, 0), &claimed, &params()).expect("path");
        assert_eq!(path.end(), (9, 0));
    }

    #[test]
    fn test_widen_even_width_trims_minus_side() {
        let grid = TileGrid::new(20, 20);
        let p = params();
        let builder = RoadBuilder::new(&grid, &p);
        let mut rng = WorldRng::from_seed_u64(1);
        let path: Vec<TilePos> = (2..8).map(|x| (x, 10)).collect();
        let tiles: HashSet<TilePos> = builder
            .widen(&path, 2, &mut rng)
            .into_iter()
            .collect();
        assert!(tiles.contains(&(5, 11)));
        assert!(!tiles.contains(&(5, 9)));

        let tiles3: HashSet<TilePos> = builder
            .widen(&path, 3, &mut rng)
            .into_iter()
            .collect();
        assert!(tiles3.contains(&(5, 11)) && tiles3.contains(&(5, 9)));
        assert!(!tiles3.contains(&(5, 12)));
    }

    #[test]
    fn test_wiggle_keeps_center_line() {
        let grid = TileGrid::new(20, 20);
        let p = RoadParams {
            wiggle_probability: 1.0,
            ..params()
        };
        let builder = RoadBuilder::new(&grid, &p);
        let mut rng = WorldRng::from_seed_u64(3);
        let path: Vec<TilePos> = (2..12).map(|x| (x, 10)).collect();
        let tiles = builder.widen(&path, 1, &mut rng);
        for pos in &path {
            assert!(tiles.contains(pos));
        }
        assert_eq!(tiles.len(), path.len() + path.len() - 2);
    }

    #[test]
    fn test_two_cities_connected_by_road() {
        let mut grid = TileGrid::new(120, 30);
        let cities = vec![City::new(4, 7, 16), City::new(100, 7, 16)];
        for city in &cities {
            apply_city_to_grid(&mut grid, city);
        }
        let mut rng = WorldRng::from_seed_u64(5);
        let report = generate_roads(&mut grid, &cities, &quiet_params(), &mut rng);
        assert_eq!(report.mst_links, 1);
        assert_eq!(report.connected_cities, 2);
        assert!(report.tiles_applied > 60);
        let seen = road_network_from(&grid, cities[0].center_tile());
        let (cx, cz) = cities[1].center_tile();
        assert!(seen.contains(&tile_key(cx, cz)));
    }

    #[test]
    fn test_roads_never_overwrite_protected_tiles() {
        let mut grid = TileGrid::new(120, 40);
        for z in 0..40 {
            grid.set(60, z, TileKind::Water, -2.0);
        }
        let cities = vec![City::new(5, 10, 16), City::new(95, 10, 16)];
        for city in &cities {
            apply_city_to_grid(&mut grid, city);
        }
        let mut rng = WorldRng::from_seed_u64(8);
        let report = generate_roads(&mut grid, &cities, &quiet_params(), &mut rng);
        assert!((0..40).all(|z| grid.type_at(60, z) == Some(TileType::Water)));
        assert_eq!(grid.count(TileType::City), 2 * 16 * 16);
        // The only route crosses water, so the second city is not connected.
        assert_eq!(report.connected_cities, 1);
    }

    #[test]
    fn test_road_tiles_flattened() {
        let mut grid = TileGrid::from_fn(100, 40, |_, _| (1.2, TileKind::Grass));
        let cities = vec![City::new(2, 10, 16), City::new(80, 10, 16)];
        for city in &cities {
            apply_city_to_grid(&mut grid, city);
        }
        let mut rng = WorldRng::from_seed_u64(2);
        generate_roads(&mut grid, &cities, &params(), &mut rng);
        let roads: Vec<&Tile> = grid
            .tiles
            .iter()
            .filter(|t| t.tile_type() == TileType::Road)
            .collect();
        assert!(!roads.is_empty());
        assert!(roads.iter().all(|t| t.height == 0.0));
    }

    #[test]
    fn test_connected_count_follows_written_network() {
        let mut grid = TileGrid::new(60, 20);
        let cities = vec![City::new(0, 0, 8), City::new(40, 0, 8), City::new(20, 12, 8)];
        for city in &cities {
            apply_city_to_grid(&mut grid, city);
        }
        assert_eq!(count_connected_cities(&grid, &[]), 0);
        assert_eq!(count_connected_cities(&grid, &cities), 1);

        for x in 8..40 {
            grid.set(x, 4, TileKind::Road, 0.0);
        }
        assert_eq!(count_connected_cities(&grid, &cities), 2);

        // A spur from the middle of the existing road reaches the third city.
        for z in 5..12 {
            grid.set(24, z, TileKind::Road, 0.0);
        }
        assert_eq!(count_connected_cities(&grid, &cities), 3);

        grid.set(30, 4, TileKind::Water, -1.0);
        assert_eq!(count_connected_cities(&grid, &cities), 2);
    }

    #[test]
    fn test_destinations_without_cities() {
        let mut grid = TileGrid::new(256, 256);
        let mut rng = WorldRng::from_seed_u64(12);
        let report = generate_roads(&mut grid, &[], &params(), &mut rng);
        assert!(report.destinations >= 2);
        assert_eq!(report.connected_cities, 0);
        assert!(grid.count(TileType::Road) > 0);
    }
}
