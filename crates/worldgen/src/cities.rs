//! City placement.
//!
//! Precondition: terrain (and rivers, if enabled) have run. Postcondition:
//! every placed footprint is City at height 0, footprints are disjoint, and
//! centres are at least `min_spacing` apart.

use bevy::prelude::*;

use crate::config::CityParams;
use crate::grid::{TileGrid, TileKind, TileType};
use crate::rng::WorldRng;

/// Axis-aligned tile rectangle `[x, x + w) x [z, z + d)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub x: i32,
    pub z: i32,
    pub w: i32,
    pub d: i32,
}

impl TileRect {
    pub fn contains(&self, x: i32, z: i32) -> bool {
        x >= self.x && z >= self.z && x < self.x + self.w && z < self.z + self.d
    }

    pub fn intersects(&self, other: &TileRect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.z < other.z + other.d
            && other.z < self.z + self.d
    }

    pub fn tiles(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (self.z..self.z + self.d).flat_map(move |z| (self.x..self.x + self.w).map(move |x| (x, z)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct City {
    pub x: i32,
    pub z: i32,
    pub center_x: f32,
    pub center_z: f32,
    pub size: u32,
}

impl City {
    pub fn new(x: i32, z: i32, size: u32) -> Self {
        Self {
            x,
            z,
            center_x: x as f32 + size as f32 / 2.0,
            center_z: z as f32 + size as f32 / 2.0,
            size,
        }
    }

    pub fn footprint(&self) -> TileRect {
        TileRect {
            x: self.x,
            z: self.z,
            w: self.size as i32,
            d: self.size as i32,
        }
    }

    /// Tile containing the centre point.
    pub fn center_tile(&self) -> (i32, i32) {
        (self.center_x.floor() as i32, self.center_z.floor() as i32)
    }

    pub fn center_distance(&self, other: &City) -> f32 {
        let dx = self.center_x - other.center_x;
        let dz = self.center_z - other.center_z;
        (dx * dx + dz * dz).sqrt()
    }
}

/// All placed cities, in placement order.
#[derive(Resource, Debug, Clone, Default)]
pub struct CityRegistry {
    pub cities: Vec<City>,
}

impl CityRegistry {
    pub fn new(cities: Vec<City>) -> Self {
        Self { cities }
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &City> {
        self.cities.iter()
    }

    /// City whose footprint contains tile `(x, z)`.
    pub fn city_at(&self, x: i32, z: i32) -> Option<&City> {
        self.cities.iter().find(|c| c.footprint().contains(x, z))
    }

    /// Player spawn point: centre of the largest city, ties broken uniformly
    /// at random. Falls back to a random road tile (or the map centre) when
    /// no city was placed.
    pub fn spawn_position(&self, grid: &TileGrid, rng: &mut WorldRng) -> (f32, f32) {
        let Some(max_size) = self.cities.iter().map(|c| c.size).max() else {
            return grid.find_random_road_position(rng);
        };
        let largest: Vec<&City> = self.cities.iter().filter(|c| c.size == max_size).collect();
        let city = largest[rng.index(largest.len())];
        (city.center_x, city.center_z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct FootprintCounts {
    water: u32,
    rock: u32,
    steep: u32,
}

/// Footprint test for a `size x size` city anchored at `(x, z)`. Fails fast on
/// the first out-of-bounds tile or exceeded tolerance.
pub fn is_valid_city_location(grid: &TileGrid, x: i32, z: i32, size: u32, params: &CityParams) -> bool {
    let mut counts = FootprintCounts::default();
    let rect = TileRect {
        x,
        z,
        w: size as i32,
        d: size as i32,
    };
    for (tx, tz) in rect.tiles() {
        let Some(tile) = grid.get(tx, tz) else {
            return false;
        };
        match tile.tile_type() {
            TileType::Water => counts.water += 1,
            TileType::Rock => counts.rock += 1,
            _ => {}
        }
        if tile.height.abs() > params.steep_height {
            counts.steep += 1;
        }
        if counts.water > params.water_tolerance
            || counts.rock > params.rock_tolerance
            || counts.steep > size
        {
            return false;
        }
    }
    true
}

fn try_place_city(
    grid: &TileGrid,
    size: u32,
    placed: &[City],
    params: &CityParams,
    rng: &mut WorldRng,
) -> Option<City> {
    let margin = size as f64;
    let span_x = grid.width as f64 - size as f64 - margin * 2.0;
    let span_z = grid.height as f64 - size as f64 - margin * 2.0;

    for _ in 0..params.max_attempts {
        let x = (margin + rng.unit() * span_x).floor() as i32;
        let z = (margin + rng.unit() * span_z).floor() as i32;

        if !is_valid_city_location(grid, x, z, size, params) {
            continue;
        }
        let candidate = City::new(x, z, size);
        let conflicts = placed.iter().any(|other| {
            candidate.center_distance(other) < params.min_spacing
                || candidate.footprint().intersects(&other.footprint())
        });
        if !conflicts {
            return Some(candidate);
        }
    }
    None
}

/// Stamp a footprint as City with flattened height. Returns tiles written.
pub fn apply_city_to_grid(grid: &mut TileGrid, city: &City) -> usize {
    city.footprint()
        .tiles()
        .filter(|&(x, z)| grid.set(x, z, TileKind::City, 0.0))
        .count()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacementReport {
    pub cities: Vec<City>,
    pub failed_sizes: Vec<u32>,
    pub tiles_stamped: usize,
}

/// Place every requested city, largest sizes first, then stamp the
/// footprints. A city that finds no valid site is logged and skipped.
pub fn place_cities(grid: &mut TileGrid, params: &CityParams, rng: &mut WorldRng) -> PlacementReport {
    let mut table = params.sizes.clone();
    table.sort_by(|a, b| b.size.cmp(&a.size));

    let mut report = PlacementReport::default();
    for entry in &table {
        for _ in 0..entry.count {
            match try_place_city(grid, entry.size, &report.cities, params, rng) {
                Some(city) => {
                    info!("Placed {0}x{0} city at ({1}, {2})", city.size, city.x, city.z);
                    report.cities.push(city);
                }
                None => {
                    warn!(
                        "Failed to place {0}x{0} city after {1} attempts",
                        entry.size, params.max_attempts
                    );
                    report.failed_sizes.push(entry.size);
                }
            }
        }
    }

    for city in &report.cities {
        report.tiles_stamped += apply_city_to_grid(grid, city);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CitySizeCount;

    fn water_grid(w: usize, h: usize) -> TileGrid {
        TileGrid::from_fn(w, h, |_, _| (-2.0, TileKind::Water))
    }

    #[test]
    fn test_city_center() {
        let city = City::new(10, 20, 16);
        assert_eq!(city.center_x, 18.0);
        assert_eq!(city.center_z, 28.0);
        assert_eq!(city.center_tile(), (18, 28));
    }

    #[test]
    fn test_rect_intersects() {
        let a = TileRect { x: 0, z: 0, w: 10, d: 10 };
        assert!(a.intersects(&TileRect { x: 9, z: 9, w: 2, d: 2 }));
        assert!(!a.intersects(&TileRect { x: 10, z: 0, w: 5, d: 5 }));
        assert_eq!(a.tiles().count(), 100);
    }

    #[test]
    fn test_all_water_rejects_large_city() {
        let mut grid = water_grid(100, 100);
        let params = CityParams {
            sizes: vec![CitySizeCount { size: 128, count: 1 }],
            ..CityParams::default()
        };
        let mut rng = WorldRng::from_seed_u64(9);
        let report = place_cities(&mut grid, &params, &mut rng);
        assert!(report.cities.is_empty());
        assert_eq!(report.failed_sizes, vec![128]);
        assert_eq!(grid.count(TileType::City), 0);
    }

    #[test]
    fn test_water_tolerance() {
        let mut grid = TileGrid::new(40, 40);
        let params = CityParams::default();
        for x in 0..5 {
            grid.set(x, 0, TileKind::Water, -2.0);
        }
        assert!(is_valid_city_location(&grid, 0, 0, 16, &params));
        grid.set(5, 0, TileKind::Water, -2.0);
        assert!(!is_valid_city_location(&grid, 0, 0, 16, &params));
    }

    #[test]
    fn test_out_of_bounds_footprint_invalid() {
        let grid = TileGrid::new(40, 40);
        let params = CityParams::default();
        assert!(!is_valid_city_location(&grid, 30, 30, 16, &params));
        assert!(!is_valid_city_location(&grid, -1, 0, 16, &params));
    }

    #[test]
    fn test_steep_tolerance_is_size() {
        let mut grid = TileGrid::new(40, 40);
        let params = CityParams::default();
        for x in 0..16 {
            grid.set(x, 3, TileKind::Terrain, 9.0);
        }
        assert!(is_valid_city_location(&grid, 0, 0, 16, &params));
        grid.set(0, 4, TileKind::Terrain, -9.0);
        assert!(!is_valid_city_location(&grid, 0, 0, 16, &params));
    }

    #[test]
    fn test_placed_cities_are_spaced_and_disjoint() {
        let mut grid = TileGrid::new(512, 512);
        let params = CityParams {
            sizes: vec![
                CitySizeCount { size: 16, count: 4 },
                CitySizeCount { size: 32, count: 3 },
            ],
            ..CityParams::default()
        };
        let mut rng = WorldRng::from_seed_u64(77);
        let report = place_cities(&mut grid, &params, &mut rng);
        assert!(report.cities.len() >= 2);
        for (i, a) in report.cities.iter().enumerate() {
            for b in &report.cities[i + 1..] {
                assert!(a.center_distance(b) >= params.min_spacing);
                assert!(!a.footprint().intersects(&b.footprint()));
            }
        }
        let expected: usize = report.cities.iter().map(|c| (c.size * c.size) as usize).sum();
        assert_eq!(grid.count(TileType::City), expected);
        assert_eq!(report.tiles_stamped, expected);
    }

    #[test]
    fn test_placement_order_is_largest_first() {
        let mut grid = TileGrid::new(512, 512);
        let params = CityParams {
            sizes: vec![
                CitySizeCount { size: 16, count: 1 },
                CitySizeCount { size: 64, count: 1 },
            ],
            ..CityParams::default()
        };
        let mut rng = WorldRng::from_seed_u64(3);
        let report = place_cities(&mut grid, &params, &mut rng);
        assert_eq!(report.cities.first().map(|c| c.size), Some(64));
    }

    #[test]
    fn test_stamped_city_is_flat() {
        let mut grid = TileGrid::from_fn(64, 64, |_, _| (1.5, TileKind::Grass));
        let city = City::new(8, 8, 16);
        assert_eq!(apply_city_to_grid(&mut grid, &city), 256);
        let tile = grid.get(10, 10).unwrap();
        assert_eq!(tile.tile_type(), TileType::City);
        assert_eq!(tile.height, 0.0);
        assert_eq!(grid.type_at(7, 8), Some(TileType::Grass));
    }

    #[test]
    fn test_spawn_prefers_largest_city() {
        let grid = TileGrid::new(64, 64);
        let registry = CityRegistry::new(vec![City::new(0, 0, 16), City::new(30, 30, 32)]);
        let mut rng = WorldRng::from_seed_u64(1);
        assert_eq!(registry.spawn_position(&grid, &mut rng), (46.0, 46.0));
    }

    #[test]
    fn test_spawn_ties_pick_a_largest() {
        let grid = TileGrid::new(256, 256);
        let registry = CityRegistry::new(vec![
            City::new(0, 0, 32),
            City::new(100, 100, 32),
            City::new(200, 0, 16),
        ]);
        let mut rng = WorldRng::from_seed_u64(5);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..64 {
            let (x, z) = registry.spawn_position(&grid, &mut rng);
            assert!((x, z) == (16.0, 16.0) || (x, z) == (116.0, 116.0));
            seen.insert((x as i32, z as i32));
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_spawn_without_cities_falls_back() {
        let grid = TileGrid::new(64, 32);
        let mut rng = WorldRng::from_seed_u64(1);
        assert_eq!(CityRegistry::default().spawn_position(&grid, &mut rng), (32.0, 16.0));
    }
}
