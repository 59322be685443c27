//! Cities joined by the inter-city network form one connected component over
//! Road, CityRoad and City tiles.

use std::collections::HashSet;

use crate::cities::{place_cities, City};
use crate::city_roads::generate_city_roads;
use crate::config::{CityParams, CityRoadParams, CitySizeCount, RoadParams, WorldGenConfig};
use crate::grid::{tile_key, TileGrid, TileType};
use crate::intercity_roads::generate_roads;
use crate::pipeline::WorldGenerator;
use crate::rng::WorldRng;
use crate::road_pathfinding::TilePos;

fn flood_network(grid: &TileGrid, from: TilePos) -> HashSet<u64> {
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

fn reaches(component: &HashSet<u64>, city: &City) -> bool {
    city.footprint()
        .tiles()
        .any(|(x, z)| component.contains(&tile_key(x, z)))
}

fn flat_world_with_cities(seed: u64) -> (TileGrid, Vec<City>, WorldRng) {
    let mut grid = TileGrid::new(256, 256);
    let mut rng = WorldRng::from_seed_u64(seed);
    let params = CityParams {
        sizes: vec![
            CitySizeCount { size: 32, count: 1 },
            CitySizeCount { size: 16, count: 2 },
        ],
        min_spacing: 70.0,
        ..CityParams::default()
    };
    let placement = place_cities(&mut grid, &params, &mut rng);
    for city in &placement.cities {
        generate_city_roads(&mut grid, city, &CityRoadParams::default(), &mut rng);
    }
    (grid, placement.cities, rng)
}

#[test]
fn test_all_cities_connected_on_open_ground() {
    for seed in [1, 2, 3] {
        let (mut grid, cities, mut rng) = flat_world_with_cities(seed);
        assert!(cities.len() >= 2, "seed {seed}: only {} cities placed", cities.len());
        let params = RoadParams {
            destination_count: 6,
            ..RoadParams::default()
        };
        let report = generate_roads(&mut grid, &cities, &params, &mut rng);
        assert_eq!(report.connected_cities, cities.len(), "seed {seed}: {report:?}");

        let component = flood_network(&grid, cities[0].center_tile());
        for city in &cities[1..] {
            assert!(
                reaches(&component, city),
                "seed {seed}: city at ({}, {}) is cut off",
                city.x,
                city.z
            );
        }
    }
}

#[test]
fn test_inter_city_roads_only_on_open_ground() {
    let (mut grid, cities, mut rng) = flat_world_with_cities(4);
    let before = grid.clone();
    let params = RoadParams {
        destination_count: 4,
        ..RoadParams::default()
    };
    generate_roads(&mut grid, &cities, &params, &mut rng);
    for (old, new) in before.tiles.iter().zip(&grid.tiles) {
        if new.tile_type() == TileType::Road && old.tile_type() != TileType::Road {
            assert!(matches!(old.tile_type(), TileType::Grass | TileType::Terrain));
            assert_eq!(new.height, 0.0);
        }
        if old.tile_type() == TileType::City || old.tile_type() == TileType::CityRoad {
            assert_eq!(old.kind, new.kind, "city tiles are never overwritten by roads");
        }
    }
}

#[test]
fn test_connected_count_matches_network_on_noise_terrain() {
    for seed in [3, 5] {
        let mut config = WorldGenConfig::terrain_only(512, 512, seed);
        config.cities.enabled = true;
        config.roads.enabled = true;
        let world = WorldGenerator::generate(&config).unwrap();
        let cities = &world.cities.cities;
        assert!(!cities.is_empty(), "seed {seed}: no cities placed");

        let component = flood_network(&world.grid, cities[0].center_tile());
        let reachable = cities.iter().filter(|city| reaches(&component, city)).count();
        assert_eq!(
            world.stats.roads.connected_cities, reachable,
            "seed {seed}: {:?}",
            world.stats.roads
        );
    }
}
