//! Every house rectangle lies inside one block and no two houses overlap.

use std::collections::HashSet;

use crate::cities::{place_cities, City};
use crate::city_roads::generate_city_roads;
use crate::config::{CityParams, CityRoadParams, CitySizeCount, HouseParams};
use crate::grid::{HouseInfo, TileGrid, TileType};
use crate::houses::{find_blocks, generate_houses, Block};
use crate::rng::WorldRng;
use crate::test_harness::TestWorld;

fn check_houses(grid: &TileGrid, blocks: &[Block]) -> usize {
    let mut houses: Vec<HouseInfo> = Vec::new();
    let mut covered: HashSet<(i32, i32)> = HashSet::new();
    for tile in grid.tiles.iter().filter(|t| t.tile_type() == TileType::House) {
        let info = *tile.house().expect("house tiles carry metadata");
        assert!(info.contains(tile.x, tile.z));
        if houses.contains(&info) {
            continue;
        }
        let block = blocks
            .iter()
            .find(|b| b.contains(info.origin_x, info.origin_z))
            .expect("house origin inside a block");
        for z in info.origin_z..info.origin_z + info.depth as i32 {
            for x in info.origin_x..info.origin_x + info.width as i32 {
                assert!(block.contains(x, z), "house at ({}, {}) leaves its block", info.origin_x, info.origin_z);
                assert_eq!(grid.get(x, z).and_then(|t| t.house()), Some(&info));
                assert!(covered.insert((x, z)), "houses overlap at ({x}, {z})");
            }
        }
        assert!(info.width >= 2 && info.depth >= 2 && info.width <= 8 && info.depth <= 8);
        houses.push(info);
    }
    houses.len()
}

#[test]
fn test_house_packing_on_generated_cities() {
    let mut grid = TileGrid::new(200, 200);
    let mut rng = WorldRng::from_seed_u64(12);
    let params = CityParams {
        sizes: vec![
            CitySizeCount { size: 64, count: 1 },
            CitySizeCount { size: 32, count: 1 },
        ],
        min_spacing: 60.0,
        ..CityParams::default()
    };
    let cities: Vec<City> = place_cities(&mut grid, &params, &mut rng).cities;
    assert!(!cities.is_empty());
    for city in &cities {
        generate_city_roads(&mut grid, city, &CityRoadParams::default(), &mut rng);
    }

    let house_params = HouseParams::default();
    let blocks: Vec<Block> = cities
        .iter()
        .flat_map(|c| find_blocks(&grid, c, house_params.min_block_tiles))
        .collect();
    let mut expected = 0;
    for city in &cities {
        expected += generate_houses(&mut grid, city, &house_params, &mut rng).houses;
    }
    assert!(expected > 0);
    assert_eq!(check_houses(&grid, &blocks), expected);
}

#[test]
fn test_houses_only_inside_cities_in_full_pipeline() {
    let world = TestWorld::builder().seed(5).trees(false).build();
    let grid = world.grid();
    for tile in grid.tiles.iter().filter(|t| t.tile_type() == TileType::House) {
        assert!(
            world.cities().city_at(tile.x, tile.z).is_some(),
            "house tile ({}, {}) outside every city",
            tile.x,
            tile.z
        );
        let info = tile.house().expect("metadata");
        assert!((1.0..3.0).contains(&info.height));
    }
    assert_eq!(world.stats().houses, {
        let mut origins: Vec<(i32, i32)> = grid
            .tiles
            .iter()
            .filter_map(|t| t.house().map(|h| (h.origin_x, h.origin_z)))
            .collect();
        origins.sort_unstable();
        origins.dedup();
        origins.len()
    });
}
