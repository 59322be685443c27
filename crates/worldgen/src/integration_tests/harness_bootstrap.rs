//! The plugin publishes every generated resource after the first update.

use crate::cities::CityRegistry;
use crate::grid::{TileGrid, TileKind, TileType};
use crate::intercity_roads::RoadReport;
use crate::pipeline::GenerationStats;
use crate::spatial_query::WorldObjects;
use crate::test_harness::{TestWorld, TEST_MAP_SIZE};
use crate::traversal::TraversalRules;
use crate::world_init::SpawnPoint;

#[test]
fn test_plugin_inserts_world_resources() {
    let world = TestWorld::new();
    assert!(world.has_resource::<TileGrid>());
    assert!(world.has_resource::<CityRegistry>());
    assert!(world.has_resource::<WorldObjects>());
    assert!(world.has_resource::<GenerationStats>());
    assert!(world.has_resource::<TraversalRules>());
    assert!(world.has_resource::<SpawnPoint>());
    assert_eq!(world.grid().tiles.len(), TEST_MAP_SIZE * TEST_MAP_SIZE);
}

#[test]
fn test_stats_match_grid() {
    let world = TestWorld::new();
    let stats = world.stats();
    let counts = world.grid().type_counts();
    assert_eq!(stats.type_counts, counts);
    assert_eq!(stats.type_counts.total(), TEST_MAP_SIZE * TEST_MAP_SIZE);
    assert_eq!(stats.cities, world.cities().len());
    assert_eq!(stats.objects, world.objects().len());
    let stages: Vec<&str> = stats.stage_ms.iter().map(|(s, _)| *s).collect();
    assert_eq!(stages, vec!["terrain", "rivers", "cities", "roads", "houses", "trees"]);
}

#[test]
fn test_grid_invariant_holds_after_generation() {
    let world = TestWorld::new();
    let grid = world.grid();
    for z in 0..grid.height as i32 {
        for x in 0..grid.width as i32 {
            let tile = grid.get(x, z).expect("in-bounds tile");
            assert_eq!((tile.x, tile.z), (x, z));
        }
    }
    assert!(grid.get(-1, 0).is_none());
    assert!(grid.get(0, grid.height as i32).is_none());
}

#[test]
fn test_spawn_at_largest_city() {
    let world = TestWorld::new();
    let spawn = world.spawn();
    let largest = world.cities().iter().map(|c| c.size).max();
    match largest {
        Some(size) => {
            let at_largest = world
                .cities()
                .iter()
                .filter(|c| c.size == size)
                .any(|c| (c.center_x, c.center_z) == (spawn.x, spawn.z));
            assert!(at_largest, "spawn ({}, {}) is not a largest-city centre", spawn.x, spawn.z);
        }
        None => {
            assert!(spawn.x >= 0.0 && spawn.x <= TEST_MAP_SIZE as f32);
            assert!(spawn.z >= 0.0 && spawn.z <= TEST_MAP_SIZE as f32);
        }
    }
}

#[test]
fn test_skip_world_gen_keeps_hand_built_grid() {
    let mut grid = TileGrid::new(8, 8);
    grid.set(3, 3, TileKind::Road, 0.0);
    let world = TestWorld::from_grid(grid);
    assert_eq!(world.grid().width, 8);
    assert_eq!(world.grid().count(TileType::Road), 1);
    assert!(!world.has_resource::<GenerationStats>());
}

#[test]
fn test_builder_stage_toggles_reach_the_pipeline() {
    let world = TestWorld::builder()
        .rivers(false)
        .roads(false)
        .city_spacing(50.0)
        .build();
    assert_eq!(world.config().cities.min_spacing, 50.0);
    assert!(!world.config().rivers.enabled);
    assert!(!world.config().roads.enabled);

    let stages: Vec<&str> = world.stats().stage_ms.iter().map(|(s, _)| *s).collect();
    assert_eq!(stages, vec!["terrain", "cities", "houses", "trees"]);
    assert_eq!(world.stats().roads, RoadReport::default());
    assert_eq!(world.grid().count(TileType::Road), 0);

    let cities: Vec<_> = world.cities().iter().collect();
    for (i, a) in cities.iter().enumerate() {
        for b in &cities[i + 1..] {
            assert!(a.center_distance(b) >= 50.0, "cities closer than the configured spacing");
        }
    }
}
