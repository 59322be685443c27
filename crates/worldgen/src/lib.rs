use bevy::prelude::*;

pub mod ascii_map;
pub mod chunk_streaming;
pub mod cities;
pub mod city_roads;
pub mod config;
pub mod error;
pub mod generators;
pub mod grid;
pub mod height_normalization;
pub mod heightfield;
pub mod houses;
pub mod intercity_roads;
pub mod noise_field;
pub mod object_index;
pub mod objects;
pub mod pipeline;
pub mod rivers;
pub mod rng;
pub mod road_pathfinding;
pub mod spatial_query;
pub mod terrain_generation;
pub mod traversal;
pub mod trees;
pub mod world_init;

#[cfg(test)]
mod integration_tests;
#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

pub use config::WorldGenConfig;
pub use error::ConfigError;
pub use grid::{Tile, TileGrid, TileKind, TileType};
pub use pipeline::{GeneratedWorld, GenerationStats, WorldGenerator};

/// Generates the world once at `Startup`.
///
/// Inserts a default [`WorldGenConfig`] unless the app already has one, so
/// hosts configure generation by inserting the resource before this plugin.
pub struct WorldGenPlugin;

impl Plugin for WorldGenPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WorldGenConfig>()
            .add_systems(Startup, world_init::init_world);
    }
}
