//! Viewpoint walk across a generated world.

use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;

use worldgen::chunk_streaming::{chunk_tiles, ChunkCache, ChunkStreamer};
use worldgen::spatial_query::{visible_tiles, WorldObjects};
use worldgen::traversal::TraversalRules;
use worldgen::world_init::SpawnPoint;
use worldgen::{TileGrid, WorldGenConfig};

/// Collision radius of the walker, in tiles.
const BODY_RADIUS: f32 = 0.1;
/// Distance covered per step at speed multiplier 1.
const STEP: f32 = 0.5;

#[derive(Debug, Default)]
struct WalkTotals {
    moved: u32,
    turns: u32,
    chunks_built: usize,
    chunks_dropped: usize,
    peak_tiles: usize,
    peak_objects: usize,
}

/// Walk `steps` steps from the spawn point, turning left at every blocked
/// step, and report what the streaming layer did.
pub fn walk(world: &World, steps: u32) -> String {
    let (Some(grid), Some(objects), Some(rules), Some(spawn), Some(config)) = (
        world.get_resource::<TileGrid>(),
        world.get_resource::<WorldObjects>(),
        world.get_resource::<TraversalRules>(),
        world.get_resource::<SpawnPoint>(),
        world.get_resource::<WorldGenConfig>(),
    ) else {
        return "walk: world resources missing".to_string();
    };

    let radius = config.streaming.render_distance;
    let chunk_size = config.streaming.chunk_size;
    let mut streamer = ChunkStreamer::new(chunk_size);
    let mut cache: ChunkCache<usize> = ChunkCache::new();
    let mut totals = WalkTotals::default();

    let (mut x, mut z) = (spawn.x, spawn.z);
    let mut facing = 0.0f32;
    for step in 0..steps {
        let speed = rules.speed_multiplier_at(grid, x, z);
        let (nx, nz) = (x + facing.cos() * STEP * speed, z + facing.sin() * STEP * speed);
        if rules.can_occupy(grid, nx, nz, BODY_RADIUS) {
            (x, z) = (nx, nz);
            totals.moved += 1;
        } else {
            facing = (facing + FRAC_PI_2).rem_euclid(std::f32::consts::TAU);
            totals.turns += 1;
        }

        let delta = streamer.update(grid, x, z, radius);
        totals.chunks_built += delta.entered.len();
        totals.chunks_dropped += cache.apply(&delta, |id| chunk_tiles(grid, chunk_size, id).count()).len();

        let tiles = visible_tiles(grid, x, z, radius).count();
        let visible = objects
            .visible_objects_directional(x, z, facing, radius, radius / 2.0)
            .count();
        totals.peak_tiles = totals.peak_tiles.max(tiles);
        totals.peak_objects = totals.peak_objects.max(visible);

        if !delta.is_empty() {
            debug!(
                "step {step}: at ({x:.1}, {z:.1}) +{} -{} chunks, {tiles} tiles, {visible} objects",
                delta.entered.len(),
                delta.exited.len()
            );
        }
    }

    format!(
        "Walk: {steps} steps from ({:.1}, {:.1}) to ({x:.1}, {z:.1}), {} moved, {} turns\n\
         Chunks: {} built, {} dropped, {} resident\n\
         Peak visible: {} tiles, {} objects",
        spawn.x,
        spawn.z,
        totals.moved,
        totals.turns,
        totals.chunks_built,
        totals.chunks_dropped,
        cache.len(),
        totals.peak_tiles,
        totals.peak_objects
    )
}
