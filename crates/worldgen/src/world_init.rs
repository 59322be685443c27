use bevy::prelude::*;

use crate::config::WorldGenConfig;
use crate::pipeline::WorldGenerator;
use crate::traversal::TraversalRules;

/// Marker resource that, when present, causes `init_world` to skip
/// generation. Used by the test harness to start from hand-built grids.
#[derive(Resource)]
pub struct SkipWorldGen;

/// Spawn location chosen at generation time, in tile units.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct SpawnPoint {
    pub x: f32,
    pub z: f32,
}

/// Run the whole pipeline once and publish its outputs as resources.
pub fn init_world(mut commands: Commands, config: Res<WorldGenConfig>, skip: Option<Res<SkipWorldGen>>) {
    if skip.is_some() {
        return;
    }

    let (config, world) = match WorldGenerator::generate(&config) {
        Ok(world) => ((*config).clone(), world),
        Err(e) => {
            warn!("{e}; generating with the default config instead");
            let fallback = WorldGenConfig::default();
            match WorldGenerator::generate(&fallback) {
                Ok(world) => (fallback, world),
                Err(e) => {
                    error!("default world config rejected: {e}");
                    return;
                }
            }
        }
    };
    commands.insert_resource(SpawnPoint {
        x: world.spawn.0,
        z: world.spawn.1,
    });
    commands.insert_resource(TraversalRules::new(config.tile_rules.clone()));
    commands.insert_resource(world.grid);
    commands.insert_resource(world.cities);
    commands.insert_resource(world.objects);
    commands.insert_resource(world.stats);
}
