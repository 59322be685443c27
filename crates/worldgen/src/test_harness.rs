//! # TestWorld: headless harness for generation tests
//!
//! Wraps a `bevy::app::App` with `MinimalPlugins` and [`WorldGenPlugin`] so
//! tests drive generation exactly the way a host does, then read the
//! generated resources back out of the ECS world.

use bevy::app::App;
use bevy::prelude::*;

use crate::cities::CityRegistry;
use crate::config::{CitySizeCount, WorldGenConfig};
use crate::grid::TileGrid;
use crate::pipeline::GenerationStats;
use crate::spatial_query::WorldObjects;
use crate::traversal::TraversalRules;
use crate::world_init::{SkipWorldGen, SpawnPoint};
use crate::WorldGenPlugin;

/// Small default map so the full pipeline stays fast under test.
pub const TEST_MAP_SIZE: usize = 128;

pub struct TestWorld {
    app: App,
}

/// Fluent builder over a [`WorldGenConfig`].
pub struct TestWorldBuilder {
    config: WorldGenConfig,
}

impl TestWorldBuilder {
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn size(mut self, width: usize, height: usize) -> Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    /// Only terrain synthesis and normalization.
    pub fn terrain_only(mut self) -> Self {
        self.config = WorldGenConfig::terrain_only(self.config.width, self.config.height, self.config.seed);
        self
    }

    pub fn cities(mut self, table: &[(u32, u32)]) -> Self {
        self.config.cities.enabled = true;
        self.config.cities.sizes = table
            .iter()
            .map(|&(size, count)| CitySizeCount { size, count })
            .collect();
        self
    }

    pub fn city_spacing(mut self, spacing: f32) -> Self {
        self.config.cities.min_spacing = spacing;
        self
    }

    pub fn rivers(mut self, enabled: bool) -> Self {
        self.config.rivers.enabled = enabled;
        self
    }

    pub fn roads(mut self, enabled: bool) -> Self {
        self.config.roads.enabled = enabled;
        self
    }

    pub fn houses(mut self, enabled: bool) -> Self {
        self.config.houses.enabled = enabled;
        self
    }

    pub fn trees(mut self, enabled: bool) -> Self {
        self.config.trees.enabled = enabled;
        self
    }

    /// Arbitrary config edits for knobs without a dedicated method.
    pub fn configure(mut self, f: impl FnOnce(&mut WorldGenConfig)) -> Self {
        f(&mut self.config);
        self
    }

    pub fn config(&self) -> &WorldGenConfig {
        &self.config
    }

    /// Build the app and run one update so the `Startup` generation runs.
    pub fn build(self) -> TestWorld {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(self.config);
        app.add_plugins(WorldGenPlugin);
        app.update();
        TestWorld { app }
    }
}

impl TestWorld {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// A 128x128 world with two small cities and one medium city.
    pub fn builder() -> TestWorldBuilder {
        let mut config = WorldGenConfig {
            width: TEST_MAP_SIZE,
            height: TEST_MAP_SIZE,
            ..WorldGenConfig::default()
        };
        config.cities.sizes = vec![
            CitySizeCount { size: 32, count: 1 },
            CitySizeCount { size: 16, count: 2 },
        ];
        config.cities.min_spacing = 40.0;
        config.roads.destination_count = 8;
        TestWorldBuilder { config }
    }

    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Skip generation and start from a hand-built grid.
    pub fn from_grid(grid: TileGrid) -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(SkipWorldGen);
        app.add_plugins(WorldGenPlugin);
        app.insert_resource(grid);
        app.insert_resource(CityRegistry::default());
        app.insert_resource(WorldObjects::default());
        app.update();
        Self { app }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    pub fn resource<T: Resource>(&self) -> &T {
        self.app.world().resource::<T>()
    }

    pub fn has_resource<T: Resource>(&self) -> bool {
        self.app.world().contains_resource::<T>()
    }

    pub fn config(&self) -> &WorldGenConfig {
        self.resource::<WorldGenConfig>()
    }

    pub fn grid(&self) -> &TileGrid {
        self.resource::<TileGrid>()
    }

    pub fn cities(&self) -> &CityRegistry {
        self.resource::<CityRegistry>()
    }

    pub fn objects(&self) -> &WorldObjects {
        self.resource::<WorldObjects>()
    }

    pub fn stats(&self) -> &GenerationStats {
        self.resource::<GenerationStats>()
    }

    pub fn spawn(&self) -> SpawnPoint {
        *self.resource::<SpawnPoint>()
    }

    pub fn traversal(&self) -> &TraversalRules {
        self.resource::<TraversalRules>()
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}
