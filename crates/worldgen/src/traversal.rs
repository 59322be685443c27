//! Movement rules consumed by walking entities.

use bevy::prelude::*;

use crate::config::TileRules;
use crate::grid::{TileGrid, TileType};

#[derive(Resource, Debug, Clone, Default)]
pub struct TraversalRules {
    pub rules: TileRules,
}

impl TraversalRules {
    pub fn new(rules: TileRules) -> Self {
        Self { rules }
    }

    /// Speed multiplier under a continuous position. 1.0 off the map.
    pub fn speed_multiplier_at(&self, grid: &TileGrid, x: f32, z: f32) -> f32 {
        grid.type_at(x.floor() as i32, z.floor() as i32)
            .map(|t| self.rules.get(t).speed_multiplier)
            .unwrap_or(1.0)
    }

    pub fn is_walkable(&self, tile_type: TileType) -> bool {
        self.rules.get(tile_type).walkable
    }

    /// A body of `radius` can stand at `(x, z)` when its centre and the eight
    /// axis and diagonal offsets all land on walkable tiles inside the map.
    pub fn can_occupy(&self, grid: &TileGrid, x: f32, z: f32, radius: f32) -> bool {
        const OFFSETS: [(f32, f32); 9] = [
            (0.0, 0.0),
            (1.0, 0.0),
            (-1.0, 0.0),
            (0.0, 1.0),
            (0.0, -1.0),
            (1.0, 1.0),
            (-1.0, 1.0),
            (1.0, -1.0),
            (-1.0, -1.0),
        ];
        OFFSETS.iter().all(|&(dx, dz)| {
            let tx = (x + dx * radius).floor() as i32;
            let tz = (z + dz * radius).floor() as i32;
            grid.type_at(tx, tz).is_some_and(|t| self.is_walkable(t))
        })
    }
}
