//! Decorative objects emitted by the generators.
//!
//! Generators emit [`ObjectSpawn`]s; only spawns that pass
//! [`validate_spawns`] become [`TileObject`]s in the world.

use std::sync::Arc;

use bevy::prelude::*;

use crate::config::ObjectConfig;
use crate::grid::TileGrid;

/// An object as a generator proposes it. Positions are fractional tile coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSpawn {
    pub x: f32,
    pub z: f32,
    pub kind: String,
    pub config: Option<Arc<ObjectConfig>>,
}

impl ObjectSpawn {
    pub fn new(x: f32, z: f32, kind: &str, config: &Arc<ObjectConfig>) -> Self {
        Self {
            x,
            z,
            kind: kind.to_string(),
            config: Some(Arc::clone(config)),
        }
    }
}

/// A validated object. Every object of one kind shares a single config.
#[derive(Debug, Clone, PartialEq)]
pub struct TileObject {
    pub x: f32,
    pub z: f32,
    pub kind: String,
    pub config: Arc<ObjectConfig>,
}

impl TileObject {
    /// Integer tile the object stands on.
    #[inline]
    pub fn tile(&self) -> (i32, i32) {
        (self.x.floor() as i32, self.z.floor() as i32)
    }
}

/// Why a spawn was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnDefect {
    MissingConfig,
    EmptyKind,
    NonFinitePosition,
    OffMap,
}

pub fn check_spawn(spawn: &ObjectSpawn, grid: &TileGrid) -> Result<Arc<ObjectConfig>, SpawnDefect> {
    if spawn.kind.is_empty() {
        return Err(SpawnDefect::EmptyKind);
    }
    if !spawn.x.is_finite() || !spawn.z.is_finite() {
        return Err(SpawnDefect::NonFinitePosition);
    }
    if !grid.in_bounds(spawn.x.floor() as i32, spawn.z.floor() as i32) {
        return Err(SpawnDefect::OffMap);
    }
    spawn.config.clone().ok_or(SpawnDefect::MissingConfig)
}

/// Convert spawns into world objects, dropping malformed ones with a warning.
/// Returns the objects and the number dropped.
pub fn validate_spawns(spawns: Vec<ObjectSpawn>, grid: &TileGrid) -> (Vec<TileObject>, usize) {
    let mut objects = Vec::with_capacity(spawns.len());
    let mut dropped = 0;
    for spawn in spawns {
        match check_spawn(&spawn, grid) {
            Ok(config) => objects.push(TileObject {
                x: spawn.x,
                z: spawn.z,
                kind: spawn.kind,
                config,
            }),
            Err(defect) => {
                warn!(
                    "Dropping object '{}' at ({}, {}): {:?}",
                    spawn.kind, spawn.x, spawn.z, defect
                );
                dropped += 1;
            }
        }
    }
    (objects, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Arc<ObjectConfig> {
        Arc::new(ObjectConfig::tree())
    }

    #[test]
    fn test_valid_spawn_kept() {
        let grid = TileGrid::new(8, 8);
        let (objects, dropped) = validate_spawns(vec![ObjectSpawn::new(3.4, 5.9, "tree", &tree())], &grid);
        assert_eq!(dropped, 0);
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].tile(), (3, 5));
    }

    #[test]
    fn test_missing_config_dropped() {
        let grid = TileGrid::new(8, 8);
        let spawn = ObjectSpawn {
            x: 1.0,
            z: 1.0,
            kind: "tree".to_string(),
            config: None,
        };
        assert_eq!(check_spawn(&spawn, &grid), Err(SpawnDefect::MissingConfig));
        let (objects, dropped) = validate_spawns(vec![spawn], &grid);
        assert!(objects.is_empty());
        assert_eq!(dropped, 1);
    }

    #[test]
    fn test_bad_positions_dropped() {
        let grid = TileGrid::new(8, 8);
        let config = tree();
        let nan = ObjectSpawn::new(f32::NAN, 1.0, "tree", &config);
        let off = ObjectSpawn::new(-0.1, 1.0, "tree", &config);
        let far = ObjectSpawn::new(1.0, 8.0, "tree", &config);
        let unnamed = ObjectSpawn::new(1.0, 1.0, "", &config);
        assert_eq!(check_spawn(&nan, &grid), Err(SpawnDefect::NonFinitePosition));
        assert_eq!(check_spawn(&off, &grid), Err(SpawnDefect::OffMap));
        assert_eq!(check_spawn(&far, &grid), Err(SpawnDefect::OffMap));
        assert_eq!(check_spawn(&unnamed, &grid), Err(SpawnDefect::EmptyKind));
    }

    #[test]
    fn test_objects_share_config() {
        let grid = TileGrid::new(8, 8);
        let config = tree();
        let spawns = (0..4).map(|i| ObjectSpawn::new(i as f32, 0.5, "tree", &config)).collect();
        let (objects, _) = validate_spawns(spawns, &grid);
        assert!(objects.iter().all(|o| Arc::ptr_eq(&o.config, &config)));
    }
}
