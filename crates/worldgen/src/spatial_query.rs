//! Per-frame visibility queries over the finished world.
//!
//! All queries use square (not circular) visibility: the inclusive tile box
//! `[floor(c - r), floor(c + r)]` clamped to the map.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use bevy::prelude::*;

use crate::grid::{Tile, TileGrid};
use crate::object_index::ObjectIndex;
use crate::objects::TileObject;

/// Inclusive tile rectangle clamped to the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleBox {
    pub min_x: i32,
    pub min_z: i32,
    pub max_x: i32,
    pub max_z: i32,
}

impl VisibleBox {
    /// `None` when the box misses the map entirely.
    pub fn around(width: usize, height: usize, cx: f32, cz: f32, radius: f32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let b = Self {
            min_x: ((cx - radius).floor() as i32).max(0),
            min_z: ((cz - radius).floor() as i32).max(0),
            max_x: ((cx + radius).floor() as i32).min(width as i32 - 1),
            max_z: ((cz + radius).floor() as i32).min(height as i32 - 1),
        };
        (b.min_x <= b.max_x && b.min_z <= b.max_z).then_some(b)
    }

    #[inline]
    pub fn contains(&self, x: i32, z: i32) -> bool {
        x >= self.min_x && x <= self.max_x && z >= self.min_z && z <= self.max_z
    }

    pub fn tile_count(&self) -> usize {
        ((self.max_x - self.min_x + 1) * (self.max_z - self.min_z + 1)) as usize
    }
}

/// Tiles in the visible box, row by row. Allocation-free.
pub fn visible_tiles<'a>(grid: &'a TileGrid, cx: f32, cz: f32, radius: f32) -> impl Iterator<Item = &'a Tile> + 'a {
    VisibleBox::around(grid.width, grid.height, cx, cz, radius)
        .into_iter()
        .flat_map(move |b| {
            (b.min_z..=b.max_z).flat_map(move |z| {
                let row = z as usize * grid.width;
                grid.tiles[row + b.min_x as usize..=row + b.max_x as usize].iter()
            })
        })
}

/// Wrap an angle into `[-PI, PI)`.
pub fn normalize_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// The finished object list plus its bucket index.
#[derive(Resource, Debug, Clone, Default)]
pub struct WorldObjects {
    objects: Vec<TileObject>,
    index: ObjectIndex,
    width: usize,
    height: usize,
}

impl WorldObjects {
    pub fn new(objects: Vec<TileObject>, width: usize, height: usize, bucket_size: usize) -> Self {
        let index = ObjectIndex::build(&objects, width, height, bucket_size);
        Self {
            objects,
            index,
            width,
            height,
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn as_slice(&self) -> &[TileObject] {
        &self.objects
    }

    fn visible_box(&self, cx: f32, cz: f32, radius: f32) -> Option<VisibleBox> {
        VisibleBox::around(self.width, self.height, cx, cz, radius)
    }

    /// Linear scan over every object.
    pub fn visible_objects(&self, cx: f32, cz: f32, radius: f32) -> impl Iterator<Item = &TileObject> + '_ {
        let b = self.visible_box(cx, cz, radius);
        self.objects.iter().filter(move |o| {
            let (x, z) = o.tile();
            b.is_some_and(|b| b.contains(x, z))
        })
    }

    /// Same result and order as [`Self::visible_objects`], through the bucket index.
    pub fn visible_indexed(&self, cx: f32, cz: f32, radius: f32) -> Vec<&TileObject> {
        let Some(b) = self.visible_box(cx, cz, radius) else {
            return Vec::new();
        };
        self.index
            .query_rect(b.min_x, b.min_z, b.max_x, b.max_z)
            .into_iter()
            .map(|i| &self.objects[i as usize])
            .filter(|o| {
                let (x, z) = o.tile();
                b.contains(x, z)
            })
            .collect()
    }

    /// Objects ahead of `facing` (radians, atan2 convention on x/z) use
    /// `forward_radius`; objects behind use `backward_radius`.
    pub fn visible_objects_directional(
        &self,
        cx: f32,
        cz: f32,
        facing: f32,
        forward_radius: f32,
        backward_radius: f32,
    ) -> impl Iterator<Item = &TileObject> + '_ {
        let forward = self.visible_box(cx, cz, forward_radius);
        let backward = self.visible_box(cx, cz, backward_radius);
        self.objects.iter().filter(move |o| {
            let angle = normalize_angle((o.z - cz).atan2(o.x - cx) - facing);
            let b = if angle.abs() <= FRAC_PI_2 { forward } else { backward };
            let (x, z) = o.tile();
            b.is_some_and(|b| b.contains(x, z))
        })
    }
}
