use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::rng::WorldRng;

/// Surface classification of a tile. Ordering is stable and used as an index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TileType {
    Water,
    Grass,
    Terrain,
    Rock,
    Road,
    City,
    CityRoad,
    House,
}

impl TileType {
    pub const COUNT: usize = 8;

    pub const ALL: [TileType; TileType::COUNT] = [
        TileType::Water,
        TileType::Grass,
        TileType::Terrain,
        TileType::Rock,
        TileType::Road,
        TileType::City,
        TileType::CityRoad,
        TileType::House,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            TileType::Water => "water",
            TileType::Grass => "grass",
            TileType::Terrain => "terrain",
            TileType::Rock => "rock",
            TileType::Road => "road",
            TileType::City => "city",
            TileType::CityRoad => "city_road",
            TileType::House => "house",
        }
    }

    /// Either kind of paved tile.
    pub fn is_road(self) -> bool {
        matches!(self, TileType::Road | TileType::CityRoad)
    }
}

/// Building metadata carried by every tile of a house footprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HouseInfo {
    pub height: f32,
    pub width: u32,
    pub depth: u32,
    pub origin_x: i32,
    pub origin_z: i32,
}

impl HouseInfo {
    pub fn contains(&self, x: i32, z: i32) -> bool {
        x >= self.origin_x
            && z >= self.origin_z
            && x < self.origin_x + self.width as i32
            && z < self.origin_z + self.depth as i32
    }
}

/// Tile payload. House metadata lives inside its variant so a tile can never
/// carry building data without being a house.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TileKind {
    Water,
    Grass,
    Terrain,
    Rock,
    Road,
    City,
    CityRoad,
    House(HouseInfo),
}

impl TileKind {
    pub fn tile_type(&self) -> TileType {
        match self {
            TileKind::Water => TileType::Water,
            TileKind::Grass => TileType::Grass,
            TileKind::Terrain => TileType::Terrain,
            TileKind::Rock => TileType::Rock,
            TileKind::Road => TileType::Road,
            TileKind::City => TileType::City,
            TileKind::CityRoad => TileType::CityRoad,
            TileKind::House(_) => TileType::House,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub x: i32,
    pub z: i32,
    pub height: f32,
    pub kind: TileKind,
}

impl Tile {
    #[inline]
    pub fn tile_type(&self) -> TileType {
        self.kind.tile_type()
    }

    pub fn house(&self) -> Option<&HouseInfo> {
        match &self.kind {
            TileKind::House(info) => Some(info),
            _ => None,
        }
    }

    /// Centre of the tile in tile units.
    pub fn center(&self) -> (f32, f32) {
        (self.x as f32 + 0.5, self.z as f32 + 0.5)
    }
}

/// Pack tile coordinates into one hashable integer.
#[inline]
pub fn tile_key(x: i32, z: i32) -> u64 {
    ((x as u32 as u64) << 32) | (z as u32 as u64)
}

#[inline]
pub fn unpack_tile_key(key: u64) -> (i32, i32) {
    ((key >> 32) as u32 as i32, key as u32 as i32)
}

/// Per-type tile tally, indexed by [`TileType::index`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeCounts(pub [usize; TileType::COUNT]);

impl TypeCounts {
    pub fn get(&self, tile_type: TileType) -> usize {
        self.0[tile_type.index()]
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }
}

/// Dense row-major tile store. `index = z * width + x`.
#[derive(Resource, Debug, Clone)]
pub struct TileGrid {
    pub tiles: Vec<Tile>,
    pub width: usize,
    pub height: usize,
}

impl TileGrid {
    /// Flat grass grid at height 0.
    pub fn new(width: usize, height: usize) -> Self {
        Self::from_fn(width, height, |_, _| (0.0, TileKind::Grass))
    }

    pub fn from_fn(
        width: usize,
        height: usize,
        mut f: impl FnMut(i32, i32) -> (f32, TileKind),
    ) -> Self {
        let mut tiles = Vec::with_capacity(width * height);
        for z in 0..height as i32 {
            for x in 0..width as i32 {
                let (height, kind) = f(x, z);
                tiles.push(Tile { x, z, height, kind });
            }
        }
        Self {
            tiles,
            width,
            height,
        }
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, z: i32) -> bool {
        x >= 0 && z >= 0 && (x as usize) < self.width && (z as usize) < self.height
    }

    #[inline]
    pub fn index(&self, x: i32, z: i32) -> Option<usize> {
        if self.in_bounds(x, z) {
            Some(z as usize * self.width + x as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn get(&self, x: i32, z: i32) -> Option<&Tile> {
        self.index(x, z).map(|i| &self.tiles[i])
    }

    #[inline]
    pub fn get_mut(&mut self, x: i32, z: i32) -> Option<&mut Tile> {
        let i = self.index(x, z)?;
        Some(&mut self.tiles[i])
    }

    #[inline]
    pub fn type_at(&self, x: i32, z: i32) -> Option<TileType> {
        self.get(x, z).map(Tile::tile_type)
    }

    /// Overwrite a tile's kind and ground height. Out-of-range writes are ignored
    /// and report `false`.
    pub fn set(&mut self, x: i32, z: i32, kind: TileKind, height: f32) -> bool {
        match self.get_mut(x, z) {
            Some(tile) => {
                tile.kind = kind;
                tile.height = height;
                true
            }
            None => false,
        }
    }

    /// Ground height under a continuous position in tile units. 0 off the map.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        self.get(x.floor() as i32, z.floor() as i32)
            .map(|t| t.height)
            .unwrap_or(0.0)
    }

    /// Tile type under a continuous position. `Terrain` off the map.
    pub fn terrain_type_at(&self, x: f32, z: f32) -> TileType {
        self.type_at(x.floor() as i32, z.floor() as i32)
            .unwrap_or(TileType::Terrain)
    }

    pub fn world_to_tile(world_x: f32, world_z: f32, tile_size: f32) -> (f32, f32) {
        (world_x / tile_size, world_z / tile_size)
    }

    pub fn tile_to_world(x: i32, z: i32, tile_size: f32) -> (f32, f32) {
        (
            x as f32 * tile_size + tile_size * 0.5,
            z as f32 * tile_size + tile_size * 0.5,
        )
    }

    /// Returns up to 4 cardinal neighbors and the count of valid entries,
    /// in the order +x, -x, +z, -z.
    /// Use `&result[..count]` to iterate over valid neighbors.
    pub fn neighbors4(&self, x: i32, z: i32) -> ([(i32, i32); 4], usize) {
        let mut result = [(0, 0); 4];
        let mut count = 0;
        for (dx, dz) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            let (nx, nz) = (x + dx, z + dz);
            if self.in_bounds(nx, nz) {
                result[count] = (nx, nz);
                count += 1;
            }
        }
        (result, count)
    }

    pub fn count(&self, tile_type: TileType) -> usize {
        self.tiles
            .iter()
            .filter(|t| t.tile_type() == tile_type)
            .count()
    }

    pub fn type_counts(&self) -> TypeCounts {
        let mut counts = TypeCounts::default();
        for tile in &self.tiles {
            counts.0[tile.tile_type().index()] += 1;
        }
        counts
    }

    /// Centre of a uniformly chosen inter-city `Road` tile, or the map centre
    /// when the map has none.
    pub fn find_random_road_position(&self, rng: &mut WorldRng) -> (f32, f32) {
        let roads: Vec<&Tile> = self
            .tiles
            .iter()
            .filter(|t| t.tile_type() == TileType::Road)
            .collect();
        if roads.is_empty() {
            return (self.width as f32 / 2.0, self.height as f32 / 2.0);
        }
        roads[rng.index(roads.len())].center()
    }
}
