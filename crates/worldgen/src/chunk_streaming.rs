//! Incremental chunk visibility for renderers.
//!
//! Each frame the visible chunk set is diffed against the previous one so a
//! renderer only builds entered chunks and drops exited ones.

use std::collections::{HashMap, HashSet};

use crate::grid::{Tile, TileGrid};
use crate::spatial_query::VisibleBox;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId {
    pub cx: i32,
    pub cz: i32,
}

impl ChunkId {
    pub fn new(cx: i32, cz: i32) -> Self {
        Self { cx, cz }
    }

    pub fn containing(x: i32, z: i32, chunk_size: usize) -> Self {
        let size = chunk_size.max(1) as i32;
        Self::new(x.div_euclid(size), z.div_euclid(size))
    }
}

/// Chunk set changes since the previous update, both sorted by `ChunkId`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkDelta {
    pub entered: Vec<ChunkId>,
    pub exited: Vec<ChunkId>,
}

impl ChunkDelta {
    pub fn is_empty(&self) -> bool {
        self.entered.is_empty() && self.exited.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ChunkStreamer {
    chunk_size: usize,
    current: HashSet<ChunkId>,
    next: HashSet<ChunkId>,
}

impl ChunkStreamer {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            current: HashSet::new(),
            next: HashSet::new(),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn is_visible(&self, id: ChunkId) -> bool {
        self.current.contains(&id)
    }

    pub fn visible_count(&self) -> usize {
        self.current.len()
    }

    /// Chunks currently visible, sorted.
    pub fn visible(&self) -> Vec<ChunkId> {
        let mut ids: Vec<ChunkId> = self.current.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Recompute the visible chunk set for a viewer at `(cx, cz)`.
    pub fn update(&mut self, grid: &TileGrid, cx: f32, cz: f32, radius: f32) -> ChunkDelta {
        self.next.clear();
        if let Some(b) = VisibleBox::around(grid.width, grid.height, cx, cz, radius) {
            let lo = ChunkId::containing(b.min_x, b.min_z, self.chunk_size);
            let hi = ChunkId::containing(b.max_x, b.max_z, self.chunk_size);
            for chunk_z in lo.cz..=hi.cz {
                for chunk_x in lo.cx..=hi.cx {
                    self.next.insert(ChunkId::new(chunk_x, chunk_z));
                }
            }
        }

        let mut delta = ChunkDelta {
            entered: self.next.difference(&self.current).copied().collect(),
            exited: self.current.difference(&self.next).copied().collect(),
        };
        delta.entered.sort_unstable();
        delta.exited.sort_unstable();

        std::mem::swap(&mut self.current, &mut self.next);
        delta
    }
}

/// Tiles of one chunk, row by row. Empty for chunks off the map.
pub fn chunk_tiles(grid: &TileGrid, chunk_size: usize, id: ChunkId) -> impl Iterator<Item = &Tile> + '_ {
    let size = chunk_size.max(1) as i32;
    let (x0, z0) = (id.cx * size, id.cz * size);
    (z0..z0 + size).flat_map(move |z| (x0..x0 + size).filter_map(move |x| grid.get(x, z)))
}

/// One built payload per visible chunk.
#[derive(Debug, Clone)]
pub struct ChunkCache<T> {
    entries: HashMap<ChunkId, T>,
}

impl<T> Default for ChunkCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> ChunkCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop exited chunks and build entered ones. Returns the dropped payloads
    /// so the caller can release whatever they own.
    pub fn apply(&mut self, delta: &ChunkDelta, mut build: impl FnMut(ChunkId) -> T) -> Vec<T> {
        let dropped = delta
            .exited
            .iter()
            .filter_map(|id| self.entries.remove(id))
            .collect();
        for &id in &delta.entered {
            self.entries.entry(id).or_insert_with(|| build(id));
        }
        dropped
    }

    pub fn get(&self, id: ChunkId) -> Option<&T> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
