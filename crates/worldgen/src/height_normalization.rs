//! Height relaxation across same-level-group tile boundaries.
//!
//! Each pass walks the grid in raster order (z outer, x inner) and updates
//! heights in place, so a tile sees neighbours already updated earlier in the
//! same pass. Output therefore depends on the visiting order and must not be
//! double-buffered.

use crate::config::NormalizationParams;
use crate::grid::{TileGrid, TileType};

/// Symmetric lookup of "do these two tile types share a level group".
#[derive(Debug, Clone)]
pub struct LevelGroups {
    shares: [[bool; TileType::COUNT]; TileType::COUNT],
}

impl LevelGroups {
    pub fn new(groups: &[Vec<TileType>]) -> Self {
        let mut shares = [[false; TileType::COUNT]; TileType::COUNT];
        for group in groups {
            for &a in group {
                for &b in group {
                    shares[a.index()][b.index()] = true;
                }
            }
        }
        Self { shares }
    }

    #[inline]
    pub fn share(&self, a: TileType, b: TileType) -> bool {
        self.shares[a.index()][b.index()]
    }
}

/// Average absolute height delta over every adjacent shared-group pair,
/// before normalization and after each pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizationReport {
    pub before: f64,
    pub after_pass: Vec<f64>,
    pub pair_count: usize,
}

impl NormalizationReport {
    pub fn after(&self) -> f64 {
        self.after_pass.last().copied().unwrap_or(self.before)
    }
}

/// Mean |Δh| over 4-connected pairs whose types share a level group.
/// Returns `(mean, pair_count)`; the mean is 0 when there are no pairs.
pub fn average_group_delta(grid: &TileGrid, groups: &LevelGroups) -> (f64, usize) {
    let mut total = 0.0f64;
    let mut pairs = 0usize;
    for tile in &grid.tiles {
        for (dx, dz) in [(1, 0), (0, 1)] {
            let Some(other) = grid.get(tile.x + dx, tile.z + dz) else {
                continue;
            };
            if groups.share(tile.tile_type(), other.tile_type()) {
                total += (tile.height - other.height).abs() as f64;
                pairs += 1;
            }
        }
    }
    if pairs == 0 {
        (0.0, 0)
    } else {
        (total / pairs as f64, pairs)
    }
}

/// Run the relaxation passes on `grid` and report the average delta trend.
pub fn normalize_heights(grid: &mut TileGrid, params: &NormalizationParams) -> NormalizationReport {
    let groups = LevelGroups::new(&params.level_groups);
    let (before, pair_count) = average_group_delta(grid, &groups);
    let mut report = NormalizationReport {
        before,
        after_pass: Vec::with_capacity(params.passes as usize),
        pair_count,
    };

    let keep = 1.0 - params.blend;
    for _ in 0..params.passes {
        for z in 0..grid.height as i32 {
            for x in 0..grid.width as i32 {
                let Some(idx) = grid.index(x, z) else {
                    continue;
                };
                let ty = grid.tiles[idx].tile_type();
                let (neighbors, count) = grid.neighbors4(x, z);
                for &(nx, nz) in &neighbors[..count] {
                    let Some(n_idx) = grid.index(nx, nz) else {
                        continue;
                    };
                    let neighbor = grid.tiles[n_idx];
                    if !groups.share(ty, neighbor.tile_type()) {
                        continue;
                    }
                    let h = grid.tiles[idx].height;
                    if (h - neighbor.height).abs() > params.threshold {
                        let avg = (h + neighbor.height) / 2.0;
                        grid.tiles[idx].height = h * keep + avg * params.blend;
                    }
                }
            }
        }
        report.after_pass.push(average_group_delta(grid, &groups).0);
    }
    report
}
