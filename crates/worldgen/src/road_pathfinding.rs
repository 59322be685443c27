use std::cell::Cell;

use pathfinding::prelude::astar;

use crate::grid::{Tile, TileGrid};

/// Step costs are fractional; the search runs on integers scaled by this.
pub const COST_SCALE: f32 = 100.0;

pub type TilePos = (i32, i32);

#[derive(Debug, Clone, PartialEq)]
pub struct GridPath {
    /// Start to end inclusive.
    pub tiles: Vec<TilePos>,
    /// Sum of step costs in unscaled units.
    pub cost: f32,
}

impl GridPath {
    pub fn end(&self) -> TilePos {
        self.tiles.last().copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

#[inline]
fn scaled(cost: f32) -> u32 {
    ((cost * COST_SCALE).round() as u32).max(1)
}

#[inline]
pub fn manhattan(a: TilePos, b: TilePos) -> u32 {
    (a.0 - b.0).unsigned_abs() + (a.1 - b.1).unsigned_abs()
}

/// 4-connected A* over the tile grid.
///
/// `step_cost` prices entering a tile; `is_success` decides termination and is
/// also checked on `start`. The heuristic is Manhattan distance to `goal`.
/// At most `max_iterations` nodes are expanded; exhausting the budget is
/// reported as no path, the same as exhausting the open set.
pub fn find_grid_path<C, S>(
    grid: &TileGrid,
    start: TilePos,
    goal: TilePos,
    max_iterations: u32,
    step_cost: C,
    is_success: S,
) -> Option<GridPath>
where
    C: Fn(&Tile, TilePos) -> f32,
    S: Fn(TilePos) -> bool,
{
    if !grid.in_bounds(start.0, start.1) {
        return None;
    }

    let expanded = Cell::new(0u32);
    let exhausted = Cell::new(false);

    let result = astar(
        &start,
        |&(x, z)| {
            let mut out: Vec<(TilePos, u32)> = Vec::with_capacity(4);
            if expanded.get() >= max_iterations {
                exhausted.set(true);
                return out;
            }
            expanded.set(expanded.get() + 1);
            let (neighbors, count) = grid.neighbors4(x, z);
            for &pos in &neighbors[..count] {
                if let Some(tile) = grid.get(pos.0, pos.1) {
                    out.push((pos, scaled(step_cost(tile, pos))));
                }
            }
            out
        },
        |&pos| manhattan(pos, goal) * COST_SCALE as u32,
        |&pos| is_success(pos),
    );

    if exhausted.get() {
        return None;
    }

    result.map(|(tiles, cost)| GridPath {
        tiles,
        cost: cost as f32 / COST_SCALE,
    })
}

/// Plain point-to-point search with a per-tile cost and no early exit.
pub fn find_path_to<C>(
    grid: &TileGrid,
    start: TilePos,
    goal: TilePos,
    max_iterations: u32,
    step_cost: C,
) -> Option<GridPath>
where
    C: Fn(&Tile, TilePos) -> f32,
{
    find_grid_path(grid, start, goal, max_iterations, step_cost, |pos| pos == goal)
}
