//! ASCII overview of a generated world.
//!
//! Each character of the overview stands for a `block x block` square of
//! tiles and shows the highest-priority tile type inside it. Built on demand
//! from `&TileGrid`.

use crate::grid::{TileGrid, TileType};

// -----------------------------------------------------------------------
// Character encoding
// -----------------------------------------------------------------------

pub fn tile_to_char(tile_type: TileType) -> char {
    match tile_type {
        TileType::Water => '~',
        TileType::Grass => '.',
        TileType::Terrain => ',',
        TileType::Rock => '^',
        TileType::Road => '#',
        TileType::City => 'c',
        TileType::CityRoad => '=',
        TileType::House => 'H',
    }
}

/// Higher value wins the block.
fn priority(tile_type: TileType) -> u8 {
    match tile_type {
        TileType::House => 7,
        TileType::CityRoad => 6,
        TileType::Road => 5,
        TileType::City => 4,
        TileType::Water => 3,
        TileType::Rock => 2,
        TileType::Terrain => 1,
        TileType::Grass => 0,
    }
}

// -----------------------------------------------------------------------
// Overview map
// -----------------------------------------------------------------------

/// Build an overview of the whole grid, one character per `block` tiles
/// square, with coordinate headers and a legend.
pub fn build_overview_map(grid: &TileGrid, block: usize) -> String {
    let block = block.max(1);
    let cols = grid.width.div_ceil(block);
    let rows = grid.height.div_ceil(block);

    let mut lines: Vec<String> = Vec::with_capacity(rows + 8);

    // Column header: real tile coordinate every 8 overview columns
    let mut col_header = String::from("       ");
    for col in (0..cols).step_by(8) {
        col_header.push_str(&format!("{:<8}", col * block));
    }
    lines.push(col_header.trim_end().to_string());

    for row in 0..rows {
        let mut line = if row % 4 == 0 {
            format!("{:>4} | ", row * block)
        } else {
            "     | ".to_string()
        };
        for col in 0..cols {
            line.push(dominant_char(grid, col * block, row * block, block));
        }
        lines.push(line);
    }

    lines.push(String::new());
    append_legend(&mut lines);
    lines.join("\n")
}

fn dominant_char(grid: &TileGrid, x0: usize, z0: usize, block: usize) -> char {
    let mut best = TileType::Grass;
    for z in z0..(z0 + block).min(grid.height) {
        for x in x0..(x0 + block).min(grid.width) {
            if let Some(t) = grid.type_at(x as i32, z as i32) {
                if priority(t) > priority(best) {
                    best = t;
                }
            }
        }
    }
    tile_to_char(best)
}

fn append_legend(lines: &mut Vec<String>) {
    lines.push("Legend:".to_string());
    lines.push("  .=Grass  ,=Terrain  ^=Rock  ~=Water".to_string());
    lines.push("  #=Road  c=City  ==CityRoad  H=House".to_string());
}
