//! Scripted swap requests supplied on the command line.

use std::fmt;

use anyhow::{bail, Context, Result};
use stackrise_core::{CellCoord, Direction};

/// Swap of the block at `cell` toward its neighbour in `direction`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SwapRequest {
    pub(crate) cell: CellCoord,
    pub(crate) direction: Direction,
}

impl fmt::Display for SwapRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{}:{:?}",
            self.cell.column(),
            self.cell.row(),
            self.direction
        )
    }
}

/// Parses `column,row:direction`, e.g. `2,3:left`.
pub(crate) fn parse_swap(value: &str) -> Result<SwapRequest> {
    let Some((position, direction)) = value.split_once(':') else {
        bail!("swap `{value}` must look like `column,row:direction`");
    };
    let Some((column, row)) = position.split_once(',') else {
        bail!("swap position `{position}` must look like `column,row`");
    };
    let column = column
        .trim()
        .parse::<u32>()
        .with_context(|| format!("invalid column in swap `{value}`"))?;
    let row = row
        .trim()
        .parse::<u32>()
        .with_context(|| format!("invalid row in swap `{value}`"))?;
    let direction = match direction.trim().to_ascii_lowercase().as_str() {
        "up" | "u" => Direction::Up,
        "down" | "d" => Direction::Down,
        "left" | "l" => Direction::Left,
        "right" | "r" => Direction::Right,
        other => bail!("unknown direction `{other}` in swap `{value}`"),
    };
    Ok(SwapRequest {
        cell: CellCoord::new(column, row),
        direction,
    })
}
