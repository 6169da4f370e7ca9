#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure gravity system that compacts every column after blocks are cleared.

use stackrise_core::{BlockId, CellCoord, Command};
use stackrise_world::query::GridView;

/// A single block dropping within its column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fall {
    /// Block that drops.
    pub block: BlockId,
    /// Column the block stays in.
    pub column: u32,
    /// Row the block leaves.
    pub from_row: u32,
    /// Row the block lands on.
    pub to_row: u32,
}

impl Fall {
    /// Cell the block leaves.
    #[must_use]
    pub const fn from(&self) -> CellCoord {
        CellCoord::new(self.column, self.from_row)
    }

    /// Cell the block lands on.
    #[must_use]
    pub const fn to(&self) -> CellCoord {
        CellCoord::new(self.column, self.to_row)
    }

    /// Number of rows the block drops.
    #[must_use]
    pub const fn distance(&self) -> u32 {
        self.from_row - self.to_row
    }
}

/// Stateless resolver that computes how far every block must drop.
#[derive(Clone, Copy, Debug, Default)]
pub struct GravityResolver;

impl GravityResolver {
    /// Computes the falls that compact every column.
    ///
    /// Columns are scanned bottom to top while counting the empty cells seen
    /// so far; each occupied cell drops by that count. One pass is exhaustive
    /// and the falls are ordered so applying them in sequence never targets
    /// an occupied cell.
    #[must_use]
    pub fn compute_fall(&self, view: GridView<'_>) -> Vec<Fall> {
        let (columns, rows) = view.dimensions();
        let mut falls = Vec::new();
        for column in 0..columns {
            let mut drop_distance = 0;
            for row in 0..rows {
                match view.occupant(CellCoord::new(column, row)) {
                    None => drop_distance += 1,
                    Some(block) if drop_distance > 0 => falls.push(Fall {
                        block,
                        column,
                        from_row: row,
                        to_row: row - drop_distance,
                    }),
                    Some(_) => {}
                }
            }
        }
        falls
    }

    /// Emits the move commands that realise the provided falls.
    pub fn commands(&self, falls: &[Fall], out: &mut Vec<Command>) {
        out.extend(falls.iter().map(|fall| Command::MoveBlock {
            from: fall.from(),
            to: fall.to(),
        }));
    }

    /// Reports whether no occupied cell sits above an empty one.
    #[must_use]
    pub fn is_settled(&self, view: GridView<'_>) -> bool {
        self.compute_fall(view).is_empty()
    }
}
