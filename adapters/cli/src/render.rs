//! Plain-text rendering of the grid.

use stackrise_core::CellCoord;
use stackrise_world::{query, World};

/// Renders the grid top row first. Usable blocks print as upper-case
/// symbols, blocks still entering from below as lower-case and empty cells
/// as `.`.
pub(crate) fn grid(world: &World) -> String {
    let view = query::grid_view(world);
    let (columns, rows) = view.dimensions();
    let mut text = String::with_capacity((columns as usize + 3) * rows as usize);
    for row in (0..rows).rev() {
        text.push('|');
        for column in 0..columns {
            let symbol = match view.block_at(CellCoord::new(column, row)) {
                Some(block) if block.usable => block.kind.symbol(),
                Some(block) => block.kind.symbol().to_ascii_lowercase(),
                None => '.',
            };
            text.push(symbol);
        }
        text.push_str("|\n");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackrise_core::{BlockKind, Command};
    use stackrise_world as world;

    #[test]
    fn renders_top_row_first() {
        let mut world = World::new();
        let mut events = Vec::new();
        let commands = [
            Command::ConfigureGrid {
                columns: 3,
                rows: 2,
            },
            Command::PlaceBlock {
                cell: CellCoord::new(0, 0),
                kind: BlockKind::Red,
                usable: false,
            },
            Command::PlaceBlock {
                cell: CellCoord::new(1, 1),
                kind: BlockKind::Purple,
                usable: true,
            },
        ];
        for command in commands {
            world::apply(&mut world, command, &mut events);
        }

        assert_eq!(grid(&world), "|.P.|\n|r..|\n");
    }
}
