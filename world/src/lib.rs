#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative grid state for stackrise.
//!
//! The world owns the dense cell array, the registry of live blocks and the
//! fractional rise offset. Every mutation goes through [`apply`]; read access
//! goes through the [`query`] module.

use std::collections::BTreeMap;

use log::trace;
use stackrise_core::{BlockId, BlockKind, BlockSnapshot, CellCoord, Command, Event};

const DEFAULT_GRID_COLUMNS: u32 = 6;
const DEFAULT_GRID_ROWS: u32 = 10;

/// Represents the authoritative grid state.
#[derive(Debug)]
pub struct World {
    grid: CellGrid,
    blocks: BTreeMap<BlockId, Block>,
    next_block_id: u32,
    rise_offset: f32,
}

impl World {
    /// Creates an empty world using the default grid dimensions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            grid: CellGrid::new(DEFAULT_GRID_COLUMNS, DEFAULT_GRID_ROWS),
            blocks: BTreeMap::new(),
            next_block_id: 0,
            rise_offset: 0.0,
        }
    }

    fn allocate_block_id(&mut self) -> BlockId {
        let id = BlockId::new(self.next_block_id);
        self.next_block_id = self.next_block_id.wrapping_add(1);
        id
    }

    fn relocate(&mut self, block_id: BlockId, from: CellCoord, to: CellCoord, out: &mut Vec<Event>) {
        if let Some(block) = self.blocks.get_mut(&block_id) {
            block.cell = to;
        }
        out.push(Event::BlockMoved {
            block: block_id,
            from,
            to,
        });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Commands that reference an empty cell, an occupied destination, an
/// out-of-bounds coordinate or a block that no longer exists are skipped
/// without emitting events.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureGrid { columns, rows } => {
            for block_id in world.blocks.keys() {
                out_events.push(Event::BlockDestroyed { block: *block_id });
            }
            world.blocks.clear();
            world.grid = CellGrid::new(columns, rows);
            world.rise_offset = 0.0;
            out_events.push(Event::GridConfigured { columns, rows });
        }
        Command::PlaceBlock { cell, kind, usable } => {
            if !world.grid.is_empty(cell) {
                trace!("placement at {cell:?} skipped: cell unavailable");
                return;
            }
            let id = world.allocate_block_id();
            world.grid.occupy(id, cell);
            let _ = world.blocks.insert(
                id,
                Block {
                    id,
                    cell,
                    kind,
                    usable,
                    disappearing: false,
                },
            );
            out_events.push(Event::BlockPlaced {
                block: id,
                cell,
                kind,
                usable,
            });
        }
        Command::SwapCells { first, second } => {
            if !world.grid.contains(first) || !world.grid.contains(second) || first == second {
                return;
            }
            let first_occupant = world.grid.occupant(first);
            let second_occupant = world.grid.occupant(second);
            if first_occupant.is_none() && second_occupant.is_none() {
                return;
            }

            world.grid.set(first, second_occupant);
            world.grid.set(second, first_occupant);
            if let Some(block_id) = first_occupant {
                world.relocate(block_id, first, second, out_events);
            }
            if let Some(block_id) = second_occupant {
                world.relocate(block_id, second, first, out_events);
            }
        }
        Command::MoveBlock { from, to } => {
            let Some(block_id) = world.grid.occupant(from) else {
                return;
            };
            if !world.grid.is_empty(to) {
                return;
            }
            world.grid.set(from, None);
            world.grid.occupy(block_id, to);
            world.relocate(block_id, from, to, out_events);
        }
        Command::MarkDisappearing { cell } => {
            let Some(block_id) = world.grid.occupant(cell) else {
                return;
            };
            world.grid.set(cell, None);
            if let Some(block) = world.blocks.get_mut(&block_id) {
                block.disappearing = true;
            }
            out_events.push(Event::BlockDisappearing {
                block: block_id,
                cell,
            });
        }
        Command::HideBlock { block } => {
            if world.blocks.get(&block).is_some_and(|entry| entry.disappearing) {
                out_events.push(Event::BlockHidden { block });
            } else {
                trace!("hide of {block:?} skipped: block already resolved");
            }
        }
        Command::DestroyBlock { block } => {
            let Some(removed) = world.blocks.remove(&block) else {
                trace!("destroy of {block:?} skipped: block already resolved");
                return;
            };
            if world.grid.occupant(removed.cell) == Some(block) {
                world.grid.set(removed.cell, None);
            }
            out_events.push(Event::BlockDestroyed { block });
        }
        Command::PromoteBlock { block } => {
            let Some(entry) = world.blocks.get_mut(&block) else {
                return;
            };
            if entry.usable {
                return;
            }
            entry.usable = true;
            out_events.push(Event::BlockPromoted {
                block,
                cell: entry.cell,
            });
        }
        Command::SetRiseOffset { offset } => {
            let offset = if offset.is_finite() {
                offset.clamp(0.0, 1.0)
            } else {
                0.0
            };
            world.rise_offset = offset;
            out_events.push(Event::RiseOffsetChanged { offset });
        }
        Command::ShiftRowsUp => {
            let overflowed = world.grid.shift_up();
            for block_id in &overflowed {
                let _ = world.blocks.remove(block_id);
                out_events.push(Event::BlockDestroyed { block: *block_id });
            }
            for block in world.blocks.values_mut() {
                if !block.disappearing {
                    block.cell = CellCoord::new(block.cell.column(), block.cell.row() + 1);
                }
            }
            out_events.push(Event::RowsShifted { overflowed });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::collections::BTreeMap;

    use super::{Block, CellGrid, World};
    use stackrise_core::{BlockId, BlockKind, BlockSnapshot, CellCoord};

    /// Dimensions of the grid as `(columns, rows)`.
    #[must_use]
    pub fn dimensions(world: &World) -> (u32, u32) {
        world.grid.dimensions()
    }

    /// Reports whether the cell lies inside the grid bounds.
    #[must_use]
    pub fn is_valid_position(world: &World, cell: CellCoord) -> bool {
        world.grid.contains(cell)
    }

    /// Reports whether both cells are in bounds and share an edge.
    #[must_use]
    pub fn are_adjacent(world: &World, first: CellCoord, second: CellCoord) -> bool {
        world.grid.contains(first) && world.grid.contains(second) && first.is_adjacent(second)
    }

    /// Returns the block occupying the cell, if any.
    #[must_use]
    pub fn block_at(world: &World, cell: CellCoord) -> Option<BlockSnapshot> {
        grid_view(world).block_at(cell)
    }

    /// Returns the block with the provided identifier while it is alive.
    ///
    /// Disappearing blocks remain visible here until they are destroyed.
    #[must_use]
    pub fn block(world: &World, block: BlockId) -> Option<BlockSnapshot> {
        world.blocks.get(&block).map(Block::snapshot)
    }

    /// Captures every live block ordered by identifier.
    #[must_use]
    pub fn blocks(world: &World) -> Vec<BlockSnapshot> {
        world.blocks.values().map(Block::snapshot).collect()
    }

    /// Current sub-row rise offset.
    #[must_use]
    pub fn rise_offset(world: &World) -> f32 {
        world.rise_offset
    }

    /// Exposes a read-only view of the cell array for pure systems.
    #[must_use]
    pub fn grid_view(world: &World) -> GridView<'_> {
        GridView {
            grid: &world.grid,
            blocks: &world.blocks,
            rise_offset: world.rise_offset,
        }
    }

    /// Read-only view into the dense cell array.
    #[derive(Clone, Copy, Debug)]
    pub struct GridView<'a> {
        grid: &'a CellGrid,
        blocks: &'a BTreeMap<BlockId, Block>,
        rise_offset: f32,
    }

    impl<'a> GridView<'a> {
        /// Provides the dimensions of the grid as `(columns, rows)`.
        #[must_use]
        pub fn dimensions(&self) -> (u32, u32) {
            self.grid.dimensions()
        }

        /// Reports whether the cell lies inside the grid bounds.
        #[must_use]
        pub fn contains(&self, cell: CellCoord) -> bool {
            self.grid.contains(cell)
        }

        /// Sub-row rise offset captured with the view.
        #[must_use]
        pub fn rise_offset(&self) -> f32 {
            self.rise_offset
        }

        /// Returns the block identifier occupying the cell, if any.
        #[must_use]
        pub fn occupant(&self, cell: CellCoord) -> Option<BlockId> {
            self.grid.occupant(cell)
        }

        /// Returns the block occupying the cell, if any.
        #[must_use]
        pub fn block_at(&self, cell: CellCoord) -> Option<BlockSnapshot> {
            self.occupant(cell)
                .and_then(|id| self.blocks.get(&id))
                .map(Block::snapshot)
        }

        /// Kind of the block occupying the cell, regardless of usability.
        #[must_use]
        pub fn kind_at(&self, cell: CellCoord) -> Option<BlockKind> {
            self.block_at(cell).map(|block| block.kind)
        }

        /// Kind of the block occupying the cell when that block may match.
        #[must_use]
        pub fn usable_kind_at(&self, cell: CellCoord) -> Option<BlockKind> {
            self.block_at(cell)
                .filter(|block| block.usable)
                .map(|block| block.kind)
        }

        /// Reports whether the cell is in bounds and unoccupied.
        #[must_use]
        pub fn is_empty(&self, cell: CellCoord) -> bool {
            self.grid.is_empty(cell)
        }

        /// Iterates over every occupied cell and its block, row by row from the bottom.
        pub fn occupied(&self) -> impl Iterator<Item = BlockSnapshot> + 'a {
            let grid = self.grid;
            let blocks = self.blocks;
            grid.cells()
                .iter()
                .filter_map(move |slot| slot.and_then(|id| blocks.get(&id)))
                .map(Block::snapshot)
        }
    }
}

#[derive(Clone, Debug)]
struct Block {
    id: BlockId,
    cell: CellCoord,
    kind: BlockKind,
    usable: bool,
    disappearing: bool,
}

impl Block {
    fn snapshot(&self) -> BlockSnapshot {
        BlockSnapshot {
            id: self.id,
            cell: self.cell,
            kind: self.kind,
            usable: self.usable,
            disappearing: self.disappearing,
        }
    }
}

#[derive(Clone, Debug)]
struct CellGrid {
    columns: u32,
    rows: u32,
    cells: Vec<Option<BlockId>>,
}

impl CellGrid {
    fn new(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![None; capacity],
        }
    }

    fn contains(&self, cell: CellCoord) -> bool {
        self.index(cell).is_some()
    }

    fn occupant(&self, cell: CellCoord) -> Option<BlockId> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    fn is_empty(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .is_some_and(|index| self.cells.get(index).copied().flatten().is_none())
    }

    fn occupy(&mut self, block_id: BlockId, cell: CellCoord) {
        self.set(cell, Some(block_id));
    }

    fn set(&mut self, cell: CellCoord, occupant: Option<BlockId>) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = occupant;
            }
        }
    }

    /// Moves every row up by one and returns the occupants pushed past the top row.
    fn shift_up(&mut self) -> Vec<BlockId> {
        let width = self.columns as usize;
        if width == 0 || self.rows == 0 {
            return Vec::new();
        }
        let top_start = width * (self.rows as usize - 1);
        let overflowed: Vec<BlockId> = self.cells[top_start..].iter().flatten().copied().collect();
        self.cells.copy_within(0..top_start, width);
        self.cells[..width].fill(None);
        overflowed
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }

    fn cells(&self) -> &[Option<BlockId>] {
        &self.cells
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(columns: u32, rows: u32) -> World {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(&mut world, Command::ConfigureGrid { columns, rows }, &mut events);
        world
    }

    fn place(world: &mut World, column: u32, row: u32, kind: BlockKind) -> BlockId {
        let mut events = Vec::new();
        apply(
            world,
            Command::PlaceBlock {
                cell: CellCoord::new(column, row),
                kind,
                usable: true,
            },
            &mut events,
        );
        match events.as_slice() {
            [Event::BlockPlaced { block, .. }] => *block,
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn shift_up_moves_rows_and_reports_overflow() {
        let mut world = configured(2, 3);
        let bottom = place(&mut world, 0, 0, BlockKind::Red);
        let top = place(&mut world, 1, 2, BlockKind::Blue);

        let mut events = Vec::new();
        apply(&mut world, Command::ShiftRowsUp, &mut events);

        assert_eq!(
            events,
            vec![
                Event::BlockDestroyed { block: top },
                Event::RowsShifted {
                    overflowed: vec![top]
                },
            ]
        );
        assert_eq!(query::block(&world, top), None);
        let moved = query::block(&world, bottom).expect("bottom block survives");
        assert_eq!(moved.cell, CellCoord::new(0, 1));
        assert_eq!(query::grid_view(&world).occupant(CellCoord::new(0, 1)), Some(bottom));
        assert!(query::grid_view(&world).is_empty(CellCoord::new(0, 0)));
    }

    #[test]
    fn configure_destroys_existing_blocks() {
        let mut world = configured(3, 3);
        let block = place(&mut world, 1, 1, BlockKind::Green);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureGrid {
                columns: 4,
                rows: 5,
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![
                Event::BlockDestroyed { block },
                Event::GridConfigured {
                    columns: 4,
                    rows: 5
                },
            ]
        );
        assert_eq!(query::dimensions(&world), (4, 5));
        assert!(query::blocks(&world).is_empty());
    }

    #[test]
    fn rise_offset_is_clamped() {
        let mut world = configured(3, 3);
        let mut events = Vec::new();
        apply(&mut world, Command::SetRiseOffset { offset: -0.5 }, &mut events);
        assert_eq!(query::rise_offset(&world), 0.0);
        apply(&mut world, Command::SetRiseOffset { offset: f32::NAN }, &mut events);
        assert_eq!(query::rise_offset(&world), 0.0);
        apply(&mut world, Command::SetRiseOffset { offset: 0.25 }, &mut events);
        assert_eq!(query::rise_offset(&world), 0.25);
    }
}
