#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the stackrise engine.
//!
//! This crate defines the message surface that connects the host adapter, the
//! authoritative grid, and pure systems. Systems submit [`Command`] values
//! describing desired grid mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values that the
//! scheduler and any presentation layer react to. Systems never touch cells
//! directly; they read immutable views and respond with command batches.
//!
//! Rows are numbered from the bottom of the well: row `0` is the row that is
//! still entering the grid and row indices grow upward.

use serde::{Deserialize, Serialize};

/// Commands that express all permissible grid mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the grid with an empty one of the provided dimensions.
    ConfigureGrid {
        /// Number of columns laid out in the grid.
        columns: u32,
        /// Number of rows laid out in the grid.
        rows: u32,
    },
    /// Creates a new block occupying the provided empty cell.
    PlaceBlock {
        /// Cell that receives the new block.
        cell: CellCoord,
        /// Colour family assigned to the block.
        kind: BlockKind,
        /// Whether the block may take part in matches immediately.
        usable: bool,
    },
    /// Exchanges the contents of two cells. An empty side turns the swap into a move.
    SwapCells {
        /// First endpoint of the swap.
        first: CellCoord,
        /// Second endpoint of the swap.
        second: CellCoord,
    },
    /// Relocates the block at `from` into the empty cell `to`.
    MoveBlock {
        /// Cell currently holding the block.
        from: CellCoord,
        /// Empty destination cell.
        to: CellCoord,
    },
    /// Flags the block at `cell` as disappearing and releases the cell.
    MarkDisappearing {
        /// Cell holding the matched block.
        cell: CellCoord,
    },
    /// Announces that a disappearing block should no longer be drawn.
    HideBlock {
        /// Block that finished its disappear animation.
        block: BlockId,
    },
    /// Removes a block from the registry for good.
    DestroyBlock {
        /// Block to remove.
        block: BlockId,
    },
    /// Marks a block as usable. Usability never reverts.
    PromoteBlock {
        /// Block that crossed the visibility threshold.
        block: BlockId,
    },
    /// Stores the sub-row vertical displacement applied to every occupied cell.
    SetRiseOffset {
        /// New offset in the half-open range `[0, 1)`.
        offset: f32,
    },
    /// Moves every row up by one index, discarding whatever occupied the top row.
    ShiftRowsUp,
}

/// Events broadcast after commands are processed or phases complete.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that the grid was replaced with an empty one.
    GridConfigured {
        /// Number of columns in the new grid.
        columns: u32,
        /// Number of rows in the new grid.
        rows: u32,
    },
    /// Confirms that a block was created.
    BlockPlaced {
        /// Identifier assigned to the block by the world.
        block: BlockId,
        /// Cell the block occupies.
        cell: CellCoord,
        /// Colour family of the block.
        kind: BlockKind,
        /// Whether the block was created usable.
        usable: bool,
    },
    /// Confirms that a block changed cells.
    BlockMoved {
        /// Identifier of the block that moved.
        block: BlockId,
        /// Cell the block occupied before the move.
        from: CellCoord,
        /// Cell the block occupies after the move.
        to: CellCoord,
    },
    /// Reports that a block became usable.
    BlockPromoted {
        /// Identifier of the promoted block.
        block: BlockId,
        /// Cell the block occupies.
        cell: CellCoord,
    },
    /// Reports that a matched block left its cell and started disappearing.
    BlockDisappearing {
        /// Identifier of the matched block.
        block: BlockId,
        /// Cell the block occupied when it matched.
        cell: CellCoord,
    },
    /// Reports that a disappearing block should no longer be drawn.
    BlockHidden {
        /// Identifier of the hidden block.
        block: BlockId,
    },
    /// Reports that a block no longer exists. Views drop it from rendering.
    BlockDestroyed {
        /// Identifier of the destroyed block.
        block: BlockId,
    },
    /// Reports the current sub-row rise offset.
    RiseOffsetChanged {
        /// Offset in the half-open range `[0, 1)`.
        offset: f32,
    },
    /// Confirms that every row moved up by one index.
    RowsShifted {
        /// Blocks pushed out through the top of the grid.
        overflowed: Vec<BlockId>,
    },
    /// Announces that a fresh, not yet usable row entered at the bottom.
    RowInserted {
        /// Blocks composing the new row, ordered by column.
        blocks: Vec<BlockId>,
    },
    /// Confirms that a requested swap settled and was written to the grid.
    SwapCommitted {
        /// First endpoint of the swap.
        first: CellCoord,
        /// Second endpoint of the swap.
        second: CellCoord,
    },
    /// Reports the deduplicated cells of a confirmed match.
    MatchFound {
        /// Cells cleared by the match, in ascending order.
        cells: Vec<CellCoord>,
    },
    /// Announces that the cascade state machine entered a new state.
    CascadeStateChanged {
        /// State that became active.
        state: CascadeState,
    },
    /// Terminal event: occupied content was pushed out through the top row.
    GridFull,
}

/// Phases of the cascade state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CascadeState {
    /// No cascade in flight. The only state that accepts swaps and lets the grid rise.
    Idle,
    /// A swap is settling before it is written to the grid.
    Swapping,
    /// Matches are being detected or matched blocks are disappearing.
    Resolving,
    /// Blocks are dropping into the space left by cleared matches.
    Falling,
}

/// Colour family of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BlockKind {
    /// Red block.
    Red,
    /// Blue block.
    Blue,
    /// Green block.
    Green,
    /// Orange block.
    Orange,
    /// Purple block.
    Purple,
    /// White block.
    White,
}

impl BlockKind {
    /// Every block kind in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Red,
        Self::Blue,
        Self::Green,
        Self::Orange,
        Self::Purple,
        Self::White,
    ];

    /// Single-character label used by text adapters and test fixtures.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Red => 'R',
            Self::Blue => 'B',
            Self::Green => 'G',
            Self::Orange => 'O',
            Self::Purple => 'P',
            Self::White => 'W',
        }
    }

    /// Parses the label produced by [`BlockKind::symbol`].
    #[must_use]
    pub fn from_symbol(symbol: char) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.symbol() == symbol.to_ascii_uppercase())
    }
}

/// Cardinal directions on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Toward increasing row indices.
    Up,
    /// Toward decreasing row indices.
    Down,
    /// Toward decreasing column indices.
    Left,
    /// Toward increasing column indices.
    Right,
}

/// Unique identifier assigned to a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(u32);

impl BlockId {
    /// Creates a new block identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
///
/// Ordering is column-major so sorted collections walk each column bottom-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell, counted from the bottom.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Reports whether the cells share an edge.
    #[must_use]
    pub fn is_adjacent(self, other: CellCoord) -> bool {
        self.manhattan_distance(other) == 1
    }

    /// Returns the neighbouring cell in the provided direction.
    ///
    /// Yields `None` when the step would leave the non-negative quadrant; upper
    /// bounds are the grid's concern.
    #[must_use]
    pub fn neighbor(self, direction: Direction) -> Option<CellCoord> {
        match direction {
            Direction::Up => self.row.checked_add(1).map(|row| Self::new(self.column, row)),
            Direction::Down => self.row.checked_sub(1).map(|row| Self::new(self.column, row)),
            Direction::Left => self
                .column
                .checked_sub(1)
                .map(|column| Self::new(column, self.row)),
            Direction::Right => self
                .column
                .checked_add(1)
                .map(|column| Self::new(column, self.row)),
        }
    }
}

/// Immutable representation of a single block's state used for queries.
///
/// This is the capability surface a view object needs: grid position,
/// usability and the disappearing flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockSnapshot {
    /// Unique identifier assigned to the block.
    pub id: BlockId,
    /// Grid position last stored on the block.
    pub cell: CellCoord,
    /// Colour family of the block.
    pub kind: BlockKind,
    /// Whether the block may take part in matches.
    pub usable: bool,
    /// Whether the block was matched and is waiting to be destroyed.
    pub disappearing: bool,
}

impl BlockSnapshot {
    /// Row the block visually occupies once the rise offset is applied.
    #[must_use]
    pub fn effective_row(&self, rise_offset: f32) -> f32 {
        self.cell.row() as f32 + rise_offset
    }
}

#[cfg(test)]
mod tests {
    use super::{BlockId, BlockKind, CascadeState, CellCoord, Direction};
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn adjacency_requires_single_axis_step() {
        let origin = CellCoord::new(2, 2);
        assert!(origin.is_adjacent(CellCoord::new(3, 2)));
        assert!(origin.is_adjacent(CellCoord::new(2, 1)));
        assert!(!origin.is_adjacent(CellCoord::new(3, 3)));
        assert!(!origin.is_adjacent(origin));
        assert!(!origin.is_adjacent(CellCoord::new(4, 2)));
    }

    #[test]
    fn neighbor_stops_at_zero() {
        let corner = CellCoord::new(0, 0);
        assert_eq!(corner.neighbor(Direction::Down), None);
        assert_eq!(corner.neighbor(Direction::Left), None);
        assert_eq!(corner.neighbor(Direction::Up), Some(CellCoord::new(0, 1)));
        assert_eq!(corner.neighbor(Direction::Right), Some(CellCoord::new(1, 0)));
    }

    #[test]
    fn symbols_parse_back_to_kinds() {
        for kind in BlockKind::ALL {
            assert_eq!(BlockKind::from_symbol(kind.symbol()), Some(kind));
        }
        assert_eq!(BlockKind::from_symbol('r'), Some(BlockKind::Red));
        assert_eq!(BlockKind::from_symbol('.'), None);
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn contracts_round_trip_through_bincode() {
        assert_round_trip(&BlockId::new(42));
        assert_round_trip(&CellCoord::new(5, 7));
        assert_round_trip(&BlockKind::Purple);
        assert_round_trip(&CascadeState::Falling);
    }
}
