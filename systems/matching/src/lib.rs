#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure match detection over the grid view.
//!
//! A run is a maximal line of usable, same-kind blocks through a cell. Runs of
//! at least [`MIN_RUN`] blocks qualify; horizontal and vertical results are
//! merged so a cell shared by both counts once.

use std::collections::BTreeSet;

use stackrise_core::{BlockKind, CellCoord, Direction};
use stackrise_world::query::GridView;

/// Shortest run that counts as a match.
pub const MIN_RUN: usize = 3;

/// Deduplicated set of cells belonging to confirmed runs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchSet {
    cells: BTreeSet<CellCoord>,
}

impl MatchSet {
    /// Creates an empty match set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports whether at least one run qualified.
    #[must_use]
    pub fn matched(&self) -> bool {
        !self.cells.is_empty()
    }

    /// Number of distinct matched cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the set holds no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Reports whether the cell belongs to the set.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        self.cells.contains(&cell)
    }

    /// Iterates over the matched cells in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.cells.iter().copied()
    }

    /// Merges another set into this one.
    pub fn merge(&mut self, other: MatchSet) {
        self.cells.extend(other.cells);
    }

    /// Consumes the set, yielding the matched cells in ascending order.
    #[must_use]
    pub fn into_vec(self) -> Vec<CellCoord> {
        self.cells.into_iter().collect()
    }

    fn absorb_run(&mut self, run: &[CellCoord]) {
        if run.len() >= MIN_RUN {
            self.cells.extend(run.iter().copied());
        }
    }
}

/// Stateless detector that scans the grid for qualifying runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct MatchDetector;

impl MatchDetector {
    /// Scans the horizontal and vertical runs passing through `origin`.
    ///
    /// Returns an empty set unless `origin` holds a usable block.
    #[must_use]
    pub fn scan_from(&self, view: GridView<'_>, origin: CellCoord) -> MatchSet {
        let mut matches = MatchSet::new();
        let Some(kind) = view.usable_kind_at(origin) else {
            return matches;
        };

        let mut horizontal = vec![origin];
        extend_run(view, origin, Direction::Left, kind, &mut horizontal);
        extend_run(view, origin, Direction::Right, kind, &mut horizontal);
        matches.absorb_run(&horizontal);

        let mut vertical = vec![origin];
        extend_run(view, origin, Direction::Up, kind, &mut vertical);
        extend_run(view, origin, Direction::Down, kind, &mut vertical);
        matches.absorb_run(&vertical);

        matches
    }

    /// Scans every listed cell and merges the results.
    #[must_use]
    pub fn scan_cells<I>(&self, view: GridView<'_>, cells: I) -> MatchSet
    where
        I: IntoIterator<Item = CellCoord>,
    {
        let mut matches = MatchSet::new();
        for cell in cells {
            matches.merge(self.scan_from(view, cell));
        }
        matches
    }

    /// Scans every occupied cell of the grid.
    #[must_use]
    pub fn scan_all(&self, view: GridView<'_>) -> MatchSet {
        self.scan_cells(view, view.occupied().map(|block| block.cell))
    }
}

fn extend_run(
    view: GridView<'_>,
    origin: CellCoord,
    direction: Direction,
    kind: BlockKind,
    run: &mut Vec<CellCoord>,
) {
    let mut cursor = origin.neighbor(direction);
    while let Some(cell) = cursor {
        if view.usable_kind_at(cell) != Some(kind) {
            break;
        }
        run.push(cell);
        cursor = cell.neighbor(direction);
    }
}
