#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic block factory responsible for choosing the kind of new blocks.
//!
//! The factory looks at the two already-placed neighbours to the left and the
//! two below the new cell. When either pair shares a kind, that kind is removed
//! from the candidates before a uniform draw. This only keeps a freshly spawned
//! block from completing a run of three with its neighbours; it makes no
//! promise that the resulting grid is solvable.

use std::collections::BTreeMap;

use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use stackrise_core::{BlockKind, CellCoord, Command, Direction};

/// Source of block kinds for freshly generated cells.
///
/// Schedulers receive an implementation at construction so tests can script
/// the exact kinds a rising row brings in.
pub trait BlockSource {
    /// Chooses the kind for `cell`. `placed` reports kinds already placed
    /// around the cell, or `None` for empty or not yet generated cells.
    fn next_kind(&mut self, cell: CellCoord, placed: &dyn Fn(CellCoord) -> Option<BlockKind>)
        -> BlockKind;
}

/// Configuration parameters required to construct the block factory.
#[derive(Clone, Debug)]
pub struct Config {
    palette: Vec<BlockKind>,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided palette and seed.
    ///
    /// An empty palette falls back to every [`BlockKind`].
    #[must_use]
    pub fn new(palette: Vec<BlockKind>, rng_seed: u64) -> Self {
        Self { palette, rng_seed }
    }
}

/// Seeded generator that avoids spawning immediate runs of three.
#[derive(Debug)]
pub struct BlockFactory {
    palette: Vec<BlockKind>,
    rng: ChaCha8Rng,
}

impl BlockFactory {
    /// Creates a new factory using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let mut palette: Vec<BlockKind> = Vec::with_capacity(config.palette.len());
        for kind in config.palette {
            if !palette.contains(&kind) {
                palette.push(kind);
            }
        }
        if palette.is_empty() {
            palette = BlockKind::ALL.to_vec();
        }
        Self {
            palette,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Palette the factory draws from.
    #[must_use]
    pub fn palette(&self) -> &[BlockKind] {
        &self.palette
    }

    /// Chooses a kind for `cell` given a lookup of already placed neighbours.
    pub fn generate<F>(&mut self, cell: CellCoord, placed: F) -> BlockKind
    where
        F: Fn(CellCoord) -> Option<BlockKind>,
    {
        let excluded = [
            repeated_kind(cell, Direction::Left, &placed),
            repeated_kind(cell, Direction::Down, &placed),
        ];
        let candidates: Vec<BlockKind> = self
            .palette
            .iter()
            .copied()
            .filter(|kind| !excluded.contains(&Some(*kind)))
            .collect();
        let pool = if candidates.is_empty() {
            &self.palette
        } else {
            &candidates
        };
        pool.choose(&mut self.rng)
            .copied()
            .unwrap_or(BlockKind::Red)
    }
}

impl BlockSource for BlockFactory {
    fn next_kind(
        &mut self,
        cell: CellCoord,
        placed: &dyn Fn(CellCoord) -> Option<BlockKind>,
    ) -> BlockKind {
        self.generate(cell, placed)
    }
}

/// Returns the kind shared by the two cells stepping away from `cell` in
/// `direction`, if both are placed and equal.
fn repeated_kind<F>(cell: CellCoord, direction: Direction, placed: &F) -> Option<BlockKind>
where
    F: Fn(CellCoord) -> Option<BlockKind>,
{
    let near = cell.neighbor(direction)?;
    let far = near.neighbor(direction)?;
    let kind = placed(near)?;
    (placed(far)? == kind).then_some(kind)
}

/// Emits placement commands filling the bottom `starting_rows` rows of a
/// `columns` by `rows` grid.
///
/// Cells are generated column by column from the bottom so both neighbour
/// pairs inspected by the factory are already known. Blocks are placed
/// unusable; the rise controller promotes the ones above the bottom row.
pub fn initial_fill<S>(
    source: &mut S,
    columns: u32,
    rows: u32,
    starting_rows: u32,
    out: &mut Vec<Command>,
) where
    S: BlockSource + ?Sized,
{
    let mut placed: BTreeMap<CellCoord, BlockKind> = BTreeMap::new();
    for column in 0..columns {
        for row in 0..starting_rows.min(rows) {
            let cell = CellCoord::new(column, row);
            let kind = source.next_kind(cell, &|neighbour| placed.get(&neighbour).copied());
            let _ = placed.insert(cell, kind);
            out.push(Command::PlaceBlock {
                cell,
                kind,
                usable: false,
            });
        }
    }
}

/// Generates the kinds for a new bottom row, left to right.
///
/// Nothing lies below row zero, so only the horizontal pair can exclude a kind.
pub fn generate_row<S>(source: &mut S, columns: u32) -> Vec<BlockKind>
where
    S: BlockSource + ?Sized,
{
    let mut row: Vec<BlockKind> = Vec::with_capacity(columns as usize);
    for column in 0..columns {
        let cell = CellCoord::new(column, 0);
        let kind = source.next_kind(cell, &|neighbour| {
            if neighbour.row() == 0 {
                row.get(neighbour.column() as usize).copied()
            } else {
                None
            }
        });
        row.push(kind);
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    const PALETTE: [BlockKind; 3] = [BlockKind::Red, BlockKind::Blue, BlockKind::Green];

    #[test]
    fn excludes_kind_repeated_on_the_left() {
        let mut factory = BlockFactory::new(Config::new(PALETTE.to_vec(), 7));
        let cell = CellCoord::new(2, 0);
        for _ in 0..200 {
            let kind = factory.generate(cell, |neighbour| {
                (neighbour.row() == 0 && neighbour.column() < 2).then_some(BlockKind::Red)
            });
            assert_ne!(kind, BlockKind::Red);
        }
    }

    #[test]
    fn excludes_both_pairs_at_once() {
        let mut factory = BlockFactory::new(Config::new(PALETTE.to_vec(), 11));
        let cell = CellCoord::new(2, 2);
        for _ in 0..200 {
            let kind = factory.generate(cell, |neighbour| {
                if neighbour.row() == 2 {
                    Some(BlockKind::Red)
                } else if neighbour.column() == 2 {
                    Some(BlockKind::Blue)
                } else {
                    None
                }
            });
            assert_eq!(kind, BlockKind::Green);
        }
    }

    #[test]
    fn mixed_pairs_exclude_nothing() {
        let mut factory = BlockFactory::new(Config::new(PALETTE.to_vec(), 3));
        let cell = CellCoord::new(2, 0);
        let mut seen = Vec::new();
        for _ in 0..200 {
            let kind = factory.generate(cell, |neighbour| match neighbour.column() {
                0 => Some(BlockKind::Red),
                1 => Some(BlockKind::Blue),
                _ => None,
            });
            if !seen.contains(&kind) {
                seen.push(kind);
            }
        }
        assert_eq!(seen.len(), PALETTE.len());
    }

    #[test]
    fn duplicate_kinds_are_dropped_from_the_palette() {
        let factory = BlockFactory::new(Config::new(
            vec![BlockKind::Red, BlockKind::Blue, BlockKind::Red, BlockKind::Blue],
            0,
        ));
        assert_eq!(factory.palette(), &[BlockKind::Red, BlockKind::Blue]);
    }

    #[test]
    fn empty_palette_falls_back_to_every_kind() {
        let factory = BlockFactory::new(Config::new(Vec::new(), 0));
        assert_eq!(factory.palette(), &BlockKind::ALL);
    }

    #[test]
    fn same_seed_produces_same_rows() {
        let mut first = BlockFactory::new(Config::new(BlockKind::ALL.to_vec(), 99));
        let mut second = BlockFactory::new(Config::new(BlockKind::ALL.to_vec(), 99));
        for _ in 0..10 {
            assert_eq!(generate_row(&mut first, 6), generate_row(&mut second, 6));
        }
    }

    #[test]
    fn generated_rows_never_hold_three_in_a_row() {
        let mut factory = BlockFactory::new(Config::new(PALETTE.to_vec(), 5));
        for _ in 0..100 {
            let row = generate_row(&mut factory, 8);
            assert!(row
                .windows(3)
                .all(|window| !(window[0] == window[1] && window[1] == window[2])));
        }
    }
}
