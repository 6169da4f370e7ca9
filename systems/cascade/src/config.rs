use std::time::Duration;

use stackrise_core::BlockKind;
use stackrise_system_spawning::{self as spawning, BlockFactory};
use thiserror::Error;

/// Fewest distinct kinds that still leave a candidate after the factory
/// excludes one kind per neighbour pair.
const MIN_PALETTE: usize = 3;

/// Most cells a grid may hold.
pub const MAX_CELLS: u64 = 1 << 16;

/// Tuning knobs for the grid and the timed cascade phases.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Number of columns in the grid.
    pub columns: u32,
    /// Number of rows in the grid, including the entering bottom row.
    pub rows: u32,
    /// Kinds the block factory draws from.
    pub palette: Vec<BlockKind>,
    /// Rows filled from the bottom when the grid is populated or reset.
    pub starting_rows: u32,
    /// Rows risen per second while no cascade is in flight.
    pub rise_speed: f32,
    /// Delay between accepting a swap and writing it to the grid.
    pub swap_settle: Duration,
    /// Delay between hiding consecutive matched blocks.
    pub destroy_stagger: Duration,
    /// Delay between dropping blocks and re-scanning the grid.
    pub fall_settle: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            columns: 6,
            rows: 10,
            palette: BlockKind::ALL.to_vec(),
            starting_rows: 4,
            rise_speed: 0.1,
            swap_settle: Duration::from_millis(100),
            destroy_stagger: Duration::from_millis(100),
            fall_settle: Duration::from_millis(200),
        }
    }
}

impl Config {
    /// Checks that the configuration describes a playable grid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.columns == 0 || self.rows < 2 {
            return Err(ConfigError::GridTooSmall {
                columns: self.columns,
                rows: self.rows,
            });
        }
        if u64::from(self.columns) * u64::from(self.rows) > MAX_CELLS {
            return Err(ConfigError::GridTooLarge {
                columns: self.columns,
                rows: self.rows,
            });
        }

        let mut distinct = self.palette.clone();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() < MIN_PALETTE {
            return Err(ConfigError::PaletteTooSmall {
                kinds: distinct.len(),
            });
        }

        if self.starting_rows >= self.rows {
            return Err(ConfigError::StartingRowsExceedGrid {
                starting_rows: self.starting_rows,
                rows: self.rows,
            });
        }

        if !self.rise_speed.is_finite() || self.rise_speed < 0.0 {
            return Err(ConfigError::InvalidRiseSpeed(self.rise_speed));
        }

        Ok(())
    }

    /// Builds the seeded block factory drawing from the configured palette.
    #[must_use]
    pub fn block_factory(&self, rng_seed: u64) -> BlockFactory {
        BlockFactory::new(spawning::Config::new(self.palette.clone(), rng_seed))
    }
}

/// Reasons a configuration is rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The grid needs at least one column and two rows.
    #[error("grid of {columns}x{rows} is too small; need at least 1x2")]
    GridTooSmall {
        /// Configured column count.
        columns: u32,
        /// Configured row count.
        rows: u32,
    },
    /// The grid holds more than [`MAX_CELLS`] cells.
    #[error("grid of {columns}x{rows} exceeds {MAX_CELLS} cells")]
    GridTooLarge {
        /// Configured column count.
        columns: u32,
        /// Configured row count.
        rows: u32,
    },
    /// The palette holds too few distinct kinds.
    #[error("palette holds {kinds} distinct kinds; need at least 3")]
    PaletteTooSmall {
        /// Number of distinct kinds configured.
        kinds: usize,
    },
    /// The starting fill would reach the top row.
    #[error("{starting_rows} starting rows do not fit below the top of a {rows}-row grid")]
    StartingRowsExceedGrid {
        /// Configured starting rows.
        starting_rows: u32,
        /// Configured row count.
        rows: u32,
    },
    /// The rise speed is negative or not a number.
    #[error("rise speed {0} must be a finite, non-negative number of rows per second")]
    InvalidRiseSpeed(f32),
}
