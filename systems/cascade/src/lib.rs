#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Cascade scheduler that drives swaps, matches, staggered destruction and falls.
//!
//! The scheduler owns the authoritative [`World`] and the [`BlockSource`] it was
//! constructed with. Timed phases live in an explicit queue keyed by their due
//! time; [`CascadeScheduler::tick`] runs every phase that came due in order and
//! spends whatever time remains while idle on the rise. The queue is empty
//! exactly when the scheduler is [`CascadeState::Idle`].

mod config;

pub use config::{Config, ConfigError, MAX_CELLS};

use std::{collections::BTreeMap, time::Duration};

use log::{debug, info, trace};
use stackrise_core::{BlockId, CascadeState, CellCoord, Command, Direction, Event};
use stackrise_system_gravity::GravityResolver;
use stackrise_system_matching::{MatchDetector, MatchSet};
use stackrise_system_rise::{self as rise, Rise};
use stackrise_system_spawning::{initial_fill, BlockSource};
use stackrise_world::{self as world, query, World};
use thiserror::Error;

/// Reasons a swap request is refused. A refused request never changes state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SwapRejected {
    /// A cascade is in flight.
    #[error("swaps are only accepted while idle; scheduler is {0:?}")]
    Busy(CascadeState),
    /// The grid overflowed and awaits a reset.
    #[error("the grid is full; reset before swapping")]
    GridFull,
    /// The cell lies outside the grid.
    #[error("cell {0:?} lies outside the grid")]
    OutOfBounds(CellCoord),
    /// No cell exists in the requested direction.
    #[error("no cell lies {direction:?} of {cell:?}")]
    NoNeighbor {
        /// Cell the swap started from.
        cell: CellCoord,
        /// Requested direction.
        direction: Direction,
    },
    /// The cells do not share an edge.
    #[error("cells {first:?} and {second:?} are not adjacent")]
    NotAdjacent {
        /// First requested cell.
        first: CellCoord,
        /// Second requested cell.
        second: CellCoord,
    },
    /// Neither cell holds a block.
    #[error("cells {first:?} and {second:?} are both empty")]
    NothingToSwap {
        /// First requested cell.
        first: CellCoord,
        /// Second requested cell.
        second: CellCoord,
    },
}

#[derive(Clone, Debug)]
enum Phase {
    CommitSwap { first: CellCoord, second: CellCoord },
    Hide(BlockId),
    Remove(Vec<BlockId>),
    SettleFall,
}

/// State machine sequencing swap, match, destroy and fall phases.
#[derive(Debug)]
pub struct CascadeScheduler<S> {
    config: Config,
    world: World,
    source: S,
    rise: Rise,
    detector: MatchDetector,
    gravity: GravityResolver,
    state: CascadeState,
    clock: Duration,
    pending: BTreeMap<(Duration, u64), Phase>,
    next_sequence: u64,
    chain: u32,
    grid_full: bool,
    adopted: bool,
}

impl<S> CascadeScheduler<S>
where
    S: BlockSource,
{
    /// Creates an idle scheduler around an existing world.
    ///
    /// The world is used as given. Runs and floating blocks it already holds
    /// are resolved by the first [`CascadeScheduler::tick`] or swap request.
    /// [`CascadeScheduler::reset`] replaces it with a freshly filled grid of
    /// the configured dimensions.
    pub fn new(config: Config, world: World, source: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let rise = Rise::new(rise::Config::new(config.rise_speed));
        Ok(Self {
            config,
            world,
            source,
            rise,
            detector: MatchDetector,
            gravity: GravityResolver,
            state: CascadeState::Idle,
            clock: Duration::ZERO,
            pending: BTreeMap::new(),
            next_sequence: 0,
            chain: 0,
            grid_full: false,
            adopted: true,
        })
    }

    /// Creates a scheduler whose grid is filled with the configured starting rows.
    pub fn populated(
        config: Config,
        source: S,
        out: &mut Vec<Event>,
    ) -> Result<Self, ConfigError> {
        let mut scheduler = Self::new(config, World::new(), source)?;
        scheduler.reset(out);
        Ok(scheduler)
    }

    /// Clears the grid, refills the starting rows and resumes rising.
    ///
    /// Pending phases are dropped and the grid-full latch is released.
    pub fn reset(&mut self, out: &mut Vec<Event>) {
        self.pending.clear();
        self.grid_full = false;
        self.chain = 0;
        self.adopted = false;

        let (columns, rows) = (self.config.columns, self.config.rows);
        let mut commands = vec![Command::ConfigureGrid { columns, rows }];
        initial_fill(
            &mut self.source,
            columns,
            rows,
            self.config.starting_rows,
            &mut commands,
        );
        self.execute(commands, out);
        self.enter(CascadeState::Idle, out);
        info!(
            "grid reset to {columns}x{rows} with {} starting rows",
            self.config.starting_rows
        );
        self.promote_and_scan(out);
    }

    /// Requests a swap between two adjacent cells.
    ///
    /// An empty side turns the swap into a move. Whether the swap forms a match
    /// plays no part in accepting it, and an accepted swap is never reverted.
    pub fn request_swap(
        &mut self,
        first: CellCoord,
        second: CellCoord,
        out: &mut Vec<Event>,
    ) -> Result<(), SwapRejected> {
        if self.grid_full {
            return Err(SwapRejected::GridFull);
        }
        self.resolve_adopted(out);
        if self.state != CascadeState::Idle {
            return Err(SwapRejected::Busy(self.state));
        }
        for cell in [first, second] {
            if !self.is_valid_position(cell) {
                return Err(SwapRejected::OutOfBounds(cell));
            }
        }
        if !first.is_adjacent(second) {
            return Err(SwapRejected::NotAdjacent { first, second });
        }
        let view = query::grid_view(&self.world);
        if view.is_empty(first) && view.is_empty(second) {
            return Err(SwapRejected::NothingToSwap { first, second });
        }

        debug!("swap accepted between {first:?} and {second:?}");
        self.enter(CascadeState::Swapping, out);
        let due = self.clock.saturating_add(self.config.swap_settle);
        self.schedule_at(due, Phase::CommitSwap { first, second });
        Ok(())
    }

    /// Requests a swap between `cell` and its neighbour in `direction`.
    pub fn request_swap_toward(
        &mut self,
        cell: CellCoord,
        direction: Direction,
        out: &mut Vec<Event>,
    ) -> Result<(), SwapRejected> {
        let neighbor = cell
            .neighbor(direction)
            .ok_or(SwapRejected::NoNeighbor { cell, direction })?;
        self.request_swap(cell, neighbor, out)
    }

    /// Advances the scheduler by `dt`.
    ///
    /// Every phase due within the window runs in due-time order. Time left
    /// over once the scheduler is idle advances the rise. Nothing happens
    /// after the grid filled up.
    pub fn tick(&mut self, dt: Duration, out: &mut Vec<Event>) {
        if self.grid_full {
            return;
        }

        self.resolve_adopted(out);
        let target = self.clock.saturating_add(dt);
        while let Some(entry) = self.pending.first_entry() {
            let (due, _) = *entry.key();
            if due > target {
                break;
            }
            let phase = entry.remove();
            self.clock = due;
            self.run(phase, out);
        }

        let idle_time = if self.state == CascadeState::Idle {
            target.saturating_sub(self.clock)
        } else {
            Duration::ZERO
        };
        self.clock = target;

        if self.state == CascadeState::Idle {
            self.advance_rise(idle_time, out);
        }
    }

    /// Current cascade state.
    #[must_use]
    pub fn state(&self) -> CascadeState {
        self.state
    }

    /// Read access to the authoritative grid.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Configuration the scheduler was built with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Reports whether the grid overflowed and the scheduler halted.
    #[must_use]
    pub fn is_grid_full(&self) -> bool {
        self.grid_full
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub fn is_valid_position(&self, cell: CellCoord) -> bool {
        query::is_valid_position(&self.world, cell)
    }

    /// Reports whether both cells are in bounds and share an edge.
    #[must_use]
    pub fn are_adjacent(&self, first: CellCoord, second: CellCoord) -> bool {
        query::are_adjacent(&self.world, first, second)
    }

    /// Effective rise speed; zero while a match or fall is in flight.
    #[must_use]
    pub fn rise_speed(&self) -> f32 {
        self.rise.speed()
    }

    /// Total time the scheduler has been ticked.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.clock
    }

    /// Number of timed phases waiting to run.
    #[must_use]
    pub fn pending_phases(&self) -> usize {
        self.pending.len()
    }

    fn run(&mut self, phase: Phase, out: &mut Vec<Event>) {
        trace!("running {phase:?} at {:?}", self.clock);
        match phase {
            Phase::CommitSwap { first, second } => self.commit_swap(first, second, out),
            Phase::Hide(block) => world::apply(&mut self.world, Command::HideBlock { block }, out),
            Phase::Remove(blocks) => {
                let commands = blocks
                    .into_iter()
                    .map(|block| Command::DestroyBlock { block })
                    .collect();
                self.execute(commands, out);
                self.begin_fall(out);
            }
            Phase::SettleFall => {
                self.enter(CascadeState::Resolving, out);
                let matches = self.detector.scan_all(query::grid_view(&self.world));
                if matches.matched() {
                    self.begin_destroy(matches, out);
                } else {
                    self.settle(out);
                }
            }
        }
    }

    fn commit_swap(&mut self, first: CellCoord, second: CellCoord, out: &mut Vec<Event>) {
        world::apply(&mut self.world, Command::SwapCells { first, second }, out);
        out.push(Event::SwapCommitted { first, second });
        self.enter(CascadeState::Resolving, out);

        let view = query::grid_view(&self.world);
        let matches = self.detector.scan_cells(view, [first, second]);
        if matches.matched() {
            self.begin_destroy(matches, out);
        } else if !self.gravity.is_settled(view) {
            self.begin_fall(out);
        } else {
            self.settle(out);
        }
    }

    /// Marks the matched blocks and schedules their staggered removal.
    ///
    /// Block `i` hides `(i + 1) * stagger` after the match; all of them are
    /// destroyed `count * stagger` after the last one hid.
    fn begin_destroy(&mut self, matches: MatchSet, out: &mut Vec<Event>) {
        let cells = matches.into_vec();
        self.chain = self.chain.saturating_add(1);
        debug!("match of {} cells (round {})", cells.len(), self.chain);
        self.rise.pause();
        out.push(Event::MatchFound {
            cells: cells.clone(),
        });

        let start = out.len();
        let commands = cells
            .into_iter()
            .map(|cell| Command::MarkDisappearing { cell })
            .collect();
        self.execute(commands, out);
        let doomed: Vec<BlockId> = out[start..]
            .iter()
            .filter_map(|event| match event {
                Event::BlockDisappearing { block, .. } => Some(*block),
                _ => None,
            })
            .collect();

        let stagger = self.config.destroy_stagger;
        let mut due = self.clock;
        for block in &doomed {
            due = due.saturating_add(stagger);
            self.schedule_at(due, Phase::Hide(*block));
        }
        let count = u32::try_from(doomed.len()).unwrap_or(u32::MAX);
        let removal = due.saturating_add(stagger.saturating_mul(count));
        self.schedule_at(removal, Phase::Remove(doomed));
    }

    fn begin_fall(&mut self, out: &mut Vec<Event>) {
        let falls = self.gravity.compute_fall(query::grid_view(&self.world));
        if falls.is_empty() {
            self.settle(out);
            return;
        }

        self.rise.pause();
        self.enter(CascadeState::Falling, out);
        trace!("{} blocks falling", falls.len());
        let mut commands = Vec::with_capacity(falls.len());
        self.gravity.commands(&falls, &mut commands);
        self.execute(commands, out);
        let due = self.clock.saturating_add(self.config.fall_settle);
        self.schedule_at(due, Phase::SettleFall);
    }

    /// Starts a cascade for runs or floating blocks present in a world
    /// handed over at construction.
    fn resolve_adopted(&mut self, out: &mut Vec<Event>) {
        if !self.adopted {
            return;
        }
        self.adopted = false;

        let view = query::grid_view(&self.world);
        let matches = self.detector.scan_all(view);
        if matches.matched() {
            debug!("adopted grid holds {} matching cells", matches.len());
            self.enter(CascadeState::Resolving, out);
            self.begin_destroy(matches, out);
        } else if !self.gravity.is_settled(view) {
            debug!("adopted grid holds floating blocks");
            self.begin_fall(out);
        }
    }

    fn settle(&mut self, out: &mut Vec<Event>) {
        if self.chain > 0 {
            info!("cascade settled after {} match rounds", self.chain);
            self.chain = 0;
        }
        self.enter(CascadeState::Idle, out);
    }

    fn advance_rise(&mut self, dt: Duration, out: &mut Vec<Event>) {
        let mut commands = Vec::new();
        self.rise.handle(
            dt,
            query::grid_view(&self.world),
            &mut self.source,
            &mut commands,
        );

        let start = out.len();
        self.execute(commands, out);
        let mut inserted = Vec::new();
        let mut overflowed = false;
        for event in &out[start..] {
            match event {
                Event::RowsShifted { overflowed: lost } => overflowed |= !lost.is_empty(),
                Event::BlockPlaced { block, .. } => inserted.push(*block),
                _ => {}
            }
        }
        if !inserted.is_empty() {
            out.push(Event::RowInserted { blocks: inserted });
        }

        if overflowed {
            info!("grid full at {:?}; halting until reset", self.clock);
            self.grid_full = true;
            self.pending.clear();
            out.push(Event::GridFull);
            return;
        }

        self.promote_and_scan(out);
    }

    /// Promotes blocks that rose past the bottom row and scans them for matches.
    fn promote_and_scan(&mut self, out: &mut Vec<Event>) {
        let mut commands = Vec::new();
        self.rise.promote(query::grid_view(&self.world), &mut commands);
        if commands.is_empty() {
            return;
        }

        let start = out.len();
        self.execute(commands, out);
        let promoted: Vec<CellCoord> = out[start..]
            .iter()
            .filter_map(|event| match event {
                Event::BlockPromoted { cell, .. } => Some(*cell),
                _ => None,
            })
            .collect();

        let matches = self
            .detector
            .scan_cells(query::grid_view(&self.world), promoted);
        if matches.matched() {
            self.enter(CascadeState::Resolving, out);
            self.begin_destroy(matches, out);
        }
    }

    fn enter(&mut self, state: CascadeState, out: &mut Vec<Event>) {
        if state == CascadeState::Idle {
            self.rise.resume();
        }
        if self.state == state {
            return;
        }
        debug!("cascade {:?} -> {:?}", self.state, state);
        self.state = state;
        out.push(Event::CascadeStateChanged { state });
    }

    fn schedule_at(&mut self, due: Duration, phase: Phase) {
        let key = (due, self.next_sequence);
        self.next_sequence = self.next_sequence.wrapping_add(1);
        let _ = self.pending.insert(key, phase);
    }

    fn execute(&mut self, commands: Vec<Command>, out: &mut Vec<Event>) {
        for command in commands {
            world::apply(&mut self.world, command, out);
        }
    }
}
