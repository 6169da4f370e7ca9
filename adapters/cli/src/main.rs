#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives the stackrise grid headlessly.
//!
//! The adapter loads the configuration, builds the scheduler, feeds it fixed
//! ticks along with scripted swaps, and prints the grid as text.

mod file_config;
mod layout_transfer;
mod render;
mod script;

use std::{collections::VecDeque, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use stackrise_core::{CascadeState, Event};
use stackrise_system_cascade::CascadeScheduler;

use crate::{
    file_config::FileConfig,
    layout_transfer::GridLayoutSnapshot,
    script::{parse_swap, SwapRequest},
};

/// Command-line arguments accepted by the stackrise binary.
#[derive(Debug, Parser)]
#[command(name = "stackrise", about = "Headless driver for the stackrise puzzle grid")]
struct CliArgs {
    /// TOML configuration file; flags below override its values.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Seed for the block factory.
    #[arg(long)]
    seed: Option<u64>,
    /// Number of grid columns.
    #[arg(long)]
    width: Option<u32>,
    /// Number of grid rows.
    #[arg(long)]
    height: Option<u32>,
    /// Rows risen per second while idle.
    #[arg(long)]
    rise_speed: Option<f32>,
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 600)]
    ticks: u32,
    /// Length of a single tick in milliseconds.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,
    /// Swap to request once the grid is idle, as `column,row:direction`. Repeatable.
    #[arg(long = "swap", value_name = "SWAP", value_parser = parse_swap)]
    swaps: Vec<SwapRequest>,
    /// Print the grid every N ticks; zero prints only the final grid.
    #[arg(long, default_value_t = 0)]
    print_every: u32,
    /// Start from an encoded layout instead of a freshly filled grid.
    #[arg(long, value_name = "LAYOUT")]
    layout: Option<String>,
    /// Print the encoded layout of the final grid.
    #[arg(long)]
    print_layout: bool,
}

/// Tallies of the events observed during a run.
#[derive(Debug, Default)]
struct RunSummary {
    swaps: u32,
    matches: u32,
    cleared: u32,
    rows_inserted: u32,
}

impl RunSummary {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::SwapCommitted { .. } => self.swaps += 1,
                Event::MatchFound { cells } => {
                    self.matches += 1;
                    self.cleared += u32::try_from(cells.len()).unwrap_or(u32::MAX);
                }
                Event::RowInserted { .. } => self.rows_inserted += 1,
                _ => {}
            }
        }
    }
}

/// Entry point for the stackrise command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = CliArgs::parse();

    let mut file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    if let Some(seed) = args.seed {
        file.seed = seed;
    }
    if let Some(width) = args.width {
        file.columns = width;
    }
    if let Some(height) = args.height {
        file.rows = height;
    }
    if let Some(rise_speed) = args.rise_speed {
        file.rise_speed = rise_speed;
    }

    let layout = args
        .layout
        .as_deref()
        .map(GridLayoutSnapshot::decode)
        .transpose()
        .context("failed to decode --layout")?;
    if let Some(layout) = &layout {
        file.columns = layout.columns;
        file.rows = layout.rows;
        file.starting_rows = file.starting_rows.min(layout.rows.saturating_sub(1));
    }

    let config = file.to_config()?;
    config.validate().context("invalid configuration")?;
    let factory = config.block_factory(file.seed);
    let mut events = Vec::new();
    let mut scheduler = match &layout {
        Some(layout) => CascadeScheduler::new(config, layout.to_world(), factory),
        None => CascadeScheduler::populated(config, factory, &mut events),
    }
    .context("invalid configuration")?;

    info!(
        "simulating {} ticks of {} ms with seed {}",
        args.ticks, args.tick_ms, file.seed
    );
    let dt = Duration::from_millis(args.tick_ms);
    let mut swaps: VecDeque<SwapRequest> = args.swaps.into();
    let mut summary = RunSummary::default();

    for tick in 1..=args.ticks {
        if scheduler.state() == CascadeState::Idle {
            if let Some(swap) = swaps.pop_front() {
                match scheduler.request_swap_toward(swap.cell, swap.direction, &mut events) {
                    Ok(()) => debug!("tick {tick}: swap {swap} accepted"),
                    Err(error) => warn!("tick {tick}: swap {swap} rejected: {error}"),
                }
            }
        }

        scheduler.tick(dt, &mut events);
        summary.record(&events);
        events.clear();

        if args.print_every > 0 && tick % args.print_every == 0 {
            println!("tick {tick} ({:?})", scheduler.state());
            print!("{}", render::grid(scheduler.world()));
        }
        if scheduler.is_grid_full() {
            warn!("grid full after {tick} ticks");
            break;
        }
    }

    println!("final grid after {:?}", scheduler.elapsed());
    print!("{}", render::grid(scheduler.world()));
    println!(
        "swaps: {}, matches: {}, cleared: {}, rows inserted: {}, grid full: {}",
        summary.swaps,
        summary.matches,
        summary.cleared,
        summary.rows_inserted,
        scheduler.is_grid_full()
    );
    if !swaps.is_empty() {
        warn!("{} scripted swaps were never requested", swaps.len());
    }

    if args.print_layout {
        let encoded = GridLayoutSnapshot::from_world(scheduler.world())
            .encode()
            .context("failed to encode final layout")?;
        println!("{encoded}");
    }

    Ok(())
}
