#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Rise controller that pushes the grid upward over time.
//!
//! The offset grows by `speed * dt` while the controller is running. Once a
//! full row has accumulated the grid shifts up by one, a fresh row of unusable
//! blocks enters at the bottom and the offset restarts from zero. Blocks become
//! usable the first time their effective row (`row + offset`) reaches one.

use std::time::Duration;

use log::debug;
use stackrise_core::{CellCoord, Command};
use stackrise_system_spawning::{generate_row, BlockSource};
use stackrise_world::query::GridView;

/// Configuration parameters required to construct the rise controller.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rise_speed: f32,
}

impl Config {
    /// Creates a new configuration rising `rise_speed` rows per second.
    #[must_use]
    pub const fn new(rise_speed: f32) -> Self {
        Self { rise_speed }
    }
}

/// Stateful controller owning the rise speed and its pause protocol.
#[derive(Clone, Debug)]
pub struct Rise {
    configured_speed: f32,
    speed: f32,
}

impl Rise {
    /// Creates a running controller using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let speed = if config.rise_speed.is_finite() {
            config.rise_speed.max(0.0)
        } else {
            0.0
        };
        Self {
            configured_speed: speed,
            speed,
        }
    }

    /// Forces the speed to zero while a cascade is in flight.
    pub fn pause(&mut self) {
        if self.speed > 0.0 {
            debug!("rise paused");
        }
        self.speed = 0.0;
    }

    /// Restores the configured speed once a cascade fully settled.
    pub fn resume(&mut self) {
        if self.speed != self.configured_speed {
            debug!("rise resumed at {} rows/s", self.configured_speed);
        }
        self.speed = self.configured_speed;
    }

    /// Current rise speed in rows per second.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Reports whether the controller is held at zero speed.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.speed == 0.0 && self.configured_speed > 0.0
    }

    /// Advances the offset by `dt` and emits the resulting grid commands.
    ///
    /// When a full row accumulates the batch shifts the rows, resets the
    /// offset and places one new unusable block per column at row zero.
    pub fn handle<S>(
        &mut self,
        dt: Duration,
        view: GridView<'_>,
        source: &mut S,
        out: &mut Vec<Command>,
    ) where
        S: BlockSource + ?Sized,
    {
        if self.speed <= 0.0 || dt.is_zero() {
            return;
        }

        let offset = view.rise_offset() + self.speed * dt.as_secs_f32();
        if offset < 1.0 {
            out.push(Command::SetRiseOffset { offset });
            return;
        }

        let (columns, _) = view.dimensions();
        debug!("rise completed a row; inserting {columns} blocks");
        out.push(Command::ShiftRowsUp);
        out.push(Command::SetRiseOffset { offset: 0.0 });
        for (column, kind) in (0..columns).zip(generate_row(source, columns)) {
            out.push(Command::PlaceBlock {
                cell: CellCoord::new(column, 0),
                kind,
                usable: false,
            });
        }
    }

    /// Emits promotions for every unusable block that crossed the visibility threshold.
    pub fn promote(&self, view: GridView<'_>, out: &mut Vec<Command>) {
        let offset = view.rise_offset();
        out.extend(
            view.occupied()
                .filter(|block| !block.usable && block.effective_row(offset) >= 1.0)
                .map(|block| Command::PromoteBlock { block: block.id }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_speeds_disable_rising() {
        assert_eq!(Rise::new(Config::new(-1.0)).speed(), 0.0);
        assert_eq!(Rise::new(Config::new(f32::INFINITY)).speed(), 0.0);
    }

    #[test]
    fn pause_and_resume_restore_configured_speed() {
        let mut rise = Rise::new(Config::new(0.4));
        rise.pause();
        assert!(rise.is_paused());
        assert_eq!(rise.speed(), 0.0);
        rise.resume();
        assert!(!rise.is_paused());
        assert_eq!(rise.speed(), 0.4);
    }
}
