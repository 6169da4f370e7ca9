//! TOML configuration file mirroring the scheduler configuration.

use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use stackrise_core::BlockKind;
use stackrise_system_cascade::Config;

/// On-disk configuration. Durations are expressed in milliseconds and the
/// palette as a string of block symbols such as `"RBGOPW"`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileConfig {
    pub(crate) columns: u32,
    pub(crate) rows: u32,
    pub(crate) palette: String,
    pub(crate) starting_rows: u32,
    pub(crate) rise_speed: f32,
    pub(crate) swap_settle_ms: u64,
    pub(crate) destroy_stagger_ms: u64,
    pub(crate) fall_settle_ms: u64,
    pub(crate) seed: u64,
}

impl Default for FileConfig {
    fn default() -> Self {
        let config = Config::default();
        Self {
            columns: config.columns,
            rows: config.rows,
            palette: config.palette.iter().map(|kind| kind.symbol()).collect(),
            starting_rows: config.starting_rows,
            rise_speed: config.rise_speed,
            swap_settle_ms: millis(config.swap_settle),
            destroy_stagger_ms: millis(config.destroy_stagger),
            fall_settle_ms: millis(config.fall_settle),
            seed: 0,
        }
    }
}

impl FileConfig {
    /// Reads and parses the configuration file at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Parses configuration from TOML text.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("invalid config toml")
    }

    /// Converts the file representation into the scheduler configuration.
    pub(crate) fn to_config(&self) -> Result<Config> {
        let mut palette = Vec::with_capacity(self.palette.len());
        for symbol in self.palette.chars().filter(|symbol| !symbol.is_whitespace()) {
            let Some(kind) = BlockKind::from_symbol(symbol) else {
                bail!("unknown block symbol `{symbol}` in palette");
            };
            palette.push(kind);
        }

        Ok(Config {
            columns: self.columns,
            rows: self.rows,
            palette,
            starting_rows: self.starting_rows,
            rise_speed: self.rise_speed,
            swap_settle: Duration::from_millis(self.swap_settle_ms),
            destroy_stagger: Duration::from_millis(self.destroy_stagger_ms),
            fall_settle: Duration::from_millis(self.fall_settle_ms),
        })
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mirror_scheduler_defaults() {
        let config = FileConfig::default().to_config().expect("defaults convert");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let file = FileConfig::parse(
            r#"
            columns = 8
            palette = "RGB"
            fall_settle_ms = 350
            seed = 9
            "#,
        )
        .expect("config parses");
        assert_eq!(file.seed, 9);

        let config = file.to_config().expect("config converts");
        assert_eq!(config.columns, 8);
        assert_eq!(config.rows, Config::default().rows);
        assert_eq!(
            config.palette,
            vec![BlockKind::Red, BlockKind::Green, BlockKind::Blue]
        );
        assert_eq!(config.fall_settle, Duration::from_millis(350));
    }

    #[test]
    fn unknown_fields_and_symbols_are_rejected() {
        assert!(FileConfig::parse("colums = 8").is_err());

        let file = FileConfig {
            palette: "RBX".to_owned(),
            ..FileConfig::default()
        };
        assert!(file.to_config().is_err());
    }
}
