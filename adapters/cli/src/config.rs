//! Layered run settings: built-in defaults, an optional TOML file, then flags.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use knight_runner_session as session;
use knight_runner_system_spawning as spawning;
use knight_runner_world::DEFAULT_CELL_SIZE;
use serde::Deserialize;

use crate::CliArgs;

const DEFAULT_FRAMES: u32 = 3_600;
const DEFAULT_FRAME_MS: u64 = 16;
const DEFAULT_MOVE_EVERY: u32 = 20;
const DEFAULT_PRINT_EVERY: u32 = 60;
const DEFAULT_LEADERBOARD: &str = "knight-runner-scores.json";

/// Contents of a settings file. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileConfig {
    seed: Option<u64>,
    frames: Option<u32>,
    frame_ms: Option<u64>,
    cell_size: Option<f32>,
    move_every: Option<u32>,
    print_every: Option<u32>,
    name: Option<String>,
    leaderboard: Option<PathBuf>,
    spawning: SpawnTuning,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
struct SpawnTuning {
    base_delay_ms: Option<u64>,
    min_delay_ms: Option<u64>,
    power_up_chance: Option<f64>,
    difficulty_period_ms: Option<u64>,
    difficulty_step: Option<f32>,
}

impl SpawnTuning {
    fn apply(self, config: spawning::Config) -> Result<spawning::Config> {
        let base_delay = self
            .base_delay_ms
            .map_or(config.base_delay(), Duration::from_millis);
        let min_delay = self
            .min_delay_ms
            .map_or(config.min_delay(), Duration::from_millis);
        let power_up_chance = self.power_up_chance.unwrap_or(config.power_up_chance());
        let period = self
            .difficulty_period_ms
            .map_or(config.difficulty_period(), Duration::from_millis);
        let step = self.difficulty_step.unwrap_or(config.difficulty_step());

        if min_delay.is_zero() || base_delay < min_delay {
            bail!("spawn delays must satisfy 0 < min_delay_ms <= base_delay_ms");
        }
        if !(0.0..=1.0).contains(&power_up_chance) {
            bail!("power_up_chance must lie in 0..=1 (received {power_up_chance})");
        }
        if period.is_zero() {
            bail!("difficulty_period_ms must be positive");
        }
        if !step.is_finite() || step < 0.0 {
            bail!("difficulty_step must be a non-negative number (received {step})");
        }

        Ok(config
            .with_spawn_delays(base_delay, min_delay)
            .with_power_up_chance(power_up_chance)
            .with_difficulty(period, step))
    }
}

impl FileConfig {
    /// Reads and parses a settings file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse settings file {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("invalid settings toml")
    }
}

/// Fully resolved settings for one invocation.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Settings {
    pub(crate) seed: u64,
    pub(crate) frames: u32,
    pub(crate) frame: Duration,
    pub(crate) cell_size: f32,
    pub(crate) move_every: u32,
    pub(crate) print_every: u32,
    pub(crate) name: Option<String>,
    pub(crate) leaderboard: PathBuf,
    spawning: SpawnTuning,
}

impl Settings {
    /// Merges flags over the file, falling back to defaults.
    ///
    /// `fallback_seed` is used when neither layer names a seed.
    pub(crate) fn resolve(args: &CliArgs, file: FileConfig, fallback_seed: u64) -> Result<Self> {
        let frame_ms = args.frame_ms.or(file.frame_ms).unwrap_or(DEFAULT_FRAME_MS);
        if frame_ms == 0 {
            bail!("frame-ms must be positive");
        }

        let cell_size = args
            .cell_size
            .or(file.cell_size)
            .unwrap_or(DEFAULT_CELL_SIZE);
        if !cell_size.is_finite() || cell_size <= 0.0 {
            bail!("cell-size must be positive (received {cell_size})");
        }

        let move_every = args
            .move_every
            .or(file.move_every)
            .unwrap_or(DEFAULT_MOVE_EVERY);
        if move_every == 0 {
            bail!("move-every must be at least 1");
        }

        Ok(Self {
            seed: args.seed.or(file.seed).unwrap_or(fallback_seed),
            frames: args.frames.or(file.frames).unwrap_or(DEFAULT_FRAMES),
            frame: Duration::from_millis(frame_ms),
            cell_size,
            move_every,
            print_every: args
                .print_every
                .or(file.print_every)
                .unwrap_or(DEFAULT_PRINT_EVERY),
            name: args.name.clone().or(file.name),
            leaderboard: args
                .leaderboard
                .clone()
                .or(file.leaderboard)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LEADERBOARD)),
            spawning: file.spawning,
        })
    }

    /// Session configuration seeded from these settings.
    pub(crate) fn session_config(&self) -> Result<session::Config> {
        let seeded = session::Config::seeded(self.seed);
        let spawning = self
            .spawning
            .apply(seeded.spawning())
            .context("invalid [spawning] settings")?;
        Ok(session::Config::new(
            seeded.world().with_cell_size(self.cell_size),
            spawning,
        ))
    }
}
