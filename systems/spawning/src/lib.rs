#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system that paces enemy and power-up arrivals and
//! ramps the difficulty multiplier over the course of a run.

pub mod scheduler;

use std::time::Duration;

use knight_runner_core::{
    CellCoord, Command, EnemyKind, Event, PowerUpKind, StatusSnapshot, BOARD_SIZE,
};
use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub use scheduler::Scheduler;

const POWER_UP_ATTEMPTS: usize = 20;
const MIN_TIMER_STEP: Duration = Duration::from_millis(1);

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    base_delay: Duration,
    min_delay: Duration,
    power_up_chance: f64,
    difficulty_period: Duration,
    difficulty_step: f32,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the stock cadence and the provided seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self {
            base_delay: Duration::from_millis(1_500),
            min_delay: Duration::from_millis(80),
            power_up_chance: 0.12,
            difficulty_period: Duration::from_millis(6_000),
            difficulty_step: 0.4,
            rng_seed,
        }
    }

    /// Returns a copy of the configuration using different spawn delays.
    #[must_use]
    pub const fn with_spawn_delays(mut self, base_delay: Duration, min_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.min_delay = min_delay;
        self
    }

    /// Returns a copy of the configuration using a different power-up probability.
    #[must_use]
    pub const fn with_power_up_chance(mut self, power_up_chance: f64) -> Self {
        self.power_up_chance = power_up_chance;
        self
    }

    /// Returns a copy of the configuration using a different difficulty ramp.
    #[must_use]
    pub const fn with_difficulty(mut self, period: Duration, step: f32) -> Self {
        self.difficulty_period = period;
        self.difficulty_step = step;
        self
    }

    /// Delay between spawns at an effective speed of 1.0.
    #[must_use]
    pub const fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Shortest delay between spawns regardless of speed.
    #[must_use]
    pub const fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Probability that a spawn places a power-up instead of an enemy.
    #[must_use]
    pub const fn power_up_chance(&self) -> f64 {
        self.power_up_chance
    }

    /// Interval between difficulty increases.
    #[must_use]
    pub const fn difficulty_period(&self) -> Duration {
        self.difficulty_period
    }

    /// Amount added to the speed multiplier on every difficulty increase.
    #[must_use]
    pub const fn difficulty_step(&self) -> f32 {
        self.difficulty_step
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(0x5eed_0f_c4e5_5b0a)
    }
}

/// Timers driven by the spawning system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timer {
    /// Places the next enemy or power-up.
    Spawn,
    /// Raises the difficulty multiplier.
    Difficulty,
}

/// Pure system that emits spawn and difficulty commands on a simulated clock.
#[derive(Debug)]
pub struct Spawning {
    config: Config,
    scheduler: Scheduler<Timer>,
    clock: Duration,
    speed_mult: f32,
    stopped: bool,
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a new spawning system with both timers armed for a fresh run.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let mut spawning = Self {
            config,
            scheduler: Scheduler::new(),
            clock: Duration::ZERO,
            speed_mult: 1.0,
            stopped: false,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        };
        spawning.arm();
        spawning
    }

    /// Time elapsed on the system's clock since the run started.
    #[must_use]
    pub const fn clock(&self) -> Duration {
        self.clock
    }

    /// Speed multiplier the system last observed or applied.
    #[must_use]
    pub const fn speed_mult(&self) -> f32 {
        self.speed_mult
    }

    /// Reports whether the timers were cancelled by a game over.
    #[must_use]
    pub const fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Clock time at which the pending spawn fires.
    #[must_use]
    pub fn next_spawn_at(&self) -> Option<Duration> {
        self.scheduler.fire_time_of(&Timer::Spawn)
    }

    /// Clock time at which the pending difficulty increase fires.
    #[must_use]
    pub fn next_difficulty_at(&self) -> Option<Duration> {
        self.scheduler.fire_time_of(&Timer::Difficulty)
    }

    /// Spawn delay for the provided effective speed.
    ///
    /// The base delay is divided by `effective_speed` and never drops below
    /// the configured floor.
    #[must_use]
    pub fn spawn_delay(&self, effective_speed: f32) -> Duration {
        let scaled = self.config.base_delay.as_secs_f64() / f64::from(effective_speed);
        Duration::try_from_secs_f64(scaled)
            .unwrap_or(self.config.base_delay)
            .max(self.config.min_delay)
            .max(MIN_TIMER_STEP)
    }

    /// Consumes world events and the current status to emit spawn commands.
    ///
    /// `occupied` lists the rounded cells covered by enemies; power-ups are
    /// never placed there or on `knight`.
    pub fn handle(
        &mut self,
        events: &[Event],
        status: &StatusSnapshot,
        knight: CellCoord,
        occupied: &[CellCoord],
        out: &mut Vec<Command>,
    ) {
        self.speed_mult = status.speed_mult;

        for event in events {
            match event {
                Event::TimeAdvanced { dt } if !self.stopped => {
                    self.clock = self.clock.saturating_add(*dt);
                    self.fire_due(status.slow_factor, knight, occupied, out);
                }
                Event::GameOver { .. } => {
                    self.stopped = true;
                    self.scheduler.clear();
                }
                Event::RunRestarted => self.arm(),
                _ => {}
            }
        }
    }

    fn arm(&mut self) {
        self.scheduler.clear();
        self.clock = Duration::ZERO;
        self.speed_mult = 1.0;
        self.stopped = false;
        self.scheduler
            .schedule(Timer::Spawn, self.spawn_delay(self.speed_mult));
        self.scheduler
            .schedule(Timer::Difficulty, self.difficulty_period());
    }

    fn difficulty_period(&self) -> Duration {
        self.config.difficulty_period.max(MIN_TIMER_STEP)
    }

    fn fire_due(
        &mut self,
        slow_factor: f32,
        knight: CellCoord,
        occupied: &[CellCoord],
        out: &mut Vec<Command>,
    ) {
        while let Some((fire_at, timer)) = self.scheduler.pop_due(self.clock) {
            match timer {
                Timer::Spawn => {
                    self.spawn(knight, occupied, out);
                    let delay = self.spawn_delay(self.speed_mult * slow_factor);
                    self.scheduler.schedule(Timer::Spawn, fire_at + delay);
                }
                Timer::Difficulty => {
                    let step = self.config.difficulty_step;
                    self.speed_mult += step;
                    debug!("difficulty tick at {:?}, speed x{:.1}", fire_at, self.speed_mult);
                    out.push(Command::IncreaseDifficulty { step });

                    let delay = self.spawn_delay(self.speed_mult * slow_factor);
                    self.scheduler.reschedule(Timer::Spawn, fire_at + delay);
                    let period = self.difficulty_period();
                    self.scheduler
                        .schedule(Timer::Difficulty, fire_at + period);
                }
            }
        }
    }

    fn spawn(&mut self, knight: CellCoord, occupied: &[CellCoord], out: &mut Vec<Command>) {
        if self.rng.gen::<f64>() < self.config.power_up_chance {
            if let Some(command) = self.place_power_up(knight, occupied) {
                out.push(command);
            }
            return;
        }

        let kind = enemy_kind(self.rng.gen::<f64>());
        let column = self.rng.gen_range(0..BOARD_SIZE);
        out.push(Command::SpawnEnemy { kind, column });
    }

    fn place_power_up(&mut self, knight: CellCoord, occupied: &[CellCoord]) -> Option<Command> {
        for _ in 0..POWER_UP_ATTEMPTS {
            let cell = CellCoord::new(
                self.rng.gen_range(0..BOARD_SIZE),
                self.rng.gen_range(0..BOARD_SIZE - 1),
            );
            if cell == knight || occupied.contains(&cell) {
                continue;
            }
            let kind = PowerUpKind::ALL[self.rng.gen_range(0..PowerUpKind::ALL.len())];
            return Some(Command::SpawnPowerUp { kind, cell });
        }
        None
    }
}

/// Maps a uniform draw in `[0, 1)` onto the weighted enemy table.
fn enemy_kind(draw: f64) -> EnemyKind {
    if draw > 0.85 {
        EnemyKind::Queen
    } else if draw > 0.65 {
        EnemyKind::Rook
    } else if draw > 0.40 {
        EnemyKind::Bishop
    } else {
        EnemyKind::Pawn
    }
}
