#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Single owner of a Knight Runner run.
//!
//! A [`Session`] holds the world together with the input and spawning systems
//! and drives them synchronously: every frame, key press or pointer selection
//! is turned into commands, applied to the world, and the resulting events are
//! fed back to the systems until no further commands are produced.

use std::{collections::VecDeque, time::Duration};

use knight_runner_core::{CellCoord, Command, Direction, Event, InputOutcome};
use knight_runner_system_input::KnightInput;
use knight_runner_system_spawning::{self as spawning, Spawning};
use knight_runner_world::{self as world, query, World};
use log::info;

/// Configuration parameters required to construct a session.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Config {
    world: world::Config,
    spawning: spawning::Config,
}

impl Config {
    /// Creates a new configuration from the world and spawning settings.
    #[must_use]
    pub const fn new(world: world::Config, spawning: spawning::Config) -> Self {
        Self { world, spawning }
    }

    /// Seeds both the world and the spawning system from a single value.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(
            world::Config::default().with_seed(seed),
            spawning::Config::new(seed.rotate_left(32) ^ 0x9e37_79b9_7f4a_7c15),
        )
    }

    /// World settings.
    #[must_use]
    pub const fn world(&self) -> world::Config {
        self.world
    }

    /// Spawning settings.
    #[must_use]
    pub const fn spawning(&self) -> spawning::Config {
        self.spawning
    }
}

/// Owns the state of one game and the systems that drive it.
#[derive(Debug)]
pub struct Session {
    world: World,
    input: KnightInput,
    spawning: Spawning,
    events: Vec<Event>,
}

impl Session {
    /// Starts a fresh run.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let session = Self {
            world: World::new(config.world),
            input: KnightInput::new(),
            spawning: Spawning::new(config.spawning),
            events: Vec::new(),
        };
        info!("{}", query::welcome_banner(&session.world));
        session
    }

    /// Advances the simulation by `dt`. Does nothing once the run is over.
    ///
    /// Returns the events produced during the frame.
    pub fn frame(&mut self, dt: Duration) -> &[Event] {
        self.events.clear();
        if query::is_running(&self.world) {
            self.pump(Command::Tick { dt });
        }
        &self.events
    }

    /// Feeds a cardinal key press into the two-key move protocol.
    pub fn press(&mut self, direction: Direction) -> InputOutcome {
        self.events.clear();
        let mut commands = Vec::new();
        let knight = query::knight(&self.world);
        let outcome = self.input.press(direction, knight, &mut commands);
        self.pump_all(commands);
        outcome
    }

    /// Commits a pointer selection of one of the knight's jump targets.
    pub fn select(&mut self, cell: CellCoord) -> InputOutcome {
        self.events.clear();
        let mut commands = Vec::new();
        let knight = query::knight(&self.world);
        let outcome = self.input.select(cell, knight, &mut commands);
        self.pump_all(commands);
        outcome
    }

    /// Discards the current run and starts a new one with fresh timers.
    pub fn restart(&mut self) {
        self.events.clear();
        self.pump(Command::Restart);
        info!("run restarted");
    }

    /// Adopts a new pixel length for board cells.
    pub fn resize(&mut self, cell_size: f32) {
        self.events.clear();
        self.pump(Command::ConfigureBoard { cell_size });
    }

    /// Read-only access to the world for queries and rendering.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Events produced by the most recent call into the session.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Reports whether the run is still in progress.
    #[must_use]
    pub fn is_running(&self) -> bool {
        query::is_running(&self.world)
    }

    /// Survival time of the current run.
    #[must_use]
    pub fn score(&self) -> Duration {
        query::score(&self.world)
    }

    /// Score of the finished run, if the run is over.
    #[must_use]
    pub fn final_score(&self) -> Option<Duration> {
        query::final_score(&self.world)
    }

    fn pump_all(&mut self, commands: Vec<Command>) {
        for command in commands {
            self.pump(command);
        }
    }

    fn pump(&mut self, command: Command) {
        let mut queue = VecDeque::from([command]);

        while let Some(command) = queue.pop_front() {
            let mut events = Vec::new();
            world::apply(&mut self.world, command, &mut events);
            if events.is_empty() {
                continue;
            }

            self.input.handle(&events);

            let status = query::status(&self.world);
            let knight = query::knight(&self.world);
            let occupied = query::enemy_cells(&self.world);
            let mut commands = Vec::new();
            self.spawning
                .handle(&events, &status, knight, &occupied, &mut commands);

            for event in &events {
                if let Event::GameOver { score } = event {
                    info!("game over after {:.1}s", score.as_secs_f32());
                }
            }

            self.events.extend(events);
            queue.extend(commands);
        }
    }
}
