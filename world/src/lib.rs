#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Knight Runner.

mod collision;
mod motion;
mod powerups;

use std::time::Duration;

use knight_runner_core::{
    CellCoord, Command, EnemyId, Event, PowerUpId, PowerUpKind, BOARD_SIZE, KNIGHT_START,
    WELCOME_BANNER,
};
use log::debug;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    collision::Contact,
    motion::{Advance, Enemy},
    powerups::{PlayerStatus, PowerUp},
};

/// Pixel length of a board cell used until an adapter configures one.
pub const DEFAULT_CELL_SIZE: f32 = 64.0;

const DEFAULT_SEED: u64 = 0x6b6e_6967_6874_0001;

/// Configuration parameters required to construct the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    seed: u64,
    cell_size: f32,
}

impl Config {
    /// Creates a new configuration using the provided seed and cell size.
    #[must_use]
    pub const fn new(seed: u64, cell_size: f32) -> Self {
        Self { seed, cell_size }
    }

    /// Returns a copy of the configuration using a different random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Returns a copy of the configuration using a different cell size.
    #[must_use]
    pub const fn with_cell_size(mut self, cell_size: f32) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// Seed of the generator driving bishop headings and queen waypoints.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Pixel length of a single board cell.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_SEED, DEFAULT_CELL_SIZE)
    }
}

/// Represents the authoritative Knight Runner world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    cell_size: f32,
    knight: CellCoord,
    enemies: Vec<Enemy>,
    power_ups: Vec<PowerUp>,
    status: PlayerStatus,
    running: bool,
    elapsed: Duration,
    final_score: Option<Duration>,
    danger: bool,
    legal_targets: Vec<CellCoord>,
    next_enemy_id: u32,
    next_power_up_id: u32,
    rng: ChaCha8Rng,
}

impl World {
    /// Creates a new world with a fresh run already in progress.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let cell_size = if is_valid_cell_size(config.cell_size) {
            config.cell_size
        } else {
            DEFAULT_CELL_SIZE
        };
        let mut world = Self {
            banner: WELCOME_BANNER,
            cell_size,
            knight: KNIGHT_START,
            enemies: Vec::new(),
            power_ups: Vec::new(),
            status: PlayerStatus::default(),
            running: true,
            elapsed: Duration::ZERO,
            final_score: None,
            danger: false,
            legal_targets: Vec::new(),
            next_enemy_id: 0,
            next_power_up_id: 0,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
        };
        world.refresh_targets();
        world
    }

    fn reset_run(&mut self) {
        self.knight = KNIGHT_START;
        self.enemies.clear();
        self.power_ups.clear();
        self.status = PlayerStatus::default();
        self.running = true;
        self.elapsed = Duration::ZERO;
        self.final_score = None;
        self.danger = false;
        self.refresh_targets();
    }

    fn refresh_targets(&mut self) {
        self.legal_targets.clear();
        if self.running {
            self.legal_targets.extend(self.knight.knight_targets());
        }
    }

    fn refresh_danger(&mut self) {
        self.danger =
            self.running && collision::in_danger(self.knight, &self.enemies, self.cell_size);
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.elapsed = self.elapsed.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });

        let now = self.elapsed;
        self.power_ups.retain(|power_up| {
            if power_up.is_expired(now) {
                out_events.push(Event::PowerUpExpired {
                    power_up: power_up.id,
                    kind: power_up.kind,
                });
                false
            } else {
                true
            }
        });

        if self.status.expire_slow(now) {
            out_events.push(Event::SlowExpired);
        }

        self.advance_enemies(dt.as_secs_f32(), out_events);
        self.refresh_danger();
    }

    fn advance_enemies(&mut self, dt_secs: f32, out_events: &mut Vec<Event>) {
        let effective_speed = self.status.effective_speed();
        let cell_size = self.cell_size;
        let floor = BOARD_SIZE as f32 * cell_size;

        let mut index = 0;
        while index < self.enemies.len() {
            let enemy = &mut self.enemies[index];
            let advance = enemy.advance(dt_secs, effective_speed, cell_size, &mut self.rng);
            let id = enemy.id;
            let below_board = enemy.position.y > floor;
            let hit = collision::touches(enemy, self.knight, cell_size);

            if advance == Advance::Exited {
                let _ = self.enemies.remove(index);
                out_events.push(Event::EnemyExited { enemy: id });
                continue;
            }

            if hit {
                match collision::resolve(&mut self.status) {
                    Contact::Absorbed => {
                        let _ = self.enemies.remove(index);
                        debug!("shield absorbed enemy {} at {:?}", id.get(), self.knight);
                        out_events.push(Event::ShieldAbsorbedHit {
                            enemy: id,
                            cell: self.knight,
                        });
                        continue;
                    }
                    Contact::Fatal => {
                        self.end_run(out_events);
                        return;
                    }
                }
            }

            if below_board {
                let _ = self.enemies.remove(index);
                out_events.push(Event::EnemyExited { enemy: id });
                continue;
            }

            index += 1;
        }
    }

    fn commit(&mut self, to: CellCoord, out_events: &mut Vec<Event>) {
        if !self.legal_targets.contains(&to) {
            return;
        }

        let from = self.knight;
        self.knight = to;
        out_events.push(Event::KnightMoved { from, to });

        self.collect_power_ups(out_events);
        self.resolve_commit_collision(out_events);
        self.refresh_targets();
        if self.status.spend_speed_move() {
            out_events.push(Event::SpeedBoostDepleted);
        }
        self.refresh_danger();
    }

    fn collect_power_ups(&mut self, out_events: &mut Vec<Event>) {
        let knight = self.knight;
        let (collected, remaining): (Vec<PowerUp>, Vec<PowerUp>) = self
            .power_ups
            .drain(..)
            .partition(|power_up| power_up.cell == knight);
        self.power_ups = remaining;

        for power_up in collected {
            self.status.grant(power_up.kind, self.elapsed);
            out_events.push(Event::PowerUpCollected {
                power_up: power_up.id,
                kind: power_up.kind,
                cell: power_up.cell,
            });

            if power_up.kind == PowerUpKind::Clear {
                let count = self.enemies.len();
                self.enemies.clear();
                out_events.push(Event::EnemiesCleared { count });
            }
        }
    }

    fn resolve_commit_collision(&mut self, out_events: &mut Vec<Event>) {
        let hits = collision::enemies_on(&self.enemies, self.knight, self.cell_size);
        if hits.is_empty() {
            return;
        }

        match collision::resolve(&mut self.status) {
            Contact::Absorbed => {
                self.enemies.retain(|enemy| !hits.contains(&enemy.id));
                debug!("shield absorbed {} enemies at {:?}", hits.len(), self.knight);
                for enemy in hits {
                    out_events.push(Event::ShieldAbsorbedHit {
                        enemy,
                        cell: self.knight,
                    });
                }
            }
            Contact::Fatal => self.end_run(out_events),
        }
    }

    fn end_run(&mut self, out_events: &mut Vec<Event>) {
        if !self.running {
            return;
        }

        self.running = false;
        self.final_score = Some(self.elapsed);
        self.danger = false;
        self.refresh_targets();
        debug!(
            "run ended at {:.1}s with knight on {:?}",
            self.elapsed.as_secs_f32(),
            self.knight
        );
        out_events.push(Event::GameOver {
            score: self.elapsed,
        });
    }

    fn next_enemy_id(&mut self) -> EnemyId {
        let id = EnemyId::new(self.next_enemy_id);
        self.next_enemy_id = self.next_enemy_id.wrapping_add(1);
        id
    }

    fn next_power_up_id(&mut self) -> PowerUpId {
        let id = PowerUpId::new(self.next_power_up_id);
        self.next_power_up_id = self.next_power_up_id.wrapping_add(1);
        id
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Once the run is over only [`Command::Restart`] and
/// [`Command::ConfigureBoard`] have any effect.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureBoard { cell_size } => {
            if !is_valid_cell_size(cell_size) {
                return;
            }
            let factor = cell_size / world.cell_size;
            for enemy in world.enemies.iter_mut() {
                enemy.rescale(factor);
            }
            world.cell_size = cell_size;
            out_events.push(Event::BoardConfigured { cell_size });
        }
        Command::Restart => {
            world.reset_run();
            debug!("run restarted");
            out_events.push(Event::RunRestarted);
        }
        _ if !world.running => {}
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::MoveKnight { to } => world.commit(to, out_events),
        Command::SpawnEnemy { kind, column } => {
            if !(0..BOARD_SIZE).contains(&column) {
                return;
            }
            let enemy = world.next_enemy_id();
            let spawned = Enemy::spawn(enemy, kind, column, world.cell_size, &mut world.rng);
            world.enemies.push(spawned);
            out_events.push(Event::EnemySpawned {
                enemy,
                kind,
                cell: CellCoord::new(column, -1),
            });
        }
        Command::SpawnPowerUp { kind, cell } => {
            if !cell.is_on_board() || cell == world.knight {
                return;
            }
            let power_up = world.next_power_up_id();
            let placed = PowerUp::new(power_up, kind, cell, world.elapsed);
            world.power_ups.push(placed);
            out_events.push(Event::PowerUpSpawned {
                power_up,
                kind,
                cell,
                expires_at: placed.expires_at,
            });
        }
        Command::IncreaseDifficulty { step } => {
            world.status.speed_mult += step;
            debug!("difficulty raised to {:.1}", world.status.speed_mult);
            out_events.push(Event::DifficultyIncreased {
                speed_mult: world.status.speed_mult,
            });
        }
    }
}

fn is_valid_cell_size(cell_size: f32) -> bool {
    cell_size.is_finite() && cell_size > 0.0
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::{collision, World};
    use knight_runner_core::{
        CellCoord, EnemySnapshot, EnemyView, PowerUpSnapshot, StatusSnapshot,
    };

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Pixel length of a single board cell.
    #[must_use]
    pub fn cell_size(world: &World) -> f32 {
        world.cell_size
    }

    /// Cell currently occupied by the knight.
    #[must_use]
    pub fn knight(world: &World) -> CellCoord {
        world.knight
    }

    /// Captures a read-only view of the enemies on the board.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        let snapshots = world
            .enemies
            .iter()
            .map(|enemy| EnemySnapshot {
                id: enemy.id,
                kind: enemy.kind(),
                position: enemy.position,
                cell: collision::enemy_cell(enemy, world.cell_size),
                waypoint: enemy.waypoint(),
            })
            .collect();
        EnemyView::from_snapshots(snapshots)
    }

    /// Rounded cells currently covered by enemies.
    #[must_use]
    pub fn enemy_cells(world: &World) -> Vec<CellCoord> {
        world
            .enemies
            .iter()
            .map(|enemy| collision::enemy_cell(enemy, world.cell_size))
            .collect()
    }

    /// Power-ups waiting on the board in spawn order.
    #[must_use]
    pub fn power_ups(world: &World) -> Vec<PowerUpSnapshot> {
        world
            .power_ups
            .iter()
            .map(|power_up| PowerUpSnapshot {
                id: power_up.id,
                kind: power_up.kind,
                cell: power_up.cell,
                expires_at: power_up.expires_at,
            })
            .collect()
    }

    /// Captures the player's buffs, difficulty and run state.
    #[must_use]
    pub fn status(world: &World) -> StatusSnapshot {
        StatusSnapshot {
            shield: world.status.shield,
            speed_moves: world.status.speed_moves,
            slow_factor: world.status.slow_factor,
            slow_until: world.status.slow_until,
            speed_mult: world.status.speed_mult,
            running: world.running,
            danger: world.danger,
            elapsed: world.elapsed,
        }
    }

    /// Cells the knight may jump to. Empty once the run is over.
    #[must_use]
    pub fn legal_targets(world: &World) -> &[CellCoord] {
        &world.legal_targets
    }

    /// Reports whether the run is still in progress.
    #[must_use]
    pub fn is_running(world: &World) -> bool {
        world.running
    }

    /// Survival time of the current run, frozen once the run ends.
    #[must_use]
    pub fn score(world: &World) -> Duration {
        world.elapsed
    }

    /// Score recorded by the fatal collision, if the run is over.
    #[must_use]
    pub fn final_score(world: &World) -> Option<Duration> {
        world.final_score
    }
}
