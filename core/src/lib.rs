#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Knight Runner engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Systems consume event streams,
//! query immutable snapshots, and respond exclusively with new command batches.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Knight Runner.";

/// Number of cells along each edge of the square board.
pub const BOARD_SIZE: i32 = 8;

/// Cell the knight occupies when a run starts.
pub const KNIGHT_START: CellCoord = CellCoord::new(3, 6);

/// Column/row displacements of the eight L-shaped knight moves.
pub const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
];

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Updates the pixel length of a single board cell.
    ConfigureBoard {
        /// Side length of a square cell measured in pixels.
        cell_size: f32,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Commits the knight to the provided destination cell.
    MoveKnight {
        /// Cell the knight should occupy after the move.
        to: CellCoord,
    },
    /// Requests that an enemy piece enter the board above the provided column.
    SpawnEnemy {
        /// Piece type to create.
        kind: EnemyKind,
        /// Column the piece enters from.
        column: i32,
    },
    /// Requests placement of a power-up on the provided cell.
    SpawnPowerUp {
        /// Effect granted on pickup.
        kind: PowerUpKind,
        /// Cell that hosts the power-up.
        cell: CellCoord,
    },
    /// Raises the global speed multiplier by the provided amount.
    IncreaseDifficulty {
        /// Amount added to the multiplier.
        step: f32,
    },
    /// Discards the current run and starts a fresh one.
    Restart,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that the board adopted a new cell size.
    BoardConfigured {
        /// Side length of a square cell measured in pixels.
        cell_size: f32,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that the knight jumped between two cells.
    KnightMoved {
        /// Cell occupied before the jump.
        from: CellCoord,
        /// Cell occupied after the jump.
        to: CellCoord,
    },
    /// Confirms that an enemy entered the play field.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Piece type of the enemy.
        kind: EnemyKind,
        /// Off-board cell the enemy starts from.
        cell: CellCoord,
    },
    /// Reports that an enemy ran off the bottom edge.
    EnemyExited {
        /// Identifier of the departed enemy.
        enemy: EnemyId,
    },
    /// Reports that a clear effect wiped every enemy from the board.
    EnemiesCleared {
        /// Number of enemies removed.
        count: usize,
    },
    /// Confirms that a power-up was placed on the board.
    PowerUpSpawned {
        /// Identifier assigned to the power-up.
        power_up: PowerUpId,
        /// Effect granted on pickup.
        kind: PowerUpKind,
        /// Cell hosting the power-up.
        cell: CellCoord,
        /// Absolute world time at which the power-up disappears.
        expires_at: Duration,
    },
    /// Reports that a power-up timed out without being collected.
    PowerUpExpired {
        /// Identifier of the expired power-up.
        power_up: PowerUpId,
        /// Effect the power-up would have granted.
        kind: PowerUpKind,
    },
    /// Reports that the knight collected a power-up.
    PowerUpCollected {
        /// Identifier of the collected power-up.
        power_up: PowerUpId,
        /// Effect applied to the player.
        kind: PowerUpKind,
        /// Cell the power-up occupied.
        cell: CellCoord,
    },
    /// Reports that the slow field wore off.
    SlowExpired,
    /// Reports that the last speed-boost move was spent.
    SpeedBoostDepleted,
    /// Reports that a shield charge absorbed a collision.
    ShieldAbsorbedHit {
        /// Enemy removed by the shield.
        enemy: EnemyId,
        /// Cell where the collision happened.
        cell: CellCoord,
    },
    /// Confirms that the global speed multiplier increased.
    DifficultyIncreased {
        /// Multiplier in effect after the increase.
        speed_mult: f32,
    },
    /// Announces that the run ended.
    GameOver {
        /// Elapsed run time at the fatal collision.
        score: Duration,
    },
    /// Announces that a fresh run started.
    RunRestarted,
}

/// Result of feeding one input action into the knight's input state machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputOutcome {
    /// The input arrived while no run was active or did not name a legal target.
    Ignored,
    /// The first direction was accepted and awaits a perpendicular follow-up.
    Armed {
        /// Primary axis chosen by the first input.
        direction: Direction,
        /// Cell two steps along the primary axis.
        midpoint: CellCoord,
        /// On-board cells reachable by a perpendicular second input.
        hints: Vec<CellCoord>,
    },
    /// The first direction pointed off the board.
    Rejected {
        /// Direction that was refused.
        direction: Direction,
        /// Off-board midpoint that caused the rejection.
        midpoint: CellCoord,
    },
    /// The pending move was abandoned without moving the knight.
    Cancelled,
    /// A knight move was submitted to the world.
    Committed {
        /// Destination of the move.
        to: CellCoord,
    },
}

/// Cardinal input directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// Column/row displacement of a single step in this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }

    /// Reports whether the direction runs along the column axis.
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::East | Self::West)
    }

    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Reports whether `other` lies on the perpendicular axis.
    #[must_use]
    pub const fn is_perpendicular_to(self, other: Direction) -> bool {
        self.is_horizontal() != other.is_horizontal()
    }

    /// Perpendicular directions in clockwise order.
    #[must_use]
    pub const fn perpendicular(self) -> [Direction; 2] {
        if self.is_horizontal() {
            [Self::North, Self::South]
        } else {
            [Self::East, Self::West]
        }
    }
}

/// Unique identifier assigned to an enemy piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a power-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PowerUpId(u32);

impl PowerUpId {
    /// Creates a new power-up identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single board cell expressed as column and row coordinates.
///
/// Coordinates are signed so that enemies waiting above the board (row `-1`)
/// or leaving below it can be described with the same type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: i32,
    row: i32,
}

impl CellCoord {
    /// Creates a new cell coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Reports whether the cell lies within the 8×8 board.
    #[must_use]
    pub const fn is_on_board(&self) -> bool {
        self.column >= 0 && self.column < BOARD_SIZE && self.row >= 0 && self.row < BOARD_SIZE
    }

    /// Cell displaced by the provided column and row deltas.
    #[must_use]
    pub const fn offset(self, columns: i32, rows: i32) -> Self {
        Self::new(self.column + columns, self.row + rows)
    }

    /// Cell reached by walking `distance` steps in `direction`.
    #[must_use]
    pub const fn step(self, direction: Direction, distance: i32) -> Self {
        let (columns, rows) = direction.offset();
        self.offset(columns * distance, rows * distance)
    }

    /// On-board cells a knight standing here can jump to.
    pub fn knight_targets(self) -> impl Iterator<Item = CellCoord> {
        KNIGHT_OFFSETS
            .into_iter()
            .map(move |(columns, rows)| self.offset(columns, rows))
            .filter(CellCoord::is_on_board)
    }

    /// Top-left pixel position of the cell for the provided cell size.
    #[must_use]
    pub fn to_pixels(self, cell_size: f32) -> Vec2 {
        Vec2::new(self.column as f32, self.row as f32) * cell_size
    }
}

/// Converts a continuous pixel position into the nearest board cell.
///
/// Both axes are divided by `cell_size` and rounded to the nearest integer,
/// with halves rounding up (towards positive infinity), so a piece exactly
/// half a cell above the board already counts as being on row 0. Collision, occupancy, danger and
/// power-up placement all go through this function so they agree on which
/// cell a moving piece belongs to. `cell_size` must be positive.
#[must_use]
pub fn pixel_to_cell(position: Vec2, cell_size: f32) -> CellCoord {
    let scaled = position / cell_size;
    CellCoord::new(round_half_up(scaled.x), round_half_up(scaled.y))
}

fn round_half_up(value: f32) -> i32 {
    (value + 0.5).floor() as i32
}

/// Chess pieces that can fall onto the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Slow piece falling straight down.
    Pawn,
    /// Fast piece falling straight down.
    Rook,
    /// Piece zig-zagging diagonally, bouncing off the side edges.
    Bishop,
    /// Piece wandering one column left, right or straight each row.
    Queen,
}

impl EnemyKind {
    /// Base travel speed measured in cells per second.
    #[must_use]
    pub const fn base_speed(self) -> f32 {
        match self {
            Self::Pawn => 1.15,
            Self::Rook => 3.20,
            Self::Bishop => 2.30,
            Self::Queen => 1.40,
        }
    }
}

/// Temporary effects that can be collected from the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Grants a single charge that absorbs one collision.
    Shield,
    /// Grants an allowance of boosted moves.
    Speed,
    /// Halves enemy speed for a short window.
    Slow,
    /// Removes every enemy from the board.
    Clear,
}

impl PowerUpKind {
    /// Every power-up kind in spawn-table order.
    pub const ALL: [PowerUpKind; 4] = [Self::Shield, Self::Speed, Self::Slow, Self::Clear];
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Piece type of the enemy.
    pub kind: EnemyKind,
    /// Top-left pixel position of the enemy.
    pub position: Vec2,
    /// Cell nearest to the enemy's pixel position.
    pub cell: CellCoord,
    /// Waypoint the enemy is travelling toward, for waypoint-seeking kinds.
    pub waypoint: Option<CellCoord>,
}

/// Read-only snapshot describing all enemies on the board.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured enemies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view contains no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

}

/// Immutable representation of a single power-up used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PowerUpSnapshot {
    /// Identifier allocated to the power-up by the world.
    pub id: PowerUpId,
    /// Effect granted on pickup.
    pub kind: PowerUpKind,
    /// Cell hosting the power-up.
    pub cell: CellCoord,
    /// Absolute world time at which the power-up disappears.
    pub expires_at: Duration,
}

/// Player buffs, difficulty and run state captured for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatusSnapshot {
    /// Remaining shield charges (0 or 1).
    pub shield: u8,
    /// Remaining speed-boost moves.
    pub speed_moves: u32,
    /// Enemy speed factor contributed by the slow effect.
    pub slow_factor: f32,
    /// Absolute world time at which the slow effect ends, if active.
    pub slow_until: Option<Duration>,
    /// Global difficulty multiplier.
    pub speed_mult: f32,
    /// Whether the run is still in progress.
    pub running: bool,
    /// Whether an enemy sits on one of the knight's legal targets.
    pub danger: bool,
    /// Run time elapsed since the run started.
    pub elapsed: Duration,
}

impl StatusSnapshot {
    /// Multiplier applied to every base speed and to the spawn cadence.
    #[must_use]
    pub fn effective_speed(&self) -> f32 {
        self.speed_mult * self.slow_factor
    }
}
