//! Per-kind kinematics for the enemy pieces falling through the board.

use glam::Vec2;
use knight_runner_core::{CellCoord, EnemyId, EnemyKind, BOARD_SIZE};
use rand::Rng;

/// Kind-specific motion state carried by an enemy.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Motion {
    /// Straight fall at a constant rate measured in cells per second.
    Pawn { velocity: f32 },
    /// Straight fall at a constant rate measured in cells per second.
    Rook { velocity: f32 },
    /// Diagonal zig-zag bouncing off the side edges.
    Bishop {
        cell: CellCoord,
        heading: i32,
        waypoint: CellCoord,
    },
    /// One row down per waypoint with a random sideways drift.
    Queen { cell: CellCoord, waypoint: CellCoord },
}

impl Motion {
    pub(crate) const fn kind(&self) -> EnemyKind {
        match self {
            Self::Pawn { .. } => EnemyKind::Pawn,
            Self::Rook { .. } => EnemyKind::Rook,
            Self::Bishop { .. } => EnemyKind::Bishop,
            Self::Queen { .. } => EnemyKind::Queen,
        }
    }
}

/// Outcome of advancing a single enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Advance {
    Moving,
    /// The enemy reached a waypoint below the last row.
    Exited,
}

#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) position: Vec2,
    pub(crate) motion: Motion,
}

impl Enemy {
    /// Creates an enemy waiting one row above the board in `column`.
    pub(crate) fn spawn<R: Rng>(
        id: EnemyId,
        kind: EnemyKind,
        column: i32,
        cell_size: f32,
        rng: &mut R,
    ) -> Self {
        let cell = CellCoord::new(column, -1);
        let motion = match kind {
            EnemyKind::Pawn => Motion::Pawn {
                velocity: kind.base_speed(),
            },
            EnemyKind::Rook => Motion::Rook {
                velocity: kind.base_speed(),
            },
            EnemyKind::Bishop => {
                let mut heading = if rng.gen_bool(0.5) { -1 } else { 1 };
                let waypoint = next_bishop_waypoint(cell, &mut heading);
                Motion::Bishop {
                    cell,
                    heading,
                    waypoint,
                }
            }
            EnemyKind::Queen => Motion::Queen {
                cell,
                waypoint: next_queen_waypoint(cell, rng),
            },
        };

        Self {
            id,
            position: cell.to_pixels(cell_size),
            motion,
        }
    }

    pub(crate) const fn kind(&self) -> EnemyKind {
        self.motion.kind()
    }

    pub(crate) fn waypoint(&self) -> Option<CellCoord> {
        match self.motion {
            Motion::Bishop { waypoint, .. } | Motion::Queen { waypoint, .. } => Some(waypoint),
            Motion::Pawn { .. } | Motion::Rook { .. } => None,
        }
    }

    /// Moves the enemy by `dt_secs` seconds of travel scaled by `effective_speed`.
    pub(crate) fn advance<R: Rng>(
        &mut self,
        dt_secs: f32,
        effective_speed: f32,
        cell_size: f32,
        rng: &mut R,
    ) -> Advance {
        let speed = self.kind().base_speed() * cell_size * effective_speed;
        match &mut self.motion {
            Motion::Pawn { velocity } | Motion::Rook { velocity } => {
                let fall = *velocity * cell_size * effective_speed * dt_secs;
                self.position.y += fall;
                self.position.x = self
                    .position
                    .x
                    .clamp(0.0, (BOARD_SIZE - 1) as f32 * cell_size);
                Advance::Moving
            }
            Motion::Bishop {
                cell,
                heading,
                waypoint,
            } => {
                if !seek(&mut self.position, *waypoint, speed * dt_secs, cell_size) {
                    return Advance::Moving;
                }
                *cell = *waypoint;
                if cell.row() >= BOARD_SIZE {
                    return Advance::Exited;
                }
                *waypoint = next_bishop_waypoint(*cell, heading);
                Advance::Moving
            }
            Motion::Queen { cell, waypoint } => {
                if !seek(&mut self.position, *waypoint, speed * dt_secs, cell_size) {
                    return Advance::Moving;
                }
                *cell = *waypoint;
                if cell.row() >= BOARD_SIZE {
                    return Advance::Exited;
                }
                *waypoint = next_queen_waypoint(*cell, rng);
                Advance::Moving
            }
        }
    }

    /// Scales the pixel position after the cell size changed by `factor`.
    pub(crate) fn rescale(&mut self, factor: f32) {
        self.position *= factor;
    }
}

/// Walks `position` toward `waypoint`, reporting whether it arrived.
fn seek(position: &mut Vec2, waypoint: CellCoord, step: f32, cell_size: f32) -> bool {
    let target = waypoint.to_pixels(cell_size);
    let delta = target - *position;
    let distance = delta.length();
    if distance <= step {
        *position = target;
        return true;
    }

    *position += delta / distance * step;
    false
}

fn next_bishop_waypoint(cell: CellCoord, heading: &mut i32) -> CellCoord {
    let mut column = cell.column() + *heading;
    if !(0..BOARD_SIZE).contains(&column) {
        *heading = -*heading;
        column = cell.column() + *heading;
    }
    CellCoord::new(column, cell.row() + 1)
}

fn next_queen_waypoint<R: Rng>(cell: CellCoord, rng: &mut R) -> CellCoord {
    let options: Vec<i32> = (-1..=1)
        .map(|drift| cell.column() + drift)
        .filter(|column| (0..BOARD_SIZE).contains(column))
        .collect();
    let column = if options.is_empty() {
        cell.column()
    } else {
        options[rng.gen_range(0..options.len())]
    };
    CellCoord::new(column, cell.row() + 1)
}
