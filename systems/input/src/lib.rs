#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Two-key knight move input system.
//!
//! Keyboard play describes an L-shaped jump with two cardinal presses: the
//! first picks the axis the knight travels two cells along, the second picks
//! the perpendicular single-cell offset. Pointer play selects one of the eight
//! jump targets directly. Both paths end in a [`Command::MoveKnight`].

use knight_runner_core::{CellCoord, Command, Direction, Event, InputOutcome};

/// Phase of the two-key protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum InputPhase {
    /// No direction is pending.
    #[default]
    Idle,
    /// The first direction was accepted and awaits a perpendicular follow-up.
    Armed(Direction),
}

/// Pure system translating directional and pointer input into knight moves.
#[derive(Debug)]
pub struct KnightInput {
    phase: InputPhase,
    running: bool,
}

impl Default for KnightInput {
    fn default() -> Self {
        Self::new()
    }
}

impl KnightInput {
    /// Creates an idle input system for a run that is in progress.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: InputPhase::Idle,
            running: true,
        }
    }

    /// Current phase of the two-key protocol.
    #[must_use]
    pub const fn phase(&self) -> InputPhase {
        self.phase
    }

    /// Tracks run state and knight moves reported by the world.
    pub fn handle(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::GameOver { .. } => {
                    self.running = false;
                    self.phase = InputPhase::Idle;
                }
                Event::RunRestarted => {
                    self.running = true;
                    self.phase = InputPhase::Idle;
                }
                Event::KnightMoved { .. } => self.phase = InputPhase::Idle,
                _ => {}
            }
        }
    }

    /// Feeds one cardinal key press for a knight standing on `knight`.
    pub fn press(
        &mut self,
        direction: Direction,
        knight: CellCoord,
        out: &mut Vec<Command>,
    ) -> InputOutcome {
        if !self.running {
            return InputOutcome::Ignored;
        }

        match self.phase {
            InputPhase::Idle => {
                let midpoint = knight.step(direction, 2);
                if !midpoint.is_on_board() {
                    return InputOutcome::Rejected {
                        direction,
                        midpoint,
                    };
                }

                self.phase = InputPhase::Armed(direction);
                let hints = direction
                    .perpendicular()
                    .into_iter()
                    .map(|side| midpoint.step(side, 1))
                    .filter(CellCoord::is_on_board)
                    .collect();
                InputOutcome::Armed {
                    direction,
                    midpoint,
                    hints,
                }
            }
            InputPhase::Armed(primary) => {
                self.phase = InputPhase::Idle;
                if !primary.is_perpendicular_to(direction) {
                    return InputOutcome::Cancelled;
                }

                let to = knight.step(primary, 2).step(direction, 1);
                if !to.is_on_board() {
                    return InputOutcome::Cancelled;
                }

                out.push(Command::MoveKnight { to });
                InputOutcome::Committed { to }
            }
        }
    }

    /// Commits a pointer selection when `cell` is one of the knight's jump targets.
    pub fn select(
        &mut self,
        cell: CellCoord,
        knight: CellCoord,
        out: &mut Vec<Command>,
    ) -> InputOutcome {
        if !self.running || !knight.knight_targets().any(|target| target == cell) {
            return InputOutcome::Ignored;
        }

        self.phase = InputPhase::Idle;
        out.push(Command::MoveKnight { to: cell });
        InputOutcome::Committed { to: cell }
    }
}
