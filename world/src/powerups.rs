//! Power-up placement records and the player buffs they grant.

use std::time::Duration;

use knight_runner_core::{CellCoord, PowerUpId, PowerUpKind};

/// Time a power-up stays on the board before it disappears.
pub(crate) const POWER_UP_LIFETIME: Duration = Duration::from_millis(5_500);

/// Length of the slow field granted by a slow pickup.
pub(crate) const SLOW_DURATION: Duration = Duration::from_millis(5_000);

/// Enemy speed factor while the slow field is active.
pub(crate) const SLOW_FACTOR: f32 = 0.5;

/// Moves granted by a speed pickup.
pub(crate) const SPEED_MOVES: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PowerUp {
    pub(crate) id: PowerUpId,
    pub(crate) kind: PowerUpKind,
    pub(crate) cell: CellCoord,
    pub(crate) expires_at: Duration,
}

impl PowerUp {
    pub(crate) fn new(id: PowerUpId, kind: PowerUpKind, cell: CellCoord, now: Duration) -> Self {
        Self {
            id,
            kind,
            cell,
            expires_at: now.saturating_add(POWER_UP_LIFETIME),
        }
    }

    /// Expiry is strict: a power-up is still collectable at exactly `expires_at`.
    pub(crate) fn is_expired(&self, now: Duration) -> bool {
        now > self.expires_at
    }
}

/// Buffs held by the player plus the global difficulty multiplier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PlayerStatus {
    pub(crate) shield: u8,
    pub(crate) speed_moves: u32,
    pub(crate) slow_factor: f32,
    pub(crate) slow_until: Option<Duration>,
    pub(crate) speed_mult: f32,
}

impl Default for PlayerStatus {
    fn default() -> Self {
        Self {
            shield: 0,
            speed_moves: 0,
            slow_factor: 1.0,
            slow_until: None,
            speed_mult: 1.0,
        }
    }
}

impl PlayerStatus {
    pub(crate) fn effective_speed(&self) -> f32 {
        self.speed_mult * self.slow_factor
    }

    /// Applies the personal effect of a pickup. `Clear` acts on the board and
    /// is resolved by the world.
    pub(crate) fn grant(&mut self, kind: PowerUpKind, now: Duration) {
        match kind {
            PowerUpKind::Shield => self.shield = 1,
            PowerUpKind::Speed => self.speed_moves = SPEED_MOVES,
            PowerUpKind::Slow => {
                self.slow_factor = SLOW_FACTOR;
                self.slow_until = Some(now.saturating_add(SLOW_DURATION));
            }
            PowerUpKind::Clear => {}
        }
    }

    /// Lifts the slow field once `now` has passed its end. Returns whether it lifted.
    pub(crate) fn expire_slow(&mut self, now: Duration) -> bool {
        match self.slow_until {
            Some(until) if now > until => {
                self.slow_until = None;
                self.slow_factor = 1.0;
                true
            }
            _ => false,
        }
    }

    /// Spends one boosted move. Returns whether this emptied the allowance.
    pub(crate) fn spend_speed_move(&mut self) -> bool {
        if self.speed_moves == 0 {
            return false;
        }
        self.speed_moves -= 1;
        self.speed_moves == 0
    }

    /// Consumes the shield charge, reporting whether one was held.
    pub(crate) fn take_shield(&mut self) -> bool {
        if self.shield == 0 {
            return false;
        }
        self.shield = 0;
        true
    }
}
