//! Knight/enemy overlap tests and the shield-or-game-over resolution.

use knight_runner_core::{pixel_to_cell, CellCoord, EnemyId};

use crate::{motion::Enemy, powerups::PlayerStatus};

/// Result of an enemy landing on the knight's cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Contact {
    /// The shield charge soaked the hit; the enemy must be removed.
    Absorbed,
    /// No shield was held and the run is over.
    Fatal,
}

/// Cell an enemy currently counts as occupying.
pub(crate) fn enemy_cell(enemy: &Enemy, cell_size: f32) -> CellCoord {
    pixel_to_cell(enemy.position, cell_size)
}

pub(crate) fn touches(enemy: &Enemy, cell: CellCoord, cell_size: f32) -> bool {
    enemy_cell(enemy, cell_size) == cell
}

/// Identifiers of all enemies whose rounded cell equals `cell`.
pub(crate) fn enemies_on(enemies: &[Enemy], cell: CellCoord, cell_size: f32) -> Vec<EnemyId> {
    enemies
        .iter()
        .filter(|enemy| touches(enemy, cell, cell_size))
        .map(|enemy| enemy.id)
        .collect()
}

/// Spends the shield if one is held, otherwise reports a fatal contact.
pub(crate) fn resolve(status: &mut PlayerStatus) -> Contact {
    if status.take_shield() {
        Contact::Absorbed
    } else {
        Contact::Fatal
    }
}

/// Reports whether any enemy sits on one of the knight's jump targets.
pub(crate) fn in_danger(knight: CellCoord, enemies: &[Enemy], cell_size: f32) -> bool {
    knight.knight_targets().any(|target| {
        enemies
            .iter()
            .any(|enemy| touches(enemy, target, cell_size))
    })
}
