//! Greedy move picker used for unattended runs.

use glam::Vec2;
use knight_runner_core::CellCoord;
use knight_runner_rendering::Scene;

const POWER_UP_BONUS: i32 = 3;
const LANE_LOOKAHEAD: i32 = 3;

/// Pointer position of a click on the center of the chosen target.
pub(crate) fn choose_click(scene: &Scene) -> Option<Vec2> {
    choose_target(scene).map(|target| scene.board.cell_center(target))
}

/// Picks the legal target that keeps the knight furthest from enemies.
///
/// Cells under an enemy in the same column are penalised since pawns and
/// rooks fall straight down. Ties keep the first candidate in scene order.
pub(crate) fn choose_target(scene: &Scene) -> Option<CellCoord> {
    let mut best: Option<(i32, CellCoord)> = None;
    for &target in &scene.legal_moves {
        let Some(score) = rate(scene, target) else {
            continue;
        };
        if best.map_or(true, |(best_score, _)| score > best_score) {
            best = Some((score, target));
        }
    }
    best.map(|(_, target)| target)
}

fn rate(scene: &Scene, target: CellCoord) -> Option<i32> {
    let mut nearest = i32::MAX;
    let mut lane_threat = 0;
    for enemy in &scene.enemies {
        if enemy.cell == target {
            return None;
        }
        let columns = (enemy.cell.column() - target.column()).abs();
        let rows_above = target.row() - enemy.cell.row();
        nearest = nearest.min(columns.max(rows_above.abs()));
        if columns == 0 && (0..=LANE_LOOKAHEAD).contains(&rows_above) {
            lane_threat += LANE_LOOKAHEAD + 1 - rows_above;
        }
    }

    let spacing = if nearest == i32::MAX { 8 } else { nearest };
    let bonus = if scene.power_ups.iter().any(|power_up| power_up.cell == target) {
        POWER_UP_BONUS
    } else {
        0
    };
    Some(spacing * 2 + bonus - lane_threat * 4)
}
