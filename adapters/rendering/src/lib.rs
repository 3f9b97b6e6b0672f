#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Knight Runner adapters.

use anyhow::Result as AnyResult;
use glam::Vec2;
use knight_runner_core::{
    CellCoord, Direction, EnemyId, EnemyKind, EnemyView, InputOutcome, PowerUpId, PowerUpKind,
    PowerUpSnapshot, StatusSnapshot, BOARD_SIZE,
};
use std::{error::Error, fmt, time::Duration};

/// Glyph drawn for the player's knight.
pub const KNIGHT_GLYPH: char = '♞';

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Cardinal key presses captured during the frame, in arrival order.
    pub directions: Vec<Direction>,
    /// Board cell the pointer selected during the frame, if any.
    pub selected_cell: Option<CellCoord>,
    /// Whether the adapter detected a restart request on this frame.
    pub restart: bool,
}

/// Describes the checkered 8×8 board and its pixel geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoardPresentation {
    /// Side length of a single cell expressed in pixels.
    pub cell_size: f32,
    /// Color of squares whose column and row sum to an even number.
    pub light_square: Color,
    /// Color of the remaining squares.
    pub dark_square: Color,
}

impl BoardPresentation {
    /// Creates a new board descriptor.
    ///
    /// Returns an error when `cell_size` is not a positive finite number.
    pub fn new(
        cell_size: f32,
        light_square: Color,
        dark_square: Color,
    ) -> std::result::Result<Self, RenderingError> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(RenderingError::InvalidCellSize { cell_size });
        }

        Ok(Self {
            cell_size,
            light_square,
            dark_square,
        })
    }

    /// Side length of the whole board in pixels.
    #[must_use]
    pub fn board_length(&self) -> f32 {
        BOARD_SIZE as f32 * self.cell_size
    }

    /// Fill color of the provided square.
    #[must_use]
    pub fn square_color(&self, cell: CellCoord) -> Color {
        if (cell.column() + cell.row()) % 2 == 0 {
            self.light_square
        } else {
            self.dark_square
        }
    }

    /// Top-left pixel of the provided cell.
    #[must_use]
    pub fn cell_origin(&self, cell: CellCoord) -> Vec2 {
        cell.to_pixels(self.cell_size)
    }

    /// Center pixel of the provided cell.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> Vec2 {
        self.cell_origin(cell) + Vec2::splat(self.cell_size * 0.5)
    }

    /// Clamps a pixel position to the board bounds.
    #[must_use]
    pub fn clamp_position(&self, position: Vec2) -> Vec2 {
        let length = self.board_length();
        Vec2::new(position.x.clamp(0.0, length), position.y.clamp(0.0, length))
    }

    /// Maps a pointer position to the square beneath it.
    ///
    /// Pointer snapping floors into the square that contains the pointer,
    /// unlike piece occupancy which rounds to the nearest cell. Returns `None`
    /// when the pointer lies outside the board.
    #[must_use]
    pub fn snap_to_cell(&self, position: Vec2) -> Option<CellCoord> {
        let length = self.board_length();
        if position.x < 0.0 || position.y < 0.0 || position.x >= length || position.y >= length {
            return None;
        }

        let scaled = position / self.cell_size;
        Some(CellCoord::new(scaled.x.floor() as i32, scaled.y.floor() as i32))
    }
}

/// Glyph drawn for an enemy piece.
#[must_use]
pub const fn enemy_glyph(kind: EnemyKind) -> char {
    match kind {
        EnemyKind::Pawn => '♟',
        EnemyKind::Rook => '♜',
        EnemyKind::Bishop => '♝',
        EnemyKind::Queen => '♛',
    }
}

/// Glyph drawn for a power-up.
#[must_use]
pub const fn power_up_glyph(kind: PowerUpKind) -> char {
    match kind {
        PowerUpKind::Shield => '🛡',
        PowerUpKind::Speed => '⚡',
        PowerUpKind::Slow => '🕒',
        PowerUpKind::Clear => '💥',
    }
}

/// Enemy piece positioned in pixel space.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneEnemy {
    /// Identifier of the enemy.
    pub id: EnemyId,
    /// Piece type of the enemy.
    pub kind: EnemyKind,
    /// Top-left pixel position.
    pub position: Vec2,
    /// Cell the enemy counts as occupying.
    pub cell: CellCoord,
    /// Glyph used to draw the piece.
    pub glyph: char,
}

/// Power-up waiting on the board.
#[derive(Clone, Debug, PartialEq)]
pub struct ScenePowerUp {
    /// Identifier of the power-up.
    pub id: PowerUpId,
    /// Effect granted on pickup.
    pub kind: PowerUpKind,
    /// Cell hosting the power-up.
    pub cell: CellCoord,
    /// Time left before the power-up disappears.
    pub remaining: Duration,
    /// Glyph used to draw the power-up.
    pub glyph: char,
}

/// Heads-up display contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hud {
    /// Survival time formatted with one decimal place.
    pub score_text: String,
    /// Effective enemy speed formatted as a multiplier.
    pub speed_text: String,
    /// Whether a shield charge is held.
    pub shield: bool,
    /// Whether speed-boost moves remain.
    pub speed: bool,
    /// Whether the slow field is active.
    pub slow: bool,
    /// Whether an enemy sits on one of the knight's jump targets.
    pub danger: bool,
}

impl Hud {
    /// Builds the display from the player's status.
    #[must_use]
    pub fn from_status(status: &StatusSnapshot) -> Self {
        Self {
            score_text: format_score(status.elapsed),
            speed_text: format!("{:.1}×", status.effective_speed()),
            shield: status.shield > 0,
            speed: status.speed_moves > 0,
            slow: status.slow_until.is_some(),
            danger: status.danger,
        }
    }
}

/// Formats a survival time the way the HUD and leaderboard show it.
#[must_use]
pub fn format_score(score: Duration) -> String {
    format!("{:.1}", score.as_secs_f32())
}

/// Visual treatment of a guide arrow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuideStyle {
    /// Arrow along the armed primary axis.
    Primary,
    /// Arrow toward a possible perpendicular completion.
    Hint,
    /// Arrow toward an unreachable midpoint.
    Invalid,
}

impl GuideStyle {
    /// Color used to draw arrows of this style.
    #[must_use]
    pub const fn color(self) -> Color {
        match self {
            Self::Primary => Color::from_rgb_u8(0x4c, 0xaf, 0x50),
            Self::Hint => Color::new(0.6, 0.8, 1.0, 0.6),
            Self::Invalid => Color::from_rgb_u8(0xe5, 0x39, 0x35),
        }
    }
}

/// Arrow drawn between two cell centers to explain a pending move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Guide {
    /// Cell the arrow starts from.
    pub from: CellCoord,
    /// Cell the arrow points to.
    pub to: CellCoord,
    /// Visual treatment of the arrow.
    pub style: GuideStyle,
}

impl Guide {
    /// Arrows describing an input outcome for a knight standing on `knight`.
    ///
    /// Only armed and rejected inputs leave arrows behind; every other
    /// outcome clears the guide.
    #[must_use]
    pub fn from_outcome(knight: CellCoord, outcome: &InputOutcome) -> Vec<Guide> {
        match outcome {
            InputOutcome::Armed {
                midpoint, hints, ..
            } => {
                let mut guides = vec![Guide {
                    from: knight,
                    to: *midpoint,
                    style: GuideStyle::Primary,
                }];
                guides.extend(hints.iter().map(|hint| Guide {
                    from: *midpoint,
                    to: *hint,
                    style: GuideStyle::Hint,
                }));
                guides
            }
            InputOutcome::Rejected { midpoint, .. } => vec![Guide {
                from: knight,
                to: *midpoint,
                style: GuideStyle::Invalid,
            }],
            InputOutcome::Ignored | InputOutcome::Cancelled | InputOutcome::Committed { .. } => {
                Vec::new()
            }
        }
    }

    /// Pixel endpoints of the arrow, running between cell centers.
    ///
    /// Both ends are clamped to the board so arrows toward an off-board
    /// midpoint stop at the edge.
    #[must_use]
    pub fn endpoints(&self, board: &BoardPresentation) -> (Vec2, Vec2) {
        (
            board.clamp_position(board.cell_center(self.from)),
            board.clamp_position(board.cell_center(self.to)),
        )
    }
}

/// Scene description combining the board and everything on it.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Board geometry and colors.
    pub board: BoardPresentation,
    /// Cell occupied by the knight.
    pub knight: CellCoord,
    /// Enemy pieces in deterministic order.
    pub enemies: Vec<SceneEnemy>,
    /// Power-ups waiting on the board.
    pub power_ups: Vec<ScenePowerUp>,
    /// Markers on the cells the knight may jump to.
    pub legal_moves: Vec<CellCoord>,
    /// Arrows describing the pending keyboard move.
    pub guides: Vec<Guide>,
    /// Heads-up display contents.
    pub hud: Hud,
    /// Whether the run is over.
    pub game_over: bool,
}

impl Scene {
    /// Creates a new scene descriptor from world snapshots.
    #[must_use]
    pub fn new(
        board: BoardPresentation,
        knight: CellCoord,
        enemies: &EnemyView,
        power_ups: &[PowerUpSnapshot],
        legal_moves: Vec<CellCoord>,
        status: &StatusSnapshot,
    ) -> Self {
        let mut scene = Self {
            board,
            knight,
            enemies: Vec::new(),
            power_ups: Vec::new(),
            legal_moves: Vec::new(),
            guides: Vec::new(),
            hud: Hud::from_status(status),
            game_over: false,
        };
        scene.refresh(knight, enemies, power_ups, legal_moves, status);
        scene
    }

    /// Replaces the dynamic contents of the scene, keeping board and guides.
    pub fn refresh(
        &mut self,
        knight: CellCoord,
        enemies: &EnemyView,
        power_ups: &[PowerUpSnapshot],
        legal_moves: Vec<CellCoord>,
        status: &StatusSnapshot,
    ) {
        self.knight = knight;
        self.enemies = enemies
            .iter()
            .map(|enemy| SceneEnemy {
                id: enemy.id,
                kind: enemy.kind,
                position: enemy.position,
                cell: enemy.cell,
                glyph: enemy_glyph(enemy.kind),
            })
            .collect();
        self.power_ups = power_ups
            .iter()
            .map(|power_up| ScenePowerUp {
                id: power_up.id,
                kind: power_up.kind,
                cell: power_up.cell,
                remaining: power_up.expires_at.saturating_sub(status.elapsed),
                glyph: power_up_glyph(power_up.kind),
            })
            .collect();
        self.legal_moves = legal_moves;
        self.hud = Hud::from_status(status);
        self.game_over = !status.running;
        if self.game_over {
            self.guides.clear();
        }
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title shown by the backend.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Knight Runner scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the simulated frame delta,
    /// per-frame input captured by the adapter, and may mutate the scene before
    /// it is rendered, allowing adapters to animate world snapshots
    /// deterministically.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene);
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Cells must have a positive finite size.
    InvalidCellSize {
        /// Provided size that failed validation.
        cell_size: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCellSize { cell_size } => {
                write!(f, "cell_size must be positive (received {cell_size})")
            }
        }
    }
}

impl Error for RenderingError {}
