//! Headless rendering backend that prints the board as text.

use std::{collections::VecDeque, io::Write, str::FromStr, time::Duration};

use anyhow::{anyhow, Context, Result};
use crossterm::{
    queue,
    style::{Color as TermColor, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
};
use glam::Vec2;
use knight_runner_core::{CellCoord, Direction, EnemyKind, PowerUpKind, BOARD_SIZE};
use knight_runner_rendering::{
    Color, FrameInput, Guide, Presentation, RenderingBackend, Scene, KNIGHT_GLYPH,
};
use log::debug;

use crate::autopilot;

/// One scripted input, consumed on a move frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum ScriptStep {
    Press(Direction),
    Select(CellCoord),
    Point(Vec2),
    Restart,
    Wait,
}

impl FromStr for ScriptStep {
    type Err = anyhow::Error;

    fn from_str(token: &str) -> Result<Self> {
        let step = match token.to_ascii_lowercase().as_str() {
            "w" | "up" => Self::Press(Direction::North),
            "s" | "down" => Self::Press(Direction::South),
            "a" | "left" => Self::Press(Direction::West),
            "d" | "right" => Self::Press(Direction::East),
            "r" | "restart" => Self::Restart,
            "." | "wait" => Self::Wait,
            other => match other.strip_prefix('@') {
                Some(pixels) => {
                    let (x, y): (f32, f32) = parse_pair(pixels, token)?;
                    Self::Point(Vec2::new(x, y))
                }
                None => {
                    let (column, row) = parse_pair(other, token)?;
                    Self::Select(CellCoord::new(column, row))
                }
            },
        };
        Ok(step)
    }
}

fn parse_pair<T>(pair: &str, token: &str) -> Result<(T, T)>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let (first, second) = pair
        .split_once(',')
        .ok_or_else(|| anyhow!("unrecognised input token `{token}`"))?;
    let first = first
        .trim()
        .parse()
        .with_context(|| format!("invalid x in `{token}`"))?;
    let second = second
        .trim()
        .parse()
        .with_context(|| format!("invalid y in `{token}`"))?;
    Ok((first, second))
}

/// Parses a whitespace separated input script.
pub(crate) fn parse_script(script: &str) -> Result<VecDeque<ScriptStep>> {
    script.split_whitespace().map(ScriptStep::from_str).collect()
}

/// Source of the input handed to the scene on move frames.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Pilot {
    Idle,
    Script(VecDeque<ScriptStep>),
    Autopilot,
}

impl Pilot {
    fn next_input(&mut self, scene: &Scene) -> FrameInput {
        let mut input = FrameInput::default();
        match self {
            Self::Idle => {}
            Self::Script(steps) => match steps.pop_front() {
                Some(ScriptStep::Press(direction)) => input.directions.push(direction),
                Some(ScriptStep::Select(cell)) => input.selected_cell = Some(cell),
                Some(ScriptStep::Point(position)) => input.selected_cell = pointer(scene, position),
                Some(ScriptStep::Restart) => input.restart = true,
                Some(ScriptStep::Wait) | None => {}
            },
            Self::Autopilot => {
                input.selected_cell =
                    autopilot::choose_click(scene).and_then(|click| pointer(scene, click));
            }
        }
        input
    }

    /// Whether a later input could start another run.
    fn may_restart(&self) -> bool {
        match self {
            Self::Script(steps) => steps.contains(&ScriptStep::Restart),
            Self::Idle | Self::Autopilot => false,
        }
    }
}

fn pointer(scene: &Scene, position: Vec2) -> Option<CellCoord> {
    let cell = scene.board.snap_to_cell(position);
    if cell.is_none() {
        debug!("pointer at {position} is off the board");
    }
    cell
}

/// How boards are drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BoardStyle {
    /// Letters on a bare grid.
    Plain,
    /// Piece glyphs on colored squares.
    Colored,
}

/// Backend that steps a fixed number of frames and prints snapshots.
///
/// After a game over the loop keeps going while the pilot still holds a
/// restart, so one invocation can play several runs.
#[derive(Debug)]
pub(crate) struct TextBackend<W> {
    out: W,
    frame: Duration,
    frames: u32,
    move_every: u32,
    print_every: u32,
    pilot: Pilot,
    style: BoardStyle,
}

impl<W: Write> TextBackend<W> {
    /// Creates a backend writing plain boards to `out`.
    ///
    /// A `print_every` of zero prints only the first and last boards.
    pub(crate) fn new(
        out: W,
        frame: Duration,
        frames: u32,
        move_every: u32,
        print_every: u32,
        pilot: Pilot,
    ) -> Self {
        Self {
            out,
            frame,
            frames,
            move_every: move_every.max(1),
            print_every,
            pilot,
            style: BoardStyle::Plain,
        }
    }

    pub(crate) fn with_style(mut self, style: BoardStyle) -> Self {
        self.style = style;
        self
    }
}

impl<W: Write> RenderingBackend for TextBackend<W> {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene),
    {
        let Self {
            mut out,
            frame,
            frames,
            move_every,
            print_every,
            mut pilot,
            style,
        } = self;
        let Presentation {
            window_title,
            clear_color,
            mut scene,
        } = presentation;
        let draw = |out: &mut W, index: u32, scene: &Scene| match style {
            BoardStyle::Plain => write!(out, "{}", render_text(index, scene)),
            BoardStyle::Colored => render_colored(out, index, scene, clear_color),
        };

        writeln!(out, "{window_title}")?;
        draw(&mut out, 0, &scene)?;

        let mut printed = 0;
        let mut reported = false;
        for index in 1..=frames {
            if scene.game_over && !pilot.may_restart() {
                break;
            }
            let input = if index % move_every == 0 {
                pilot.next_input(&scene)
            } else {
                FrameInput::default()
            };
            update_scene(frame, input, &mut scene);

            if scene.game_over {
                if !reported {
                    draw(&mut out, index, &scene)?;
                    writeln!(out, "game over after {}s", scene.hud.score_text)?;
                    printed = index;
                    reported = true;
                }
                continue;
            }
            if reported {
                writeln!(out, "restarted")?;
                reported = false;
                draw(&mut out, index, &scene)?;
                printed = index;
                continue;
            }
            if print_every > 0 && index % print_every == 0 {
                draw(&mut out, index, &scene)?;
                printed = index;
            }
        }

        if printed != frames && !scene.game_over {
            draw(&mut out, frames, &scene)?;
        }
        out.flush().context("failed to flush board output")
    }
}

/// Renders the scene as a HUD line followed by the board, one row per line.
pub(crate) fn render_text(frame: u32, scene: &Scene) -> String {
    let mut text = hud_line(frame, scene);
    text.push('\n');

    for row in 0..BOARD_SIZE {
        let line: Vec<String> = (0..BOARD_SIZE)
            .map(|column| {
                symbol_at(scene, CellCoord::new(column, row), BoardStyle::Plain).to_string()
            })
            .collect();
        text.push_str(&line.join(" "));
        text.push('\n');
    }

    for guide in &scene.guides {
        text.push_str(&guide_line(scene, guide));
    }
    text
}

fn render_colored<W: Write>(
    out: &mut W,
    frame: u32,
    scene: &Scene,
    background: Color,
) -> std::io::Result<()> {
    queue!(
        out,
        SetBackgroundColor(terminal_color(background, background)),
        SetForegroundColor(TermColor::White),
        Print(hud_line(frame, scene)),
        ResetColor,
        Print('\n')
    )?;

    for row in 0..BOARD_SIZE {
        for column in 0..BOARD_SIZE {
            let cell = CellCoord::new(column, row);
            queue!(
                out,
                SetBackgroundColor(terminal_color(scene.board.square_color(cell), background)),
                SetForegroundColor(TermColor::Black),
                Print(symbol_at(scene, cell, BoardStyle::Colored)),
                Print(' ')
            )?;
        }
        queue!(out, ResetColor, Print('\n'))?;
    }

    for guide in &scene.guides {
        queue!(
            out,
            SetForegroundColor(terminal_color(guide.style.color(), background)),
            Print(guide_line(scene, guide)),
            ResetColor
        )?;
    }
    Ok(())
}

fn hud_line(frame: u32, scene: &Scene) -> String {
    let hud = &scene.hud;
    let mut line = format!(
        "-- frame {frame}: score {}s speed {}",
        hud.score_text, hud.speed_text
    );
    for (active, label) in [
        (hud.shield, "shield"),
        (hud.speed, "speed"),
        (hud.slow, "slow"),
        (hud.danger, "DANGER"),
    ] {
        if active {
            line.push(' ');
            line.push_str(label);
        }
    }
    line
}

fn guide_line(scene: &Scene, guide: &Guide) -> String {
    let (start, end) = guide.endpoints(&scene.board);
    format!(
        "guide {:?}: {},{} -> {},{} ({:.0},{:.0} -> {:.0},{:.0})\n",
        guide.style,
        guide.from.column(),
        guide.from.row(),
        guide.to.column(),
        guide.to.row(),
        start.x,
        start.y,
        end.x,
        end.y
    )
}

/// Blends `color` over `background` by its alpha.
fn terminal_color(color: Color, background: Color) -> TermColor {
    let blend = |channel: f32, under: f32| {
        let mixed = channel * color.alpha + under * (1.0 - color.alpha);
        (mixed.clamp(0.0, 1.0) * 255.0).round() as u8
    };
    TermColor::Rgb {
        r: blend(color.red, background.red),
        g: blend(color.green, background.green),
        b: blend(color.blue, background.blue),
    }
}

fn symbol_at(scene: &Scene, cell: CellCoord, style: BoardStyle) -> char {
    let glyphs = style == BoardStyle::Colored;
    if scene.knight == cell {
        return if glyphs { KNIGHT_GLYPH } else { 'N' };
    }
    if let Some(enemy) = scene.enemies.iter().find(|enemy| enemy.cell == cell) {
        if glyphs {
            return enemy.glyph;
        }
        return match enemy.kind {
            EnemyKind::Pawn => 'p',
            EnemyKind::Rook => 'r',
            EnemyKind::Bishop => 'b',
            EnemyKind::Queen => 'q',
        };
    }
    if let Some(power_up) = scene.power_ups.iter().find(|power_up| power_up.cell == cell) {
        if glyphs {
            return power_up.glyph;
        }
        return match power_up.kind {
            PowerUpKind::Shield => '#',
            PowerUpKind::Speed => '>',
            PowerUpKind::Slow => '~',
            PowerUpKind::Clear => '*',
        };
    }
    match (scene.legal_moves.contains(&cell), glyphs) {
        (true, true) => '•',
        (true, false) => 'o',
        (false, true) => ' ',
        (false, false) => '.',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knight_runner_core::{EnemyView, StatusSnapshot, KNIGHT_START};
    use knight_runner_rendering::{BoardPresentation, GuideStyle};

    fn status(running: bool) -> StatusSnapshot {
        StatusSnapshot {
            shield: 1,
            speed_moves: 0,
            slow_factor: 1.0,
            slow_until: None,
            speed_mult: 1.0,
            running,
            danger: false,
            elapsed: Duration::from_millis(2_500),
        }
    }

    fn presentation() -> Presentation {
        let board = BoardPresentation::new(
            16.0,
            Color::from_rgb_u8(0xee, 0xee, 0xd2),
            Color::from_rgb_u8(0x76, 0x96, 0x56),
        )
        .expect("valid board");
        let scene = Scene::new(
            board,
            KNIGHT_START,
            &EnemyView::default(),
            &[],
            KNIGHT_START.knight_targets().collect(),
            &status(true),
        );
        Presentation::new("Knight Runner", Color::new(0.0, 0.0, 0.0, 1.0), scene)
    }

    #[test]
    fn script_tokens_parse() {
        let steps = parse_script("w d  UP left 4,4 @40.5,8 r .").expect("valid script");
        assert_eq!(
            steps,
            VecDeque::from([
                ScriptStep::Press(Direction::North),
                ScriptStep::Press(Direction::East),
                ScriptStep::Press(Direction::North),
                ScriptStep::Press(Direction::West),
                ScriptStep::Select(CellCoord::new(4, 4)),
                ScriptStep::Point(Vec2::new(40.5, 8.0)),
                ScriptStep::Restart,
                ScriptStep::Wait,
            ])
        );
        assert!(parse_script("jump").is_err());
        assert!(parse_script("1,x").is_err());
        assert!(parse_script("@1.5").is_err());
    }

    #[test]
    fn board_shows_knight_and_targets() {
        let text = render_text(0, &presentation().scene);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].contains("score 2.5s"));
        assert!(lines[0].ends_with("shield"));
        assert_eq!(lines[7], ". . . N . . . .");
        assert_eq!(lines[6], ". o . . . o . .");
    }

    #[test]
    fn guides_list_cells_and_clamped_pixels() {
        let mut scene = presentation().scene;
        scene.guides = vec![Guide {
            from: CellCoord::new(0, 6),
            to: CellCoord::new(-2, 6),
            style: GuideStyle::Invalid,
        }];
        let text = render_text(0, &scene);
        assert!(text.ends_with("guide Invalid: 0,6 -> -2,6 (8,104 -> 0,104)\n"));
    }

    #[test]
    fn colored_board_paints_squares_and_glyphs() {
        let mut out = Vec::new();
        render_colored(
            &mut out,
            0,
            &presentation().scene,
            Color::new(0.0, 0.0, 0.0, 1.0),
        )
        .expect("write to memory");
        let text = String::from_utf8(out).expect("utf8 output");
        assert!(text.contains("48;2;238;238;210"));
        assert!(text.contains("48;2;118;150;86"));
        assert!(text.contains(KNIGHT_GLYPH));
        assert!(text.contains('•'));
    }

    #[test]
    fn pointer_positions_snap_to_squares() {
        let scene = presentation().scene;
        let mut pilot = Pilot::Script(parse_script("@40,95.9 @200,10").expect("valid script"));
        assert_eq!(
            pilot.next_input(&scene).selected_cell,
            Some(CellCoord::new(2, 5))
        );
        assert_eq!(pilot.next_input(&scene), FrameInput::default());
    }

    #[test]
    fn script_inputs_arrive_on_move_frames() {
        let backend = TextBackend::new(
            Vec::new(),
            Duration::from_millis(10),
            6,
            3,
            0,
            Pilot::Script(parse_script("w 2,2").expect("valid script")),
        );
        let mut seen = Vec::new();
        backend
            .run(presentation(), |dt, input, _scene| {
                assert_eq!(dt, Duration::from_millis(10));
                seen.push(input);
            })
            .expect("backend runs");

        assert_eq!(seen.len(), 6);
        assert_eq!(seen[2].directions, vec![Direction::North]);
        assert_eq!(seen[5].selected_cell, Some(CellCoord::new(2, 2)));
        assert!(seen
            .iter()
            .enumerate()
            .all(|(i, input)| i == 2 || i == 5 || *input == FrameInput::default()));
    }

    #[test]
    fn game_over_stops_the_loop() {
        let mut out = Vec::new();
        let backend = TextBackend::new(&mut out, Duration::from_millis(10), 100, 1, 0, Pilot::Idle);
        let mut calls = 0;
        backend
            .run(presentation(), |_, _, scene| {
                calls += 1;
                if calls == 4 {
                    scene.game_over = true;
                }
            })
            .expect("backend runs");

        assert_eq!(calls, 4);
        let text = String::from_utf8(out).expect("utf8 output");
        assert!(text.starts_with("Knight Runner\n"));
        assert!(text.contains("-- frame 4:"));
        assert!(text.trim_end().ends_with("game over after 2.5s"));
    }

    #[test]
    fn restart_after_game_over_starts_another_run() {
        let mut out = Vec::new();
        let backend = TextBackend::new(
            &mut out,
            Duration::from_millis(10),
            20,
            1,
            0,
            Pilot::Script(parse_script(". . r").expect("valid script")),
        );
        let mut calls = 0;
        let mut restarts = 0;
        backend
            .run(presentation(), |_, input, scene| {
                calls += 1;
                if input.restart {
                    restarts += 1;
                    scene.game_over = false;
                } else if calls == 1 {
                    scene.game_over = true;
                }
            })
            .expect("backend runs");

        assert_eq!(restarts, 1);
        assert_eq!(calls, 20);
        let text = String::from_utf8(out).expect("utf8 output");
        assert_eq!(text.matches("game over after").count(), 1);
        assert!(text.contains("restarted\n-- frame 3:"));
        assert!(text.contains("-- frame 20:"));
    }

    #[test]
    fn game_over_without_a_pending_restart_ends_the_run() {
        let backend = TextBackend::new(
            Vec::new(),
            Duration::from_millis(10),
            20,
            1,
            0,
            Pilot::Script(parse_script(". w d").expect("valid script")),
        );
        let mut calls = 0;
        backend
            .run(presentation(), |_, _, scene| {
                calls += 1;
                scene.game_over = true;
            })
            .expect("backend runs");
        assert_eq!(calls, 1);
    }
}
