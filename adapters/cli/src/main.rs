#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Knight Runner headlessly.
//!
//! Runs are driven by a key script, the autopilot, or nothing at all, and
//! printed as text boards. Finished runs are recorded on the local
//! leaderboard.

mod autopilot;
mod config;
mod text_backend;

use std::{
    path::PathBuf,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result};
use clap::Parser;
use knight_runner_core::{CellCoord, InputOutcome};
use knight_runner_leaderboard::Leaderboard;
use knight_runner_rendering::{
    BoardPresentation, Color, FrameInput, Guide, Presentation, RenderingBackend, Scene,
};
use knight_runner_session::Session;
use knight_runner_world::query;
use log::{debug, info};

use self::{
    config::{FileConfig, Settings},
    text_backend::{parse_script, BoardStyle, Pilot, TextBackend},
};

const LIGHT_SQUARE: Color = Color::from_rgb_u8(0xee, 0xee, 0xd2);
const DARK_SQUARE: Color = Color::from_rgb_u8(0x76, 0x96, 0x56);
const BACKGROUND: Color = Color::from_rgb_u8(0x1e, 0x1e, 0x1e);
const LEADERBOARD_ROWS: usize = 10;

#[derive(Debug, Parser)]
#[command(
    name = "knight-runner",
    version,
    about = "Play seeded Knight Runner runs in the terminal"
)]
struct CliArgs {
    /// TOML settings file; flags override its values.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Seed for enemy motion and spawning. Random when omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// Maximum number of frames to simulate.
    #[arg(long)]
    frames: Option<u32>,
    /// Simulated milliseconds per frame.
    #[arg(long)]
    frame_ms: Option<u64>,
    /// Pixel length of a board cell.
    #[arg(long)]
    cell_size: Option<f32>,
    /// Whitespace separated inputs: w/a/s/d, up/down/left/right, a cell `x,y`,
    /// a pointer position in pixels `@px,py`, `r` to play again, `.` to wait.
    #[arg(long, value_name = "TOKENS", conflicts_with = "autopilot")]
    keys: Option<String>,
    /// Let the autopilot pick the knight's moves.
    #[arg(long)]
    autopilot: bool,
    /// Draw piece glyphs on colored squares.
    #[arg(long)]
    color: bool,
    /// Frames between consecutive inputs.
    #[arg(long)]
    move_every: Option<u32>,
    /// Frames between printed boards; 0 prints only the first and last.
    #[arg(long)]
    print_every: Option<u32>,
    /// Name recorded on the leaderboard.
    #[arg(long)]
    name: Option<String>,
    /// Leaderboard file.
    #[arg(long, value_name = "PATH")]
    leaderboard: Option<PathBuf>,
    /// Do not record the finished run.
    #[arg(long)]
    no_submit: bool,
    /// Print the leaderboard and exit.
    #[arg(long)]
    show_leaderboard: bool,
    /// Empty the leaderboard and exit.
    #[arg(long, conflicts_with = "show_leaderboard")]
    reset_leaderboard: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse();
    let file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(&args, file, rand::random())?;

    if args.show_leaderboard {
        let board = Leaderboard::load(&settings.leaderboard)?;
        print!("{}", format_leaderboard(&board));
        return Ok(());
    }
    if args.reset_leaderboard {
        let mut board = Leaderboard::load(&settings.leaderboard)?;
        board.clear();
        board.save(&settings.leaderboard)?;
        info!("cleared leaderboard {}", settings.leaderboard.display());
        return Ok(());
    }

    let pilot = if args.autopilot {
        Pilot::Autopilot
    } else if let Some(keys) = &args.keys {
        Pilot::Script(parse_script(keys).context("invalid --keys script")?)
    } else {
        Pilot::Idle
    };

    info!("seed {}", settings.seed);
    let mut session = Session::new(settings.session_config()?);
    let board = BoardPresentation::new(settings.cell_size, LIGHT_SQUARE, DARK_SQUARE)
        .context("invalid board geometry")?;
    let scene = Scene::new(
        board,
        query::knight(session.world()),
        &query::enemy_view(session.world()),
        &query::power_ups(session.world()),
        query::legal_targets(session.world()).to_vec(),
        &query::status(session.world()),
    );
    let presentation = Presentation::new(
        query::welcome_banner(session.world()),
        BACKGROUND,
        scene,
    );

    let style = if args.color {
        BoardStyle::Colored
    } else {
        BoardStyle::Plain
    };
    let backend = TextBackend::new(
        std::io::stdout().lock(),
        settings.frame,
        settings.frames,
        settings.move_every,
        settings.print_every,
        pilot,
    )
    .with_style(style);
    let mut finished = Vec::new();
    backend.run(presentation, |dt, input, scene| {
        update_scene(&mut session, dt, input, scene, &mut finished)
    })?;

    if session.is_running() {
        println!(
            "run still going after {} frames, survived {:.1}s",
            settings.frames,
            session.score().as_secs_f32()
        );
    }
    if finished.is_empty() || args.no_submit {
        return Ok(());
    }

    let mut leaderboard = Leaderboard::load(&settings.leaderboard)?;
    let name = settings
        .name
        .clone()
        .or_else(|| leaderboard.last_name().map(str::to_owned))
        .unwrap_or_default();
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is set before the Unix epoch")?
        .as_millis() as u64;
    for score in finished {
        match leaderboard.submit(&name, score, timestamp) {
            Some(rank) => println!("recorded {:.1}s at rank {rank}", score.as_secs_f32()),
            None => println!("{:.1}s did not make the leaderboard", score.as_secs_f32()),
        }
    }
    leaderboard.save(&settings.leaderboard)?;
    print!("{}", format_leaderboard(&leaderboard));
    Ok(())
}

/// Applies one frame of input and time, noting the score of a run that ends.
fn update_scene(
    session: &mut Session,
    dt: Duration,
    input: FrameInput,
    scene: &mut Scene,
    finished: &mut Vec<Duration>,
) {
    if input.restart {
        session.restart();
        scene.guides.clear();
    }
    let was_running = session.is_running();
    for direction in input.directions {
        let knight = query::knight(session.world());
        let outcome = session.press(direction);
        debug!("pressed {direction:?}: {outcome:?}");
        show_outcome(scene, knight, &outcome);
    }
    if let Some(cell) = input.selected_cell {
        let knight = query::knight(session.world());
        let outcome = session.select(cell);
        debug!("selected {cell:?}: {outcome:?}");
        show_outcome(scene, knight, &outcome);
    }

    let _ = session.frame(dt);
    if was_running {
        finished.extend(session.final_score());
    }
    let world = session.world();
    scene.refresh(
        query::knight(world),
        &query::enemy_view(world),
        &query::power_ups(world),
        query::legal_targets(world).to_vec(),
        &query::status(world),
    );
}

fn show_outcome(scene: &mut Scene, knight: CellCoord, outcome: &InputOutcome) {
    if *outcome != InputOutcome::Ignored {
        scene.guides = Guide::from_outcome(knight, outcome);
    }
}

fn format_leaderboard(board: &Leaderboard) -> String {
    if board.ranked().is_empty() {
        return "leaderboard is empty\n".to_owned();
    }
    board
        .ranked()
        .iter()
        .take(LEADERBOARD_ROWS)
        .enumerate()
        .map(|(index, entry)| {
            format!(
                "{:>2}. {:<16} {:>6.1}s\n",
                index + 1,
                entry.name,
                entry.score
            )
        })
        .collect()
}
