use knight_runner_core::{CellCoord, Command, Direction, Event, InputOutcome, KNIGHT_START};
use knight_runner_system_input::{InputPhase, KnightInput};
use knight_runner_world::{self as world, query, Config, World};

struct Harness {
    world: World,
    input: KnightInput,
}

impl Harness {
    fn new() -> Self {
        Self {
            world: World::new(Config::default()),
            input: KnightInput::new(),
        }
    }

    fn press(&mut self, direction: Direction) -> InputOutcome {
        let mut commands = Vec::new();
        let knight = query::knight(&self.world);
        let outcome = self.input.press(direction, knight, &mut commands);
        self.run(commands);
        outcome
    }

    fn select(&mut self, cell: CellCoord) -> InputOutcome {
        let mut commands = Vec::new();
        let knight = query::knight(&self.world);
        let outcome = self.input.select(cell, knight, &mut commands);
        self.run(commands);
        outcome
    }

    fn run(&mut self, commands: Vec<Command>) {
        for command in commands {
            let mut events = Vec::new();
            world::apply(&mut self.world, command, &mut events);
            self.input.handle(&events);
        }
    }

    fn knight(&self) -> CellCoord {
        query::knight(&self.world)
    }
}

#[test]
fn up_then_right_jumps_to_four_four() {
    let mut harness = Harness::new();
    assert!(matches!(
        harness.press(Direction::North),
        InputOutcome::Armed { .. }
    ));
    assert_eq!(
        harness.press(Direction::East),
        InputOutcome::Committed {
            to: CellCoord::new(4, 4)
        }
    );
    assert_eq!(harness.knight(), CellCoord::new(4, 4));
    assert_eq!(harness.input.phase(), InputPhase::Idle);
}

#[test]
fn up_then_left_jumps_to_two_four() {
    let mut harness = Harness::new();
    let _ = harness.press(Direction::North);
    let _ = harness.press(Direction::West);
    assert_eq!(harness.knight(), CellCoord::new(2, 4));
}

#[test]
fn parallel_second_press_cancels() {
    let mut harness = Harness::new();
    let _ = harness.press(Direction::North);
    assert_eq!(harness.press(Direction::North), InputOutcome::Cancelled);
    assert_eq!(harness.knight(), KNIGHT_START);
    assert_eq!(harness.input.phase(), InputPhase::Idle);
}

#[test]
fn opposite_second_press_cancels() {
    let mut harness = Harness::new();
    let _ = harness.press(Direction::North);
    assert_eq!(harness.press(Direction::South), InputOutcome::Cancelled);
    assert_eq!(harness.knight(), KNIGHT_START);
    assert_eq!(harness.input.phase(), InputPhase::Idle);
}

#[test]
fn off_board_completion_cancels() {
    let mut input = KnightInput::new();
    let mut commands = Vec::new();
    let knight = CellCoord::new(0, 6);

    let _ = input.press(Direction::North, knight, &mut commands);
    assert_eq!(
        input.press(Direction::West, knight, &mut commands),
        InputOutcome::Cancelled
    );
    assert_eq!(input.phase(), InputPhase::Idle);
    assert!(commands.is_empty());
}

#[test]
fn off_board_midpoint_is_rejected_without_arming() {
    let mut input = KnightInput::new();
    let mut commands = Vec::new();
    let knight = CellCoord::new(0, 6);

    assert_eq!(
        input.press(Direction::West, knight, &mut commands),
        InputOutcome::Rejected {
            direction: Direction::West,
            midpoint: CellCoord::new(-2, 6),
        }
    );
    assert_eq!(input.phase(), InputPhase::Idle);

    // The next press starts a fresh first phase.
    assert!(matches!(
        input.press(Direction::North, knight, &mut commands),
        InputOutcome::Armed {
            direction: Direction::North,
            ..
        }
    ));
    assert_eq!(
        input.press(Direction::East, knight, &mut commands),
        InputOutcome::Committed {
            to: CellCoord::new(1, 4)
        }
    );
    assert_eq!(
        commands,
        vec![Command::MoveKnight {
            to: CellCoord::new(1, 4)
        }]
    );
}

#[test]
fn pointer_commits_only_knight_targets() {
    let mut harness = Harness::new();
    assert_eq!(harness.select(CellCoord::new(3, 5)), InputOutcome::Ignored);
    assert_eq!(harness.select(CellCoord::new(4, 8)), InputOutcome::Ignored);
    assert_eq!(harness.knight(), KNIGHT_START);

    assert_eq!(
        harness.select(CellCoord::new(5, 5)),
        InputOutcome::Committed {
            to: CellCoord::new(5, 5)
        }
    );
    assert_eq!(harness.knight(), CellCoord::new(5, 5));
}

#[test]
fn pointer_commit_discards_pending_direction() {
    let mut harness = Harness::new();
    let _ = harness.press(Direction::North);
    assert_eq!(
        harness.input.phase(),
        InputPhase::Armed(Direction::North)
    );

    let _ = harness.select(CellCoord::new(1, 5));
    assert_eq!(harness.input.phase(), InputPhase::Idle);
    assert!(matches!(
        harness.press(Direction::East),
        InputOutcome::Armed { .. }
    ));
}

#[test]
fn game_over_blocks_input_until_restart() {
    let mut input = KnightInput::new();
    let mut commands = Vec::new();
    let _ = input.press(Direction::North, KNIGHT_START, &mut commands);

    input.handle(&[Event::GameOver {
        score: std::time::Duration::from_secs(1),
    }]);
    assert_eq!(input.phase(), InputPhase::Idle);
    assert_eq!(
        input.press(Direction::East, KNIGHT_START, &mut commands),
        InputOutcome::Ignored
    );
    assert!(commands.is_empty());

    input.handle(&[Event::RunRestarted]);
    let _ = input.press(Direction::North, KNIGHT_START, &mut commands);
    let _ = input.press(Direction::East, KNIGHT_START, &mut commands);
    assert_eq!(
        commands,
        vec![Command::MoveKnight {
            to: CellCoord::new(4, 4)
        }]
    );
}
