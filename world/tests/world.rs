use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use knight_runner_core::{
    CellCoord, Command, EnemyKind, Event, PowerUpKind, BOARD_SIZE, KNIGHT_START,
};
use knight_runner_world::{self as world, query, Config, World};

const FRAME: Duration = Duration::from_millis(50);

fn apply(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    events
}

fn tick_until<F>(world: &mut World, limit: usize, mut done: F) -> Vec<Event>
where
    F: FnMut(&World, &[Event]) -> bool,
{
    let mut collected = Vec::new();
    for _ in 0..limit {
        let events = apply(world, Command::Tick { dt: FRAME });
        let finished = done(world, &events);
        collected.extend(events);
        if finished {
            return collected;
        }
    }
    panic!("condition not reached within {limit} frames");
}

fn spawn_pawn(world: &mut World, column: i32) {
    let _ = apply(
        world,
        Command::SpawnEnemy {
            kind: EnemyKind::Pawn,
            column,
        },
    );
}

fn place(world: &mut World, kind: PowerUpKind, cell: CellCoord) {
    let events = apply(world, Command::SpawnPowerUp { kind, cell });
    assert!(
        matches!(events.as_slice(), [Event::PowerUpSpawned { .. }]),
        "power-up was not placed: {events:?}"
    );
}

#[test]
fn pawn_hitting_unshielded_knight_ends_run_and_freezes_score() {
    let mut world = World::new(Config::default());
    spawn_pawn(&mut world, KNIGHT_START.column());

    let events = tick_until(&mut world, 400, |_, events| {
        events
            .iter()
            .any(|event| matches!(event, Event::GameOver { .. }))
    });
    let score = query::score(&world);
    assert!(!query::is_running(&world));
    assert_eq!(query::final_score(&world), Some(score));
    assert!(query::legal_targets(&world).is_empty());
    assert_eq!(
        events
            .iter()
            .filter(|event| matches!(event, Event::GameOver { .. }))
            .count(),
        1
    );

    for _ in 0..10 {
        assert!(apply(&mut world, Command::Tick { dt: FRAME }).is_empty());
    }
    assert_eq!(query::score(&world), score);
    assert!(!query::is_running(&world));
}

#[test]
fn shield_absorbs_frame_collision_and_removes_that_enemy() {
    let mut world = World::new(Config::default());
    place(&mut world, PowerUpKind::Shield, CellCoord::new(5, 5));
    let _ = apply(
        &mut world,
        Command::MoveKnight {
            to: CellCoord::new(5, 5),
        },
    );
    assert_eq!(query::status(&world).shield, 1);

    spawn_pawn(&mut world, 5);
    let events = tick_until(&mut world, 400, |_, events| {
        events
            .iter()
            .any(|event| matches!(event, Event::ShieldAbsorbedHit { .. }))
    });

    assert!(query::is_running(&world));
    assert_eq!(query::status(&world).shield, 0);
    assert!(query::enemy_view(&world).is_empty());
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::GameOver { .. })));
}

#[test]
fn shielded_commit_removes_every_enemy_on_the_destination() {
    let mut world = World::new(Config::default());
    place(&mut world, PowerUpKind::Shield, CellCoord::new(5, 5));
    let _ = apply(
        &mut world,
        Command::MoveKnight {
            to: CellCoord::new(5, 5),
        },
    );

    let destination = CellCoord::new(3, 4);
    spawn_pawn(&mut world, 3);
    spawn_pawn(&mut world, 3);
    let _ = tick_until(&mut world, 400, |world, _| {
        query::enemy_cells(world)
            .iter()
            .all(|cell| *cell == destination)
    });

    let events = apply(&mut world, Command::MoveKnight { to: destination });
    let absorbed = events
        .iter()
        .filter(|event| matches!(event, Event::ShieldAbsorbedHit { .. }))
        .count();
    assert_eq!(absorbed, 2);
    assert!(query::is_running(&world));
    assert_eq!(query::status(&world).shield, 0);
    assert!(query::enemy_view(&world).is_empty());
}

#[test]
fn unshielded_commit_onto_enemy_ends_run() {
    let mut world = World::new(Config::default());
    let destination = CellCoord::new(4, 4);
    spawn_pawn(&mut world, 4);
    let _ = tick_until(&mut world, 400, |world, _| {
        query::enemy_cells(world).contains(&destination)
    });

    let events = apply(&mut world, Command::MoveKnight { to: destination });
    assert!(matches!(
        events.as_slice(),
        [Event::KnightMoved { .. }, Event::GameOver { .. }]
    ));
    assert!(!query::is_running(&world));
}

#[test]
fn danger_flags_enemy_on_a_jump_target() {
    let mut world = World::new(Config::default());
    assert!(!query::status(&world).danger);
    spawn_pawn(&mut world, 4);

    let _ = tick_until(&mut world, 400, |world, _| query::status(world).danger);
    assert!(query::enemy_cells(&world).contains(&CellCoord::new(4, 4)));
    assert!(query::is_running(&world));
}

#[test]
fn pawn_leaves_through_the_bottom_edge() {
    let mut world = World::new(Config::default());
    spawn_pawn(&mut world, 0);

    let events = tick_until(&mut world, 400, |world, _| {
        query::enemy_view(world).is_empty()
    });
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::EnemyExited { .. })));
    assert!(query::is_running(&world));
}

#[test]
fn waypoint_enemies_stay_within_columns_and_exit() {
    let mut world = World::new(Config::default().with_seed(99));
    for column in 0..BOARD_SIZE {
        let _ = apply(
            &mut world,
            Command::SpawnEnemy {
                kind: if column % 2 == 0 {
                    EnemyKind::Bishop
                } else {
                    EnemyKind::Queen
                },
                column,
            },
        );
    }
    let mut exited = 0;
    for _ in 0..400 {
        for event in apply(&mut world, Command::Tick { dt: FRAME }) {
            if matches!(event, Event::EnemyExited { .. } | Event::GameOver { .. }) {
                exited += 1;
            }
        }
        for snapshot in query::enemy_view(&world).iter() {
            assert!((0..BOARD_SIZE).contains(&snapshot.cell.column()));
            assert!(snapshot.cell.row() >= -1 && snapshot.cell.row() <= BOARD_SIZE);
        }
        if query::enemy_view(&world).is_empty() || !query::is_running(&world) {
            break;
        }
    }
    assert!(exited >= 1);
}

#[test]
fn speed_pickup_grants_allowance_spent_by_the_same_move() {
    let mut world = World::new(Config::default());
    place(&mut world, PowerUpKind::Speed, CellCoord::new(5, 5));

    let _ = apply(
        &mut world,
        Command::MoveKnight {
            to: CellCoord::new(5, 5),
        },
    );
    assert_eq!(query::status(&world).speed_moves, 2);

    let _ = apply(
        &mut world,
        Command::MoveKnight {
            to: CellCoord::new(3, 6),
        },
    );
    let events = apply(
        &mut world,
        Command::MoveKnight {
            to: CellCoord::new(5, 5),
        },
    );
    assert_eq!(query::status(&world).speed_moves, 0);
    assert!(events.contains(&Event::SpeedBoostDepleted));
}

#[test]
fn slow_pickup_refreshes_window_from_second_pickup() {
    let mut world = World::new(Config::default());
    place(&mut world, PowerUpKind::Slow, CellCoord::new(5, 5));
    let _ = apply(
        &mut world,
        Command::MoveKnight {
            to: CellCoord::new(5, 5),
        },
    );
    assert_eq!(
        query::status(&world).slow_until,
        Some(Duration::from_millis(5_000))
    );

    let _ = apply(
        &mut world,
        Command::Tick {
            dt: Duration::from_millis(2_000),
        },
    );
    place(&mut world, PowerUpKind::Slow, CellCoord::new(3, 6));
    let _ = apply(
        &mut world,
        Command::MoveKnight {
            to: CellCoord::new(3, 6),
        },
    );

    let status = query::status(&world);
    assert_eq!(status.slow_until, Some(Duration::from_millis(7_000)));
    assert_eq!(status.effective_speed(), 0.5);

    let _ = apply(
        &mut world,
        Command::Tick {
            dt: Duration::from_millis(5_000),
        },
    );
    assert_eq!(query::status(&world).slow_factor, 0.5);
    let events = apply(
        &mut world,
        Command::Tick {
            dt: Duration::from_millis(1),
        },
    );
    assert!(events.contains(&Event::SlowExpired));
    assert_eq!(query::status(&world).slow_factor, 1.0);
}

#[test]
fn clear_pickup_empties_the_board() {
    let mut world = World::new(Config::default());
    for column in [0, 2, 7] {
        spawn_pawn(&mut world, column);
    }
    place(&mut world, PowerUpKind::Clear, CellCoord::new(5, 5));

    let events = apply(
        &mut world,
        Command::MoveKnight {
            to: CellCoord::new(5, 5),
        },
    );
    assert!(events.contains(&Event::EnemiesCleared { count: 3 }));
    assert!(query::enemy_view(&world).is_empty());
    assert!(query::power_ups(&world).is_empty());
}

#[test]
fn power_up_expires_after_its_lifetime() {
    let mut world = World::new(Config::default());
    place(&mut world, PowerUpKind::Shield, CellCoord::new(0, 0));

    let _ = apply(
        &mut world,
        Command::Tick {
            dt: Duration::from_millis(5_500),
        },
    );
    assert_eq!(query::power_ups(&world).len(), 1);

    let events = apply(
        &mut world,
        Command::Tick {
            dt: Duration::from_millis(1),
        },
    );
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::PowerUpExpired { .. })));
    assert!(query::power_ups(&world).is_empty());
}

#[test]
fn non_knight_moves_are_ignored() {
    let mut world = World::new(Config::default());
    for to in [
        CellCoord::new(3, 5),
        CellCoord::new(4, 8),
        CellCoord::new(3, 6),
    ] {
        assert!(apply(&mut world, Command::MoveKnight { to }).is_empty());
    }
    assert_eq!(query::knight(&world), KNIGHT_START);
}

#[test]
fn difficulty_only_increases_until_restart() {
    let mut world = World::new(Config::default());
    for expected in [1.4_f32, 1.8, 2.2] {
        let events = apply(&mut world, Command::IncreaseDifficulty { step: 0.4 });
        let status = query::status(&world);
        assert!((status.speed_mult - expected).abs() < 1e-5);
        assert!(matches!(
            events.as_slice(),
            [Event::DifficultyIncreased { .. }]
        ));
    }

    let _ = apply(&mut world, Command::Restart);
    assert_eq!(query::status(&world).speed_mult, 1.0);
}

#[test]
fn restart_resets_the_whole_run() {
    let mut world = World::new(Config::default());
    place(&mut world, PowerUpKind::Shield, CellCoord::new(5, 5));
    let _ = apply(
        &mut world,
        Command::MoveKnight {
            to: CellCoord::new(5, 5),
        },
    );
    let _ = apply(&mut world, Command::IncreaseDifficulty { step: 0.4 });
    spawn_pawn(&mut world, 1);
    place(&mut world, PowerUpKind::Slow, CellCoord::new(0, 0));
    let _ = apply(
        &mut world,
        Command::Tick {
            dt: Duration::from_secs(1),
        },
    );

    let events = apply(&mut world, Command::Restart);
    assert_eq!(events, vec![Event::RunRestarted]);

    let status = query::status(&world);
    assert_eq!(query::knight(&world), KNIGHT_START);
    assert!(query::enemy_view(&world).is_empty());
    assert!(query::power_ups(&world).is_empty());
    assert_eq!(status.shield, 0);
    assert_eq!(status.speed_moves, 0);
    assert_eq!(status.slow_factor, 1.0);
    assert_eq!(status.slow_until, None);
    assert_eq!(status.speed_mult, 1.0);
    assert_eq!(status.elapsed, Duration::ZERO);
    assert!(status.running);
    assert_eq!(query::final_score(&world), None);
}

#[test]
fn commands_after_game_over_are_ignored_until_restart() {
    let mut world = World::new(Config::default());
    spawn_pawn(&mut world, KNIGHT_START.column());
    let _ = tick_until(&mut world, 400, |world, _| !query::is_running(world));

    assert!(apply(&mut world, Command::IncreaseDifficulty { step: 0.4 }).is_empty());
    spawn_pawn(&mut world, 0);
    assert!(apply(
        &mut world,
        Command::MoveKnight {
            to: CellCoord::new(5, 5),
        },
    )
    .is_empty());

    let _ = apply(&mut world, Command::Restart);
    assert!(query::is_running(&world));
    assert_eq!(query::legal_targets(&world).len(), 6);
}

#[test]
fn configure_board_rescales_enemy_positions() {
    let mut world = World::new(Config::default());
    spawn_pawn(&mut world, 2);
    let events = apply(&mut world, Command::ConfigureBoard { cell_size: 32.0 });
    assert_eq!(events, vec![Event::BoardConfigured { cell_size: 32.0 }]);

    let view = query::enemy_view(&world);
    let snapshot = view.iter().last().expect("pawn snapshot");
    assert_eq!(snapshot.position, glam::Vec2::new(64.0, -32.0));
    assert_eq!(snapshot.cell, CellCoord::new(2, -1));

    assert!(apply(&mut world, Command::ConfigureBoard { cell_size: 0.0 }).is_empty());
    assert_eq!(query::cell_size(&world), 32.0);
}

#[test]
fn deterministic_replay_produces_identical_fingerprint() {
    let first = replay(0x5eed);
    let second = replay(0x5eed);
    assert_eq!(first, second, "replay diverged between runs");
}

fn replay(seed: u64) -> u64 {
    let mut world = World::new(Config::default().with_seed(seed));
    let kinds = [
        EnemyKind::Queen,
        EnemyKind::Bishop,
        EnemyKind::Rook,
        EnemyKind::Pawn,
    ];
    let mut hasher = DefaultHasher::new();

    for step in 0..240_u32 {
        if step % 20 == 0 {
            let kind = kinds[(step / 20) as usize % kinds.len()];
            let column = (step / 20) as i32 % BOARD_SIZE;
            let _ = apply(&mut world, Command::SpawnEnemy { kind, column });
        }
        for event in apply(&mut world, Command::Tick { dt: FRAME }) {
            format!("{event:?}").hash(&mut hasher);
        }
        for snapshot in query::enemy_view(&world).iter() {
            snapshot.id.hash(&mut hasher);
            snapshot.position.x.to_bits().hash(&mut hasher);
            snapshot.position.y.to_bits().hash(&mut hasher);
        }
    }

    hasher.finish()
}
