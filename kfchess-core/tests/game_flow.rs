//! Integration tests for the KFChess core
//!
//! Drives full games built from the bundled piece catalogue: loading, command
//! routing across producer threads, motion chains, collisions and scoring.

use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::thread;

use kfchess_core::{
    Board, Catalogue, CatalogueConfig, CatalogueError, Cell, Clock, Color, Command, CommandKind,
    Game, GameConfig, GameError, GameEvent, GameResult, Piece, PieceCode,
};

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn pieces_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..").join("pieces")
}

fn catalogue() -> Catalogue {
    Catalogue::load(&pieces_dir(), CatalogueConfig::default()).unwrap()
}

fn standard_game() -> Game {
    let cat = catalogue();
    Game::new(cat.spawn_pieces().unwrap(), cat.board().clone()).unwrap()
}

/// Build a game from explicit placements using the bundled piece types
fn custom_game(placements: &[(&str, i32, i32)]) -> Result<Game, GameError> {
    let cat = catalogue();
    let pieces: Vec<Piece> = placements
        .iter()
        .map(|&(code, row, col)| {
            cat.factory()
                .create_piece(PieceCode::parse(code).unwrap(), Cell::new(row, col), 0)
                .unwrap()
        })
        .collect();
    Game::new(pieces, cat.board().clone())
}

/// Tick every `step` ms from `from` up to and including `to`
fn tick_through(game: &mut Game, from: i64, to: i64, step: i64) -> Vec<GameEvent> {
    let mut events = Vec::new();
    let mut now = from;
    while now <= to {
        events.extend(game.tick(now).events);
        now += step;
    }
    events
}

/// Clock that moves forward a fixed step on every reading
struct SteppingClock {
    now: AtomicI64,
    step: i64,
}

impl Clock for SteppingClock {
    fn now_ms(&self) -> i64 {
        self.now.fetch_add(self.step, Ordering::SeqCst)
    }
}

// ============================================================================
// CATALOGUE
// ============================================================================

#[test]
fn test_standard_catalogue_loads() {
    let cat = catalogue();
    assert_eq!(cat.board().cells_wide(), 8);
    assert_eq!(cat.board().cells_high(), 8);
    assert_eq!(cat.factory().type_codes().count(), 12);

    let game = standard_game();
    assert_eq!(game.piece_count(), 32);
    assert_eq!(game.piece("KW_7_4").unwrap().state_name(), "idle");
    assert_eq!(game.piece("PB_1_3").unwrap().state_name(), "first_idle");
    assert_eq!(game.result(), GameResult::Ongoing);
}

#[test]
fn test_opening_moves() {
    let game = standard_game();
    let mut pawn = game.valid_moves("PW_6_4").unwrap();
    pawn.sort();
    assert_eq!(pawn, vec![Cell::new(4, 4), Cell::new(5, 4)]);

    let mut knight = game.valid_moves("NW_7_1").unwrap();
    knight.sort();
    assert_eq!(knight, vec![Cell::new(5, 0), Cell::new(5, 2)]);

    assert!(game.valid_moves("RW_7_0").unwrap().is_empty());
}

#[test]
fn test_missing_transitions_file_uses_defaults() {
    let root = std::env::temp_dir().join(format!("kfchess-defaults-{}", std::process::id()));
    std::fs::create_dir_all(root.join("KW")).unwrap();
    std::fs::create_dir_all(root.join("KB")).unwrap();
    std::fs::write(root.join("board.csv"), "KB,,\n,,\n,,KW\n").unwrap();
    for code in ["KW", "KB"] {
        std::fs::write(root.join(code).join("moves.txt"), "1,0\n-1,0\n0,1\n0,-1\n").unwrap();
    }

    let cat = Catalogue::load(&root, CatalogueConfig::default()).unwrap();
    let mut game = Game::new(cat.spawn_pieces().unwrap(), cat.board().clone()).unwrap();
    assert_eq!(game.board().cells_wide(), 3);

    game.enqueue(Command::move_to(0, "KW_2_2", Cell::new(2, 2), Cell::new(1, 2)));
    game.tick(0);
    assert_eq!(game.piece("KW_2_2").unwrap().state_name(), "move");
    game.tick(1000);
    assert_eq!(game.piece("KW_2_2").unwrap().state_name(), "long_rest");

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn test_bad_move_file_reports_line() {
    let root = std::env::temp_dir().join(format!("kfchess-badmoves-{}", std::process::id()));
    std::fs::create_dir_all(root.join("KW")).unwrap();
    std::fs::write(root.join("board.csv"), "KW\n").unwrap();
    std::fs::write(root.join("KW").join("moves.txt"), "# fine\n1,0\n1,0:sometimes\n").unwrap();

    let err = Catalogue::load(&root, CatalogueConfig::default()).unwrap_err();
    assert!(matches!(err, CatalogueError::UnknownTag { line: 3, .. }));

    std::fs::remove_dir_all(&root).ok();
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

#[test]
fn test_construction_rejects_bad_layouts() {
    assert!(matches!(
        custom_game(&[("KW", 7, 4), ("KB", 0, 4), ("QW", 7, 4)]),
        Err(GameError::DuplicateOccupancy { color: Color::White, .. })
    ));
    assert!(matches!(
        custom_game(&[("KW", 7, 4), ("RB", 0, 0)]),
        Err(GameError::MissingKing(Color::Black))
    ));
    assert!(custom_game(&[("KW", 7, 4), ("KB", 0, 4)]).is_ok());
}

// ============================================================================
// COMMANDS AND MOTION
// ============================================================================

#[test]
fn test_pawn_double_step_only_once() {
    let mut game = standard_game();
    game.enqueue(Command::move_to(0, "PW_6_4", Cell::new(6, 4), Cell::new(4, 4)));
    game.tick(0);
    assert_eq!(game.piece("PW_6_4").unwrap().state_name(), "first_move");

    tick_through(&mut game, 100, 2000, 100);
    assert_eq!(game.piece("PW_6_4").unwrap().state_name(), "long_rest");
    assert_eq!(game.piece("PW_6_4").unwrap().current_cell(), Cell::new(4, 4));

    tick_through(&mut game, 2100, 8000, 100);
    assert_eq!(game.piece("PW_6_4").unwrap().state_name(), "idle");

    game.enqueue(Command::move_to(8100, "PW_6_4", Cell::new(4, 4), Cell::new(2, 4)));
    let report = game.tick(8100);
    assert!(matches!(&report.events[0], GameEvent::Rejected { .. }));
    assert_eq!(game.valid_moves("PW_6_4").unwrap(), vec![Cell::new(3, 4)]);
}

#[test]
fn test_stale_and_illegal_commands_leave_state() {
    let mut game = standard_game();
    // rook is boxed in by its own pieces
    game.enqueue(Command::move_to(0, "RW_7_0", Cell::new(7, 0), Cell::new(4, 0)));
    // source is not where the knight stands
    game.enqueue(Command::move_to(0, "NW_7_1", Cell::new(7, 2), Cell::new(5, 2)));
    // internal events are not accepted from producers
    game.enqueue(Command::new(0, "KW_7_4", CommandKind::Done, vec![Cell::new(7, 4)]));

    let report = game.tick(0);
    assert_eq!(report.events.len(), 3);
    assert!(report.events.iter().all(|e| matches!(e, GameEvent::Rejected { .. })));
    assert_eq!(game.piece("RW_7_0").unwrap().state_name(), "idle");
    assert_eq!(game.piece("NW_7_1").unwrap().state_name(), "idle");
    assert_eq!(game.piece("KW_7_4").unwrap().state_name(), "idle");
}

#[test]
fn test_fifo_across_producer_threads() {
    let mut game = standard_game();

    let handles: Vec<_> = ["W", "B"]
        .into_iter()
        .map(|tag| {
            let tx = game.sender();
            thread::spawn(move || {
                for seq in 0..50 {
                    tx.send(Command::idle(seq, format!("ghost-{}", tag), Cell::new(0, 0)));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let report = game.tick(0);
    assert_eq!(report.events.len(), 100);
    for tag in ["W", "B"] {
        let id = format!("ghost-{}", tag);
        let stamps: Vec<i64> = report
            .events
            .iter()
            .filter_map(|e| match e {
                GameEvent::Rejected { at_ms, piece_id, .. } if *piece_id == id => Some(*at_ms),
                _ => None,
            })
            .collect();
        assert_eq!(stamps, (0..50).collect::<Vec<_>>());
    }
}

// ============================================================================
// COLLISIONS
// ============================================================================

#[test]
fn test_knight_passes_over_own_pawn() {
    let mut game = standard_game();
    game.enqueue(Command::move_to(0, "NW_7_1", Cell::new(7, 1), Cell::new(5, 2)));
    let events = tick_through(&mut game, 0, 1500, 25);

    assert!(!events.iter().any(|e| matches!(e, GameEvent::Captured { .. })));
    assert!(game.piece("PW_6_2").is_some());
    let knight = game.piece("NW_7_1").unwrap();
    assert_eq!(knight.current_cell(), Cell::new(5, 2));
    assert_eq!(knight.state_name(), "long_rest");
}

#[test]
fn test_moving_piece_captures_idle_piece() {
    let mut game = custom_game(&[("KW", 7, 4), ("KB", 0, 4), ("RW", 7, 0), ("BB", 3, 0)]).unwrap();
    game.enqueue(Command::move_to(0, "RW_7_0", Cell::new(7, 0), Cell::new(3, 0)));
    let events = tick_through(&mut game, 0, 5000, 50);

    let captures: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            GameEvent::Captured { winner, captured, cell, .. } => Some((winner.as_str(), captured.as_str(), *cell)),
            _ => None,
        })
        .collect();
    assert_eq!(captures, vec![("RW_7_0", "BB_3_0", Cell::new(3, 0))]);
    assert!(game.piece("BB_3_0").is_none());
    assert_eq!(game.scoreboard().score(Color::White), 1);
    assert_eq!(game.scoreboard().score(Color::Black), 0);
}

#[test]
fn test_king_capture_ends_run() {
    let mut game = custom_game(&[("KW", 7, 4), ("KB", 0, 4), ("QW", 3, 4)])
        .unwrap()
        .with_clock(Arc::new(SteppingClock {
            now: AtomicI64::new(0),
            step: 50,
        }))
        .with_config(GameConfig::default().with_tick_interval(0).with_max_ticks(1000));

    game.enqueue(Command::move_to(0, "QW_3_4", Cell::new(3, 4), Cell::new(0, 4)));
    let mut finished = Vec::new();
    let result = game.run_with(|report| {
        finished.extend(report.events.iter().filter(|e| matches!(e, GameEvent::Finished { .. })).cloned());
    });

    assert_eq!(result, GameResult::WhiteWins);
    assert_eq!(finished.len(), 1);
    assert!(game.piece("KB_0_4").is_none());
    assert!(game.tick_count() < 1000);

    let board = game.scoreboard();
    assert_eq!(board.score(Color::White), 11);
    assert!(board.log(Color::White).iter().any(|line| line.contains("captured KB_0_4")));
    assert!(board.log(Color::White).last().unwrap().ends_with("won"));
}

#[test]
fn test_snapshot_tracks_motion() {
    let mut game = standard_game();
    let handle = game.snapshot_handle();
    game.enqueue(Command::move_to(0, "NW_7_6", Cell::new(7, 6), Cell::new(5, 7)));
    game.tick(0);
    game.tick(500);

    let snap = kfchess_core::read_snapshot(&handle);
    let knight = snap.piece("NW_7_6").unwrap();
    assert_eq!(knight.state, "move");
    assert!(knight.legal_moves.is_empty());
    let board = Board::standard();
    assert_ne!(knight.pixel, board.cell_to_pixels(Cell::new(7, 6)));
    assert_ne!(knight.pixel, board.cell_to_pixels(Cell::new(5, 7)));
    assert_eq!(snap.tick, 2);
    assert!(!snap.is_over());
}
