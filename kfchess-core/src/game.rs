//! Authoritative game loop: tick, command routing and collision resolution

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::board::{Board, Cell};
use crate::clock::{Clock, MonotonicClock};
use crate::command::Command;
use crate::config::GameConfig;
use crate::error::{GameError, Rejection};
use crate::events::{GameEvent, Scoreboard};
use crate::piece::{Color, Piece, PieceKind};
use crate::position::PositionIndex;
use crate::queue::{command_channel, CommandInbox, CommandSender};
use crate::snapshot::{publish_snapshot, CellOccupancy, GameSnapshot, PieceView, SharedSnapshot};

// ============================================================================
// CORE TYPES
// ============================================================================

/// Game result
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    Ongoing,
    WhiteWins,
    BlackWins,
    /// Both kings fell in the same tick
    Draw,
}

impl GameResult {
    pub fn winner(self) -> Option<Color> {
        match self {
            GameResult::WhiteWins => Some(Color::White),
            GameResult::BlackWins => Some(Color::Black),
            GameResult::Ongoing | GameResult::Draw => None,
        }
    }

    pub fn is_over(self) -> bool {
        self != GameResult::Ongoing
    }

    fn from_kings(white_alive: bool, black_alive: bool) -> Self {
        match (white_alive, black_alive) {
            (true, true) => GameResult::Ongoing,
            (true, false) => GameResult::WhiteWins,
            (false, true) => GameResult::BlackWins,
            (false, false) => GameResult::Draw,
        }
    }
}

impl std::fmt::Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameResult::Ongoing => f.write_str("ongoing"),
            GameResult::WhiteWins => f.write_str("white wins"),
            GameResult::BlackWins => f.write_str("black wins"),
            GameResult::Draw => f.write_str("draw"),
        }
    }
}

/// Outcome of one tick
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: u64,
    pub now_ms: i64,
    pub events: Vec<GameEvent>,
    pub result: GameResult,
}

// ============================================================================
// GAME
// ============================================================================

/// Owns every live piece, the board and the command inbox
pub struct Game {
    board: Board,
    pieces: BTreeMap<String, Piece>,
    index: PositionIndex,
    inbox: CommandInbox,
    sender: CommandSender,
    clock: Arc<dyn Clock>,
    config: GameConfig,
    scoreboard: Scoreboard,
    snapshot: SharedSnapshot,
    tick: u64,
    now_ms: i64,
    result: GameResult,
}

impl Game {
    /// Build a game, rejecting same-color stacking and missing kings
    pub fn new(pieces: Vec<Piece>, board: Board) -> Result<Self, GameError> {
        let pieces = validate_layout(pieces)?;
        let (sender, inbox) = command_channel();
        let index = PositionIndex::from_pieces(pieces.values());

        let game = Self {
            board,
            pieces,
            index,
            inbox,
            sender,
            clock: Arc::new(MonotonicClock::new()),
            config: GameConfig::default(),
            scoreboard: Scoreboard::new(),
            snapshot: SharedSnapshot::default(),
            tick: 0,
            now_ms: 0,
            result: GameResult::Ongoing,
        };
        game.publish();
        Ok(game)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self.publish();
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn piece(&self, id: &str) -> Option<&Piece> {
        self.pieces.get(id)
    }

    /// Live pieces ordered by id
    pub fn pieces(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.values()
    }

    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    pub fn position_index(&self) -> &PositionIndex {
        &self.index
    }

    pub fn result(&self) -> GameResult {
        self.result
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// New producer handle into this game's inbox
    pub fn sender(&self) -> CommandSender {
        self.sender.clone()
    }

    pub fn snapshot_handle(&self) -> SharedSnapshot {
        Arc::clone(&self.snapshot)
    }

    pub fn enqueue(&self, cmd: Command) {
        self.sender.send(cmd);
    }

    /// Legal destinations for a piece against the current index
    pub fn valid_moves(&self, piece_id: &str) -> Option<Vec<Cell>> {
        self.pieces.get(piece_id).map(|p| p.legal_destinations(&self.index))
    }

    // ------------------------------------------------------------------
    // Loop
    // ------------------------------------------------------------------

    /// Run one authoritative tick at `now_ms`
    pub fn tick(&mut self, now_ms: i64) -> TickReport {
        if self.result.is_over() {
            return self.report(Vec::new());
        }
        self.tick += 1;
        self.now_ms = now_ms;
        let mut events = Vec::new();

        for piece in self.pieces.values_mut() {
            if piece.update(now_ms, &self.board).is_some() {
                debug!(piece = %piece.id(), state = %piece.state_name(), at_ms = now_ms, "expired");
            }
        }
        self.reindex();

        for cmd in self.inbox.drain() {
            events.push(self.apply(cmd));
        }
        self.reindex();

        self.resolve_collisions(now_ms, &mut events);

        self.result = self.check_result();
        if self.result.is_over() {
            info!(result = %self.result, tick = self.tick, at_ms = now_ms, "game over");
            events.push(GameEvent::Finished {
                at_ms: now_ms,
                result: self.result,
            });
        }

        for event in &events {
            self.scoreboard.record(event);
        }
        self.publish();
        self.report(events)
    }

    /// Tick on the shared clock until decided or out of budget
    pub fn run(&mut self) -> GameResult {
        self.run_with(|_| {})
    }

    /// Like `run`, handing each report to `on_tick`
    pub fn run_with<F: FnMut(&TickReport)>(&mut self, mut on_tick: F) -> GameResult {
        let interval = Duration::from_millis(self.config.tick_interval_ms);
        loop {
            if self.config.max_ticks.map_or(false, |max| self.tick >= max) {
                info!(ticks = self.tick, "tick budget exhausted");
                break;
            }
            let report = self.tick(self.clock.now_ms());
            on_tick(&report);
            if report.result.is_over() {
                break;
            }
            if !interval.is_zero() {
                std::thread::sleep(interval);
            }
        }
        self.result
    }

    // ------------------------------------------------------------------
    // Tick steps
    // ------------------------------------------------------------------

    fn reindex(&mut self) {
        self.index = PositionIndex::from_pieces(self.pieces.values());
    }

    fn apply(&mut self, cmd: Command) -> GameEvent {
        let outcome = match self.pieces.get_mut(&cmd.piece_id) {
            Some(piece) => piece
                .on_command(&cmd, &self.index, &self.board)
                .map(|_| (piece.color(), piece.state_name().to_string())),
            None => Err(Rejection::UnknownPiece(cmd.piece_id.clone())),
        };

        match outcome {
            Ok((color, state)) => {
                debug!(command = %cmd, state = %state, "applied");
                GameEvent::Applied {
                    at_ms: cmd.timestamp_ms,
                    piece_id: cmd.piece_id,
                    color,
                    kind: cmd.kind,
                    params: cmd.params,
                    state,
                }
            }
            Err(reason) => {
                warn!(command = %cmd, %reason, "rejected");
                GameEvent::Rejected {
                    at_ms: cmd.timestamp_ms,
                    piece_id: cmd.piece_id,
                    kind: cmd.kind,
                    reason: reason.to_string(),
                }
            }
        }
    }

    fn resolve_collisions(&mut self, now_ms: i64, events: &mut Vec<GameEvent>) {
        let mut captured = Vec::new();

        for cell in self.index.contested_cells() {
            let occupants: Vec<&Piece> = self
                .index
                .occupants(cell)
                .iter()
                .filter_map(|o| self.pieces.get(&o.id))
                .collect();
            if occupants.len() < 2 {
                continue;
            }
            let winner = match collision_winner(cell, &occupants) {
                Some(winner) => winner,
                None => continue,
            };

            for loser in occupants.iter().filter(|p| p.id() != winner.id() && p.can_be_captured()) {
                info!(winner = %winner.id(), captured = %loser.id(), %cell, "capture");
                events.push(GameEvent::Captured {
                    at_ms: now_ms,
                    cell,
                    winner: winner.id().to_string(),
                    winner_color: winner.color(),
                    captured: loser.id().to_string(),
                    captured_color: loser.color(),
                });
                captured.push(loser.id().to_string());
            }
        }

        for id in captured {
            self.pieces.remove(&id);
            self.index.remove(&id);
        }
    }

    fn check_result(&self) -> GameResult {
        let has_king = |color: Color| {
            self.pieces
                .values()
                .any(|p| p.kind() == PieceKind::King && p.color() == color)
        };
        GameResult::from_kings(has_king(Color::White), has_king(Color::Black))
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    fn report(&self, events: Vec<GameEvent>) -> TickReport {
        TickReport {
            tick: self.tick,
            now_ms: self.now_ms,
            events,
            result: self.result,
        }
    }

    /// Current observable state
    pub fn build_snapshot(&self) -> GameSnapshot {
        let pieces = self
            .pieces
            .values()
            .map(|p| PieceView {
                id: p.id().to_string(),
                code: p.code().to_string(),
                color: p.color(),
                cell: p.current_cell(),
                pixel: self.board.meters_to_pixels(p.position_meters()),
                state: p.state_name().to_string(),
                legal_moves: if self.config.snapshot_legal_moves {
                    p.legal_destinations(&self.index)
                } else {
                    Vec::new()
                },
            })
            .collect();

        let occupancy = self
            .index
            .iter()
            .map(|(cell, occupants)| CellOccupancy {
                cell,
                pieces: occupants.iter().map(|o| o.id.clone()).collect(),
            })
            .collect();

        GameSnapshot {
            tick: self.tick,
            now_ms: self.now_ms,
            rows: self.board.cells_high(),
            cols: self.board.cells_wide(),
            pieces,
            occupancy,
            result: self.result,
        }
    }

    fn publish(&self) {
        publish_snapshot(&self.snapshot, self.build_snapshot());
    }
}

// ============================================================================
// RULES
// ============================================================================

/// Check the construction contract and key pieces by id
fn validate_layout(pieces: Vec<Piece>) -> Result<BTreeMap<String, Piece>, GameError> {
    let mut by_id = BTreeMap::new();
    let mut seen: BTreeMap<(Color, Cell), String> = BTreeMap::new();

    for piece in pieces {
        let key = (piece.color(), piece.current_cell());
        if let Some(first) = seen.get(&key) {
            return Err(GameError::DuplicateOccupancy {
                color: key.0,
                cell: key.1,
                first: first.clone(),
                second: piece.id().to_string(),
            });
        }
        if by_id.contains_key(piece.id()) {
            return Err(GameError::DuplicatePieceId(piece.id().to_string()));
        }
        seen.insert(key, piece.id().to_string());
        by_id.insert(piece.id().to_string(), piece);
    }

    for color in [Color::White, Color::Black] {
        let has_king = by_id
            .values()
            .any(|p: &Piece| p.kind() == PieceKind::King && p.color() == color);
        if !has_king {
            return Err(GameError::MissingKing(color));
        }
    }

    Ok(by_id)
}

/// Pick the surviving occupant of a contested cell.
/// Returns `None` when a knight is only passing over the cell.
fn collision_winner<'a>(cell: Cell, occupants: &[&'a Piece]) -> Option<&'a Piece> {
    let earliest = |a: &&&'a Piece, b: &&&'a Piece| {
        (a.start_time_ms(), a.id()).cmp(&(b.start_time_ms(), b.id()))
    };

    // Knights landing here win outright
    if let Some(knight) = occupants
        .iter()
        .filter(|p| p.is_knight_arriving_at(cell))
        .min_by(earliest)
    {
        return Some(*knight);
    }
    if occupants
        .iter()
        .any(|p| p.kind() == PieceKind::Knight && p.physics().is_moving())
    {
        return None;
    }

    let active = occupants.iter().filter(|p| !p.physics().is_idle()).min_by(earliest);
    active.or_else(|| occupants.iter().min_by(earliest)).copied()
}
