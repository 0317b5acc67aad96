//! Observable per-tick view of a game, shared with producers and renderers

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::board::Cell;
use crate::game::GameResult;
use crate::piece::Color;

/// One live piece as seen from outside the game loop
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PieceView {
    pub id: String,
    pub code: String,
    pub color: Color,
    pub cell: Cell,
    /// Top-left pixel of the interpolated position
    pub pixel: (i32, i32),
    pub state: String,
    pub legal_moves: Vec<Cell>,
}

/// Cell and the ids standing on it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellOccupancy {
    pub cell: Cell,
    pub pieces: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub tick: u64,
    pub now_ms: i64,
    pub rows: i32,
    pub cols: i32,
    pub pieces: Vec<PieceView>,
    pub occupancy: Vec<CellOccupancy>,
    pub result: GameResult,
}

impl Default for GameSnapshot {
    fn default() -> Self {
        Self {
            tick: 0,
            now_ms: 0,
            rows: 0,
            cols: 0,
            pieces: Vec::new(),
            occupancy: Vec::new(),
            result: GameResult::Ongoing,
        }
    }
}

impl GameSnapshot {
    pub fn piece(&self, id: &str) -> Option<&PieceView> {
        self.pieces.iter().find(|p| p.id == id)
    }

    /// First piece of `color` standing on `cell`
    pub fn piece_at(&self, cell: Cell, color: Color) -> Option<&PieceView> {
        self.pieces.iter().find(|p| p.cell == cell && p.color == color)
    }

    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = &PieceView> {
        self.pieces.iter().filter(move |p| p.color == color)
    }

    pub fn is_over(&self) -> bool {
        self.result.is_over()
    }
}

/// Snapshot handle written by the game thread
pub type SharedSnapshot = Arc<RwLock<GameSnapshot>>;

/// Clone the latest snapshot, recovering from a poisoned lock
pub fn read_snapshot(shared: &SharedSnapshot) -> GameSnapshot {
    match shared.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

pub fn publish_snapshot(shared: &SharedSnapshot, snapshot: GameSnapshot) {
    match shared.write() {
        Ok(mut guard) => *guard = snapshot,
        Err(poisoned) => *poisoned.into_inner() = snapshot,
    }
}
