//! Piece identity and the façade over its state machine

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::board::{Board, Cell, Point};
use crate::command::Command;
use crate::error::{CatalogueError, Rejection};
use crate::physics::Physics;
use crate::position::PositionIndex;
use crate::state::{StateGraph, StateId, StateMachine};

// ============================================================================
// IDENTITY
// ============================================================================

/// Side a piece plays for
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'W' => Some(Color::White),
            'B' => Some(Color::Black),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Color::White => 'W',
            Color::Black => 'B',
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::White => f.write_str("white"),
            Color::Black => f.write_str("black"),
        }
    }
}

/// Piece type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl PieceKind {
    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'K' => Some(PieceKind::King),
            'Q' => Some(PieceKind::Queen),
            'R' => Some(PieceKind::Rook),
            'B' => Some(PieceKind::Bishop),
            'N' => Some(PieceKind::Knight),
            'P' => Some(PieceKind::Pawn),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            PieceKind::King => 'K',
            PieceKind::Queen => 'Q',
            PieceKind::Rook => 'R',
            PieceKind::Bishop => 'B',
            PieceKind::Knight => 'N',
            PieceKind::Pawn => 'P',
        }
    }
}

/// Two-letter type code such as `KW` or `PB`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PieceCode {
    pub kind: PieceKind,
    pub color: Color,
}

impl PieceCode {
    pub const fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }

    pub fn parse(code: &str) -> Result<Self, CatalogueError> {
        let bad = || CatalogueError::BadPieceCode(code.to_string());
        let mut chars = code.trim().chars();
        let kind = chars.next().and_then(PieceKind::from_letter).ok_or_else(bad)?;
        let color = chars.next().and_then(Color::from_letter).ok_or_else(bad)?;
        if chars.next().is_some() {
            return Err(bad());
        }
        Ok(Self { kind, color })
    }

    /// Id of the piece of this type that starts on `cell`
    pub fn piece_id(&self, cell: Cell) -> String {
        format!("{}_{}_{}", self, cell.row, cell.col)
    }
}

impl std::fmt::Display for PieceCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.kind.letter(), self.color.letter())
    }
}

// ============================================================================
// PIECE
// ============================================================================

/// A live piece: identity plus its current state
#[derive(Clone, Debug)]
pub struct Piece {
    id: String,
    code: PieceCode,
    machine: StateMachine,
}

impl Piece {
    /// Create a piece in its initial state at `cell`. Returns `None` if the
    /// initial state cannot be entered there.
    pub fn spawn(code: PieceCode, graph: Arc<StateGraph>, cell: Cell, now_ms: i64, board: &Board) -> Option<Self> {
        Self::with_id(code.piece_id(cell), code, graph, cell, now_ms, board)
    }

    pub fn with_id(
        id: String,
        code: PieceCode,
        graph: Arc<StateGraph>,
        cell: Cell,
        now_ms: i64,
        board: &Board,
    ) -> Option<Self> {
        let mut machine = StateMachine::new(graph);
        if !machine.start(&id, cell, now_ms, board) {
            return None;
        }
        Some(Self { id, code, machine })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn code(&self) -> PieceCode {
        self.code
    }

    pub fn kind(&self) -> PieceKind {
        self.code.kind
    }

    pub fn color(&self) -> Color {
        self.code.color
    }

    pub fn state_name(&self) -> &str {
        self.machine.state_name()
    }

    pub fn physics(&self) -> &Physics {
        self.machine.physics()
    }

    pub fn current_cell(&self) -> Cell {
        self.physics().current_cell()
    }

    pub fn position_meters(&self) -> Point {
        self.physics().current_position_meters()
    }

    /// End cell of the active physics
    pub fn destination(&self) -> Cell {
        self.physics().end_cell()
    }

    pub fn start_time_ms(&self) -> i64 {
        self.physics().start_time_ms()
    }

    pub fn can_be_captured(&self) -> bool {
        self.physics().can_be_captured()
    }

    pub fn can_capture(&self) -> bool {
        self.physics().can_capture()
    }

    /// Reported for renderers and tools; move validation does not consult it
    pub fn is_movement_blocker(&self) -> bool {
        self.physics().is_movement_blocker()
    }

    /// A knight mid-move whose destination is `cell`
    pub fn is_knight_arriving_at(&self, cell: Cell) -> bool {
        self.kind() == PieceKind::Knight && self.physics().is_moving() && self.destination() == cell
    }

    pub fn on_command(&mut self, cmd: &Command, index: &PositionIndex, board: &Board) -> Result<StateId, Rejection> {
        let color = self.color();
        self.machine.on_command(cmd, index, color, board)
    }

    pub fn update(&mut self, now_ms: i64, board: &Board) -> Option<StateId> {
        self.machine.update(now_ms, board)
    }

    pub fn legal_destinations(&self, index: &PositionIndex) -> Vec<Cell> {
        self.machine.legal_destinations(index, self.color())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::PhysicsSpec;

    #[test]
    fn test_parse_codes() {
        let code = PieceCode::parse("KW").unwrap();
        assert_eq!(code, PieceCode::new(PieceKind::King, Color::White));
        assert!(PieceCode::parse("nb").is_err());
        assert!(PieceCode::parse("XB").is_err());
        assert!(PieceCode::parse("PWX").is_err());
        assert_eq!(PieceCode::parse("NB").unwrap().to_string(), "NB");
    }

    #[test]
    fn test_piece_id_format() {
        let code = PieceCode::new(PieceKind::Knight, Color::Black);
        assert_eq!(code.piece_id(Cell::new(0, 6)), "NB_0_6");
    }

    #[test]
    fn test_spawn_starts_idle() {
        let mut graph = StateGraph::new();
        graph.add_state("idle", PhysicsSpec::Idle, true, None);
        let board = Board::standard();

        let piece = Piece::spawn(PieceCode::parse("QB").unwrap(), Arc::new(graph), Cell::new(0, 3), 0, &board).unwrap();
        assert_eq!(piece.id(), "QB_0_3");
        assert_eq!(piece.state_name(), "idle");
        assert_eq!(piece.current_cell(), Cell::new(0, 3));
        assert!(piece.is_movement_blocker());
        assert!(piece.can_be_captured());
        assert!(!piece.can_capture());
        assert!(!piece.is_knight_arriving_at(Cell::new(0, 3)));

        let empty = StateGraph::new();
        assert!(Piece::spawn(PieceCode::parse("QB").unwrap(), Arc::new(empty), Cell::new(0, 3), 0, &board).is_none());
    }
}
