//! KFChess Core - Real-time chess engine
//!
//! This crate provides the core of a continuous-motion chess variant:
//! - Board geometry (cells, meters, pixels)
//! - Movement rule tables with capture semantics
//! - Per-state physics and the piece state machine
//! - The authoritative tick loop with collision resolution
//! - Catalogue loading, input controllers and producer threads

pub mod board;
pub mod command;
pub mod error;
pub mod moves;
pub mod physics;
pub mod state;
pub mod piece;
pub mod position;
pub mod clock;
pub mod queue;
pub mod events;
pub mod snapshot;
pub mod config;
pub mod game;
pub mod catalogue;
pub mod input;
pub mod producer;

// Re-exports for convenient access
pub use board::{Board, Cell, Point};
pub use command::{Command, CommandKind};
pub use error::{CatalogueError, GameError, Rejection};
pub use moves::{CaptureRule, MoveRules};
pub use physics::{Physics, PhysicsSpec};
pub use state::{StateGraph, StateId, StateMachine};
pub use piece::{Color, Piece, PieceCode, PieceKind};
pub use position::{Occupant, PositionIndex};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use queue::{command_channel, CommandInbox, CommandSender};
pub use events::{GameEvent, Scoreboard};
pub use snapshot::{read_snapshot, GameSnapshot, PieceView, SharedSnapshot};
pub use config::{CatalogueConfig, GameConfig};
pub use game::{Game, GameResult, TickReport};
pub use catalogue::{Catalogue, Layout, PieceFactory};
pub use input::{Action, Keymap, PlayerController};
pub use producer::{Producer, StopFlag};
