//! Error types

use std::path::PathBuf;

use crate::board::Cell;
use crate::piece::Color;

/// Fatal errors raised while constructing a game
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("two {color:?} pieces share cell {cell}: {first} and {second}")]
    DuplicateOccupancy {
        color: Color,
        cell: Cell,
        first: String,
        second: String,
    },

    #[error("missing {0:?} king")]
    MissingKing(Color),

    #[error("duplicate piece id: {0}")]
    DuplicatePieceId(String),
}

/// Errors raised while loading a piece catalogue or layout
#[derive(Debug, thiserror::Error)]
pub enum CatalogueError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{origin}:{line}: bad move offset '{text}'")]
    BadOffset { origin: String, line: usize, text: String },

    #[error("{origin}:{line}: unknown move tag '{tag}'")]
    UnknownTag { origin: String, line: usize, tag: String },

    #[error("bad piece code '{0}' (expected kind letter + W/B)")]
    BadPieceCode(String),

    #[error("no definition for piece type '{0}'")]
    UnknownPieceType(String),

    #[error("{path}: unknown physics kind '{kind}'")]
    UnknownPhysics { path: PathBuf, kind: String },

    #[error("cannot place {code} at {cell}")]
    Placement { code: String, cell: Cell },

    #[error("layout is empty")]
    EmptyLayout,
}

/// Reasons an external command was discarded; never fatal
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("unknown piece '{0}'")]
    UnknownPiece(String),

    #[error("no '{kind}' transition from state '{state}'")]
    NoTransition { state: String, kind: String },

    #[error("'done' is reserved for physics expiry")]
    InternalOnly,

    #[error("state '{0}' has no movement rules")]
    MissingRules(String),

    #[error("malformed payload for '{0}'")]
    MalformedPayload(String),

    #[error("source {claimed} is stale, piece is at {actual}")]
    StaleSource { claimed: Cell, actual: Cell },

    #[error("illegal move {from} -> {to}")]
    IllegalMove { from: Cell, to: Cell },

    #[error("state '{0}' rejected the payload")]
    PhysicsRejected(String),
}
