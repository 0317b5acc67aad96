//! Command records exchanged between producers, pieces and physics

use serde::{Deserialize, Serialize};

use crate::board::Cell;

/// Event kind carried by a command; matched case-insensitively
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CommandKind {
    Idle,
    Move,
    Jump,
    Rest,
    Done,
    /// Catalogue-defined event, stored lower-cased
    Other(String),
}

impl CommandKind {
    pub fn parse(name: &str) -> Self {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            "idle" => CommandKind::Idle,
            "move" => CommandKind::Move,
            "jump" => CommandKind::Jump,
            "rest" => CommandKind::Rest,
            "done" => CommandKind::Done,
            _ => CommandKind::Other(name),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CommandKind::Idle => "idle",
            CommandKind::Move => "move",
            CommandKind::Jump => "jump",
            CommandKind::Rest => "rest",
            CommandKind::Done => "done",
            CommandKind::Other(name) => name,
        }
    }
}

impl From<String> for CommandKind {
    fn from(name: String) -> Self {
        CommandKind::parse(&name)
    }
}

impl From<CommandKind> for String {
    fn from(kind: CommandKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable event record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub timestamp_ms: i64,
    /// Empty for internally generated events
    #[serde(default)]
    pub piece_id: String,
    pub kind: CommandKind,
    #[serde(default)]
    pub params: Vec<Cell>,
}

impl Command {
    pub fn new(timestamp_ms: i64, piece_id: impl Into<String>, kind: CommandKind, params: Vec<Cell>) -> Self {
        Self {
            timestamp_ms,
            piece_id: piece_id.into(),
            kind,
            params,
        }
    }

    pub fn move_to(timestamp_ms: i64, piece_id: impl Into<String>, src: Cell, dst: Cell) -> Self {
        Self::new(timestamp_ms, piece_id, CommandKind::Move, vec![src, dst])
    }

    pub fn jump(timestamp_ms: i64, piece_id: impl Into<String>, params: Vec<Cell>) -> Self {
        Self::new(timestamp_ms, piece_id, CommandKind::Jump, params)
    }

    pub fn idle(timestamp_ms: i64, piece_id: impl Into<String>, cell: Cell) -> Self {
        Self::new(timestamp_ms, piece_id, CommandKind::Idle, vec![cell])
    }

    /// Self-expiry event emitted by physics; never carries a piece id
    pub fn done(timestamp_ms: i64, cell: Cell) -> Self {
        Self::new(timestamp_ms, String::new(), CommandKind::Done, vec![cell])
    }

    pub fn is_internal(&self) -> bool {
        self.kind == CommandKind::Done
    }

    /// Copy of this command with a different payload
    pub fn with_params(&self, params: Vec<Cell>) -> Self {
        Self {
            params,
            ..self.clone()
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}ms[{}", self.kind, self.timestamp_ms, self.piece_id)?;
        for cell in &self.params {
            write!(f, " {}", cell)?;
        }
        f.write_str("]")
    }
}
