//! Device-independent player input: keymaps and the cursor controller
//!
//! A controller turns logical key names into commands using a two-press
//! protocol: `select` picks up an own piece under the cursor, and a second
//! `select` (move) or `jump` issues the command towards the cursor.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::Cell;
use crate::command::Command;
use crate::piece::Color;
use crate::snapshot::GameSnapshot;

/// Logical input action
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Select,
    Jump,
}

/// Key name -> action, matched case-insensitively
#[derive(Clone, Debug, Default)]
pub struct Keymap {
    keys: FxHashMap<String, Action>,
}

impl Keymap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, key: &str, action: Action) -> Self {
        self.keys.insert(key.to_ascii_lowercase(), action);
        self
    }

    pub fn action(&self, key: &str) -> Option<Action> {
        self.keys.get(&key.to_ascii_lowercase()).copied()
    }

    /// Arrow keys, enter to select, `+` to jump
    pub fn arrows() -> Self {
        Self::new()
            .bind("up", Action::Up)
            .bind("down", Action::Down)
            .bind("left", Action::Left)
            .bind("right", Action::Right)
            .bind("enter", Action::Select)
            .bind("+", Action::Jump)
    }

    /// WASD, `f` to select, `g` to jump
    pub fn wasd() -> Self {
        Self::new()
            .bind("w", Action::Up)
            .bind("s", Action::Down)
            .bind("a", Action::Left)
            .bind("d", Action::Right)
            .bind("f", Action::Select)
            .bind("g", Action::Jump)
    }

    /// Conventional keymap for a side
    pub fn for_color(color: Color) -> Self {
        match color {
            Color::White => Self::arrows(),
            Color::Black => Self::wasd(),
        }
    }
}

/// One player's cursor and pending selection
#[derive(Clone, Debug)]
pub struct PlayerController {
    color: Color,
    rows: i32,
    cols: i32,
    keymap: Keymap,
    cursor: Cell,
    selected: Option<String>,
}

impl PlayerController {
    pub fn new(color: Color, rows: i32, cols: i32, keymap: Keymap) -> Self {
        Self {
            color,
            rows,
            cols,
            keymap,
            cursor: Cell::new(0, 0),
            selected: None,
        }
    }

    pub fn with_cursor(mut self, cell: Cell) -> Self {
        self.cursor = self.clamp(cell);
        self
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn cursor(&self) -> Cell {
        self.cursor
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Feed one key press; returns the command to enqueue, if any
    pub fn handle_key(&mut self, key: &str, now_ms: i64, snapshot: &GameSnapshot) -> Option<Command> {
        let action = self.keymap.action(key)?;
        self.handle_action(action, now_ms, snapshot)
    }

    pub fn handle_action(&mut self, action: Action, now_ms: i64, snapshot: &GameSnapshot) -> Option<Command> {
        match action {
            Action::Up => self.step(-1, 0),
            Action::Down => self.step(1, 0),
            Action::Left => self.step(0, -1),
            Action::Right => self.step(0, 1),
            Action::Select => return self.select(now_ms, snapshot),
            Action::Jump => return self.jump(now_ms, snapshot),
        }
        None
    }

    fn step(&mut self, dr: i32, dc: i32) {
        self.cursor = self.clamp(self.cursor.shifted(dr, dc));
    }

    fn clamp(&self, cell: Cell) -> Cell {
        Cell::new(
            cell.row.clamp(0, (self.rows - 1).max(0)),
            cell.col.clamp(0, (self.cols - 1).max(0)),
        )
    }

    /// Cell of the selected piece if it is still ours and alive
    fn take_selection(&mut self, snapshot: &GameSnapshot) -> Option<(String, Cell)> {
        let id = self.selected.take()?;
        snapshot
            .piece(&id)
            .filter(|p| p.color == self.color)
            .map(|p| (id.clone(), p.cell))
    }

    fn select(&mut self, now_ms: i64, snapshot: &GameSnapshot) -> Option<Command> {
        if let Some((id, src)) = self.take_selection(snapshot) {
            if src == self.cursor {
                debug!(piece = %id, "deselected");
                return None;
            }
            return Some(Command::move_to(now_ms, id, src, self.cursor));
        }

        match snapshot.piece_at(self.cursor, self.color) {
            Some(piece) => {
                debug!(piece = %piece.id, cell = %self.cursor, "selected");
                self.selected = Some(piece.id.clone());
            }
            None => debug!(cell = %self.cursor, color = %self.color, "nothing to select"),
        }
        None
    }

    fn jump(&mut self, now_ms: i64, snapshot: &GameSnapshot) -> Option<Command> {
        if let Some((id, src)) = self.take_selection(snapshot) {
            let params = if src == self.cursor { vec![src] } else { vec![src, self.cursor] };
            return Some(Command::jump(now_ms, id, params));
        }
        snapshot
            .piece_at(self.cursor, self.color)
            .map(|piece| Command::jump(now_ms, piece.id.clone(), vec![piece.cell]))
    }
}
