//! Per-tick game events and the scoreboard fed from them

use serde::{Deserialize, Serialize};

use crate::board::Cell;
use crate::command::CommandKind;
use crate::game::GameResult;
use crate::piece::Color;

/// Points for each captured enemy piece
pub const CAPTURE_POINTS: u32 = 1;

/// Bonus for winning the game
pub const WIN_POINTS: u32 = 10;

/// Something observable that happened during a tick
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// An external command changed a piece's state
    Applied {
        at_ms: i64,
        piece_id: String,
        color: Color,
        kind: CommandKind,
        params: Vec<Cell>,
        state: String,
    },
    /// An external command was discarded
    Rejected {
        at_ms: i64,
        piece_id: String,
        kind: CommandKind,
        reason: String,
    },
    Captured {
        at_ms: i64,
        cell: Cell,
        winner: String,
        winner_color: Color,
        captured: String,
        captured_color: Color,
    },
    Finished { at_ms: i64, result: GameResult },
}

/// Per-color score and move log
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Scoreboard {
    pub white_score: u32,
    pub black_score: u32,
    pub white_log: Vec<String>,
    pub black_log: Vec<String>,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(&self, color: Color) -> u32 {
        match color {
            Color::White => self.white_score,
            Color::Black => self.black_score,
        }
    }

    pub fn log(&self, color: Color) -> &[String] {
        match color {
            Color::White => &self.white_log,
            Color::Black => &self.black_log,
        }
    }

    pub fn record(&mut self, event: &GameEvent) {
        match event {
            GameEvent::Applied { at_ms, piece_id, color, kind, params, .. } => {
                let cells: Vec<String> = params.iter().map(Cell::to_string).collect();
                let line = format!("{} {} {} {}", format_time(*at_ms), piece_id, kind, cells.join("->"));
                self.log_mut(*color).push(line);
            }
            GameEvent::Captured { at_ms, cell, winner, winner_color, captured, captured_color } => {
                if captured_color != winner_color {
                    *self.score_mut(*winner_color) += CAPTURE_POINTS;
                }
                let line = format!("{} {} captured {} at {}", format_time(*at_ms), winner, captured, cell);
                self.log_mut(*winner_color).push(line);
            }
            GameEvent::Finished { at_ms, result } => {
                if let Some(color) = result.winner() {
                    *self.score_mut(color) += WIN_POINTS;
                    self.log_mut(color).push(format!("{} won", format_time(*at_ms)));
                }
            }
            GameEvent::Rejected { .. } => {}
        }
    }

    fn score_mut(&mut self, color: Color) -> &mut u32 {
        match color {
            Color::White => &mut self.white_score,
            Color::Black => &mut self.black_score,
        }
    }

    fn log_mut(&mut self, color: Color) -> &mut Vec<String> {
        match color {
            Color::White => &mut self.white_log,
            Color::Black => &mut self.black_log,
        }
    }
}

/// `mm:ss.mmm` game time
pub fn format_time(ms: i64) -> String {
    let ms = ms.max(0);
    format!("{:02}:{:02}.{:03}", ms / 60_000, (ms / 1000) % 60, ms % 1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(winner_color: Color) -> GameEvent {
        GameEvent::Captured {
            at_ms: 61_250,
            cell: Cell::new(3, 3),
            winner: "QW_7_3".into(),
            winner_color,
            captured: "PB_1_3".into(),
            captured_color: winner_color.opponent(),
        }
    }

    #[test]
    fn test_scores_captures_and_win() {
        let mut board = Scoreboard::new();
        board.record(&capture(Color::White));
        board.record(&capture(Color::White));
        board.record(&capture(Color::Black));
        board.record(&GameEvent::Finished { at_ms: 70_000, result: GameResult::WhiteWins });

        assert_eq!(board.score(Color::White), 2 + WIN_POINTS);
        assert_eq!(board.score(Color::Black), 1);
        assert_eq!(board.log(Color::White)[0], "01:01.250 QW_7_3 captured PB_1_3 at (3,3)");
        assert_eq!(board.log(Color::White).last().unwrap(), "01:10.000 won");
    }

    #[test]
    fn test_draw_awards_nothing() {
        let mut board = Scoreboard::new();
        board.record(&GameEvent::Finished { at_ms: 5, result: GameResult::Draw });
        assert_eq!(board.score(Color::White), 0);
        assert_eq!(board.score(Color::Black), 0);
    }

    #[test]
    fn test_applied_goes_to_movers_log() {
        let mut board = Scoreboard::new();
        board.record(&GameEvent::Applied {
            at_ms: 1200,
            piece_id: "PB_1_4".into(),
            color: Color::Black,
            kind: CommandKind::Move,
            params: vec![Cell::new(1, 4), Cell::new(2, 4)],
            state: "move".into(),
        });
        assert!(board.log(Color::White).is_empty());
        assert_eq!(board.log(Color::Black), &["00:01.200 PB_1_4 move (1,4)->(2,4)".to_string()]);
    }

    #[test]
    fn test_event_json_is_tagged() {
        let json = serde_json::to_string(&capture(Color::Black)).unwrap();
        assert!(json.contains("\"type\":\"captured\""));
    }
}
