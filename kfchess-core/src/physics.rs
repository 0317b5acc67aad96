//! Continuous-motion models attached to piece states
//!
//! Each state owns one [`Physics`] instance. `reset` starts it from a command
//! payload, `update` advances it to a point in time and reports natural expiry
//! with an internal `done` command.

use crate::board::{Board, Cell, Point};
use crate::command::Command;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Default speed for move states
pub const DEFAULT_SPEED_M_PER_SEC: f64 = 1.0;

/// Default airtime for jump states
pub const DEFAULT_JUMP_MS: i64 = 1000;

/// Default duration for timed and rest states
pub const DEFAULT_REST_MS: i64 = 3000;

// ============================================================================
// VARIANTS
// ============================================================================

/// Physics template declared by the catalogue for one state
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PhysicsSpec {
    Idle,
    Move { speed_m_per_sec: f64 },
    Jump { duration_ms: i64 },
    /// Fixed position for a fixed duration; `rest` also makes the piece passive
    Timed { duration_ms: i64, rest: bool },
}

impl PhysicsSpec {
    pub fn name(&self) -> &'static str {
        match self {
            PhysicsSpec::Idle => "idle",
            PhysicsSpec::Move { .. } => "move",
            PhysicsSpec::Jump { .. } => "jump",
            PhysicsSpec::Timed { rest: true, .. } => "rest",
            PhysicsSpec::Timed { rest: false, .. } => "timed",
        }
    }
}

/// Per-instance physics state
#[derive(Clone, Debug)]
pub struct Physics {
    spec: PhysicsSpec,
    needs_clear_path: bool,
    start_cell: Cell,
    end_cell: Cell,
    start_pos: Point,
    end_pos: Point,
    pos: Point,
    /// Cell under `pos`, cached so queries need no board
    cell: Cell,
    start_ms: i64,
    duration_ms: Option<i64>,
    expired: bool,
}

impl Physics {
    pub fn new(spec: PhysicsSpec, needs_clear_path: bool) -> Self {
        Self {
            spec,
            needs_clear_path,
            start_cell: Cell::new(0, 0),
            end_cell: Cell::new(0, 0),
            start_pos: Point::default(),
            end_pos: Point::default(),
            pos: Point::default(),
            cell: Cell::new(0, 0),
            start_ms: 0,
            duration_ms: None,
            expired: false,
        }
    }

    pub fn spec(&self) -> PhysicsSpec {
        self.spec
    }

    /// Start from a command payload. Returns false and leaves the prior
    /// state untouched when the payload does not fit this variant.
    pub fn reset(&mut self, cmd: &Command, board: &Board) -> bool {
        if cmd.params.iter().any(|&c| !board.contains(c)) {
            return false;
        }

        let (start, end, duration_ms) = match self.spec {
            PhysicsSpec::Idle => match cmd.params.first() {
                Some(&cell) => (cell, cell, None),
                None => return false,
            },
            PhysicsSpec::Move { speed_m_per_sec } => {
                let [src, dst] = match cmd.params.as_slice() {
                    &[src, dst] => [src, dst],
                    _ => return false,
                };
                if src == dst || speed_m_per_sec <= 0.0 {
                    return false;
                }
                let distance = board.cell_to_meters(src).distance_to(board.cell_to_meters(dst));
                let duration = (distance / speed_m_per_sec * 1000.0).round() as i64;
                (src, dst, Some(duration))
            }
            PhysicsSpec::Jump { duration_ms } => match cmd.params.as_slice() {
                &[cell] => (cell, cell, Some(duration_ms)),
                &[src, dst] => (src, dst, Some(duration_ms)),
                _ => return false,
            },
            PhysicsSpec::Timed { duration_ms, .. } => match cmd.params.first() {
                Some(&cell) => (cell, cell, Some(duration_ms)),
                None => return false,
            },
        };

        self.start_cell = start;
        self.end_cell = end;
        self.start_pos = board.cell_to_meters(start);
        self.end_pos = board.cell_to_meters(end);
        self.start_ms = cmd.timestamp_ms;
        self.duration_ms = duration_ms;
        self.expired = false;

        // Only moves travel; everything else sits on its end cell from the start
        if matches!(self.spec, PhysicsSpec::Move { .. }) {
            self.pos = self.start_pos;
            self.cell = start;
        } else {
            self.pos = self.end_pos;
            self.cell = end;
        }
        true
    }

    /// Advance to `now_ms`. Returns the `done` command once, on expiry.
    pub fn update(&mut self, now_ms: i64, board: &Board) -> Option<Command> {
        let duration = self.duration_ms?;
        if self.expired {
            return None;
        }
        let elapsed = now_ms - self.start_ms;

        if let PhysicsSpec::Move { .. } = self.spec {
            // a zero-length move has already arrived
            if duration > 0 && elapsed < duration {
                let t = (elapsed.max(0) as f64 / duration as f64).clamp(0.0, 1.0);
                self.pos = self.start_pos.lerp(self.end_pos, t);
                self.cell = board.meters_to_cell(self.pos);
                return None;
            }
            self.pos = self.end_pos;
            self.cell = self.end_cell;
        }

        if elapsed >= duration {
            self.expired = true;
            return Some(Command::done(now_ms, self.end_cell));
        }
        None
    }

    pub fn current_position_meters(&self) -> Point {
        self.pos
    }

    pub fn current_cell(&self) -> Cell {
        self.cell
    }

    pub fn start_cell(&self) -> Cell {
        self.start_cell
    }

    /// Cell this physics ends on
    pub fn end_cell(&self) -> Cell {
        self.end_cell
    }

    pub fn start_time_ms(&self) -> i64 {
        self.start_ms
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.duration_ms
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.spec, PhysicsSpec::Idle)
    }

    pub fn is_moving(&self) -> bool {
        matches!(self.spec, PhysicsSpec::Move { .. })
    }

    pub fn can_be_captured(&self) -> bool {
        !matches!(self.spec, PhysicsSpec::Move { .. } | PhysicsSpec::Jump { .. })
    }

    pub fn can_capture(&self) -> bool {
        !matches!(self.spec, PhysicsSpec::Idle | PhysicsSpec::Timed { rest: true, .. })
    }

    /// Informational: clear-path checks reject any occupant, blocker or not
    pub fn is_movement_blocker(&self) -> bool {
        matches!(self.spec, PhysicsSpec::Idle | PhysicsSpec::Timed { rest: true, .. })
    }

    pub fn needs_clear_path(&self) -> bool {
        self.needs_clear_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandKind;

    fn cmd(ts: i64, kind: CommandKind, params: Vec<Cell>) -> Command {
        Command::new(ts, "QW_0_0", kind, params)
    }

    #[test]
    fn test_move_interpolates_and_expires() {
        let board = Board::standard();
        let mut phys = Physics::new(PhysicsSpec::Move { speed_m_per_sec: 1.0 }, true);
        assert!(phys.reset(&Command::move_to(0, "QW_0_0", Cell::new(0, 0), Cell::new(0, 3)), &board));
        assert_eq!(phys.duration_ms(), Some(3000));

        assert!(phys.update(1400, &board).is_none());
        assert_eq!(phys.current_cell(), Cell::new(0, 1));
        assert!((phys.current_position_meters().x - 1.4).abs() < 1e-9);

        assert!(phys.update(2999, &board).is_none());

        let done = phys.update(3000, &board).unwrap();
        assert_eq!(done.kind, CommandKind::Done);
        assert_eq!(done.params, vec![Cell::new(0, 3)]);
        assert_eq!(phys.current_cell(), Cell::new(0, 3));

        // expiry is reported once
        assert!(phys.update(3500, &board).is_none());
    }

    #[test]
    fn test_move_rejects_malformed_payload() {
        let board = Board::standard();
        let mut phys = Physics::new(PhysicsSpec::Move { speed_m_per_sec: 2.0 }, true);
        assert!(phys.reset(&Command::move_to(100, "RW_7_0", Cell::new(7, 0), Cell::new(5, 0)), &board));

        assert!(!phys.reset(&Command::move_to(200, "RW_7_0", Cell::new(5, 0), Cell::new(5, 0)), &board));
        assert!(!phys.reset(&cmd(200, CommandKind::Move, vec![Cell::new(5, 0)]), &board));
        assert!(!phys.reset(&Command::move_to(200, "RW_7_0", Cell::new(5, 0), Cell::new(9, 0)), &board));

        // prior state retained
        assert_eq!(phys.start_time_ms(), 100);
        assert_eq!(phys.end_cell(), Cell::new(5, 0));
        assert_eq!(phys.duration_ms(), Some(1000));

        let mut frozen = Physics::new(PhysicsSpec::Move { speed_m_per_sec: 0.0 }, true);
        assert!(!frozen.reset(&Command::move_to(0, "RW_7_0", Cell::new(7, 0), Cell::new(6, 0)), &board));
    }

    #[test]
    fn test_jump_snaps_to_destination() {
        let board = Board::standard();
        let mut phys = Physics::new(PhysicsSpec::Jump { duration_ms: 1000 }, false);
        assert!(phys.reset(&Command::jump(500, "NW_7_1", vec![Cell::new(7, 1), Cell::new(5, 2)]), &board));
        assert_eq!(phys.current_cell(), Cell::new(5, 2));
        assert!(!phys.can_be_captured());
        assert!(phys.update(1499, &board).is_none());
        assert_eq!(phys.update(1500, &board).unwrap().params, vec![Cell::new(5, 2)]);

        assert!(phys.reset(&Command::jump(2000, "NW_7_1", vec![Cell::new(5, 2)]), &board));
        assert_eq!(phys.current_cell(), Cell::new(5, 2));
        assert!(!phys.reset(&Command::jump(2000, "NW_7_1", vec![]), &board));
    }

    #[test]
    fn test_idle_never_expires() {
        let board = Board::standard();
        let mut phys = Physics::new(PhysicsSpec::Idle, true);
        assert!(phys.reset(&Command::idle(0, "KW_7_4", Cell::new(7, 4)), &board));

        assert!(phys.update(10_000, &board).is_none());
        let before = (phys.current_cell(), phys.current_position_meters(), phys.start_time_ms());
        assert!(phys.update(10_000, &board).is_none());
        assert_eq!(before, (phys.current_cell(), phys.current_position_meters(), phys.start_time_ms()));
        assert_eq!(phys.current_position_meters(), Point::new(4.0, 7.0));
    }

    #[test]
    fn test_rest_expires_in_place() {
        let board = Board::standard();
        let mut phys = Physics::new(PhysicsSpec::Timed { duration_ms: 6000, rest: true }, true);
        assert!(phys.reset(&Command::done(3000, Cell::new(2, 2)), &board));
        assert!(phys.update(8999, &board).is_none());
        let done = phys.update(9000, &board).unwrap();
        assert_eq!(done.params, vec![Cell::new(2, 2)]);
        assert!(done.piece_id.is_empty());
    }

    #[test]
    fn test_capability_table() {
        let cases = [
            (PhysicsSpec::Idle, true, false, true),
            (PhysicsSpec::Move { speed_m_per_sec: 1.0 }, false, true, false),
            (PhysicsSpec::Jump { duration_ms: 1000 }, false, true, false),
            (PhysicsSpec::Timed { duration_ms: 100, rest: false }, true, true, false),
            (PhysicsSpec::Timed { duration_ms: 100, rest: true }, true, false, true),
        ];
        for (spec, captured, captures, blocker) in cases {
            let phys = Physics::new(spec, true);
            assert_eq!(phys.can_be_captured(), captured, "{}", spec.name());
            assert_eq!(phys.can_capture(), captures, "{}", spec.name());
            assert_eq!(phys.is_movement_blocker(), blocker, "{}", spec.name());
            assert_eq!(phys.is_idle(), spec == PhysicsSpec::Idle, "{}", spec.name());
        }
    }

    #[test]
    fn test_instant_move_lands_before_start() {
        let board = Board::standard();
        let mut phys = Physics::new(PhysicsSpec::Move { speed_m_per_sec: 1e9 }, true);
        assert!(phys.reset(&Command::move_to(100, "QW_0_0", Cell::new(0, 0), Cell::new(0, 1)), &board));
        assert_eq!(phys.duration_ms(), Some(0));

        // a tick stamped before the command must not interpolate
        assert!(phys.update(95, &board).is_none());
        assert_eq!(phys.current_cell(), Cell::new(0, 1));
        assert!(phys.current_position_meters().x.is_finite());

        let done = phys.update(100, &board).unwrap();
        assert_eq!(done.params, vec![Cell::new(0, 1)]);
    }
}
