//! Movement rule sets: legal relative offsets and their capture semantics

use rustc_hash::FxHashMap;

use crate::board::Cell;
use crate::error::CatalogueError;
use crate::piece::Color;
use crate::position::PositionIndex;

/// Capture semantics attached to an offset
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureRule {
    /// Legal whether or not the destination is occupied
    Any,
    /// Legal only onto an enemy piece (pawn diagonal)
    CaptureOnly,
    /// Legal only onto an empty cell (pawn push)
    NonCaptureOnly,
}

impl CaptureRule {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "" => Some(CaptureRule::Any),
            "capture" => Some(CaptureRule::CaptureOnly),
            "non_capture" => Some(CaptureRule::NonCaptureOnly),
            _ => None,
        }
    }
}

/// Offset table for one piece type, shared read-only by all its pieces
#[derive(Clone, Debug, Default)]
pub struct MoveRules {
    rows: i32,
    cols: i32,
    rules: FxHashMap<(i32, i32), CaptureRule>,
    /// Offsets in declaration order
    order: Vec<(i32, i32)>,
}

impl MoveRules {
    /// Empty table validating against a `rows x cols` board
    pub fn new(rows: i32, cols: i32) -> Self {
        Self {
            rows,
            cols,
            ..Default::default()
        }
    }

    /// Builder-style insert
    pub fn with(mut self, dr: i32, dc: i32, rule: CaptureRule) -> Self {
        self.insert(dr, dc, rule);
        self
    }

    pub fn insert(&mut self, dr: i32, dc: i32, rule: CaptureRule) {
        if self.rules.insert((dr, dc), rule).is_none() {
            self.order.push((dr, dc));
        }
    }

    /// Parse the `dr,dc[:capture|:non_capture]` line format
    pub fn parse(text: &str, rows: i32, cols: i32, origin: &str) -> Result<Self, CatalogueError> {
        let mut rules = Self::new(rows, cols);

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let (offset, tag) = match line.split_once(':') {
                Some((offset, tag)) => (offset.trim(), tag.trim()),
                None => (line, ""),
            };

            let bad_offset = || CatalogueError::BadOffset {
                origin: origin.to_string(),
                line: idx + 1,
                text: raw.trim().to_string(),
            };
            let (dr, dc) = offset.split_once(',').ok_or_else(bad_offset)?;
            let dr: i32 = dr.trim().parse().map_err(|_| bad_offset())?;
            let dc: i32 = dc.trim().parse().map_err(|_| bad_offset())?;

            let rule = CaptureRule::from_tag(tag).ok_or_else(|| CatalogueError::UnknownTag {
                origin: origin.to_string(),
                line: idx + 1,
                tag: tag.to_string(),
            })?;

            rules.insert(dr, dc, rule);
        }

        Ok(rules)
    }

    pub fn rule(&self, dr: i32, dc: i32) -> Option<CaptureRule> {
        self.rules.get(&(dr, dc)).copied()
    }

    pub fn offsets(&self) -> impl Iterator<Item = ((i32, i32), CaptureRule)> + '_ {
        self.order.iter().map(move |off| (*off, self.rules[off]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn in_bounds(&self, cell: Cell) -> bool {
        (0..self.rows).contains(&cell.row) && (0..self.cols).contains(&cell.col)
    }

    /// Check a move from `src` to `dst` against the current occupancy
    pub fn is_valid(
        &self,
        src: Cell,
        dst: Cell,
        index: &PositionIndex,
        needs_clear_path: bool,
        color: Color,
    ) -> bool {
        if !self.in_bounds(dst) {
            return false;
        }

        let (dr, dc) = src.offset_to(dst);
        let rule = match self.rule(dr, dc) {
            Some(rule) => rule,
            None => return false,
        };

        let occupants = index.occupants(dst);
        let passes = match rule {
            CaptureRule::Any => occupants.is_empty() || index.has_color(dst, color.opponent()),
            CaptureRule::CaptureOnly => index.has_color(dst, color.opponent()),
            CaptureRule::NonCaptureOnly => occupants.is_empty(),
        };
        if !passes {
            return false;
        }

        !needs_clear_path || path_is_clear(src, dst, index)
    }

    /// Every destination reachable from `src` right now
    pub fn legal_destinations(
        &self,
        src: Cell,
        index: &PositionIndex,
        needs_clear_path: bool,
        color: Color,
    ) -> Vec<Cell> {
        self.order
            .iter()
            .map(|&(dr, dc)| src.shifted(dr, dc))
            .filter(|&dst| self.is_valid(src, dst, index, needs_clear_path, color))
            .collect()
    }
}

/// Intermediate cells of a straight multi-cell line are all empty.
/// Non-straight offsets (knight leaps) have no path to check.
fn path_is_clear(src: Cell, dst: Cell, index: &PositionIndex) -> bool {
    let (dr, dc) = src.offset_to(dst);
    let steps = dr.abs().max(dc.abs());
    let straight = dr == 0 || dc == 0 || dr.abs() == dc.abs();
    if !straight || steps < 2 {
        return true;
    }

    let (step_r, step_c) = (dr.signum(), dc.signum());
    (1..steps).all(|i| !index.is_occupied(src.shifted(i * step_r, i * step_c)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_with(entries: &[(Cell, &str, Color)]) -> PositionIndex {
        let mut index = PositionIndex::new();
        for (cell, id, color) in entries {
            index.insert(*cell, id, *color);
        }
        index
    }

    #[test]
    fn test_non_capture_only_rejects_occupied() {
        let rules = MoveRules::new(8, 8).with(1, 0, CaptureRule::NonCaptureOnly);
        let index = index_with(&[(Cell::new(2, 0), "PW_6_0", Color::White)]);
        assert!(!rules.is_valid(Cell::new(1, 0), Cell::new(2, 0), &index, false, Color::Black));
        assert!(rules.is_valid(Cell::new(1, 0), Cell::new(2, 0), &PositionIndex::new(), false, Color::Black));
    }

    #[test]
    fn test_capture_only_needs_enemy() {
        let rules = MoveRules::new(8, 8).with(1, 0, CaptureRule::CaptureOnly);
        let enemy = index_with(&[(Cell::new(2, 0), "PW_6_0", Color::White)]);
        let friend = index_with(&[(Cell::new(2, 0), "PB_1_1", Color::Black)]);

        assert!(rules.is_valid(Cell::new(1, 0), Cell::new(2, 0), &enemy, false, Color::Black));
        assert!(!rules.is_valid(Cell::new(1, 0), Cell::new(2, 0), &friend, false, Color::Black));
        assert!(!rules.is_valid(Cell::new(1, 0), Cell::new(2, 0), &PositionIndex::new(), false, Color::Black));
    }

    #[test]
    fn test_any_rejects_friendly_destination() {
        let rules = MoveRules::new(8, 8).with(0, 1, CaptureRule::Any);
        let friend = index_with(&[(Cell::new(4, 5), "RW_7_7", Color::White)]);
        let enemy = index_with(&[(Cell::new(4, 5), "RB_0_7", Color::Black)]);

        assert!(!rules.is_valid(Cell::new(4, 4), Cell::new(4, 5), &friend, false, Color::White));
        assert!(rules.is_valid(Cell::new(4, 4), Cell::new(4, 5), &enemy, false, Color::White));
    }

    #[test]
    fn test_out_of_bounds_and_unknown_offset() {
        let rules = MoveRules::new(8, 8).with(-1, 0, CaptureRule::Any);
        let empty = PositionIndex::new();
        assert!(!rules.is_valid(Cell::new(0, 0), Cell::new(-1, 0), &empty, false, Color::White));
        assert!(!rules.is_valid(Cell::new(4, 4), Cell::new(5, 4), &empty, false, Color::White));
    }

    #[test]
    fn test_clear_path_blocks_any_color() {
        let rules = MoveRules::new(8, 8)
            .with(0, 3, CaptureRule::Any)
            .with(3, 3, CaptureRule::Any)
            .with(2, 1, CaptureRule::Any);
        let blocked = index_with(&[
            (Cell::new(0, 2), "PW_6_2", Color::White),
            (Cell::new(1, 1), "PB_1_1", Color::Black),
        ]);

        assert!(!rules.is_valid(Cell::new(0, 0), Cell::new(0, 3), &blocked, true, Color::White));
        assert!(!rules.is_valid(Cell::new(0, 0), Cell::new(3, 3), &blocked, true, Color::White));
        // same lines are fine when the state does not require a clear path
        assert!(rules.is_valid(Cell::new(0, 0), Cell::new(0, 3), &blocked, false, Color::White));
        // knight-shaped offsets are never path-checked
        assert!(rules.is_valid(Cell::new(0, 0), Cell::new(2, 1), &blocked, true, Color::White));
    }

    #[test]
    fn test_parse_move_file() {
        let text = "\
# rook-ish
0,1
1,0:non_capture   # push
1,1 : capture

-1,-1";
        let rules = MoveRules::parse(text, 8, 8, "moves.txt").unwrap();
        assert_eq!(rules.len(), 4);
        assert_eq!(rules.rule(0, 1), Some(CaptureRule::Any));
        assert_eq!(rules.rule(1, 0), Some(CaptureRule::NonCaptureOnly));
        assert_eq!(rules.rule(1, 1), Some(CaptureRule::CaptureOnly));
        assert_eq!(rules.offsets().next(), Some(((0, 1), CaptureRule::Any)));
    }

    #[test]
    fn test_parse_errors_name_line() {
        let err = MoveRules::parse("0,1\n1;0\n", 8, 8, "PW/moves.txt").unwrap_err();
        assert!(err.to_string().contains("PW/moves.txt:2"));

        let err = MoveRules::parse("1,0:sideways\n", 8, 8, "x").unwrap_err();
        assert!(matches!(err, CatalogueError::UnknownTag { line: 1, .. }));
    }

    #[test]
    fn test_legal_destinations_in_declaration_order() {
        let rules = MoveRules::new(8, 8)
            .with(-1, 0, CaptureRule::NonCaptureOnly)
            .with(-1, -1, CaptureRule::CaptureOnly)
            .with(-1, 1, CaptureRule::CaptureOnly);
        let index = index_with(&[(Cell::new(5, 5), "PB_1_5", Color::Black)]);
        let dests = rules.legal_destinations(Cell::new(6, 4), &index, true, Color::White);
        assert_eq!(dests, vec![Cell::new(5, 4), Cell::new(5, 5)]);
    }
}
