//! Per-tick cell occupancy index

use rustc_hash::FxHashMap;

use crate::board::Cell;
use crate::piece::{Color, Piece};

/// One piece standing on a cell
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Occupant {
    pub id: String,
    pub color: Color,
}

/// Cell -> occupants, rebuilt from scratch every tick
#[derive(Clone, Debug, Default)]
pub struct PositionIndex {
    cells: FxHashMap<Cell, Vec<Occupant>>,
}

impl PositionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from the live pieces
    pub fn from_pieces<'a>(pieces: impl IntoIterator<Item = &'a Piece>) -> Self {
        let mut index = Self::new();
        for piece in pieces {
            index.insert(piece.current_cell(), piece.id(), piece.color());
        }
        index
    }

    pub fn insert(&mut self, cell: Cell, id: &str, color: Color) {
        self.cells.entry(cell).or_default().push(Occupant {
            id: id.to_string(),
            color,
        });
    }

    /// Drop a piece wherever it is recorded
    pub fn remove(&mut self, id: &str) {
        self.cells.retain(|_, occupants| {
            occupants.retain(|o| o.id != id);
            !occupants.is_empty()
        });
    }

    pub fn occupants(&self, cell: Cell) -> &[Occupant] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_occupied(&self, cell: Cell) -> bool {
        !self.occupants(cell).is_empty()
    }

    pub fn has_color(&self, cell: Cell, color: Color) -> bool {
        self.occupants(cell).iter().any(|o| o.color == color)
    }

    /// Cells holding two or more pieces, sorted for deterministic resolution
    pub fn contested_cells(&self) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self
            .cells
            .iter()
            .filter(|(_, occupants)| occupants.len() >= 2)
            .map(|(&cell, _)| cell)
            .collect();
        cells.sort();
        cells
    }

    /// All occupied cells in sorted order
    pub fn iter(&self) -> impl Iterator<Item = (Cell, &[Occupant])> {
        let mut entries: Vec<_> = self.cells.iter().map(|(&c, o)| (c, o.as_slice())).collect();
        entries.sort_by_key(|(c, _)| *c);
        entries.into_iter()
    }

    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
