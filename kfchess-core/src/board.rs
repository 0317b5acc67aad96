//! Board geometry: cell grid, metric space and pixel space

use serde::{Deserialize, Serialize};

/// Default physical size of one cell
pub const DEFAULT_CELL_SIZE_M: f64 = 1.0;

/// Default on-screen size of one cell
pub const DEFAULT_CELL_SIZE_PX: u32 = 96;

/// Board cell as (row, col)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Offset from `self` to `other` as (dr, dc)
    pub fn offset_to(&self, other: Cell) -> (i32, i32) {
        (other.row - self.row, other.col - self.col)
    }

    /// Cell reached by applying an offset
    pub fn shifted(&self, dr: i32, dc: i32) -> Cell {
        Cell::new(self.row + dr, self.col + dc)
    }
}

impl From<(i32, i32)> for Cell {
    fn from((row, col): (i32, i32)) -> Self {
        Cell::new(row, col)
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

/// Position in meters; `x` runs along columns, `y` along rows
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Point a fraction `t` of the way towards `other`
    pub fn lerp(&self, other: Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

/// Static board geometry, immutable once built
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    cells_wide: i32,
    cells_high: i32,
    cell_size_m: f64,
    cell_size_px: u32,
}

impl Board {
    pub fn new(cells_wide: i32, cells_high: i32, cell_size_m: f64, cell_size_px: u32) -> Self {
        Self {
            cells_wide,
            cells_high,
            cell_size_m,
            cell_size_px,
        }
    }

    /// Standard 8x8 board with default cell sizes
    pub fn standard() -> Self {
        Self::new(8, 8, DEFAULT_CELL_SIZE_M, DEFAULT_CELL_SIZE_PX)
    }

    pub fn cells_wide(&self) -> i32 {
        self.cells_wide
    }

    pub fn cells_high(&self) -> i32 {
        self.cells_high
    }

    pub fn cell_size_m(&self) -> f64 {
        self.cell_size_m
    }

    pub fn cell_size_px(&self) -> u32 {
        self.cell_size_px
    }

    /// Check if a cell lies on the board
    pub fn contains(&self, cell: Cell) -> bool {
        (0..self.cells_high).contains(&cell.row) && (0..self.cells_wide).contains(&cell.col)
    }

    /// Top-left corner of a cell in meters
    pub fn cell_to_meters(&self, cell: Cell) -> Point {
        Point::new(
            cell.col as f64 * self.cell_size_m,
            cell.row as f64 * self.cell_size_m,
        )
    }

    /// Nearest cell to a metric position
    pub fn meters_to_cell(&self, pos: Point) -> Cell {
        Cell::new(
            (pos.y / self.cell_size_m).round() as i32,
            (pos.x / self.cell_size_m).round() as i32,
        )
    }

    /// Metric position to pixel (x, y)
    pub fn meters_to_pixels(&self, pos: Point) -> (i32, i32) {
        let scale = self.cell_size_px as f64 / self.cell_size_m;
        ((pos.x * scale).round() as i32, (pos.y * scale).round() as i32)
    }

    pub fn cell_to_pixels(&self, cell: Cell) -> (i32, i32) {
        self.meters_to_pixels(self.cell_to_meters(cell))
    }

    /// Iterate all cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.cells_high).flat_map(move |row| (0..self.cells_wide).map(move |col| Cell::new(row, col)))
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}
