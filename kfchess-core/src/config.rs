//! Configuration types for games and catalogue loading

use crate::board::{DEFAULT_CELL_SIZE_M, DEFAULT_CELL_SIZE_PX};
use crate::physics::{DEFAULT_JUMP_MS, DEFAULT_REST_MS, DEFAULT_SPEED_M_PER_SEC};

/// Rest after a completed move
pub const DEFAULT_LONG_REST_MS: i64 = 6000;

/// Rest after a completed jump
pub const DEFAULT_SHORT_REST_MS: i64 = DEFAULT_REST_MS;

/// Game loop configuration
#[derive(Clone, Debug)]
pub struct GameConfig {
    /// Sleep between ticks in `Game::run`
    pub tick_interval_ms: u64,
    /// Stop after this many ticks (None = until decided)
    pub max_ticks: Option<u64>,
    /// Compute legal destinations for every piece in snapshots
    pub snapshot_legal_moves: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 16,
            max_ticks: None,
            snapshot_legal_moves: true,
        }
    }
}

impl GameConfig {
    pub fn with_tick_interval(mut self, ms: u64) -> Self {
        self.tick_interval_ms = ms;
        self
    }

    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    pub fn with_snapshot_legal_moves(mut self, enabled: bool) -> Self {
        self.snapshot_legal_moves = enabled;
        self
    }
}

/// Defaults applied while loading a piece catalogue
#[derive(Clone, Debug)]
pub struct CatalogueConfig {
    pub cell_size_m: f64,
    pub cell_size_px: u32,
    pub speed_m_per_sec: f64,
    pub jump_ms: i64,
    pub long_rest_ms: i64,
    pub short_rest_ms: i64,
    /// Duration for any other timed state
    pub timed_ms: i64,
    pub need_clear_path: bool,
}

impl Default for CatalogueConfig {
    fn default() -> Self {
        Self {
            cell_size_m: DEFAULT_CELL_SIZE_M,
            cell_size_px: DEFAULT_CELL_SIZE_PX,
            speed_m_per_sec: DEFAULT_SPEED_M_PER_SEC,
            jump_ms: DEFAULT_JUMP_MS,
            long_rest_ms: DEFAULT_LONG_REST_MS,
            short_rest_ms: DEFAULT_SHORT_REST_MS,
            timed_ms: DEFAULT_REST_MS,
            need_clear_path: true,
        }
    }
}

impl CatalogueConfig {
    pub fn with_cell_size(mut self, meters: f64, pixels: u32) -> Self {
        self.cell_size_m = meters;
        self.cell_size_px = pixels;
        self
    }

    pub fn with_speed(mut self, speed_m_per_sec: f64) -> Self {
        self.speed_m_per_sec = speed_m_per_sec;
        self
    }
}
