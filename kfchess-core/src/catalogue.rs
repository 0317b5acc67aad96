//! Piece catalogue loading
//!
//! On-disk layout under a catalogue root:
//!
//! ```text
//! board.csv                          initial layout, one code per cell
//! transitions.csv                    from_state,event,to_state (optional)
//! <CODE>/moves.txt                   piece-wide move table (optional)
//! <CODE>/states/<state>/config.json  per-state physics (optional)
//! <CODE>/states/<state>/moves.txt    per-state move table (optional)
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::board::{Board, Cell};
use crate::command::CommandKind;
use crate::config::CatalogueConfig;
use crate::error::CatalogueError;
use crate::moves::MoveRules;
use crate::physics::PhysicsSpec;
use crate::piece::{Piece, PieceCode};
use crate::state::{StateGraph, INITIAL_STATE};

// ============================================================================
// CONSTANTS
// ============================================================================

/// States every piece type gets, whether or not a directory declares them
pub const DEFAULT_STATES: [&str; 5] = ["idle", "move", "jump", "long_rest", "short_rest"];

/// Preferred starting state when a type declares it (pawn double step)
pub const FIRST_IDLE_STATE: &str = "first_idle";

const LAYOUT_FILE: &str = "board.csv";
const TRANSITIONS_FILE: &str = "transitions.csv";
const MOVES_FILE: &str = "moves.txt";
const CONFIG_FILE: &str = "config.json";
const STATES_DIR: &str = "states";

// ============================================================================
// FILE FORMATS
// ============================================================================

/// One row of the global transition table
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionRule {
    pub from: String,
    pub event: CommandKind,
    pub to: String,
}

impl TransitionRule {
    pub fn new(from: &str, event: CommandKind, to: &str) -> Self {
        Self {
            from: from.to_string(),
            event,
            to: to.to_string(),
        }
    }
}

/// Transition table used when the catalogue has no `transitions.csv`
pub fn default_transitions() -> Vec<TransitionRule> {
    vec![
        TransitionRule::new("idle", CommandKind::Move, "move"),
        TransitionRule::new("idle", CommandKind::Jump, "jump"),
        TransitionRule::new("move", CommandKind::Done, "long_rest"),
        TransitionRule::new("jump", CommandKind::Done, "short_rest"),
        TransitionRule::new("long_rest", CommandKind::Done, "idle"),
        TransitionRule::new("short_rest", CommandKind::Done, "idle"),
    ]
}

/// Parse `from_state,event,to_state` rows; the header and malformed rows are skipped
pub fn parse_transitions(text: &str) -> Vec<TransitionRule> {
    let mut rules = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        match fields.as_slice() {
            ["from_state", "event", "to_state"] => {}
            [from, event, to] if !from.is_empty() && !event.is_empty() && !to.is_empty() => {
                rules.push(TransitionRule::new(from, CommandKind::parse(event), to));
            }
            _ => warn!(line = idx + 1, row = %line, "skipping malformed transition row"),
        }
    }
    rules
}

/// Initial placement grid from `board.csv`
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    rows: Vec<Vec<Option<PieceCode>>>,
    cols: usize,
}

impl Layout {
    /// Parse a CSV grid; empty cells hold no piece, short rows are padded
    pub fn parse(text: &str) -> Result<Self, CatalogueError> {
        let mut rows = Vec::new();
        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            let row = line
                .split(',')
                .map(|cell| match cell.trim() {
                    "" => Ok(None),
                    code => PieceCode::parse(code).map(Some),
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }
        while rows.last().map_or(false, |r: &Vec<Option<PieceCode>>| r.iter().all(Option::is_none)) {
            rows.pop();
        }

        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(cols, None);
        }
        let layout = Self { rows, cols };
        if layout.placements().next().is_none() {
            return Err(CatalogueError::EmptyLayout);
        }
        Ok(layout)
    }

    pub fn rows(&self) -> i32 {
        self.rows.len() as i32
    }

    pub fn cols(&self) -> i32 {
        self.cols as i32
    }

    /// Every occupied cell in row-major order
    pub fn placements(&self) -> impl Iterator<Item = (Cell, PieceCode)> + '_ {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(c, code)| code.map(|code| (Cell::new(r as i32, c as i32), code)))
        })
    }
}

/// `config.json` contents; unknown sections such as graphics are ignored
#[derive(Clone, Debug, Default, Deserialize)]
struct StateConfigFile {
    #[serde(default)]
    physics: PhysicsConfig,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct PhysicsConfig {
    kind: Option<String>,
    speed_m_per_sec: Option<f64>,
    duration_ms: Option<i64>,
    need_clear_path: Option<bool>,
}

// ============================================================================
// PIECE FACTORY
// ============================================================================

/// Per-type state graphs plus the board they were built for
#[derive(Clone, Debug)]
pub struct PieceFactory {
    board: Board,
    config: CatalogueConfig,
    graphs: BTreeMap<String, Arc<StateGraph>>,
}

impl PieceFactory {
    pub fn new(board: Board, config: CatalogueConfig) -> Self {
        Self {
            board,
            config,
            graphs: BTreeMap::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn add_type(&mut self, code: PieceCode, graph: StateGraph) {
        self.graphs.insert(code.to_string(), Arc::new(graph));
    }

    pub fn graph(&self, code: PieceCode) -> Option<&Arc<StateGraph>> {
        self.graphs.get(&code.to_string())
    }

    /// Loaded type codes in sorted order
    pub fn type_codes(&self) -> impl Iterator<Item = &str> {
        self.graphs.keys().map(String::as_str)
    }

    /// Build the state graph for one `<CODE>/` directory
    pub fn load_type(
        &mut self,
        code: PieceCode,
        dir: &Path,
        transitions: &[TransitionRule],
    ) -> Result<(), CatalogueError> {
        let rows = self.board.cells_high();
        let cols = self.board.cells_wide();
        let origin = |path: &Path| path.display().to_string();

        let shared_rules = match read_optional(&dir.join(MOVES_FILE))? {
            Some(text) => {
                let path = dir.join(MOVES_FILE);
                Some(Arc::new(MoveRules::parse(&text, rows, cols, &origin(&path))?))
            }
            None => None,
        };

        let mut names: Vec<String> = DEFAULT_STATES.iter().map(|s| s.to_string()).collect();
        for extra in list_subdirs(&dir.join(STATES_DIR))? {
            if !names.contains(&extra) {
                names.push(extra);
            }
        }

        let mut graph = StateGraph::new();
        for name in &names {
            let state_dir = dir.join(STATES_DIR).join(name);

            let cfg_path = state_dir.join(CONFIG_FILE);
            let cfg = match read_optional(&cfg_path)? {
                Some(text) => serde_json::from_str::<StateConfigFile>(&text)
                    .map_err(|source| CatalogueError::Config { path: cfg_path.clone(), source })?,
                None => StateConfigFile::default(),
            };

            let moves_path = state_dir.join(MOVES_FILE);
            let rules = match read_optional(&moves_path)? {
                Some(text) => Some(Arc::new(MoveRules::parse(&text, rows, cols, &origin(&moves_path))?)),
                None => shared_rules.clone(),
            };

            let physics = self.physics_spec(name, &cfg.physics, &cfg_path)?;
            let clear = cfg.physics.need_clear_path.unwrap_or(self.config.need_clear_path);
            graph.add_state(name, physics, clear, rules);
        }

        for rule in transitions {
            if !graph.add_transition(&rule.from, rule.event.clone(), &rule.to) {
                debug!(code = %code, from = %rule.from, to = %rule.to, "transition not applicable");
            }
        }
        if graph.state_id(FIRST_IDLE_STATE).is_some() {
            graph.set_initial(FIRST_IDLE_STATE);
        } else {
            graph.set_initial(INITIAL_STATE);
        }

        debug!(code = %code, states = graph.len(), "loaded piece type");
        self.add_type(code, graph);
        Ok(())
    }

    /// Spawn a piece of `code` in its initial state at `cell`
    pub fn create_piece(&self, code: PieceCode, cell: Cell, now_ms: i64) -> Result<Piece, CatalogueError> {
        let graph = self
            .graph(code)
            .ok_or_else(|| CatalogueError::UnknownPieceType(code.to_string()))?;
        Piece::spawn(code, Arc::clone(graph), cell, now_ms, &self.board).ok_or_else(|| CatalogueError::Placement {
            code: code.to_string(),
            cell,
        })
    }

    fn physics_spec(&self, name: &str, cfg: &PhysicsConfig, path: &Path) -> Result<PhysicsSpec, CatalogueError> {
        let kind = cfg.kind.clone().unwrap_or_else(|| kind_for_state(name).to_string());
        let spec = match kind.to_ascii_lowercase().as_str() {
            "idle" => PhysicsSpec::Idle,
            "move" => PhysicsSpec::Move {
                speed_m_per_sec: cfg.speed_m_per_sec.unwrap_or(self.config.speed_m_per_sec),
            },
            "jump" => PhysicsSpec::Jump {
                duration_ms: cfg.duration_ms.unwrap_or(self.config.jump_ms),
            },
            "rest" => PhysicsSpec::Timed {
                duration_ms: cfg.duration_ms.unwrap_or_else(|| self.rest_ms(name)),
                rest: true,
            },
            "timed" => PhysicsSpec::Timed {
                duration_ms: cfg.duration_ms.unwrap_or(self.config.timed_ms),
                rest: false,
            },
            _ => {
                return Err(CatalogueError::UnknownPhysics {
                    path: path.to_path_buf(),
                    kind,
                })
            }
        };
        Ok(spec)
    }

    fn rest_ms(&self, name: &str) -> i64 {
        match name {
            "long_rest" => self.config.long_rest_ms,
            "short_rest" => self.config.short_rest_ms,
            _ => self.config.timed_ms,
        }
    }
}

/// Physics kind implied by a state name
pub fn kind_for_state(name: &str) -> &'static str {
    if name.ends_with("move") {
        "move"
    } else if name.ends_with("jump") {
        "jump"
    } else if name.ends_with("rest") {
        "rest"
    } else {
        "idle"
    }
}

// ============================================================================
// CATALOGUE
// ============================================================================

/// A loaded catalogue: board, layout and a factory for every type on disk
#[derive(Clone, Debug)]
pub struct Catalogue {
    root: PathBuf,
    layout: Layout,
    factory: PieceFactory,
}

impl Catalogue {
    /// Load everything under `root`
    pub fn load(root: &Path, config: CatalogueConfig) -> Result<Self, CatalogueError> {
        let layout_path = root.join(LAYOUT_FILE);
        let layout_text = fs::read_to_string(&layout_path).map_err(|source| CatalogueError::Io {
            path: layout_path.clone(),
            source,
        })?;
        let layout = Layout::parse(&layout_text)?;

        let transitions = match read_optional(&root.join(TRANSITIONS_FILE))? {
            Some(text) => parse_transitions(&text),
            None => {
                warn!(root = %root.display(), "no transitions.csv, using defaults");
                default_transitions()
            }
        };

        let board = Board::new(layout.cols(), layout.rows(), config.cell_size_m, config.cell_size_px);
        let mut factory = PieceFactory::new(board, config);

        for name in list_subdirs(root)? {
            match PieceCode::parse(&name) {
                Ok(code) => factory.load_type(code, &root.join(&name), &transitions)?,
                Err(_) => debug!(dir = %name, "skipping non-piece directory"),
            }
        }

        info!(
            root = %root.display(),
            types = factory.graphs.len(),
            rows = layout.rows(),
            cols = layout.cols(),
            "catalogue loaded"
        );
        Ok(Self {
            root: root.to_path_buf(),
            layout,
            factory,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn board(&self) -> &Board {
        self.factory.board()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn factory(&self) -> &PieceFactory {
        &self.factory
    }

    /// One piece per layout entry, in its initial state at time zero
    pub fn spawn_pieces(&self) -> Result<Vec<Piece>, CatalogueError> {
        self.layout
            .placements()
            .map(|(cell, code)| self.factory.create_piece(code, cell, 0))
            .collect()
    }
}

// ============================================================================
// FILESYSTEM HELPERS
// ============================================================================

fn read_optional(path: &Path) -> Result<Option<String>, CatalogueError> {
    if !path.is_file() {
        return Ok(None);
    }
    fs::read_to_string(path)
        .map(Some)
        .map_err(|source| CatalogueError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Sorted names of the directories directly under `dir`; missing dir = none
fn list_subdirs(dir: &Path) -> Result<Vec<String>, CatalogueError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let io_err = |source| CatalogueError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}
