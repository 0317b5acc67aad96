//! Piece state machine
//!
//! A [`StateGraph`] is the immutable per-type template: named states, each with
//! a physics spec, an optional move table and outgoing transitions. Every piece
//! owns a [`StateMachine`] holding its own physics instances indexed by
//! [`StateId`], so the graph itself is shared behind an `Arc`.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::board::{Board, Cell};
use crate::command::{Command, CommandKind};
use crate::error::Rejection;
use crate::moves::MoveRules;
use crate::physics::{Physics, PhysicsSpec};
use crate::piece::Color;
use crate::position::PositionIndex;

/// Stable index of a state within its graph
pub type StateId = usize;

/// Name of the state every piece starts in
pub const INITIAL_STATE: &str = "idle";

// ============================================================================
// STATE GRAPH
// ============================================================================

/// One node of a state graph
#[derive(Clone, Debug)]
pub struct StateSpec {
    pub name: String,
    pub physics: PhysicsSpec,
    pub needs_clear_path: bool,
    pub rules: Option<Arc<MoveRules>>,
    pub transitions: FxHashMap<CommandKind, StateId>,
}

/// Immutable per-type state template
#[derive(Clone, Debug, Default)]
pub struct StateGraph {
    states: Vec<StateSpec>,
    by_name: FxHashMap<String, StateId>,
    initial: StateId,
}

impl StateGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a state, replacing any existing state of the same name
    pub fn add_state(
        &mut self,
        name: &str,
        physics: PhysicsSpec,
        needs_clear_path: bool,
        rules: Option<Arc<MoveRules>>,
    ) -> StateId {
        let spec = StateSpec {
            name: name.to_string(),
            physics,
            needs_clear_path,
            rules,
            transitions: FxHashMap::default(),
        };
        if let Some(&id) = self.by_name.get(name) {
            let transitions = std::mem::take(&mut self.states[id].transitions);
            self.states[id] = StateSpec { transitions, ..spec };
            return id;
        }
        let id = self.states.len();
        self.states.push(spec);
        self.by_name.insert(name.to_string(), id);
        if name == INITIAL_STATE {
            self.initial = id;
        }
        id
    }

    /// Wire `from --kind--> to`. Returns false if either state is unknown.
    pub fn add_transition(&mut self, from: &str, kind: CommandKind, to: &str) -> bool {
        match (self.by_name.get(from), self.by_name.get(to)) {
            (Some(&from), Some(&to)) => {
                self.states[from].transitions.insert(kind, to);
                true
            }
            _ => false,
        }
    }

    pub fn set_initial(&mut self, name: &str) -> bool {
        match self.by_name.get(name) {
            Some(&id) => {
                self.initial = id;
                true
            }
            None => false,
        }
    }

    pub fn initial(&self) -> StateId {
        self.initial
    }

    pub fn state(&self, id: StateId) -> &StateSpec {
        &self.states[id]
    }

    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.by_name.get(name).copied()
    }

    pub fn states(&self) -> &[StateSpec] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

// ============================================================================
// STATE MACHINE
// ============================================================================

/// Per-piece cursor into a shared graph
#[derive(Clone, Debug)]
pub struct StateMachine {
    graph: Arc<StateGraph>,
    physics: Vec<Physics>,
    current: StateId,
}

impl StateMachine {
    pub fn new(graph: Arc<StateGraph>) -> Self {
        let physics = graph
            .states()
            .iter()
            .map(|s| Physics::new(s.physics, s.needs_clear_path))
            .collect();
        let current = graph.initial();
        Self {
            graph,
            physics,
            current,
        }
    }

    /// Place the machine in its initial state at `cell`
    pub fn start(&mut self, piece_id: &str, cell: Cell, now_ms: i64, board: &Board) -> bool {
        let initial = self.graph.initial();
        let cmd = Command::idle(now_ms, piece_id, cell);
        if self.physics.get_mut(initial).map_or(false, |p| p.reset(&cmd, board)) {
            self.current = initial;
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> StateId {
        self.current
    }

    pub fn graph(&self) -> &Arc<StateGraph> {
        &self.graph
    }

    pub fn current_spec(&self) -> &StateSpec {
        self.graph.state(self.current)
    }

    pub fn state_name(&self) -> &str {
        &self.current_spec().name
    }

    pub fn physics(&self) -> &Physics {
        &self.physics[self.current]
    }

    pub fn rules(&self) -> Option<&MoveRules> {
        self.current_spec().rules.as_deref()
    }

    /// Validate and apply an external command
    pub fn on_command(
        &mut self,
        cmd: &Command,
        index: &PositionIndex,
        color: Color,
        board: &Board,
    ) -> Result<StateId, Rejection> {
        if cmd.kind == CommandKind::Done {
            return Err(Rejection::InternalOnly);
        }

        let spec = self.current_spec();
        let next = *spec.transitions.get(&cmd.kind).ok_or_else(|| Rejection::NoTransition {
            state: spec.name.clone(),
            kind: cmd.kind.to_string(),
        })?;
        let here = self.physics().current_cell();

        let cmd = match cmd.kind {
            CommandKind::Move => {
                let rules = self.require_rules()?;
                let (src, dst) = match cmd.params.as_slice() {
                    &[src, dst] => (src, dst),
                    _ => return Err(Rejection::MalformedPayload(cmd.kind.to_string())),
                };
                if src != here {
                    return Err(Rejection::StaleSource { claimed: src, actual: here });
                }
                let clear = self.physics().needs_clear_path();
                if !rules.is_valid(src, dst, index, clear, color) {
                    return Err(Rejection::IllegalMove { from: src, to: dst });
                }
                cmd.clone()
            }
            CommandKind::Jump => {
                let (src, dst) = match cmd.params.as_slice() {
                    &[src] => (src, src),
                    &[src, dst] => (src, dst),
                    _ => return Err(Rejection::MalformedPayload(cmd.kind.to_string())),
                };
                if src != here {
                    return Err(Rejection::StaleSource { claimed: src, actual: here });
                }
                // Leaps ignore blockers in between
                if dst != src && !self.require_rules()?.is_valid(src, dst, index, false, color) {
                    return Err(Rejection::IllegalMove { from: src, to: dst });
                }
                cmd.clone()
            }
            _ if cmd.params.is_empty() => cmd.with_params(vec![here]),
            _ => cmd.clone(),
        };

        if !self.enter(next, &cmd, board) {
            return Err(Rejection::PhysicsRejected(self.graph.state(next).name.clone()));
        }
        Ok(next)
    }

    /// Advance the active physics; follows a `done` transition on expiry.
    /// Returns the new state when one was entered.
    pub fn update(&mut self, now_ms: i64, board: &Board) -> Option<StateId> {
        let done = self.physics[self.current].update(now_ms, board)?;
        let next = *self.current_spec().transitions.get(&CommandKind::Done)?;
        if self.enter(next, &done, board) {
            Some(next)
        } else {
            warn!(
                state = %self.graph.state(next).name,
                "done transition rejected by target physics"
            );
            None
        }
    }

    /// Legal destinations from the current cell under the current rules
    pub fn legal_destinations(&self, index: &PositionIndex, color: Color) -> Vec<Cell> {
        match self.rules() {
            Some(rules) if self.current_spec().transitions.contains_key(&CommandKind::Move) => {
                let physics = self.physics();
                rules.legal_destinations(physics.current_cell(), index, physics.needs_clear_path(), color)
            }
            _ => Vec::new(),
        }
    }

    fn require_rules(&self) -> Result<&MoveRules, Rejection> {
        self.rules()
            .ok_or_else(|| Rejection::MissingRules(self.state_name().to_string()))
    }

    fn enter(&mut self, next: StateId, cmd: &Command, board: &Board) -> bool {
        if !self.physics[next].reset(cmd, board) {
            return false;
        }
        debug!(
            from = %self.graph.state(self.current).name,
            to = %self.graph.state(next).name,
            event = %cmd.kind,
            at_ms = cmd.timestamp_ms,
            "state transition"
        );
        self.current = next;
        true
    }
}
