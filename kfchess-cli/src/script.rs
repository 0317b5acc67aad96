//! Timed key scripts replayed through a player controller

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use kfchess_core::{read_snapshot, Clock, Color, CommandSender, PlayerController, SharedSnapshot, StopFlag};

/// One key press at a game time
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyPress {
    pub at_ms: i64,
    pub key: String,
}

/// Key presses per side
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub white: Vec<KeyPress>,
    #[serde(default)]
    pub black: Vec<KeyPress>,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script: {}", path.display()))?;
        let script: Script = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse script: {}", path.display()))?;
        Ok(script)
    }

    /// Presses for `color`, ordered by time
    pub fn presses(&self, color: Color) -> Vec<KeyPress> {
        let mut presses = match color {
            Color::White => self.white.clone(),
            Color::Black => self.black.clone(),
        };
        presses.sort_by_key(|p| p.at_ms);
        presses
    }

    pub fn len(&self) -> usize {
        self.white.len() + self.black.len()
    }
}

/// Producer body: wait for each press time, then feed the key to the controller
pub fn replay(
    presses: Vec<KeyPress>,
    mut controller: PlayerController,
    clock: Arc<dyn Clock>,
    snapshot: SharedSnapshot,
    sender: CommandSender,
    stop: StopFlag,
) {
    for press in presses {
        while clock.now_ms() < press.at_ms {
            if stop.is_stopped() {
                return;
            }
            thread::sleep(Duration::from_millis(1));
        }
        if stop.is_stopped() {
            return;
        }

        let view = read_snapshot(&snapshot);
        if view.is_over() {
            return;
        }
        if let Some(cmd) = controller.handle_key(&press.key, clock.now_ms(), &view) {
            tracing::debug!(color = %controller.color(), command = %cmd, "scripted command");
            if !sender.send(cmd) {
                return;
            }
        }
    }
}
