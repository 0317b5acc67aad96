//! Random bot that plays from the published snapshot

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use kfchess_core::{read_snapshot, Cell, Clock, Color, Command, CommandSender, GameSnapshot, SharedSnapshot, StopFlag};

/// Picks a random ready piece and sends it somewhere legal, preferring captures
#[derive(Clone, Debug)]
pub struct RandomBot {
    color: Color,
    rng: ChaCha8Rng,
    think_ms: i64,
    jump_chance: f64,
}

impl RandomBot {
    pub fn new(color: Color, seed: u64) -> Self {
        Self {
            color,
            rng: ChaCha8Rng::seed_from_u64(seed),
            think_ms: 500,
            jump_chance: 0.1,
        }
    }

    pub fn with_think_time(mut self, think_ms: i64) -> Self {
        self.think_ms = think_ms.max(1);
        self
    }

    pub fn with_jump_chance(mut self, chance: f64) -> Self {
        self.jump_chance = chance.clamp(0.0, 1.0);
        self
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Next command for this side, if any piece can act
    pub fn choose(&mut self, now_ms: i64, snapshot: &GameSnapshot) -> Option<Command> {
        let ready: Vec<_> = snapshot
            .pieces_of(self.color)
            .filter(|p| !p.legal_moves.is_empty())
            .collect();
        if ready.is_empty() {
            return None;
        }

        let enemy = self.color.opponent();
        let captures: Vec<(&str, Cell, Cell)> = ready
            .iter()
            .flat_map(|p| {
                p.legal_moves
                    .iter()
                    .filter(move |dst| snapshot.piece_at(**dst, enemy).is_some())
                    .map(move |dst| (p.id.as_str(), p.cell, *dst))
            })
            .collect();
        if let Some(&(id, src, dst)) = captures.choose(&mut self.rng) {
            return Some(Command::move_to(now_ms, id, src, dst));
        }

        let piece = ready.choose(&mut self.rng)?;
        if self.rng.gen_bool(self.jump_chance) {
            return Some(Command::jump(now_ms, piece.id.clone(), vec![piece.cell]));
        }
        let dst = piece.legal_moves.choose(&mut self.rng)?;
        Some(Command::move_to(now_ms, piece.id.clone(), piece.cell, *dst))
    }
}

/// Producer body: one decision every think interval of game time
pub fn drive(
    mut bot: RandomBot,
    clock: Arc<dyn Clock>,
    snapshot: SharedSnapshot,
    sender: CommandSender,
    stop: StopFlag,
) {
    let mut next_at = clock.now_ms() + bot.think_ms;
    while !stop.is_stopped() {
        let now = clock.now_ms();
        if now >= next_at {
            let view = read_snapshot(&snapshot);
            if view.is_over() {
                return;
            }
            if let Some(cmd) = bot.choose(now, &view) {
                tracing::debug!(color = %bot.color(), command = %cmd, "bot command");
                if !sender.send(cmd) {
                    return;
                }
            }
            next_at = now + bot.think_ms;
        }
        thread::sleep(Duration::from_millis(1));
    }
}
