//! Multi-producer, single-consumer command queue

use std::sync::mpsc::{self, Receiver, Sender};

use crate::command::Command;

/// Producer handle; clone one per thread
#[derive(Clone, Debug)]
pub struct CommandSender {
    tx: Sender<Command>,
}

impl CommandSender {
    /// Enqueue without blocking. Returns false once the game is gone.
    pub fn send(&self, cmd: Command) -> bool {
        self.tx.send(cmd).is_ok()
    }
}

/// Consumer side, owned by the game loop
#[derive(Debug)]
pub struct CommandInbox {
    rx: Receiver<Command>,
}

impl CommandInbox {
    /// Take everything queued so far, oldest first
    pub fn drain(&self) -> Vec<Command> {
        self.rx.try_iter().collect()
    }
}

/// Create a connected sender/inbox pair
pub fn command_channel() -> (CommandSender, CommandInbox) {
    let (tx, rx) = mpsc::channel();
    (CommandSender { tx }, CommandInbox { rx })
}
