//! The thread-safe FIFO channel between foreground and control loop.

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::Command;

/// Create a connected sender/receiver pair for one run.
///
/// The channel is unbounded: `send` never applies backpressure.  A fresh
/// channel is created per run and discarded with it.
pub fn command_channel() -> (CommandSender, CommandReceiver) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (CommandSender { tx }, CommandReceiver { rx })
}

// ── Producer half ─────────────────────────────────────────────────────────────

/// Fire-and-forget producer half.  Clone freely; every clone feeds the same
/// FIFO queue.
#[derive(Clone)]
pub struct CommandSender {
    tx: Sender<Command>,
}

impl CommandSender {
    /// Enqueue `cmd`.  Never blocks and never fails.
    ///
    /// If the run has already ended the command is dropped on the floor —
    /// commands are advisory, not transactional.
    pub fn send(&self, cmd: Command) {
        let _ = self.tx.send(cmd);
    }
}

// ── Consumer half ─────────────────────────────────────────────────────────────

/// Consumer half, owned exclusively by the control loop.
pub struct CommandReceiver {
    rx: Receiver<Command>,
}

impl CommandReceiver {
    /// Take the next pending command, oldest first.  Never blocks.
    ///
    /// `None` means no command is pending this iteration (or every sender is
    /// gone) — a normal condition, not an error.
    pub fn try_next(&self) -> Option<Command> {
        match self.rx.try_recv() {
            Ok(cmd) => Some(cmd),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}
