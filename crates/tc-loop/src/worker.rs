//! The supervised background worker that owns a run.
//!
//! Exactly two logical execution contexts exist: the foreground (command
//! producers, status display) and one worker thread that exclusively owns
//! the [`ControlLoop`] and therefore the engine.  The channel inside
//! [`LoopHandle`] is the only structure shared between them.

use std::thread::{self, JoinHandle};

use tc_command::{Command, CommandSender, command_channel};
use tc_control::ControlPolicy;
use tc_core::LoopConfig;
use tc_engine::{EngineConfig, TrafficEngine};

use crate::observer::ControlObserver;
use crate::sim::{ControlLoop, RunOutcome};
use crate::{LoopError, LoopResult};

// ── Handle ────────────────────────────────────────────────────────────────────

/// Handle to a running control worker, held by the foreground context.
///
/// The handle is the only coupling between foreground and worker: commands
/// go in through [`send`][Self::send], the run outcome comes back through
/// [`join`][Self::join].  The foreground never touches the engine.
pub struct LoopHandle {
    commands: CommandSender,
    worker:   JoinHandle<LoopResult<RunOutcome>>,
}

impl LoopHandle {
    /// Enqueue a command for the running loop.  Never blocks; commands still
    /// queued when the run ends are dropped.
    pub fn send(&self, cmd: Command) {
        self.commands.send(cmd);
    }

    /// A cloneable sender for handing to other producer contexts.
    pub fn sender(&self) -> CommandSender {
        self.commands.clone()
    }

    /// `true` once the worker has reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Block until the run reaches `Completed` or `Failed` and surface the
    /// result.  A panicking worker is reported as
    /// [`LoopError::WorkerPanicked`], never silently discarded.
    pub fn join(self) -> LoopResult<RunOutcome> {
        match self.worker.join() {
            Ok(result) => result,
            Err(_) => Err(LoopError::WorkerPanicked),
        }
    }
}

// ── Spawn ─────────────────────────────────────────────────────────────────────

/// Start a run on a dedicated worker thread.
///
/// Creates the per-run command channel, moves the loop (and with it the
/// engine, policy, and observer) onto a named thread, and returns the
/// foreground's handle.  Startup errors from the engine surface through
/// [`LoopHandle::join`], not here — the worker owns the whole run lifecycle.
pub fn spawn<E, P, O>(
    config:        LoopConfig,
    engine_config: EngineConfig,
    engine:        E,
    policy:        P,
    mut observer:  O,
) -> LoopResult<LoopHandle>
where
    E: TrafficEngine + Send + 'static,
    P: ControlPolicy,
    O: ControlObserver + Send + 'static,
{
    let (tx, rx) = command_channel();
    let mut ctl = ControlLoop::new(config, engine_config, engine, policy, rx)?;

    let worker = thread::Builder::new()
        .name("control-loop".to_owned())
        .spawn(move || ctl.run(&mut observer))
        .map_err(LoopError::Spawn)?;

    Ok(LoopHandle { commands: tx, worker })
}
