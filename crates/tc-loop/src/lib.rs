//! `tc-loop` — the simulation control loop.
//!
//! # The loop body
//!
//! ```text
//! Idle → Running:  engine.start(), discover agents, step := 0
//! Running, once per iteration:
//!   ① Step      — engine.step(); step += 1.  Any error is fatal.
//!   ② Complete? — remaining_vehicles() == 0 → close(), Completed.
//!   ③ Pace      — cooperative sleep (skipped when pace_ms = 0).
//!   ④ Command   — at most ONE queued command is drained and applied.
//!   ⑤ Decide    — every decision_cadence steps, run the policy over
//!                 every agent in ascending id order and apply actions.
//!   ⑥ Sample    — every sample_interval steps, emit a TrafficSample.
//! Running → Failed: best-effort close(), error surfaced to the caller.
//! ```
//!
//! Draining at most one command per iteration bounds per-step latency and
//! preserves FIFO order without starving the stepping cadence; running the
//! policy every N steps rather than every step keeps control changes from
//! being issued faster than they can take effect physically.
//!
//! # Crate layout
//!
//! | Module       | Contents                                               |
//! |--------------|--------------------------------------------------------|
//! | [`sim`]      | `ControlLoop`, `RunState`, `RunOutcome`, agent set     |
//! | [`worker`]   | `spawn` + `LoopHandle` — the supervised worker thread  |
//! | [`observer`] | `ControlObserver` hooks, `TrafficSample`, `DropReason` |
//! | [`error`]    | `LoopError`, `LoopResult`                              |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use tc_control::ThresholdPolicy;
//! use tc_core::LoopConfig;
//! use tc_engine::EngineConfig;
//! use tc_loop::{NoopObserver, spawn};
//!
//! let handle = spawn(
//!     LoopConfig::default(),
//!     EngineConfig::new("scenario.sumocfg"),
//!     engine,
//!     ThresholdPolicy::default(),
//!     NoopObserver,
//! )?;
//! handle.send(Command::Emergency);
//! let outcome = handle.join()?;
//! ```

pub mod error;
pub mod observer;
pub mod sim;
pub mod worker;

#[cfg(test)]
mod tests;

pub use error::{LoopError, LoopResult};
pub use observer::{ControlObserver, DropReason, NoopObserver, TrafficSample};
pub use sim::{Agent, ControlLoop, RunOutcome, RunState, emergency_vehicle_id};
pub use worker::{LoopHandle, spawn};
