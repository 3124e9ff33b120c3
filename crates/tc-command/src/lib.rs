//! `tc-command` — externally-issued commands and the channel that carries
//! them into a running control loop.
//!
//! # Design notes
//!
//! The channel is the only shared mutable structure crossing the concurrency
//! boundary between the foreground (command producers) and the loop's worker
//! thread (sole consumer).  Both halves are non-blocking by contract:
//!
//! - [`CommandSender::send`] is fire-and-forget — it never blocks and never
//!   fails.  Commands are advisory, not transactional; anything still queued
//!   when a run ends is dropped.
//! - [`CommandReceiver::try_next`] returns the oldest pending command or
//!   `None`, never blocking the stepping cadence.
//!
//! Ordering is per-channel FIFO: no command is delivered twice, and no
//! command is reordered relative to another.
//!
//! # Crate layout
//!
//! | Module      | Contents                                      |
//! |-------------|-----------------------------------------------|
//! | [`command`] | `Command` enum                                |
//! | [`channel`] | `command_channel`, sender/receiver halves     |

pub mod channel;
pub mod command;


pub use channel::{CommandReceiver, CommandSender, command_channel};
pub use command::Command;
