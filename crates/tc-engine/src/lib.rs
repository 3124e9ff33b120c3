//! `tc-engine` — the seam between the control loop and the external
//! traffic-simulation engine.
//!
//! The engine itself (vehicle routing, signal physics, emission modeling) is
//! an external collaborator.  This crate defines the narrow stepping / query /
//! mutation contract the control loop drives it through, and ships a scripted
//! in-memory implementation so the rest of the workspace can be exercised
//! without a live simulator attached.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                 |
//! |--------------|----------------------------------------------------------|
//! | [`engine`]   | `TrafficEngine` trait, `EngineConfig`                    |
//! | [`snapshot`] | `LaneSnapshot` — per-lane reading for one decision tick  |
//! | [`scripted`] | `ScriptedEngine` — playback engine for tests and demos   |
//! | [`error`]    | `EngineError`, `EngineResult`                            |

pub mod engine;
pub mod error;
pub mod scripted;
pub mod snapshot;


pub use engine::{EngineConfig, TrafficEngine};
pub use error::{EngineError, EngineResult};
pub use scripted::{Mutation, ScriptedEngine, ScriptedEngineBuilder};
pub use snapshot::LaneSnapshot;
