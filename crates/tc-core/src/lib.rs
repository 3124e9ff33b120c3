//! `tc-core` — foundational types for the traffic-control workspace.
//!
//! This crate is a dependency of every other `tc-*` crate.  It intentionally
//! has no `tc-*` dependencies and minimal external ones (only `thiserror`,
//! plus optional `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                                  |
//! |------------|-----------------------------------------------------------|
//! | [`ids`]    | `TlsId`, `LaneId`, `EdgeId`, `VehicleId`, `RouteId`       |
//! | [`step`]   | `Step` — the per-run simulation step counter              |
//! | [`config`] | `LoopConfig` — cadences, pacing, command constants        |
//! | [`error`]  | `CoreError`, `CoreResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.          |

pub mod config;
pub mod error;
pub mod ids;
pub mod step;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::LoopConfig;
pub use error::{CoreError, CoreResult};
pub use ids::{EdgeId, LaneId, RouteId, TlsId, VehicleId};
pub use step::Step;
