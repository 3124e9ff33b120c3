//! The `TrafficEngine` trait and engine startup configuration.

use std::path::PathBuf;

use tc_core::{EdgeId, LaneId, RouteId, TlsId, VehicleId};

use crate::{EngineResult, LaneSnapshot};

// ── EngineConfig ──────────────────────────────────────────────────────────────

/// Engine-specific startup configuration.
///
/// Mirrors the command line handed to an external engine binary: the scenario
/// file plus any startup flags.  Implementations that need nothing (like the
/// scripted engine) simply record it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Path to the scenario file handed to the engine at startup.
    pub scenario: PathBuf,

    /// Run the engine with its own graphical front end attached.
    pub gui: bool,

    /// Additional startup flags, passed through verbatim.
    pub extra_flags: Vec<String>,
}

impl EngineConfig {
    /// Configuration for `scenario` with no gui and no extra flags.
    pub fn new(scenario: impl Into<PathBuf>) -> Self {
        Self {
            scenario:    scenario.into(),
            gui:         false,
            extra_flags: Vec::new(),
        }
    }

    /// Toggle the engine's graphical front end.
    pub fn gui(mut self, gui: bool) -> Self {
        self.gui = gui;
        self
    }

    /// Append one verbatim startup flag.
    pub fn flag(mut self, flag: impl Into<String>) -> Self {
        self.extra_flags.push(flag.into());
        self
    }
}

// ── TrafficEngine ─────────────────────────────────────────────────────────────

/// The narrow contract the control loop drives an external engine through.
///
/// Exactly one context (the loop's worker thread) calls these methods; the
/// single-writer discipline means implementations need no internal locking.
/// Query results that the contract declares *ordered* must return the same
/// order on every call within a run — the loop's agent set and tie-breaking
/// rules depend on it.
pub trait TrafficEngine {
    /// Launch or connect to the simulation.  Called exactly once, before any
    /// other method.
    fn start(&mut self, config: &EngineConfig) -> EngineResult<()>;

    /// Advance simulation time by one discrete tick.
    fn step(&mut self) -> EngineResult<()>;

    /// Vehicles still expected to enter or currently in the scenario.
    /// Zero signals run completion.
    fn remaining_vehicles(&self) -> usize;

    /// All controllable intersections, in stable engine order.
    fn traffic_lights(&self) -> Vec<TlsId>;

    /// The lanes controlled by `tls`, in stable engine order.
    fn controlled_lanes(&self, tls: &TlsId) -> EngineResult<Vec<LaneId>>;

    /// A fresh reading of `lane`.
    fn lane_snapshot(&self, lane: &LaneId) -> EngineResult<LaneSnapshot>;

    /// Set the remaining duration of `tls`'s current phase to `seconds`.
    fn set_phase_duration(&mut self, tls: &TlsId, seconds: f64) -> EngineResult<()>;

    /// Insert a new vehicle of `class` on `route`.
    fn inject_vehicle(
        &mut self,
        vehicle: &VehicleId,
        route:   &RouteId,
        class:   &str,
    ) -> EngineResult<()>;

    /// Vehicles currently on `edge`, lead vehicle first.
    fn vehicles_on_edge(&self, edge: &EdgeId) -> EngineResult<Vec<VehicleId>>;

    /// Pin `vehicle` in place at `position` metres along `edge` for
    /// `seconds` simulated seconds.
    fn stop_vehicle(
        &mut self,
        vehicle:  &VehicleId,
        edge:     &EdgeId,
        position: f64,
        seconds:  f64,
    ) -> EngineResult<()>;

    /// Mark `vehicle` visually distinct in the engine's own display.
    ///
    /// Purely cosmetic.  The default implementation does nothing.
    fn highlight_vehicle(&mut self, _vehicle: &VehicleId) -> EngineResult<()> {
        Ok(())
    }

    /// Mean speed over all vehicles currently in the scenario, m/s.
    fn average_speed(&self) -> EngineResult<f64>;

    /// CO2 output attributed to `lane` during the last interval, mg/s.
    fn lane_co2(&self, lane: &LaneId) -> EngineResult<f64>;

    /// Release the engine connection.  Idempotent.
    fn close(&mut self);
}
