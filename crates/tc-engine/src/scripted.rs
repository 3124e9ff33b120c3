//! `ScriptedEngine` — an in-memory engine for tests and headless demos.
//!
//! The real engine is an external process; everything interesting about the
//! control loop can be exercised against a playback double instead.  The
//! scripted engine holds a fixed scenario (traffic lights, lanes, edges,
//! routes), plays back per-step lane readings, drains a vehicle population at
//! a fixed rate, and records every mutation it receives in [`ScriptedEngine::log`]
//! so tests can assert on exactly what the loop did, and when.

use rustc_hash::FxHashMap;

use tc_core::{EdgeId, LaneId, RouteId, TlsId, VehicleId};

use crate::engine::{EngineConfig, TrafficEngine};
use crate::{EngineError, EngineResult, LaneSnapshot};

// ── Mutation log ──────────────────────────────────────────────────────────────

/// One mutation received by the scripted engine, stamped with the engine's
/// internal step counter at the time of the call.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    PhaseDuration { step: u64, tls: TlsId, seconds: f64 },
    Injected      { step: u64, vehicle: VehicleId, route: RouteId, class: String },
    Highlighted   { step: u64, vehicle: VehicleId },
    Stopped       { step: u64, vehicle: VehicleId, edge: EdgeId, position: f64, seconds: f64 },
}

// ── Lane scripts ──────────────────────────────────────────────────────────────

/// Per-lane playback: a default reading plus per-step overrides.
#[derive(Debug, Clone, Default)]
struct LaneScript {
    default:   LaneSnapshot,
    overrides: FxHashMap<u64, LaneSnapshot>,
    co2_mg_s:  f64,
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Fluent builder for [`ScriptedEngine`].
///
/// # Example
///
/// ```rust,ignore
/// let engine = ScriptedEngine::builder()
///     .traffic_light("N1", ["N1_in_0", "N1_in_1"])
///     .lane("N1_in_0", LaneSnapshot { halting: 5, ..LaneSnapshot::empty() })
///     .route("loop")
///     .edge("E1", ["veh_a", "veh_b"])
///     .vehicles(100)
///     .drain(1)
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct ScriptedEngineBuilder {
    tls:          Vec<(TlsId, Vec<LaneId>)>,
    lanes:        FxHashMap<LaneId, LaneScript>,
    edges:        FxHashMap<EdgeId, Vec<VehicleId>>,
    routes:       Vec<RouteId>,
    speed:        f64,
    vehicles:     usize,
    drain:        usize,
    fail_start:   Option<String>,
    fail_step_at: Option<u64>,
}

impl ScriptedEngineBuilder {
    /// Register a traffic light and its controlled lanes, in order.
    ///
    /// Lanes not scripted separately read back as empty.
    pub fn traffic_light<L>(mut self, tls: impl Into<TlsId>, lanes: impl IntoIterator<Item = L>) -> Self
    where
        L: Into<LaneId>,
    {
        let lanes: Vec<LaneId> = lanes.into_iter().map(Into::into).collect();
        for lane in &lanes {
            self.lanes.entry(lane.clone()).or_default();
        }
        self.tls.push((tls.into(), lanes));
        self
    }

    /// Set the default reading played back for `lane` on every step.
    pub fn lane(mut self, lane: impl Into<LaneId>, snapshot: LaneSnapshot) -> Self {
        self.lanes.entry(lane.into()).or_default().default = snapshot;
        self
    }

    /// Override the reading played back for `lane` at exactly `step`.
    pub fn lane_at(mut self, lane: impl Into<LaneId>, step: u64, snapshot: LaneSnapshot) -> Self {
        self.lanes
            .entry(lane.into())
            .or_default()
            .overrides
            .insert(step, snapshot);
        self
    }

    /// Set the constant CO2 reading for `lane`, mg/s.
    pub fn lane_co2(mut self, lane: impl Into<LaneId>, mg_s: f64) -> Self {
        self.lanes.entry(lane.into()).or_default().co2_mg_s = mg_s;
        self
    }

    /// Register an edge and the vehicles on it, lead vehicle first.
    pub fn edge<V>(mut self, edge: impl Into<EdgeId>, vehicles: impl IntoIterator<Item = V>) -> Self
    where
        V: Into<VehicleId>,
    {
        self.edges
            .insert(edge.into(), vehicles.into_iter().map(Into::into).collect());
        self
    }

    /// Register a route id known to the scenario.
    pub fn route(mut self, route: impl Into<RouteId>) -> Self {
        self.routes.push(route.into());
        self
    }

    /// Set the constant scenario-wide mean speed, m/s.
    pub fn average_speed(mut self, m_s: f64) -> Self {
        self.speed = m_s;
        self
    }

    /// Initial count of expected vehicles.  The run completes once it drains
    /// to zero.
    pub fn vehicles(mut self, n: usize) -> Self {
        self.vehicles = n;
        self
    }

    /// How many vehicles finish per step.
    pub fn drain(mut self, per_step: usize) -> Self {
        self.drain = per_step;
        self
    }

    /// Make `start()` fail with the given message.
    pub fn fail_start(mut self, message: impl Into<String>) -> Self {
        self.fail_start = Some(message.into());
        self
    }

    /// Make the `n`-th `step()` call (1-based) fail with a connection error.
    pub fn fail_step_at(mut self, n: u64) -> Self {
        self.fail_step_at = Some(n);
        self
    }

    pub fn build(self) -> ScriptedEngine {
        ScriptedEngine {
            tls:          self.tls,
            lanes:        self.lanes,
            edges:        self.edges,
            routes:       self.routes,
            speed:        self.speed,
            fail_start:   self.fail_start,
            fail_step_at: self.fail_step_at,
            started_with: None,
            closed:       false,
            now:          0,
            remaining:    self.vehicles,
            drain:        self.drain,
            injected:     Vec::new(),
            log:          Vec::new(),
            close_calls:  0,
        }
    }
}

// ── ScriptedEngine ────────────────────────────────────────────────────────────

/// An in-memory [`TrafficEngine`] driven entirely by a pre-built scenario.
///
/// Construct via [`ScriptedEngine::builder`].  The scenario tables are fixed
/// at build time; run state (step cursor, remaining vehicles, mutation log)
/// evolves as the loop drives the engine.
#[derive(Debug)]
pub struct ScriptedEngine {
    tls:          Vec<(TlsId, Vec<LaneId>)>,
    lanes:        FxHashMap<LaneId, LaneScript>,
    edges:        FxHashMap<EdgeId, Vec<VehicleId>>,
    routes:       Vec<RouteId>,
    speed:        f64,
    fail_start:   Option<String>,
    fail_step_at: Option<u64>,

    /// The config `start()` was called with, once it has been.
    pub started_with: Option<EngineConfig>,
    closed:       bool,
    now:          u64,
    remaining:    usize,
    drain:        usize,
    injected:     Vec<VehicleId>,

    /// Every mutation received, in call order.
    pub log: Vec<Mutation>,

    /// How many times `close()` has been called.
    pub close_calls: u32,
}

impl ScriptedEngine {
    pub fn builder() -> ScriptedEngineBuilder {
        ScriptedEngineBuilder::default()
    }

    /// The engine's internal step cursor (steps successfully taken).
    pub fn current_step(&self) -> u64 {
        self.now
    }

    fn ensure_running(&self) -> EngineResult<()> {
        if self.started_with.is_none() || self.closed {
            return Err(EngineError::NotRunning);
        }
        Ok(())
    }

    fn known_vehicle(&self, vehicle: &VehicleId) -> bool {
        self.injected.contains(vehicle) || self.edges.values().any(|vs| vs.contains(vehicle))
    }
}

impl TrafficEngine for ScriptedEngine {
    fn start(&mut self, config: &EngineConfig) -> EngineResult<()> {
        if let Some(message) = &self.fail_start {
            return Err(EngineError::Startup(message.clone()));
        }
        if self.started_with.is_some() {
            return Err(EngineError::Startup("engine already started".to_owned()));
        }
        self.started_with = Some(config.clone());
        Ok(())
    }

    fn step(&mut self) -> EngineResult<()> {
        self.ensure_running()?;
        if self.fail_step_at == Some(self.now + 1) {
            return Err(EngineError::Connection("scripted step failure".to_owned()));
        }
        self.now += 1;
        self.remaining = self.remaining.saturating_sub(self.drain);
        Ok(())
    }

    fn remaining_vehicles(&self) -> usize {
        self.remaining
    }

    fn traffic_lights(&self) -> Vec<TlsId> {
        self.tls.iter().map(|(tls, _)| tls.clone()).collect()
    }

    fn controlled_lanes(&self, tls: &TlsId) -> EngineResult<Vec<LaneId>> {
        self.tls
            .iter()
            .find(|(id, _)| id == tls)
            .map(|(_, lanes)| lanes.clone())
            .ok_or_else(|| EngineError::UnknownTrafficLight(tls.clone()))
    }

    fn lane_snapshot(&self, lane: &LaneId) -> EngineResult<LaneSnapshot> {
        self.ensure_running()?;
        let script = self
            .lanes
            .get(lane)
            .ok_or_else(|| EngineError::UnknownLane(lane.clone()))?;
        Ok(script
            .overrides
            .get(&self.now)
            .cloned()
            .unwrap_or_else(|| script.default.clone()))
    }

    fn set_phase_duration(&mut self, tls: &TlsId, seconds: f64) -> EngineResult<()> {
        self.ensure_running()?;
        if !self.tls.iter().any(|(id, _)| id == tls) {
            return Err(EngineError::UnknownTrafficLight(tls.clone()));
        }
        self.log.push(Mutation::PhaseDuration {
            step: self.now,
            tls:  tls.clone(),
            seconds,
        });
        Ok(())
    }

    fn inject_vehicle(
        &mut self,
        vehicle: &VehicleId,
        route:   &RouteId,
        class:   &str,
    ) -> EngineResult<()> {
        self.ensure_running()?;
        if !self.routes.contains(route) {
            return Err(EngineError::UnknownRoute(route.clone()));
        }
        if self.known_vehicle(vehicle) {
            return Err(EngineError::DuplicateVehicle(vehicle.clone()));
        }
        self.injected.push(vehicle.clone());
        // A freshly inserted vehicle is one more the scenario must finish.
        self.remaining += 1;
        self.log.push(Mutation::Injected {
            step:    self.now,
            vehicle: vehicle.clone(),
            route:   route.clone(),
            class:   class.to_owned(),
        });
        Ok(())
    }

    fn vehicles_on_edge(&self, edge: &EdgeId) -> EngineResult<Vec<VehicleId>> {
        self.ensure_running()?;
        self.edges
            .get(edge)
            .cloned()
            .ok_or_else(|| EngineError::UnknownEdge(edge.clone()))
    }

    fn stop_vehicle(
        &mut self,
        vehicle:  &VehicleId,
        edge:     &EdgeId,
        position: f64,
        seconds:  f64,
    ) -> EngineResult<()> {
        self.ensure_running()?;
        let on_edge = self
            .edges
            .get(edge)
            .ok_or_else(|| EngineError::UnknownEdge(edge.clone()))?;
        if !on_edge.contains(vehicle) {
            return Err(EngineError::UnknownVehicle(vehicle.clone()));
        }
        self.log.push(Mutation::Stopped {
            step:    self.now,
            vehicle: vehicle.clone(),
            edge:    edge.clone(),
            position,
            seconds,
        });
        Ok(())
    }

    fn highlight_vehicle(&mut self, vehicle: &VehicleId) -> EngineResult<()> {
        self.ensure_running()?;
        if !self.known_vehicle(vehicle) {
            return Err(EngineError::UnknownVehicle(vehicle.clone()));
        }
        self.log.push(Mutation::Highlighted {
            step:    self.now,
            vehicle: vehicle.clone(),
        });
        Ok(())
    }

    fn average_speed(&self) -> EngineResult<f64> {
        self.ensure_running()?;
        Ok(self.speed)
    }

    fn lane_co2(&self, lane: &LaneId) -> EngineResult<f64> {
        self.ensure_running()?;
        self.lanes
            .get(lane)
            .map(|script| script.co2_mg_s)
            .ok_or_else(|| EngineError::UnknownLane(lane.clone()))
    }

    fn close(&mut self) {
        self.closed = true;
        self.close_calls += 1;
    }
}
