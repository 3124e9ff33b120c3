//! The `ControlLoop` struct, its state machine, and the per-step body.

use std::thread;
use std::time::Duration;

use tc_command::{Command, CommandReceiver};
use tc_control::{ControlAction, ControlPolicy};
use tc_core::{LaneId, LoopConfig, Step, TlsId, VehicleId};
use tc_engine::{EngineConfig, EngineError, TrafficEngine};

use crate::observer::{ControlObserver, DropReason, TrafficSample};
use crate::{LoopError, LoopResult};

// ── Agent set ─────────────────────────────────────────────────────────────────

/// One controllable intersection and its controlled lanes, discovered from
/// the engine at run start.
///
/// The agent set and its order are fixed for the lifetime of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub tls:   TlsId,
    pub lanes: Vec<LaneId>,
}

// ── Run state and outcome ─────────────────────────────────────────────────────

/// The loop's lifecycle.  `Completed` and `Failed` are terminal; a new run
/// requires a fresh loop with a fresh channel and step counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Failed,
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// The step at which the scenario drained empty.
    pub final_step: Step,

    /// Commands applied to the engine (dropped commands excluded).
    pub commands_applied: u64,

    /// `ExtendPhase` actions pushed to the engine.
    pub phase_extensions: u64,
}

// ── Vehicle id synthesis ──────────────────────────────────────────────────────

/// Deterministic id for a dispatched emergency vehicle.
///
/// At most one command is applied per step and the step counter is strictly
/// increasing, so ids never collide within a run.  A fresh run resets the id
/// space along with its fresh engine instance.
pub fn emergency_vehicle_id(step: Step) -> VehicleId {
    VehicleId(format!("em_{}", step.0))
}

// ── Command application outcome ───────────────────────────────────────────────

enum CommandOutcome {
    Applied,
    Dropped(DropReason),
}

// ── ControlLoop ───────────────────────────────────────────────────────────────

/// The simulation control loop.
///
/// Owns the stepping cadence, drains the inbound command channel without
/// blocking simulation progress, and evaluates the control policy against
/// live engine state at every decision tick.  Exactly one execution context
/// (usually the worker thread started by [`spawn`][crate::spawn]) drives a
/// loop; it is the only context that touches the engine.
pub struct ControlLoop<E: TrafficEngine, P: ControlPolicy> {
    /// Loop configuration (cadences, pacing, command constants).
    pub config: LoopConfig,

    /// Startup configuration handed to the engine on `Idle → Running`.
    pub engine_config: EngineConfig,

    /// The engine adapter.  Exclusively owned; no locking needed.
    pub engine: E,

    /// The per-intersection decision logic.
    pub policy: P,

    commands: CommandReceiver,
    step:     Step,
    agents:   Vec<Agent>,
    state:    RunState,
}

impl<E: TrafficEngine, P: ControlPolicy> ControlLoop<E, P> {
    // ── Construction ──────────────────────────────────────────────────────

    /// Build an idle loop.  Validates `config` up front so a bad cadence
    /// fails here rather than mid-run.
    pub fn new(
        config:        LoopConfig,
        engine_config: EngineConfig,
        engine:        E,
        policy:        P,
        commands:      CommandReceiver,
    ) -> LoopResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            engine_config,
            engine,
            policy,
            commands,
            step:   Step::ZERO,
            agents: Vec::new(),
            state:  RunState::Idle,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// The step counter (last successfully completed engine step).
    pub fn step(&self) -> Step {
        self.step
    }

    /// The fixed agent set, empty until the run starts.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Run the loop from `Idle` to a terminal state.
    ///
    /// Returns the run summary on `Completed`.  On `Failed` the engine has
    /// been given a best-effort `close()` and the error describes the fatal
    /// step.  Calling `run` on a non-idle loop fails with
    /// [`LoopError::AlreadyStarted`].
    pub fn run<O: ControlObserver>(&mut self, observer: &mut O) -> LoopResult<RunOutcome> {
        if self.state != RunState::Idle {
            return Err(LoopError::AlreadyStarted);
        }

        // ── Idle → Running ────────────────────────────────────────────────
        if let Err(source) = self.engine.start(&self.engine_config) {
            self.state = RunState::Failed;
            return Err(LoopError::Startup { source });
        }
        if let Err(source) = self.discover_agents() {
            self.engine.close();
            self.state = RunState::Failed;
            return Err(LoopError::Startup { source });
        }
        self.step = Step::ZERO;
        self.state = RunState::Running;

        let pace = Duration::from_millis(self.config.pace_ms);
        let mut commands_applied = 0u64;
        let mut phase_extensions = 0u64;

        loop {
            // ── ① Advance the engine ──────────────────────────────────────
            if let Err(source) = self.engine.step() {
                return Err(self.fail(source));
            }
            self.step.advance();
            observer.on_step(self.step);

            // ── ② Completion check ────────────────────────────────────────
            //
            // Checked immediately after stepping so a run whose first step
            // drains the scenario completes without a single decision pass.
            if self.engine.remaining_vehicles() == 0 {
                self.engine.close();
                self.state = RunState::Completed;
                break;
            }

            // ── ③ Cooperative pacing ──────────────────────────────────────
            if !pace.is_zero() {
                thread::sleep(pace);
            }

            // ── ④ At most one command per iteration ───────────────────────
            //
            // One command per step bounds per-step latency and preserves
            // FIFO order without starving the stepping cadence.
            if let Some(cmd) = self.commands.try_next() {
                match self.apply_command(&cmd) {
                    Ok(CommandOutcome::Applied) => {
                        commands_applied += 1;
                        observer.on_command_applied(self.step, &cmd);
                    }
                    Ok(CommandOutcome::Dropped(reason)) => {
                        observer.on_command_dropped(self.step, &cmd, &reason);
                    }
                    Err(source) => return Err(self.fail(source)),
                }
            }

            // ── ⑤ Decision tick ───────────────────────────────────────────
            if self.config.is_decision_step(self.step) {
                match self.run_controllers(observer) {
                    Ok(extensions) => phase_extensions += extensions,
                    Err(source) => return Err(self.fail(source)),
                }
            }

            // ── ⑥ Metrics sample ──────────────────────────────────────────
            if self.config.is_sample_step(self.step) {
                if let Err(source) = self.sample(observer) {
                    return Err(self.fail(source));
                }
            }
        }

        let outcome = RunOutcome {
            final_step: self.step,
            commands_applied,
            phase_extensions,
        };
        observer.on_run_end(&outcome);
        Ok(outcome)
    }

    // ── Startup ───────────────────────────────────────────────────────────

    /// Discover the fixed agent set: every traffic light and its controlled
    /// lanes, sorted ascending by id for a stable decision order.
    fn discover_agents(&mut self) -> Result<(), EngineError> {
        let mut agents = Vec::new();
        for tls in self.engine.traffic_lights() {
            let lanes = self.engine.controlled_lanes(&tls)?;
            agents.push(Agent { tls, lanes });
        }
        agents.sort_by(|a, b| a.tls.cmp(&b.tls));
        self.agents = agents;
        Ok(())
    }

    // ── Failure path ──────────────────────────────────────────────────────

    /// Best-effort close, mark `Failed`, and build the surfaced error.
    /// `step` in the error is the last fully completed step.
    fn fail(&mut self, source: EngineError) -> LoopError {
        self.engine.close();
        self.state = RunState::Failed;
        LoopError::Engine { step: self.step.0, source }
    }

    // ── Command application ───────────────────────────────────────────────

    fn apply_command(&mut self, cmd: &Command) -> Result<CommandOutcome, EngineError> {
        match cmd {
            Command::Emergency => {
                let vehicle = emergency_vehicle_id(self.step);
                let injected = self.engine.inject_vehicle(
                    &vehicle,
                    &self.config.dispatch_route,
                    &self.config.emergency_class,
                );
                match injected {
                    Ok(()) => {}
                    Err(e) if e.is_unknown_entity() => {
                        return Ok(CommandOutcome::Dropped(DropReason::UnknownEntity(e)));
                    }
                    Err(e) => return Err(e),
                }
                // Cosmetic only: a failed highlight never fails the command.
                let _ = self.engine.highlight_vehicle(&vehicle);
                Ok(CommandOutcome::Applied)
            }

            Command::Accident { edge } => {
                let vehicles = match self.engine.vehicles_on_edge(edge) {
                    Ok(v) => v,
                    Err(e) if e.is_unknown_entity() => {
                        return Ok(CommandOutcome::Dropped(DropReason::UnknownEntity(e)));
                    }
                    Err(e) => return Err(e),
                };
                let Some(lead) = vehicles.first() else {
                    return Ok(CommandOutcome::Dropped(DropReason::EmptyEdge));
                };
                self.engine.stop_vehicle(
                    lead,
                    edge,
                    self.config.accident_position,
                    self.config.accident_duration,
                )?;
                Ok(CommandOutcome::Applied)
            }
        }
    }

    // ── Decision tick ─────────────────────────────────────────────────────

    /// Run the policy over every agent and apply the returned actions.
    /// Returns the number of phase extensions issued.
    fn run_controllers<O: ControlObserver>(
        &mut self,
        observer: &mut O,
    ) -> Result<u64, EngineError> {
        let mut extensions = 0u64;

        // Snapshots are read fresh for every agent at every decision tick;
        // nothing is cached between ticks.
        for agent in &self.agents {
            let mut lanes = Vec::with_capacity(agent.lanes.len());
            for lane in &agent.lanes {
                lanes.push((lane.clone(), self.engine.lane_snapshot(lane)?));
            }

            let decision = self.policy.decide(&agent.tls, &lanes);
            if let Some(lane) = &decision.preempted {
                observer.on_preemption(self.step, &agent.tls, lane);
            }
            match decision.action {
                ControlAction::NoOp => {}
                ControlAction::ExtendPhase { seconds } => {
                    self.engine.set_phase_duration(&agent.tls, seconds)?;
                    extensions += 1;
                    observer.on_phase_extended(self.step, &agent.tls, seconds);
                }
            }
        }

        Ok(extensions)
    }

    // ── Sampling ──────────────────────────────────────────────────────────

    /// Read aggregate statistics and hand them to the observer.
    fn sample<O: ControlObserver>(&mut self, observer: &mut O) -> Result<(), EngineError> {
        let average_speed = self.engine.average_speed()?;
        let mut co2_mg_s = 0.0;
        for agent in &self.agents {
            for lane in &agent.lanes {
                co2_mg_s += self.engine.lane_co2(lane)?;
            }
        }
        observer.on_sample(&TrafficSample { step: self.step, average_speed, co2_mg_s });
        Ok(())
    }
}
