//! Integration tests for the control loop, driven by the scripted engine.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tc_command::{Command, CommandSender, command_channel};
use tc_control::{ControlPolicy, Decision, NoopPolicy, ThresholdPolicy};
use tc_core::{EdgeId, LaneId, LoopConfig, Step, TlsId, VehicleId};
use tc_engine::{EngineConfig, LaneSnapshot, Mutation, ScriptedEngine, ScriptedEngineBuilder};

use crate::observer::{ControlObserver, DropReason, TrafficSample};
use crate::sim::{ControlLoop, RunState, emergency_vehicle_id};
use crate::{LoopError, NoopObserver, spawn};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Headless config: no pacing, no sampling, default cadence of 10.
fn headless() -> LoopConfig {
    LoopConfig { pace_ms: 0, sample_interval: 0, ..LoopConfig::default() }
}

fn engine_config() -> EngineConfig {
    EngineConfig::new("scenario.sumocfg")
}

fn new_loop<P: ControlPolicy>(
    config:  LoopConfig,
    builder: ScriptedEngineBuilder,
    policy:  P,
) -> (ControlLoop<ScriptedEngine, P>, CommandSender) {
    let (tx, rx) = command_channel();
    let ctl = ControlLoop::new(config, engine_config(), builder.build(), policy, rx).unwrap();
    (ctl, tx)
}

/// Records every observer callback for later assertions.
#[derive(Default)]
struct Probe {
    steps:       Vec<u64>,
    applied:     Vec<(u64, Command)>,
    dropped:     Vec<(u64, Command, String)>,
    preemptions: Vec<(u64, TlsId, LaneId)>,
    extensions:  Vec<(u64, TlsId, f64)>,
    samples:     Vec<TrafficSample>,
    ended:       bool,
}

impl ControlObserver for Probe {
    fn on_step(&mut self, step: Step) {
        self.steps.push(step.0);
    }
    fn on_command_applied(&mut self, step: Step, cmd: &Command) {
        self.applied.push((step.0, cmd.clone()));
    }
    fn on_command_dropped(&mut self, step: Step, cmd: &Command, reason: &DropReason) {
        self.dropped.push((step.0, cmd.clone(), reason.to_string()));
    }
    fn on_preemption(&mut self, step: Step, tls: &TlsId, lane: &LaneId) {
        self.preemptions.push((step.0, tls.clone(), lane.clone()));
    }
    fn on_phase_extended(&mut self, step: Step, tls: &TlsId, seconds: f64) {
        self.extensions.push((step.0, tls.clone(), seconds));
    }
    fn on_sample(&mut self, sample: &TrafficSample) {
        self.samples.push(sample.clone());
    }
    fn on_run_end(&mut self, _outcome: &crate::RunOutcome) {
        self.ended = true;
    }
}

/// Counts `decide` calls; always holds.
struct CountingPolicy(Arc<AtomicUsize>);

impl ControlPolicy for CountingPolicy {
    fn decide(&self, _tls: &TlsId, _lanes: &[(LaneId, LaneSnapshot)]) -> Decision {
        self.0.fetch_add(1, Ordering::SeqCst);
        Decision::hold()
    }
}

fn busy_lane(halting: u32) -> LaneSnapshot {
    LaneSnapshot { halting, ..LaneSnapshot::empty() }
}

// ── Stepping and completion ───────────────────────────────────────────────────

#[cfg(test)]
mod stepping {
    use super::*;

    #[test]
    fn completes_when_the_scenario_drains() {
        let (mut ctl, _tx) = new_loop(
            headless(),
            ScriptedEngine::builder().vehicles(10).drain(1),
            NoopPolicy,
        );
        let mut probe = Probe::default();
        let outcome = ctl.run(&mut probe).unwrap();

        assert_eq!(outcome.final_step, Step(10));
        assert_eq!(ctl.state(), RunState::Completed);
        assert_eq!(ctl.engine.close_calls, 1);
        assert!(probe.ended);
    }

    #[test]
    fn steps_increase_by_exactly_one() {
        let (mut ctl, _tx) = new_loop(
            headless(),
            ScriptedEngine::builder().vehicles(7).drain(1),
            NoopPolicy,
        );
        let mut probe = Probe::default();
        ctl.run(&mut probe).unwrap();

        assert_eq!(probe.steps, (1..=7).collect::<Vec<_>>());
    }

    #[test]
    fn first_step_completion_makes_no_decisions() {
        // The scenario drains on the very first step; even a cadence of 1
        // must not reach the policy.
        let calls = Arc::new(AtomicUsize::new(0));
        let config = LoopConfig { decision_cadence: 1, ..headless() };
        let (mut ctl, _tx) = new_loop(
            config,
            ScriptedEngine::builder()
                .traffic_light("N1", ["N1_in_0"])
                .vehicles(1)
                .drain(1),
            CountingPolicy(calls.clone()),
        );
        let outcome = ctl.run(&mut NoopObserver).unwrap();

        assert_eq!(outcome.final_step, Step(1));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(ctl.state(), RunState::Completed);
    }

    #[test]
    fn second_run_is_rejected() {
        let (mut ctl, _tx) = new_loop(
            headless(),
            ScriptedEngine::builder().vehicles(1).drain(1),
            NoopPolicy,
        );
        ctl.run(&mut NoopObserver).unwrap();
        assert!(matches!(ctl.run(&mut NoopObserver), Err(LoopError::AlreadyStarted)));
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let (_tx, rx) = command_channel();
        let config = LoopConfig { decision_cadence: 0, ..LoopConfig::default() };
        let result = ControlLoop::new(
            config,
            engine_config(),
            ScriptedEngine::builder().build(),
            NoopPolicy,
            rx,
        );
        assert!(matches!(result, Err(LoopError::Config(_))));
    }
}

// ── Command application ───────────────────────────────────────────────────────

#[cfg(test)]
mod commands {
    use super::*;

    #[test]
    fn emergencies_apply_in_fifo_order_one_per_step() {
        let (mut ctl, tx) = new_loop(
            headless(),
            ScriptedEngine::builder().route("loop").vehicles(10).drain(1),
            NoopPolicy,
        );
        tx.send(Command::Emergency);
        tx.send(Command::Emergency);

        let mut probe = Probe::default();
        let outcome = ctl.run(&mut probe).unwrap();
        assert_eq!(outcome.commands_applied, 2);

        let injections: Vec<_> = ctl
            .engine
            .log
            .iter()
            .filter_map(|m| match m {
                Mutation::Injected { step, vehicle, route, class } => {
                    Some((*step, vehicle.clone(), route.clone(), class.clone()))
                }
                _ => None,
            })
            .collect();

        // Applied in order, on two different steps, ids fed by the counter.
        assert_eq!(injections.len(), 2);
        assert_eq!(injections[0].0, 1);
        assert_eq!(injections[1].0, 2);
        assert_eq!(injections[0].1, VehicleId::from("em_1"));
        assert_eq!(injections[1].1, VehicleId::from("em_2"));
        for (_, _, route, class) in &injections {
            assert_eq!(route.as_str(), "loop");
            assert_eq!(class, "emergency");
        }
    }

    #[test]
    fn dispatched_vehicles_are_highlighted() {
        let (mut ctl, tx) = new_loop(
            headless(),
            ScriptedEngine::builder().route("loop").vehicles(5).drain(1),
            NoopPolicy,
        );
        tx.send(Command::Emergency);
        ctl.run(&mut NoopObserver).unwrap();

        assert!(ctl.engine.log.iter().any(|m| matches!(
            m,
            Mutation::Highlighted { vehicle, .. } if vehicle == &VehicleId::from("em_1")
        )));
    }

    #[test]
    fn accident_stops_the_lead_vehicle() {
        let (mut ctl, tx) = new_loop(
            headless(),
            ScriptedEngine::builder()
                .edge("E1", ["veh_a", "veh_b"])
                .vehicles(5)
                .drain(1),
            NoopPolicy,
        );
        tx.send(Command::Accident { edge: EdgeId::from("E1") });

        let mut probe = Probe::default();
        let outcome = ctl.run(&mut probe).unwrap();
        assert_eq!(outcome.commands_applied, 1);

        let stops: Vec<_> = ctl
            .engine
            .log
            .iter()
            .filter(|m| matches!(m, Mutation::Stopped { .. }))
            .collect();
        assert_eq!(stops.len(), 1);
        assert_eq!(
            stops[0],
            &Mutation::Stopped {
                step:     1,
                vehicle:  VehicleId::from("veh_a"),
                edge:     EdgeId::from("E1"),
                position: 250.0,
                seconds:  100.0,
            }
        );
    }

    #[test]
    fn accident_on_an_empty_edge_is_discarded() {
        let (mut ctl, tx) = new_loop(
            headless(),
            ScriptedEngine::builder().edge("E1", Vec::<VehicleId>::new()).vehicles(5).drain(1),
            NoopPolicy,
        );
        tx.send(Command::Accident { edge: EdgeId::from("E1") });

        let mut probe = Probe::default();
        let outcome = ctl.run(&mut probe).unwrap();

        // No mutation, no error; the loop just moves on.
        assert_eq!(outcome.commands_applied, 0);
        assert!(ctl.engine.log.is_empty());
        assert_eq!(probe.dropped.len(), 1);
        assert_eq!(probe.dropped[0].2, "no vehicle on the target edge");
    }

    #[test]
    fn accident_on_an_unknown_edge_is_discarded() {
        let (mut ctl, tx) = new_loop(
            headless(),
            ScriptedEngine::builder().vehicles(5).drain(1),
            NoopPolicy,
        );
        tx.send(Command::Accident { edge: EdgeId::from("nowhere") });

        let mut probe = Probe::default();
        let outcome = ctl.run(&mut probe).unwrap();

        assert_eq!(outcome.commands_applied, 0);
        assert_eq!(probe.dropped.len(), 1);
        assert_eq!(ctl.state(), RunState::Completed);
    }

    #[test]
    fn emergency_ids_embed_the_step_counter() {
        assert_eq!(emergency_vehicle_id(Step(7)), VehicleId::from("em_7"));
        assert_eq!(emergency_vehicle_id(Step(123)), VehicleId::from("em_123"));
    }
}

// ── Decision ticks ────────────────────────────────────────────────────────────

#[cfg(test)]
mod decisions {
    use super::*;

    #[test]
    fn extension_applied_once_per_decision_tick() {
        // One agent, one lane, queue permanently above threshold.
        let (mut ctl, _tx) = new_loop(
            headless(),
            ScriptedEngine::builder()
                .traffic_light("N1", ["N1_in_0"])
                .lane("N1_in_0", busy_lane(5))
                .vehicles(35)
                .drain(1),
            ThresholdPolicy::default(),
        );
        let mut probe = Probe::default();
        let outcome = ctl.run(&mut probe).unwrap();

        assert_eq!(outcome.phase_extensions, 3);
        assert_eq!(
            probe.extensions,
            vec![
                (10, TlsId::from("N1"), 25.0),
                (20, TlsId::from("N1"), 25.0),
                (30, TlsId::from("N1"), 25.0),
            ]
        );
    }

    #[test]
    fn below_threshold_queues_never_extend() {
        let (mut ctl, _tx) = new_loop(
            headless(),
            ScriptedEngine::builder()
                .traffic_light("N1", ["N1_in_0"])
                .lane("N1_in_0", busy_lane(3))
                .vehicles(25)
                .drain(1),
            ThresholdPolicy::default(),
        );
        let outcome = ctl.run(&mut NoopObserver).unwrap();
        assert_eq!(outcome.phase_extensions, 0);
        assert!(ctl.engine.log.is_empty());
    }

    #[test]
    fn preemption_suppresses_extensions_and_signals() {
        let corridor = LaneSnapshot {
            halting: 9,
            classes: vec!["emergency".to_owned()],
            ..LaneSnapshot::empty()
        };
        let (mut ctl, _tx) = new_loop(
            headless(),
            ScriptedEngine::builder()
                .traffic_light("N1", ["N1_in_0"])
                .lane("N1_in_0", corridor)
                .vehicles(25)
                .drain(1),
            ThresholdPolicy::default(),
        );
        let mut probe = Probe::default();
        let outcome = ctl.run(&mut probe).unwrap();

        // The queue is far above threshold, but the corridor wins every tick.
        assert_eq!(outcome.phase_extensions, 0);
        assert!(ctl.engine.log.is_empty());
        assert_eq!(probe.preemptions.len(), 2); // decision ticks 10 and 20
        assert_eq!(probe.preemptions[0], (10, TlsId::from("N1"), LaneId::from("N1_in_0")));
    }

    #[test]
    fn agents_run_in_ascending_id_order() {
        // Registered out of order; the loop must still decide N1 before N2.
        let (mut ctl, _tx) = new_loop(
            headless(),
            ScriptedEngine::builder()
                .traffic_light("N2", ["N2_in_0"])
                .traffic_light("N1", ["N1_in_0"])
                .lane("N1_in_0", busy_lane(6))
                .lane("N2_in_0", busy_lane(6))
                .vehicles(15)
                .drain(1),
            ThresholdPolicy::default(),
        );
        let mut probe = Probe::default();
        ctl.run(&mut probe).unwrap();

        assert_eq!(probe.extensions.len(), 2);
        assert_eq!(probe.extensions[0].1, TlsId::from("N1"));
        assert_eq!(probe.extensions[1].1, TlsId::from("N2"));
    }

    #[test]
    fn agent_set_is_discovered_and_sorted() {
        let (mut ctl, _tx) = new_loop(
            headless(),
            ScriptedEngine::builder()
                .traffic_light("N2", ["N2_in_0"])
                .traffic_light("N1", ["N1_in_0", "N1_in_1"])
                .vehicles(1)
                .drain(1),
            NoopPolicy,
        );
        ctl.run(&mut NoopObserver).unwrap();

        let agents = ctl.agents();
        assert_eq!(agents.len(), 2);
        assert_eq!(agents[0].tls, TlsId::from("N1"));
        assert_eq!(agents[0].lanes.len(), 2);
        assert_eq!(agents[1].tls, TlsId::from("N2"));
    }
}

// ── Sampling ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod sampling {
    use super::*;

    #[test]
    fn samples_aggregate_speed_and_co2() {
        let config = LoopConfig { pace_ms: 0, sample_interval: 10, ..LoopConfig::default() };
        let (mut ctl, _tx) = new_loop(
            config,
            ScriptedEngine::builder()
                .traffic_light("N1", ["N1_in_0", "N1_in_1"])
                .lane_co2("N1_in_0", 300.0)
                .lane_co2("N1_in_1", 120.0)
                .average_speed(7.5)
                .vehicles(25)
                .drain(1),
            NoopPolicy,
        );
        let mut probe = Probe::default();
        ctl.run(&mut probe).unwrap();

        assert_eq!(probe.samples.len(), 2); // steps 10 and 20
        for (i, expected_step) in [(0usize, 10u64), (1, 20)] {
            assert_eq!(probe.samples[i].step, Step(expected_step));
            assert_eq!(probe.samples[i].average_speed, 7.5);
            assert_eq!(probe.samples[i].co2_mg_s, 420.0);
        }
    }

    #[test]
    fn zero_interval_disables_sampling() {
        let (mut ctl, _tx) = new_loop(
            headless(),
            ScriptedEngine::builder().vehicles(100).drain(1).average_speed(5.0),
            NoopPolicy,
        );
        let mut probe = Probe::default();
        ctl.run(&mut probe).unwrap();
        assert!(probe.samples.is_empty());
    }
}

// ── Failure paths ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod failures {
    use super::*;

    #[test]
    fn startup_failure_never_enters_running() {
        let (mut ctl, _tx) = new_loop(
            headless(),
            ScriptedEngine::builder().fail_start("no scenario file"),
            NoopPolicy,
        );
        let mut probe = Probe::default();
        let err = ctl.run(&mut probe).unwrap_err();

        assert!(matches!(err, LoopError::Startup { .. }));
        assert_eq!(ctl.state(), RunState::Failed);
        assert!(probe.steps.is_empty());
        assert!(!probe.ended);
    }

    #[test]
    fn midrun_failure_closes_and_surfaces_the_error() {
        let (mut ctl, _tx) = new_loop(
            headless(),
            ScriptedEngine::builder().vehicles(100).drain(1).fail_step_at(5),
            NoopPolicy,
        );
        let err = ctl.run(&mut NoopObserver).unwrap_err();

        match err {
            LoopError::Engine { step, .. } => assert_eq!(step, 4),
            other => panic!("expected engine error, got {other:?}"),
        }
        assert_eq!(ctl.state(), RunState::Failed);
        assert_eq!(ctl.engine.close_calls, 1);
    }
}

// ── Worker ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod worker {
    use super::*;

    #[test]
    fn spawned_run_accepts_commands_and_joins() {
        // Paced at 1 ms/step so the foreground's send comfortably lands
        // while the run is still in flight.
        let config = LoopConfig { pace_ms: 1, sample_interval: 0, ..LoopConfig::default() };
        let engine = ScriptedEngine::builder()
            .route("loop")
            .vehicles(300)
            .drain(1)
            .build();

        let handle = spawn(config, engine_config(), engine, NoopPolicy, NoopObserver).unwrap();
        handle.send(Command::Emergency);

        let outcome = handle.join().unwrap();
        assert_eq!(outcome.commands_applied, 1);
        assert_eq!(outcome.final_step, Step(301)); // 300 scripted + 1 injected
    }

    #[test]
    fn worker_surfaces_engine_failure() {
        let engine = ScriptedEngine::builder().vehicles(100).drain(1).fail_step_at(3).build();
        let handle = spawn(headless(), engine_config(), engine, NoopPolicy, NoopObserver).unwrap();
        assert!(matches!(handle.join(), Err(LoopError::Engine { .. })));
    }

    #[test]
    fn worker_startup_failure_surfaces_through_join() {
        let engine = ScriptedEngine::builder().fail_start("bad config").build();
        let handle = spawn(headless(), engine_config(), engine, NoopPolicy, NoopObserver).unwrap();
        assert!(matches!(handle.join(), Err(LoopError::Startup { .. })));
    }
}
