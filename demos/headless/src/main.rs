//! headless — end-to-end demo of the traffic-control loop.
//!
//! Drives a scripted four-intersection scenario through a full run: the
//! worker thread owns the loop and the engine, while this (foreground)
//! thread dispatches an emergency vehicle and stages an accident mid-run.
//! Metric samples land in `./output/traffic_samples.csv`.
//!
//! Swap the scripted engine for a live engine binding to run the same loop
//! against a real simulator.

use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use tc_command::Command;
use tc_control::ThresholdPolicy;
use tc_core::{EdgeId, LaneId, LoopConfig, Step, TlsId};
use tc_engine::{EngineConfig, LaneSnapshot, ScriptedEngine};
use tc_loop::{ControlObserver, DropReason, RunOutcome, TrafficSample, spawn};
use tc_output::{CsvSampleWriter, SampleObserver};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:            u64  = 42;
const INTERSECTIONS:   u32  = 4;
const LANES_PER_TLS:   u32  = 2;
const VEHICLES:        usize = 600;
const PACE_MS:         u64  = 2;      // ~2 ms per engine step, keeps the run visible
const SAMPLE_INTERVAL: u64  = 50;
const OUTPUT_DIR:      &str = "output";

// ── Scenario ──────────────────────────────────────────────────────────────────

/// Build a four-intersection scenario with randomized rush-hour queues.
///
/// Each intersection `N1..N4` controls two approach lanes whose standing
/// queues vary per decision tick; an emergency vehicle crosses `N2` around
/// step 300, which the policy must cede to.
fn build_scenario() -> ScriptedEngine {
    let mut rng = SmallRng::seed_from_u64(SEED);
    let mut builder = ScriptedEngine::builder()
        .route("loop")
        .vehicles(VEHICLES)
        .drain(1)
        .average_speed(8.3);

    for n in 1..=INTERSECTIONS {
        let tls = format!("N{n}");
        let lanes: Vec<String> = (0..LANES_PER_TLS).map(|l| format!("N{n}_in_{l}")).collect();
        builder = builder.traffic_light(tls, lanes.clone());

        for lane in &lanes {
            builder = builder.lane_co2(lane.clone(), rng.gen_range(80.0..400.0));
            // Queue lengths vary per decision tick.
            for step in (10..VEHICLES as u64).step_by(10) {
                let halting = rng.gen_range(0..8);
                builder = builder.lane_at(
                    lane.clone(),
                    step,
                    LaneSnapshot {
                        occupancy: f64::from(halting) / 10.0,
                        halting,
                        classes: vec!["passenger".to_owned()],
                    },
                );
            }
        }
        builder = builder.edge(format!("E{n}"), vec![format!("car_{n}_0"), format!("car_{n}_1")]);
    }

    // An emergency vehicle crosses N2's first approach around step 300.
    builder = builder.lane_at(
        "N2_in_0",
        300,
        LaneSnapshot {
            occupancy: 0.5,
            halting:   6,
            classes:   vec!["passenger".to_owned(), "emergency".to_owned()],
        },
    );

    builder.build()
}

// ── Observer ──────────────────────────────────────────────────────────────────

/// Prints notable loop events and forwards samples to the CSV writer.
struct ConsoleObserver {
    inner:       SampleObserver<CsvSampleWriter>,
    samples:     usize,
    extensions:  usize,
    preemptions: usize,
}

impl ConsoleObserver {
    fn new(inner: SampleObserver<CsvSampleWriter>) -> Self {
        Self { inner, samples: 0, extensions: 0, preemptions: 0 }
    }
}

impl ControlObserver for ConsoleObserver {
    fn on_command_applied(&mut self, step: Step, cmd: &Command) {
        println!("{step}: applied {cmd:?}");
    }

    fn on_command_dropped(&mut self, step: Step, cmd: &Command, reason: &DropReason) {
        println!("{step}: dropped {cmd:?} ({reason})");
    }

    fn on_preemption(&mut self, step: Step, tls: &TlsId, lane: &LaneId) {
        self.preemptions += 1;
        println!("{step}: {tls} ceding to emergency corridor on {lane}");
    }

    fn on_phase_extended(&mut self, _step: Step, _tls: &TlsId, _seconds: f64) {
        self.extensions += 1;
    }

    fn on_sample(&mut self, sample: &TrafficSample) {
        self.samples += 1;
        self.inner.on_sample(sample);
    }

    fn on_run_end(&mut self, outcome: &RunOutcome) {
        self.inner.on_run_end(outcome);
        if let Some(e) = self.inner.take_error() {
            eprintln!("output error: {e}");
        }
        println!();
        println!("{:<24} {:<10}", "Metric", "Count");
        println!("{}", "-".repeat(34));
        println!("{:<24} {:<10}", "Final step", outcome.final_step.0);
        println!("{:<24} {:<10}", "Commands applied", outcome.commands_applied);
        println!("{:<24} {:<10}", "Phase extensions", self.extensions);
        println!("{:<24} {:<10}", "Emergency preemptions", self.preemptions);
        println!("{:<24} {:<10}", "Samples written", self.samples);
    }
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    println!("=== headless — traffic-control loop demo ===");
    println!("Intersections: {INTERSECTIONS}  |  Vehicles: {VEHICLES}  |  Seed: {SEED}");
    println!();

    fs::create_dir_all(OUTPUT_DIR)?;
    let writer = CsvSampleWriter::new(Path::new(OUTPUT_DIR))?;
    let observer = ConsoleObserver::new(SampleObserver::new(writer));

    let config = LoopConfig {
        pace_ms:         PACE_MS,
        sample_interval: SAMPLE_INTERVAL,
        ..LoopConfig::default()
    };

    let started = Instant::now();
    let handle = spawn(
        config,
        EngineConfig::new("demo.scenario"),
        build_scenario(),
        ThresholdPolicy::default(),
        observer,
    )?;

    // Foreground: issue commands while the run is in flight.
    thread::sleep(Duration::from_millis(200));
    handle.send(Command::Emergency);
    println!("foreground: emergency vehicle dispatched");

    thread::sleep(Duration::from_millis(200));
    handle.send(Command::Accident { edge: EdgeId::from("E2") });
    println!("foreground: accident staged on E2");

    let outcome = handle.join()?;
    println!();
    println!(
        "Run complete in {:.2} s ({} steps, {} commands applied)",
        started.elapsed().as_secs_f64(),
        outcome.final_step.0,
        outcome.commands_applied,
    );
    println!("Samples: {OUTPUT_DIR}/traffic_samples.csv");

    Ok(())
}
