//! Per-lane state as read from the engine.

/// A fresh per-lane reading taken for one decision tick.
///
/// Snapshots are recomputed from the engine every time the agent controller
/// runs and are never cached across ticks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LaneSnapshot {
    /// Fraction of the lane surface covered by vehicles, 0.0–1.0.
    pub occupancy: f64,

    /// Vehicles counted as stopped/queued on the lane during the last
    /// simulated interval.
    pub halting: u32,

    /// Vehicle classes currently present on the lane.
    pub classes: Vec<String>,
}

impl LaneSnapshot {
    /// An empty lane: no occupancy, no queue, no vehicles.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns `true` if a vehicle of `class` is currently on the lane.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}
