//! The reference policy: emergency preemption over queue-length extension.

use tc_core::{LaneId, TlsId};
use tc_engine::LaneSnapshot;

use crate::{ControlAction, ControlPolicy, Decision};

/// Cede to emergency corridors; otherwise extend the current phase once the
/// busiest lane's standing queue passes a threshold.
///
/// An emergency sighting yields [`ControlAction::NoOp`] plus the sighted lane
/// in [`Decision::preempted`] — the loop surfaces it through the observer.
/// No phase change is issued for the corridor itself: forcing green toward
/// the emergency lane would need phase-layout knowledge the engine adapter
/// does not expose (see DESIGN.md).
#[derive(Debug, Clone)]
pub struct ThresholdPolicy {
    /// Vehicle class that triggers preemption.
    pub emergency_class: String,

    /// Standing-queue length that must be *exceeded* before a phase
    /// extension.  A queue of exactly this size holds.
    pub halting_threshold: u32,

    /// Phase duration requested when the threshold is exceeded, seconds.
    pub extend_secs: f64,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            emergency_class:   "emergency".to_owned(),
            halting_threshold: 3,
            extend_secs:       25.0,
        }
    }
}

impl ControlPolicy for ThresholdPolicy {
    fn decide(&self, _tls: &TlsId, lanes: &[(LaneId, LaneSnapshot)]) -> Decision {
        // Emergency corridors take absolute priority over load logic.
        let sighted = lanes
            .iter()
            .find(|(_, snap)| snap.has_class(&self.emergency_class));
        if let Some((lane, _)) = sighted {
            return Decision {
                action:    ControlAction::NoOp,
                preempted: Some(lane.clone()),
            };
        }

        // Busiest lane by standing queue; ties go to the first lane in the
        // engine's stable order.
        let busiest = lanes
            .iter()
            .reduce(|best, cand| if cand.1.halting > best.1.halting { cand } else { best });
        match busiest {
            Some((_, snap)) if snap.halting > self.halting_threshold => Decision {
                action:    ControlAction::ExtendPhase { seconds: self.extend_secs },
                preempted: None,
            },
            _ => Decision::hold(),
        }
    }
}
