//! The `ControlPolicy` trait — the loop's decision-logic extension point.

use tc_core::{LaneId, TlsId};
use tc_engine::LaneSnapshot;

use crate::Decision;

/// Pluggable per-intersection decision logic.
///
/// `decide` must be a pure function of its inputs: no interior mutability, no
/// hidden state.  The control loop calls it once per agent per decision tick
/// with freshly-read snapshots, in stable agent order, and applies the
/// returned action before moving to the next agent.
///
/// The loop's worker thread owns the policy for the whole run, so
/// implementations must be `Send + 'static`.
pub trait ControlPolicy: Send + 'static {
    /// Decide for one intersection.
    ///
    /// `lanes` holds one `(lane, snapshot)` pair per controlled lane, in the
    /// engine's stable lane order.  An empty slice must yield a no-op
    /// decision, never a panic.
    fn decide(&self, tls: &TlsId, lanes: &[(LaneId, LaneSnapshot)]) -> Decision;
}
