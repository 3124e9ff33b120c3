//! A policy that never acts.

use tc_core::{LaneId, TlsId};
use tc_engine::LaneSnapshot;

use crate::{ControlPolicy, Decision};

/// A [`ControlPolicy`] that always holds.
///
/// Useful for exercising the loop's stepping and command plumbing without
/// any control effects.
pub struct NoopPolicy;

impl ControlPolicy for NoopPolicy {
    fn decide(&self, _tls: &TlsId, _lanes: &[(LaneId, LaneSnapshot)]) -> Decision {
        Decision::hold()
    }
}
