//! The simulation step counter.
//!
//! # Design
//!
//! Time is represented as a monotonically increasing `Step` counter, advanced
//! exactly once per successful engine stepping call.  The counter is owned
//! exclusively by the control loop and resets to zero at the start of every
//! run; wall-clock pacing is a separate, cooperative concern and never feeds
//! back into the counter.

use std::fmt;

/// An absolute simulation step counter for one run.
///
/// Stored as `u64` to avoid overflow: at one engine step per millisecond a
/// u64 lasts ~585 million years, far longer than any conceivable run.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Step(pub u64);

impl Step {
    pub const ZERO: Step = Step(0);

    /// Advance the counter by one.  Called after each successful engine step.
    #[inline]
    pub fn advance(&mut self) {
        self.0 += 1;
    }

    /// Return the step `n` after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Step {
        Step(self.0 + n)
    }
}

impl std::ops::Sub for Step {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Step) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}
