//! The commands a foreground context can issue to a running control loop.

use tc_core::EdgeId;

/// An externally-issued request, applied by the control loop between engine
/// steps.
///
/// At most one command is applied per loop iteration, in FIFO order.
/// Commands are immutable once enqueued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Dispatch a new emergency-class vehicle on the configured route.
    Emergency,

    /// Stop the lead vehicle on `edge` in place, simulating an accident.
    ///
    /// Silently discarded if no vehicle is on the edge when the command is
    /// applied — no retry, no error.
    Accident { edge: EdgeId },
}
