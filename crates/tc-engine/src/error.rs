use tc_core::{EdgeId, LaneId, RouteId, TlsId, VehicleId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine startup failed: {0}")]
    Startup(String),

    #[error("engine connection lost: {0}")]
    Connection(String),

    #[error("engine used before start() or after close()")]
    NotRunning,

    #[error("unknown traffic light {0}")]
    UnknownTrafficLight(TlsId),

    #[error("unknown lane {0}")]
    UnknownLane(LaneId),

    #[error("unknown edge {0}")]
    UnknownEdge(EdgeId),

    #[error("unknown route {0}")]
    UnknownRoute(RouteId),

    #[error("unknown vehicle {0}")]
    UnknownVehicle(VehicleId),

    #[error("vehicle {0} already exists")]
    DuplicateVehicle(VehicleId),
}

impl EngineError {
    /// `true` when the error names a scenario entity that does not exist.
    ///
    /// The control loop drops the offending command and keeps running for
    /// these; every other engine error aborts the run.
    pub fn is_unknown_entity(&self) -> bool {
        matches!(
            self,
            Self::UnknownTrafficLight(_)
                | Self::UnknownLane(_)
                | Self::UnknownEdge(_)
                | Self::UnknownRoute(_)
                | Self::UnknownVehicle(_)
        )
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
