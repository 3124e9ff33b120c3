use tc_engine::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoopError {
    #[error("engine startup failed: {source}")]
    Startup { source: EngineError },

    #[error("engine failed after step {step}: {source}")]
    Engine { step: u64, source: EngineError },

    #[error("control loop has already run; build a fresh loop for a new run")]
    AlreadyStarted,

    #[error(transparent)]
    Config(#[from] tc_core::CoreError),

    #[error("failed to spawn control worker: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("control worker panicked")]
    WorkerPanicked,
}

pub type LoopResult<T> = Result<T, LoopError>;
