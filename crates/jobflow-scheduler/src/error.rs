//! Error types for the facade.
//!
//! Control-plane failures carry a stable machine-readable code plus the
//! engine's original message, so callers across process boundaries can
//! branch without string-matching.

use thiserror::Error;

use jobflow_engine::EngineError;

/// Failure of a run-every / run-at / run-now operation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControlPlaneError {
    /// The engine rejected a recurrence registration.
    #[error("run_every rejected: {0}")]
    RunEvery(String),

    /// The engine rejected a one-shot schedule.
    #[error("run_at rejected: {0}")]
    RunAt(String),

    /// The engine rejected an immediate-execution request.
    #[error("run_now rejected: {0}")]
    RunNow(String),

    /// The request was malformed and never reached the engine.
    #[error("invalid request: {0}")]
    Validation(String),
}

impl ControlPlaneError {
    /// Stable machine-readable code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            ControlPlaneError::RunEvery(_) => "RUNEVERY_ERROR",
            ControlPlaneError::RunAt(_) => "RUNAT_ERROR",
            ControlPlaneError::RunNow(_) => "RUNNOW_ERROR",
            ControlPlaneError::Validation(_) => "VALIDATION_ERROR",
        }
    }

    /// The underlying message, preserved verbatim.
    pub fn message(&self) -> &str {
        match self {
            ControlPlaneError::RunEvery(msg)
            | ControlPlaneError::RunAt(msg)
            | ControlPlaneError::RunNow(msg)
            | ControlPlaneError::Validation(msg) => msg,
        }
    }
}

/// Lifecycle and construction errors of the service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// An engine call failed while registering declared jobs.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The service is already running.
    #[error("service is already running")]
    AlreadyRunning,

    /// The service is not running.
    #[error("service is not running")]
    NotRunning,
}
