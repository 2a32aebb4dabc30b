// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
///
/// Only profile-level failures surface here; per-descriptor failures are
/// recorded in the report as [`crate::domain::ChangeError`].
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Unknown profile: {0}")]
    UnknownProfile(String),

    #[error("Orchestrator busy: another profile run is in progress")]
    OrchestratorBusy,

    #[error("Diagnostics unavailable: {0}")]
    DiagnosticsUnavailable(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Execution error: {0}")]
    Execution(#[from] crate::port::ExecutionError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
