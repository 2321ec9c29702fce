// Domain errors - Error types for the domain layer

use thiserror::Error;

/// Domain-specific error types
///
/// Validation failures are returned synchronously from job submission.
/// Failures that happen while the engine runs arrive through the job outcome
/// instead, so `EngineFailure` is only produced when converting an outcome.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Source path does not reference an existing file
    #[error("Source file not found: {0}")]
    SourceNotFound(String),

    /// Engine or scratch directory could not be prepared
    #[error("Transcode initialization failed: {0}")]
    InitializationFailed(String),

    /// Quality tier outside the known range
    #[error("Invalid quality tier: {0}")]
    InvalidQuality(i64),

    /// Request arguments are inconsistent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Engine reported a failure while transcoding
    #[error("Engine failure: {0}")]
    EngineFailure(String),

    /// A compression job is already running
    #[error("A compression job is already active: {0}")]
    JobAlreadyActive(String),

    /// Operation not allowed while a job is running
    #[error("Operation not allowed while job {0} is active")]
    JobActive(String),

    /// Metadata probe failed
    #[error("Probe failed: {0}")]
    ProbeFailed(String),

    /// File system operation failed
    #[error("File system error: {0}")]
    FsFail(String),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    ConfigFail(String),
}

impl DomainError {
    /// Stable machine-readable code, matching the method-channel error codes
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::SourceNotFound(_) => "FILE_NOT_FOUND",
            DomainError::InitializationFailed(_) => "TRANSCODE_INIT_FAILED",
            DomainError::InvalidQuality(_) => "INVALID_QUALITY",
            DomainError::InvalidRequest(_) => "INVALID_REQUEST",
            DomainError::EngineFailure(_) => "ENGINE_FAILURE",
            DomainError::JobAlreadyActive(_) => "JOB_ALREADY_ACTIVE",
            DomainError::JobActive(_) => "JOB_ACTIVE",
            DomainError::ProbeFailed(_) => "PROBE_FAILED",
            DomainError::FsFail(_) => "FS_FAIL",
            DomainError::ConfigFail(_) => "CONFIG_FAIL",
        }
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::FsFail(err.to_string())
    }
}
