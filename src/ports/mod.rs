// Ports - Interface definitions (contracts)

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::EncodingStrategy;

/// Everything an engine needs to run one transcode
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeSpec {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub strategy: EncodingStrategy,
}

/// Callbacks raised by a transcoding engine.
///
/// Engines may invoke these from any thread. Implementations must not block.
pub trait EngineListener: Send + Sync {
    /// Engine accepted the job and began work
    fn on_start(&self);

    /// Fraction of work done, nominally in [0, 1] but not guaranteed monotonic
    fn on_progress(&self, fraction: f64);

    /// Output written; `size` is the engine's reported output size in bytes
    fn on_success(&self, size: u64);

    /// Engine gave up
    fn on_failure(&self, message: &str);

    /// Engine stopped after a cancellation request
    fn on_cancelled(&self);
}

/// Port for the external transcoding engine
#[async_trait]
pub trait TranscodeEngine: Send + Sync {
    /// Start transcoding in the background and return once the engine accepted the job.
    ///
    /// Errors returned here mean the job never started and no listener
    /// callbacks will follow.
    async fn start(
        &self,
        spec: TranscodeSpec,
        listener: Arc<dyn EngineListener>,
    ) -> Result<(), DomainError>;

    /// Request cooperative cancellation of the running transcode
    fn cancel(&self);
}

/// Port for media metadata probing
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Probe a media file for duration, tags and track details
    async fn probe(&self, file_path: &Path) -> Result<ProbeResult, DomainError>;
}

/// Port for still-frame extraction
#[async_trait]
pub trait ThumbnailPort: Send + Sync {
    /// Write a JPEG of the frame at `position` to `destination`
    async fn extract_frame(
        &self,
        source: &Path,
        destination: &Path,
        position: Duration,
        quality: u8,
    ) -> Result<(), DomainError>;
}

/// Summary of a cache clear
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearReport {
    pub files_removed: u64,
    pub bytes_freed: u64,
}

/// Port for file system operations
#[async_trait]
pub trait FsPort: Send + Sync {
    /// Check if a regular file exists
    async fn file_exists(&self, file_path: &Path) -> Result<bool, DomainError>;

    /// Get file size
    async fn file_size(&self, file_path: &Path) -> Result<u64, DomainError>;

    /// Delete file
    async fn delete_file(&self, file_path: &Path) -> Result<(), DomainError>;

    /// Create the directory if needed and verify it accepts writes
    async fn ensure_writable_dir(&self, dir_path: &Path) -> Result<(), DomainError>;

    /// Remove everything inside a directory, keeping the directory itself
    async fn clear_directory(&self, dir_path: &Path) -> Result<ClearReport, DomainError>;
}

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse log level from a name or a numeric engine level
    pub fn parse(level_str: &str) -> Result<Self, DomainError> {
        if let Ok(code) = level_str.trim().parse::<i32>() {
            return Self::from_code(code);
        }
        match level_str.trim().to_lowercase().as_str() {
            "trace" | "verbose" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(DomainError::InvalidRequest(format!(
                "Invalid log level: {}. Valid levels: trace, debug, info, warn, error or 0-3",
                level_str
            ))),
        }
    }

    /// Map the engine logger's numeric levels: 0 verbose, 1 info, 2 warning, 3 error
    pub fn from_code(code: i32) -> Result<Self, DomainError> {
        match code {
            0 => Ok(LogLevel::Trace),
            1 => Ok(LogLevel::Info),
            2 => Ok(LogLevel::Warn),
            3 => Ok(LogLevel::Error),
            other => Err(DomainError::InvalidRequest(format!(
                "Invalid log level code: {}. Valid codes: 0-3",
                other
            ))),
        }
    }

    /// Filter directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Port for logging control
pub trait LogPort: Send + Sync {
    /// Change verbosity at runtime
    fn set_log_level(&self, level: LogLevel) -> Result<(), DomainError>;

    /// Get current log level
    fn log_level(&self) -> LogLevel;
}
