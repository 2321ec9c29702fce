// Domain models - Core types and data structures

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::DomainError;

/// Quality tier selecting a predefined resolution/bit-rate policy.
///
/// The ordinals are part of the external contract and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoQuality {
    DefaultQuality,
    LowQuality,
    MediumQuality,
    /// Custom frame-rate tier; requires a frame-rate override.
    HighestQuality,
    Res640x480Quality,
    Res960x540Quality,
    Res1280x720Quality,
    Res1920x1080Quality,
}

impl VideoQuality {
    pub const ALL: [VideoQuality; 8] = [
        VideoQuality::DefaultQuality,
        VideoQuality::LowQuality,
        VideoQuality::MediumQuality,
        VideoQuality::HighestQuality,
        VideoQuality::Res640x480Quality,
        VideoQuality::Res960x540Quality,
        VideoQuality::Res1280x720Quality,
        VideoQuality::Res1920x1080Quality,
    ];

    /// Map an ordinal to a tier, rejecting unknown values
    pub fn from_ordinal(ordinal: i64) -> Result<Self, DomainError> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .ok_or(DomainError::InvalidQuality(ordinal))
    }

    pub fn ordinal(self) -> i64 {
        self as i64
    }

    /// Whether this tier adopts the caller-supplied frame rate
    pub fn uses_custom_frame_rate(self) -> bool {
        self == VideoQuality::HighestQuality
    }
}

impl fmt::Display for VideoQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.ordinal())
    }
}

/// Request for one compression job. Immutable once submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionRequest {
    pub source: PathBuf,
    pub quality: VideoQuality,
    pub delete_origin: bool,
    pub include_audio: bool,
    pub frame_rate: Option<u32>,
}

impl CompressionRequest {
    /// Create a request with audio kept and no frame-rate override
    pub fn new(source: impl Into<PathBuf>, quality: VideoQuality) -> Self {
        Self {
            source: source.into(),
            quality,
            delete_origin: false,
            include_audio: true,
            frame_rate: None,
        }
    }

    pub fn with_delete_origin(mut self, delete_origin: bool) -> Self {
        self.delete_origin = delete_origin;
        self
    }

    pub fn with_audio(mut self, include_audio: bool) -> Self {
        self.include_audio = include_audio;
        self
    }

    pub fn with_frame_rate(mut self, frame_rate: Option<u32>) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    /// Check argument consistency. Source existence is checked by the controller.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.source.as_os_str().is_empty() {
            return Err(DomainError::InvalidRequest(
                "source path cannot be empty".to_string(),
            ));
        }
        match self.frame_rate {
            Some(0) => Err(DomainError::InvalidRequest(
                "frame rate must be positive".to_string(),
            )),
            None if self.quality.uses_custom_frame_rate() => Err(DomainError::InvalidRequest(
                format!("quality {} requires a frame rate", self.quality),
            )),
            _ => Ok(()),
        }
    }
}

/// Unique identifier of a compression job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Job lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Cancelled,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Cancelled | JobState::Failed
        )
    }
}

/// Point-in-time view of the active job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSnapshot {
    pub id: JobId,
    pub state: JobState,
    pub progress: f64,
    pub destination: PathBuf,
}

/// Terminal result of a job, delivered exactly once
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Succeeded(MediaInfo),
    Cancelled,
    Failed(String),
}

impl JobOutcome {
    pub fn state(&self) -> JobState {
        match self {
            JobOutcome::Succeeded(_) => JobState::Succeeded,
            JobOutcome::Cancelled => JobState::Cancelled,
            JobOutcome::Failed(_) => JobState::Failed,
        }
    }

    /// Convert into a result, treating cancellation as `None`
    pub fn into_result(self) -> Result<Option<MediaInfo>, DomainError> {
        match self {
            JobOutcome::Succeeded(info) => Ok(Some(info)),
            JobOutcome::Cancelled => Ok(None),
            JobOutcome::Failed(message) => Err(DomainError::EngineFailure(message)),
        }
    }
}

/// Audio track details reported by a probe
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrackInfo {
    pub channels: Option<u32>,
    pub sample_rate: Option<u32>,
}

/// Raw metadata returned by a probe port
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeResult {
    pub duration: Option<Duration>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Display rotation in degrees (0, 90, 180, 270)
    pub rotation: Option<i32>,
    pub frame_rate: Option<f64>,
    pub audio: Option<AudioTrackInfo>,
    pub size: Option<u64>,
}

impl ProbeResult {
    /// Width and height as displayed, i.e. swapped for quarter-turn rotations
    pub fn display_size(&self) -> Option<(u32, u32)> {
        let (w, h) = (self.width?, self.height?);
        match self.rotation.map(|r| r.rem_euclid(360)) {
            Some(90) | Some(270) => Some((h, w)),
            _ => Some((w, h)),
        }
    }
}

/// Result metadata for a media file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<i32>,
    pub filesize: u64,
    /// Duration in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl MediaInfo {
    /// Media info carrying only path and size
    pub fn bare(path: impl Into<PathBuf>, filesize: u64) -> Self {
        Self {
            path: path.into(),
            title: None,
            author: None,
            width: None,
            height: None,
            orientation: None,
            filesize,
            duration: None,
        }
    }

    /// Combine a probe result with the file's path and size
    pub fn from_probe(path: &Path, filesize: u64, probe: ProbeResult) -> Self {
        Self {
            path: path.to_path_buf(),
            title: probe.title,
            author: probe.author,
            width: probe.width,
            height: probe.height,
            orientation: probe.rotation,
            filesize,
            duration: probe.duration.map(|d| d.as_secs_f64() * 1000.0),
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration.map(|ms| Duration::from_secs_f64(ms / 1000.0))
    }

    /// The shape a finished compression is reported in
    pub fn as_compress_result(&self) -> CompressResult<'_> {
        CompressResult {
            info: self,
            is_cancel: false,
        }
    }
}

/// Media info of a compressed output plus the `isCancel` flag callers of
/// the compress operation expect
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressResult<'a> {
    #[serde(flatten)]
    pub info: &'a MediaInfo,
    pub is_cancel: bool,
}
