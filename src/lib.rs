//! video-compress library
//!
//! Orchestrates one video compression job at a time on top of an external
//! transcoding engine. A job takes a source file and a quality tier, writes
//! its output into a private scratch directory, streams progress and ends in
//! exactly one outcome: succeeded with the output's media info, cancelled or
//! failed.
//!
//! The crate is laid out as ports and adapters:
//!
//! - [`domain`] holds the model, the tier-to-strategy rules and the errors
//! - [`ports`] defines the engine, probe, filesystem and log contracts
//! - [`adapters`] implements them with ffmpeg, ffprobe, the local
//!   filesystem, `tracing` and TOML configuration
//! - [`app`] contains the job controller and the [`VideoCompressor`] facade

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod output;
pub mod ports;

// Re-export commonly used types
pub use app::{JobHandle, Ports, VideoCompressor};
pub use domain::errors::DomainError;
pub use domain::model::{
    CompressResult, CompressionRequest, JobId, JobOutcome, JobSnapshot, JobState, MediaInfo,
    VideoQuality,
};
