// Adapters - External system implementations

pub mod exec_ffmpeg;
pub mod fs_local;
pub mod probe_ffprobe;
pub mod tool_command;
pub mod toml_config;
pub mod tracing_log;

// Re-export adapters
pub use exec_ffmpeg::{FfmpegEngine, FfmpegFrameGrabber, FfmpegSettings};
pub use fs_local::FsLocalAdapter;
pub use probe_ffprobe::FfprobeAdapter;
pub use toml_config::{CompressConfig, TomlConfigAdapter};
pub use tracing_log::TracingLogAdapter;
