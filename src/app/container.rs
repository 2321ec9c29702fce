use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::adapters::{
    CompressConfig, FfmpegEngine, FfmpegFrameGrabber, FfmpegSettings, FfprobeAdapter,
    FsLocalAdapter,
};
use crate::app::api::{Ports, VideoCompressor};
use crate::domain::errors::DomainError;
use crate::ports::{FsPort, LogPort, ProbePort, ThumbnailPort, TranscodeEngine};

pub trait AppContainer: Send + Sync {
    fn compressor(&self) -> Arc<VideoCompressor>;
}

pub struct DefaultAppContainer {
    compressor: Arc<VideoCompressor>,
}

impl DefaultAppContainer {
    /// Wire the ffmpeg-backed adapters described by `config`
    pub fn new(config: &CompressConfig, log_port: Arc<dyn LogPort>) -> Result<Self, DomainError> {
        config.validate()?;

        let ffmpeg_path = resolve_tool(config.ffmpeg_path.as_deref(), "ffmpeg");
        let ffprobe_path = resolve_tool(config.ffprobe_path.as_deref(), "ffprobe");

        let mut settings = FfmpegSettings::new(&ffmpeg_path);
        settings.video_codec = config.video_codec.clone();
        settings.audio_codec = config.audio_codec.clone();
        settings.preset = config.encoder_preset.clone();
        if let Some(threads) = config.threads {
            settings.threads = threads;
        }

        let probe_port = Arc::new(FfprobeAdapter::new(ffprobe_path));
        let engine = Arc::new(FfmpegEngine::new(
            settings,
            Arc::clone(&probe_port) as Arc<dyn ProbePort>,
        ));
        let thumbnail_port = Arc::new(FfmpegFrameGrabber::new(ffmpeg_path));
        let fs_port = Arc::new(FsLocalAdapter::new());

        let ports = Ports {
            engine: engine as Arc<dyn TranscodeEngine>,
            probe: probe_port as Arc<dyn ProbePort>,
            thumbnails: thumbnail_port as Arc<dyn ThumbnailPort>,
            fs: fs_port as Arc<dyn FsPort>,
            log: log_port,
        };

        Ok(Self {
            compressor: Arc::new(VideoCompressor::new(ports, config.scratch_dir.clone())),
        })
    }
}

impl AppContainer for DefaultAppContainer {
    fn compressor(&self) -> Arc<VideoCompressor> {
        Arc::clone(&self.compressor)
    }
}

/// Configured path, else the binary found on `PATH`, else the bare name
fn resolve_tool(configured: Option<&Path>, name: &str) -> PathBuf {
    if let Some(path) = configured {
        return path.to_path_buf();
    }
    match which::which(name) {
        Ok(path) => {
            debug!("using {} at {}", name, path.display());
            path
        }
        Err(e) => {
            warn!("{} not found on PATH ({}), jobs will fail to start", name, e);
            PathBuf::from(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::TracingLogAdapter;
    use crate::ports::LogLevel;

    #[test]
    fn configured_tool_path_wins() {
        let path = resolve_tool(Some(Path::new("/opt/ff/ffmpeg")), "ffmpeg");
        assert_eq!(path, PathBuf::from("/opt/ff/ffmpeg"));
    }

    #[test]
    fn missing_tool_falls_back_to_name() {
        let path = resolve_tool(None, "video-compress-no-such-tool");
        assert_eq!(path, PathBuf::from("video-compress-no-such-tool"));
    }

    #[test]
    fn container_rejects_invalid_config() {
        let config = CompressConfig {
            threads: Some(0),
            ..Default::default()
        };
        let log = Arc::new(TracingLogAdapter::detached(LogLevel::Info));
        assert!(DefaultAppContainer::new(&config, log).is_err());
    }

    #[test]
    fn container_uses_configured_scratch_dir() {
        let config = CompressConfig {
            scratch_dir: PathBuf::from("/var/tmp/vc-test"),
            ffmpeg_path: Some(PathBuf::from("/usr/bin/ffmpeg")),
            ffprobe_path: Some(PathBuf::from("/usr/bin/ffprobe")),
            ..Default::default()
        };
        let log = Arc::new(TracingLogAdapter::detached(LogLevel::Info));
        let container = DefaultAppContainer::new(&config, log).unwrap();
        assert_eq!(
            container.compressor().scratch_dir(),
            Path::new("/var/tmp/vc-test")
        );
    }
}
