//! Still-frame extraction through ffmpeg

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::adapters::tool_command::ToolCommand;
use crate::domain::errors::DomainError;
use crate::ports::ThumbnailPort;

/// Grabs single JPEG frames with `ffmpeg -frames:v 1`
#[derive(Debug, Clone)]
pub struct FfmpegFrameGrabber {
    ffmpeg_path: PathBuf,
}

impl FfmpegFrameGrabber {
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }
}

/// Map a 1..=100 quality to ffmpeg's JPEG qscale (31 worst, 2 best)
pub fn jpeg_qscale(quality: u8) -> u32 {
    let quality = quality.clamp(1, 100) as u32;
    31 - (quality - 1) * 29 / 99
}

#[async_trait]
impl ThumbnailPort for FfmpegFrameGrabber {
    async fn extract_frame(
        &self,
        source: &Path,
        destination: &Path,
        position: Duration,
        quality: u8,
    ) -> Result<(), DomainError> {
        ToolCommand::new(&self.ffmpeg_path)
            .args(["-hide_banner", "-nostdin", "-y", "-ss"])
            .arg(format!("{:.3}", position.as_secs_f64()))
            .arg("-i")
            .arg(source.to_string_lossy())
            .args(["-frames:v", "1", "-q:v"])
            .arg(jpeg_qscale(quality).to_string())
            .arg(destination.to_string_lossy())
            .execute_with(DomainError::EngineFailure)
            .await?;
        Ok(())
    }
}
