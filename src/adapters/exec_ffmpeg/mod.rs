//! FFmpeg execution adapter
//!
//! Drives the `ffmpeg` command-line tool as the external transcoding engine.
//! Progress comes from `-progress pipe:1`, cancellation kills the child.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::{AudioTarget, BitRatePolicy};
use crate::ports::*;

mod thumbnail;

pub use thumbnail::FfmpegFrameGrabber;

/// Number of stderr lines kept for failure messages
const STDERR_TAIL_LINES: usize = 20;

/// Encoder settings shared by every job
#[derive(Debug, Clone, PartialEq)]
pub struct FfmpegSettings {
    pub ffmpeg_path: PathBuf,
    pub video_codec: String,
    pub audio_codec: String,
    pub preset: String,
    pub threads: usize,
}

impl FfmpegSettings {
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            preset: "medium".to_string(),
            threads: optimize_thread_count(),
        }
    }
}

/// Use 75% of the cores, between 1 and 16 threads
pub fn optimize_thread_count() -> usize {
    let cpu_count = num_cpus::get();
    ((cpu_count as f64 * 0.75).ceil() as usize).clamp(1, 16)
}

/// FFmpeg-based transcoding engine
pub struct FfmpegEngine {
    settings: FfmpegSettings,
    probe: Arc<dyn ProbePort>,
    cancel_tx: Mutex<Option<watch::Sender<bool>>>,
}

impl FfmpegEngine {
    pub fn new(settings: FfmpegSettings, probe: Arc<dyn ProbePort>) -> Self {
        Self {
            settings,
            probe,
            cancel_tx: Mutex::new(None),
        }
    }
}

#[async_trait]
impl TranscodeEngine for FfmpegEngine {
    async fn start(
        &self,
        spec: TranscodeSpec,
        listener: Arc<dyn EngineListener>,
    ) -> Result<(), DomainError> {
        let source = self
            .probe
            .probe(&spec.source)
            .await
            .map_err(|e| DomainError::InitializationFailed(format!("cannot read source: {e}")))?;

        let args = build_transcode_args(&spec, &source, &self.settings);
        debug!(ffmpeg = %self.settings.ffmpeg_path.display(), ?args, "spawning transcoder");

        let child = Command::new(&self.settings.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                DomainError::InitializationFailed(format!(
                    "failed to spawn {}: {e}",
                    self.settings.ffmpeg_path.display()
                ))
            })?;

        let (tx, rx) = watch::channel(false);
        *self.cancel_tx.lock().unwrap_or_else(|e| e.into_inner()) = Some(tx);

        info!(source = %spec.source.display(), destination = %spec.destination.display(), "ffmpeg started");
        tokio::spawn(supervise(child, listener, rx, source.duration, spec.destination));
        Ok(())
    }

    fn cancel(&self) {
        let guard = self.cancel_tx.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(tx) = guard.as_ref() {
            // no receiver means the transcode already finished
            let _ = tx.send(true);
        }
    }
}

enum Finish {
    Exited(std::io::Result<ExitStatus>),
    Cancelled,
}

async fn supervise(
    mut child: Child,
    listener: Arc<dyn EngineListener>,
    mut cancel_rx: watch::Receiver<bool>,
    total: Option<Duration>,
    destination: PathBuf,
) {
    listener.on_start();

    let stderr_tail = child
        .stderr
        .take()
        .map(|stderr| tokio::spawn(collect_tail(stderr, STDERR_TAIL_LINES)));

    let finish = tokio::select! {
        _ = wait_for_cancel(&mut cancel_rx) => Finish::Cancelled,
        status = drive(&mut child, listener.as_ref(), total) => Finish::Exited(status),
    };

    match finish {
        Finish::Cancelled => {
            if let Err(e) = child.kill().await {
                warn!("failed to kill ffmpeg: {}", e);
            }
            if let Some(task) = stderr_tail {
                task.abort();
            }
            remove_partial_output(&destination).await;
            listener.on_cancelled();
        }
        Finish::Exited(Ok(status)) if status.success() => {
            match tokio::fs::metadata(&destination).await {
                Ok(meta) => listener.on_success(meta.len()),
                Err(e) => listener.on_failure(&format!(
                    "ffmpeg exited cleanly but output is unreadable: {e}"
                )),
            }
        }
        Finish::Exited(Ok(status)) => {
            let tail = match stderr_tail {
                Some(task) => task.await.unwrap_or_default(),
                None => String::new(),
            };
            remove_partial_output(&destination).await;
            listener.on_failure(&format!("ffmpeg exited with {status}: {}", tail.trim()));
        }
        Finish::Exited(Err(e)) => {
            remove_partial_output(&destination).await;
            listener.on_failure(&format!("ffmpeg I/O error: {e}"));
        }
    }
}

/// Forward progress lines until stdout closes, then wait for exit
async fn drive(
    child: &mut Child,
    listener: &dyn EngineListener,
    total: Option<Duration>,
) -> std::io::Result<ExitStatus> {
    if let Some(stdout) = child.stdout.take() {
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            if let Some(fraction) = parse_progress_line(&line, total) {
                listener.on_progress(fraction);
            }
        }
    }
    child.wait().await
}

/// Resolve once cancellation is requested; pend forever if the sender is gone
async fn wait_for_cancel(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

async fn collect_tail<R: AsyncRead + Unpin>(reader: R, keep: usize) -> String {
    let mut tail = VecDeque::with_capacity(keep);
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if tail.len() == keep {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    tail.into_iter().collect::<Vec<_>>().join("\n")
}

async fn remove_partial_output(destination: &Path) {
    match tokio::fs::remove_file(destination).await {
        Ok(()) => debug!("removed partial output {}", destination.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("failed to remove partial output {}: {}", destination.display(), e),
    }
}

/// Parse one `-progress` line into a completion fraction.
///
/// `out_time_ms` is in microseconds as well, despite its name.
pub fn parse_progress_line(line: &str, total: Option<Duration>) -> Option<f64> {
    let (key, value) = line.trim().split_once('=')?;
    match key {
        "progress" if value == "end" => Some(1.0),
        "out_time_us" | "out_time_ms" => {
            let total_us = total?.as_micros() as f64;
            if total_us <= 0.0 {
                return None;
            }
            let done: f64 = value.parse().ok()?;
            Some((done / total_us).clamp(0.0, 1.0))
        }
        _ => None,
    }
}

/// Build the ffmpeg argument list for a transcode
pub fn build_transcode_args(
    spec: &TranscodeSpec,
    source: &ProbeResult,
    settings: &FfmpegSettings,
) -> Vec<String> {
    let video = &spec.strategy.video;
    let frame_rate = video.effective_frame_rate(source.frame_rate);

    let mut args: Vec<String> = vec![
        "-hide_banner".into(),
        "-nostdin".into(),
        "-y".into(),
        "-i".into(),
        spec.source.to_string_lossy().into_owned(),
        "-map".into(),
        "0:v:0".into(),
    ];

    let bit_rate = match source.display_size() {
        Some((width, height)) => {
            let (out_w, out_h) = video.output_size(width, height);
            if (out_w, out_h) != (width, height) {
                args.push("-vf".into());
                args.push(format!("scale={out_w}:{out_h}"));
            }
            Some(video.bit_rate_for(out_w, out_h, frame_rate))
        }
        None => match video.bit_rate {
            BitRatePolicy::Fixed(bit_rate) => Some(bit_rate),
            BitRatePolicy::Estimated => None,
        },
    };

    args.extend([
        "-c:v".into(),
        settings.video_codec.clone(),
        "-preset".into(),
        settings.preset.clone(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-r".into(),
        format_rate(frame_rate),
        "-g".into(),
        video.gop_size(frame_rate).to_string(),
    ]);
    if let Some(bit_rate) = bit_rate {
        args.push("-b:v".into());
        args.push(bit_rate.to_string());
    }

    match spec.strategy.audio {
        AudioTarget::Passthrough => {
            args.extend(["-map".into(), "0:a:0?".into(), "-c:a".into(), settings.audio_codec.clone()]);
            if let Some(audio) = &source.audio {
                if let Some(channels) = audio.channels {
                    args.push("-ac".into());
                    args.push(channels.to_string());
                }
                if let Some(sample_rate) = audio.sample_rate {
                    args.push("-ar".into());
                    args.push(sample_rate.to_string());
                }
            }
        }
        AudioTarget::Remove => args.push("-an".into()),
    }

    args.extend([
        "-movflags".into(),
        "+faststart".into(),
        "-threads".into(),
        settings.threads.to_string(),
        "-progress".into(),
        "pipe:1".into(),
        "-nostats".into(),
        spec.destination.to_string_lossy().into_owned(),
    ]);
    args
}

fn format_rate(rate: f64) -> String {
    if rate.fract() == 0.0 {
        format!("{}", rate as u64)
    } else {
        format!("{:.3}", rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rules::StrategyResolver;

    fn settings() -> FfmpegSettings {
        FfmpegSettings {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            preset: "fast".to_string(),
            threads: 4,
        }
    }

    fn spec(quality: VideoQuality, frame_rate: Option<u32>, audio: bool) -> TranscodeSpec {
        TranscodeSpec {
            source: PathBuf::from("/in/movie.mov"),
            destination: PathBuf::from("/scratch/out.mp4"),
            strategy: StrategyResolver::resolve(quality, frame_rate, audio).unwrap(),
        }
    }

    fn hd_source() -> ProbeResult {
        ProbeResult {
            duration: Some(Duration::from_secs(10)),
            width: Some(1920),
            height: Some(1080),
            frame_rate: Some(25.0),
            audio: Some(AudioTrackInfo {
                channels: Some(2),
                sample_rate: Some(44100),
            }),
            ..Default::default()
        }
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn low_quality_scales_and_caps_frame_rate() {
        let args = build_transcode_args(
            &spec(VideoQuality::LowQuality, None, true),
            &hd_source(),
            &settings(),
        );
        assert_eq!(value_after(&args, "-vf"), Some("scale=640:360"));
        assert_eq!(value_after(&args, "-r"), Some("25"));
        assert_eq!(value_after(&args, "-g"), Some("75"));
        // 0.14 * 640 * 360 * 25
        assert_eq!(value_after(&args, "-b:v"), Some("806400"));
        assert_eq!(value_after(&args, "-ac"), Some("2"));
        assert_eq!(value_after(&args, "-ar"), Some("44100"));
        assert_eq!(args.last().map(String::as_str), Some("/scratch/out.mp4"));
    }

    #[test]
    fn custom_tier_keeps_size_and_uses_fixed_rate() {
        let args = build_transcode_args(
            &spec(VideoQuality::HighestQuality, Some(24), true),
            &hd_source(),
            &settings(),
        );
        assert!(!args.iter().any(|a| a == "-vf"));
        assert_eq!(value_after(&args, "-r"), Some("24"));
        assert_eq!(value_after(&args, "-b:v"), Some("3686400"));
    }

    #[test]
    fn removed_audio_drops_track() {
        let args = build_transcode_args(
            &spec(VideoQuality::DefaultQuality, None, false),
            &hd_source(),
            &settings(),
        );
        assert!(args.iter().any(|a| a == "-an"));
        assert!(!args.iter().any(|a| a == "-c:a"));
    }

    #[test]
    fn unknown_dimensions_skip_scaling_and_estimate() {
        let source = ProbeResult {
            duration: Some(Duration::from_secs(1)),
            ..Default::default()
        };
        let args = build_transcode_args(
            &spec(VideoQuality::MediumQuality, None, true),
            &source,
            &settings(),
        );
        assert!(!args.iter().any(|a| a == "-vf"));
        assert!(!args.iter().any(|a| a == "-b:v"));
        assert_eq!(value_after(&args, "-r"), Some("30"));
    }

    #[test]
    fn progress_lines() {
        let total = Some(Duration::from_secs(10));
        assert_eq!(parse_progress_line("out_time_us=5000000", total), Some(0.5));
        assert_eq!(parse_progress_line("out_time_ms=2500000", total), Some(0.25));
        assert_eq!(parse_progress_line("out_time_us=99000000", total), Some(1.0));
        assert_eq!(parse_progress_line("out_time_us=N/A", total), None);
        assert_eq!(parse_progress_line("progress=continue", total), None);
        assert_eq!(parse_progress_line("progress=end", None), Some(1.0));
        assert_eq!(parse_progress_line("out_time_us=100", None), None);
        assert_eq!(parse_progress_line("frame=12", total), None);
    }

    #[test]
    fn fractional_rates_are_formatted() {
        assert_eq!(format_rate(30.0), "30");
        assert_eq!(format_rate(29.97002997), "29.970");
    }
}
