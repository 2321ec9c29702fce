//! FFprobe adapter for media file probing
//!
//! Shells out to `ffprobe -v quiet -print_format json -show_format -show_streams`
//! and maps the JSON into a [`ProbeResult`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::adapters::tool_command::ToolCommand;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// FFprobe-based probe adapter
#[derive(Debug, Clone)]
pub struct FfprobeAdapter {
    ffprobe_path: PathBuf,
}

impl FfprobeAdapter {
    pub fn new(ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }
}

#[async_trait]
impl ProbePort for FfprobeAdapter {
    async fn probe(&self, file_path: &Path) -> Result<ProbeResult, DomainError> {
        let output = ToolCommand::new(&self.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(file_path.to_string_lossy())
            .execute_with(DomainError::ProbeFailed)
            .await?;

        parse_ffprobe_json(&output.stdout)
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    size: Option<String>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    channels: Option<u32>,
    sample_rate: Option<String>,
    duration: Option<String>,
    #[serde(default)]
    tags: HashMap<String, String>,
    #[serde(default)]
    side_data_list: Vec<FfprobeSideData>,
}

#[derive(Debug, Deserialize)]
struct FfprobeSideData {
    rotation: Option<f64>,
}

/// Parse ffprobe's JSON output
pub fn parse_ffprobe_json(json: &str) -> Result<ProbeResult, DomainError> {
    let output: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| DomainError::ProbeFailed(format!("ffprobe JSON parse error: {e}")))?;

    let video = output
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));
    let audio = output
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"));

    let duration = parse_seconds(output.format.duration.as_deref())
        .or_else(|| video.and_then(|v| parse_seconds(v.duration.as_deref())));

    let frame_rate = video.and_then(|v| {
        v.avg_frame_rate
            .as_deref()
            .and_then(parse_frame_rate)
            .or_else(|| v.r_frame_rate.as_deref().and_then(parse_frame_rate))
    });

    Ok(ProbeResult {
        duration,
        title: tag(&output.format.tags, "title"),
        author: tag(&output.format.tags, "artist").or_else(|| tag(&output.format.tags, "author")),
        width: video.and_then(|v| v.width),
        height: video.and_then(|v| v.height),
        rotation: video.and_then(rotation_of),
        frame_rate,
        audio: audio.map(|a| AudioTrackInfo {
            channels: a.channels,
            sample_rate: a.sample_rate.as_deref().and_then(|s| s.parse().ok()),
        }),
        size: output.format.size.as_deref().and_then(|s| s.parse().ok()),
    })
}

fn tag(tags: &HashMap<String, String>, key: &str) -> Option<String> {
    tags.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.clone())
        .filter(|v| !v.is_empty())
}

fn parse_seconds(value: Option<&str>) -> Option<Duration> {
    value
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|s| s.is_finite() && *s >= 0.0)
        .map(Duration::from_secs_f64)
}

/// Parse `num/den` frame rates; `0/0` yields `None`
fn parse_frame_rate(value: &str) -> Option<f64> {
    let (num, den) = value.split_once('/')?;
    let num: f64 = num.parse().ok()?;
    let den: f64 = den.parse().ok()?;
    if den == 0.0 || num <= 0.0 {
        return None;
    }
    Some(num / den)
}

// Older muxers put rotation in a tag, newer ones in display-matrix side data
fn rotation_of(stream: &FfprobeStream) -> Option<i32> {
    if let Some(rotate) = stream.tags.get("rotate").and_then(|r| r.parse::<i32>().ok()) {
        return Some(rotate.rem_euclid(360));
    }
    stream
        .side_data_list
        .iter()
        .find_map(|d| d.rotation)
        .map(|r| (-(r.round() as i32)).rem_euclid(360))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {
                "codec_type": "video",
                "width": 1920,
                "height": 1080,
                "r_frame_rate": "30000/1001",
                "avg_frame_rate": "30000/1001",
                "side_data_list": [{ "side_data_type": "Display Matrix", "rotation": -90 }]
            },
            {
                "codec_type": "audio",
                "channels": 2,
                "sample_rate": "48000"
            }
        ],
        "format": {
            "duration": "12.500000",
            "size": "123456",
            "tags": { "title": "Holiday", "ARTIST": "Sam" }
        }
    }"#;

    #[test]
    fn parses_full_output() {
        let probe = parse_ffprobe_json(SAMPLE).unwrap();
        assert_eq!(probe.duration, Some(Duration::from_millis(12500)));
        assert_eq!(probe.width, Some(1920));
        assert_eq!(probe.height, Some(1080));
        assert_eq!(probe.rotation, Some(90));
        assert_eq!(probe.title.as_deref(), Some("Holiday"));
        assert_eq!(probe.author.as_deref(), Some("Sam"));
        assert_eq!(probe.size, Some(123456));
        let fps = probe.frame_rate.unwrap();
        assert!((fps - 29.97).abs() < 0.01);
        let audio = probe.audio.unwrap();
        assert_eq!(audio.channels, Some(2));
        assert_eq!(audio.sample_rate, Some(48000));
    }

    #[test]
    fn handles_audio_only_files() {
        let json = r#"{ "streams": [{ "codec_type": "audio", "channels": 1 }],
                        "format": { "duration": "3.0" } }"#;
        let probe = parse_ffprobe_json(json).unwrap();
        assert_eq!(probe.width, None);
        assert_eq!(probe.frame_rate, None);
        assert_eq!(probe.duration, Some(Duration::from_secs(3)));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_ffprobe_json("not json"),
            Err(DomainError::ProbeFailed(_))
        ));
    }

    #[test]
    fn frame_rate_parsing() {
        assert_eq!(parse_frame_rate("25/1"), Some(25.0));
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("abc"), None);
    }
}
