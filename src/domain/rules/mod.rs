// Domain rules - Strategy resolution policies

use serde::Serialize;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Frame rate used by every fixed-resolution tier
pub const DEFAULT_FRAME_RATE: u32 = 30;

/// Key-frame interval in seconds
pub const DEFAULT_KEY_FRAME_INTERVAL: f32 = 3.0;

/// Fixed bit rate of the custom frame-rate tier (1280 x 720 x 4)
pub const CUSTOM_TIER_BIT_RATE: u64 = 1280 * 720 * 4;

/// Bits per pixel per frame used when estimating a bit rate
const BIT_RATE_FACTOR: f64 = 0.07 * 2.0;

/// How the output frame is sized relative to the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResizePolicy {
    /// Keep the input size
    PassThrough,
    /// Shrink so the smaller side, and optionally the larger side, fit
    AtMost { minor: u32, major: Option<u32> },
}

/// How the video bit rate is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum BitRatePolicy {
    /// Derived from output size and frame rate
    Estimated,
    Fixed(u64),
}

/// Resolved video track target
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VideoTarget {
    pub resize: ResizePolicy,
    pub bit_rate: BitRatePolicy,
    /// Upper bound; never exceeds the source's native frame rate
    pub frame_rate: u32,
    pub key_frame_interval: f32,
}

impl VideoTarget {
    fn at_most(minor: u32, major: Option<u32>) -> Self {
        Self {
            resize: ResizePolicy::AtMost { minor, major },
            bit_rate: BitRatePolicy::Estimated,
            frame_rate: DEFAULT_FRAME_RATE,
            key_frame_interval: DEFAULT_KEY_FRAME_INTERVAL,
        }
    }

    /// Output dimensions for a source of the given display size.
    ///
    /// Preserves aspect ratio, never scales up, and rounds to even values.
    pub fn output_size(&self, width: u32, height: u32) -> (u32, u32) {
        let (minor_limit, major_limit) = match self.resize {
            ResizePolicy::PassThrough => return (even(width), even(height)),
            ResizePolicy::AtMost { minor, major } => (minor, major),
        };

        let (source_minor, source_major) = (width.min(height), width.max(height));
        if source_minor == 0 {
            return (even(width), even(height));
        }

        let mut scale = minor_limit as f64 / source_minor as f64;
        if let Some(major_limit) = major_limit {
            scale = scale.min(major_limit as f64 / source_major as f64);
        }
        if scale >= 1.0 {
            return (even(width), even(height));
        }

        let scaled = |side: u32| even((side as f64 * scale).round() as u32).max(2);
        (scaled(width), scaled(height))
    }

    /// Target frame rate capped by the source's native rate
    pub fn effective_frame_rate(&self, source_frame_rate: Option<f64>) -> f64 {
        let target = self.frame_rate as f64;
        match source_frame_rate {
            Some(native) if native > 0.0 && native < target => native,
            _ => target,
        }
    }

    /// Bit rate for the given output size and frame rate
    pub fn bit_rate_for(&self, width: u32, height: u32, frame_rate: f64) -> u64 {
        match self.bit_rate {
            BitRatePolicy::Fixed(bit_rate) => bit_rate,
            BitRatePolicy::Estimated => {
                (BIT_RATE_FACTOR * width as f64 * height as f64 * frame_rate) as u64
            }
        }
    }

    /// Key-frame interval expressed in frames
    pub fn gop_size(&self, frame_rate: f64) -> u32 {
        ((frame_rate * self.key_frame_interval as f64).round() as u32).max(1)
    }
}

fn even(value: u32) -> u32 {
    value - value % 2
}

/// Resolved audio track target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioTarget {
    /// Re-encode keeping the input's channel count and sample rate
    Passthrough,
    /// Strip the audio track
    Remove,
}

/// Complete encoding target for one job
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EncodingStrategy {
    pub video: VideoTarget,
    pub audio: AudioTarget,
}

/// Maps quality tiers to encoding strategies
pub struct StrategyResolver;

impl StrategyResolver {
    /// Resolve a strategy. Pure: identical inputs give identical outputs.
    pub fn resolve(
        quality: VideoQuality,
        frame_rate: Option<u32>,
        include_audio: bool,
    ) -> Result<EncodingStrategy, DomainError> {
        let video = match quality {
            VideoQuality::DefaultQuality => VideoTarget::at_most(720, None),
            VideoQuality::LowQuality => VideoTarget::at_most(360, None),
            VideoQuality::MediumQuality => VideoTarget::at_most(640, None),
            VideoQuality::HighestQuality => {
                let frame_rate = match frame_rate {
                    Some(rate) if rate > 0 => rate,
                    _ => {
                        return Err(DomainError::InvalidRequest(format!(
                            "quality {} requires a positive frame rate",
                            quality
                        )))
                    }
                };
                VideoTarget {
                    resize: ResizePolicy::PassThrough,
                    bit_rate: BitRatePolicy::Fixed(CUSTOM_TIER_BIT_RATE),
                    frame_rate,
                    key_frame_interval: DEFAULT_KEY_FRAME_INTERVAL,
                }
            }
            VideoQuality::Res640x480Quality => VideoTarget::at_most(480, Some(640)),
            VideoQuality::Res960x540Quality => VideoTarget::at_most(540, Some(960)),
            VideoQuality::Res1280x720Quality => VideoTarget::at_most(720, Some(1280)),
            VideoQuality::Res1920x1080Quality => VideoTarget::at_most(1080, Some(1920)),
        };

        let audio = if include_audio {
            AudioTarget::Passthrough
        } else {
            AudioTarget::Remove
        };

        Ok(EncodingStrategy { video, audio })
    }

    /// Resolve from a raw ordinal, failing on unknown tiers
    pub fn resolve_ordinal(
        ordinal: i64,
        frame_rate: Option<u32>,
        include_audio: bool,
    ) -> Result<EncodingStrategy, DomainError> {
        Self::resolve(VideoQuality::from_ordinal(ordinal)?, frame_rate, include_audio)
    }
}

#[cfg(test)]
mod tests;
