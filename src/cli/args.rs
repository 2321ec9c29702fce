//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

/// Arguments for the compress command
#[derive(Args, Debug)]
pub struct CompressArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Quality tier ordinal (0 default, 1 low, 2 medium, 3 custom frame rate,
    /// 4 640x480, 5 960x540, 6 1280x720, 7 1920x1080)
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    pub quality: i64,

    /// Delete the input after a successful compression
    #[arg(long)]
    pub delete_origin: bool,

    /// Drop the audio track
    #[arg(long)]
    pub no_audio: bool,

    /// Output frame rate, required by tier 3
    #[arg(long)]
    pub frame_rate: Option<u32>,

    /// Report progress and the result as JSON lines
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the info command
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Input media file path
    #[arg(short, long)]
    pub input: PathBuf,
}

/// Arguments for the thumbnail command
#[derive(Args, Debug)]
pub struct ThumbnailArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// JPEG quality (1-100)
    #[arg(short, long, default_value_t = 75, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: u8,

    /// Frame position in milliseconds
    #[arg(short, long, default_value_t = 0)]
    pub position: u64,
}
