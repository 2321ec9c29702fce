//! CLI module for video-compress
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

/// Video compression driven by ffmpeg, one job at a time
#[derive(Parser, Debug)]
#[command(name = "video-compress")]
#[command(about = "Compress videos into a scratch directory at a chosen quality tier")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// TOML config file with a [video_compress] table
    #[arg(long, global = true, env = "VIDEO_COMPRESS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level (trace, debug, info, warn, error or 0-3)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Directory receiving outputs and thumbnails
    #[arg(long, global = true)]
    pub scratch_dir: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compress a video into the scratch directory
    Compress(args::CompressArgs),
    /// Print media information for a file
    Info(args::InfoArgs),
    /// Extract a JPEG still from a video
    Thumbnail(args::ThumbnailArgs),
    /// Delete everything in the scratch directory
    ClearCache,
}
