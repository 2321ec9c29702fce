//! video-compress CLI
//!
//! Compresses videos with ffmpeg at one of eight quality tiers, one job at a
//! time, writing outputs into a scratch directory.
//!
//! # Usage
//!
//! ```bash
//! video-compress compress --input clip.mov --quality 1
//! video-compress compress --input clip.mov --quality 3 --frame-rate 24 --json
//! video-compress info --input clip.mov
//! video-compress thumbnail --input clip.mov --position 1500
//! video-compress clear-cache
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use video_compress::adapters::TracingLogAdapter;
use video_compress::app::{AppContainer, DefaultAppContainer};
use video_compress::cli::{commands, Cli, Commands};
use video_compress::config_initialization::initialize_configuration_hierarchy;
use video_compress::ports::LogPort;

/// Main entry point for the video-compress CLI
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = initialize_configuration_hierarchy(&cli)?;
    let config = loaded.config;

    let log_port = Arc::new(
        TracingLogAdapter::install(config.log_level()?, config.json_logs)
            .context("Failed to initialize logging")?,
    );

    match &loaded.file {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => debug!("No configuration file found, using defaults"),
    }
    if !loaded.env_overrides.is_empty() {
        debug!("Environment overrides: {}", loaded.env_overrides.join(", "));
    }

    let container = DefaultAppContainer::new(&config, log_port as Arc<dyn LogPort>)
        .context("Failed to initialize application")?;
    let compressor = container.compressor();

    match cli.command {
        Commands::Compress(args) => commands::compress(&compressor, args).await,
        Commands::Info(args) => commands::info(&compressor, args).await,
        Commands::Thumbnail(args) => commands::thumbnail(&compressor, args).await,
        Commands::ClearCache => commands::clear_cache(&compressor).await,
    }
}
