//! Configuration initialization and hierarchy management

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::adapters::{CompressConfig, TomlConfigAdapter};
use crate::cli::Cli;

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "VIDEO_COMPRESS_";

/// Resolved configuration plus where it came from
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: CompressConfig,
    pub file: Option<PathBuf>,
    pub env_overrides: Vec<String>,
}

/// Initialize configuration hierarchy following precedence: CLI > Env > File > Defaults
pub fn initialize_configuration_hierarchy(cli: &Cli) -> Result<LoadedConfig> {
    let (mut config, file) = load_config_file(cli.config.as_deref())?;
    let env_overrides = apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    apply_cli_overrides(&mut config, cli);
    config.validate().context("Invalid configuration")?;

    Ok(LoadedConfig {
        config,
        file,
        env_overrides,
    })
}

/// Load the explicit file, else the first default location that exists
fn load_config_file(explicit: Option<&Path>) -> Result<(CompressConfig, Option<PathBuf>)> {
    if let Some(path) = explicit {
        let config = TomlConfigAdapter::load(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?;
        return Ok((config, Some(path.to_path_buf())));
    }

    for path in TomlConfigAdapter::default_locations() {
        if path.is_file() {
            let config = TomlConfigAdapter::load(&path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?;
            return Ok((config, Some(path)));
        }
    }

    Ok((CompressConfig::default(), None))
}

/// Apply `VIDEO_COMPRESS_*` variables and return the names that were used
pub fn apply_env_overrides<F>(config: &mut CompressConfig, lookup: F) -> Result<Vec<String>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut applied = Vec::new();
    let mut var = |name: &str| {
        let key = format!("{}{}", ENV_PREFIX, name);
        let value = lookup(&key).filter(|v| !v.trim().is_empty());
        if value.is_some() {
            applied.push(key);
        }
        value
    };

    if let Some(value) = var("SCRATCH_DIR") {
        config.scratch_dir = PathBuf::from(value);
    }
    if let Some(value) = var("FFMPEG_PATH") {
        config.ffmpeg_path = Some(PathBuf::from(value));
    }
    if let Some(value) = var("FFPROBE_PATH") {
        config.ffprobe_path = Some(PathBuf::from(value));
    }
    if let Some(value) = var("LOG_LEVEL") {
        config.log_level = value;
    }
    if let Some(value) = var("JSON_LOGS") {
        config.json_logs = parse_bool(&value)
            .with_context(|| format!("{}JSON_LOGS must be a boolean, got {:?}", ENV_PREFIX, value))?;
    }
    if let Some(value) = var("VIDEO_CODEC") {
        config.video_codec = value;
    }
    if let Some(value) = var("AUDIO_CODEC") {
        config.audio_codec = value;
    }
    if let Some(value) = var("ENCODER_PRESET") {
        config.encoder_preset = value;
    }
    if let Some(value) = var("THREADS") {
        let threads = value
            .trim()
            .parse::<usize>()
            .with_context(|| format!("{}THREADS must be a number, got {:?}", ENV_PREFIX, value))?;
        config.threads = Some(threads);
    }

    Ok(applied)
}

/// Apply CLI argument overrides to configuration
fn apply_cli_overrides(config: &mut CompressConfig, cli: &Cli) {
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if cli.json_logs {
        config.json_logs = true;
    }
    if let Some(dir) = &cli.scratch_dir {
        config.scratch_dir = dir.clone();
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = CompressConfig::default();
        let applied = apply_env_overrides(
            &mut config,
            env(&[
                ("VIDEO_COMPRESS_SCRATCH_DIR", "/data/scratch"),
                ("VIDEO_COMPRESS_THREADS", "4"),
                ("VIDEO_COMPRESS_JSON_LOGS", "yes"),
                ("UNRELATED", "x"),
            ]),
        )
        .unwrap();

        assert_eq!(config.scratch_dir, PathBuf::from("/data/scratch"));
        assert_eq!(config.threads, Some(4));
        assert!(config.json_logs);
        assert_eq!(applied.len(), 3);
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut config = CompressConfig::default();
        let applied =
            apply_env_overrides(&mut config, env(&[("VIDEO_COMPRESS_VIDEO_CODEC", "  ")])).unwrap();
        assert!(applied.is_empty());
        assert_eq!(config.video_codec, "libx264");
    }

    #[test]
    fn malformed_env_values_fail() {
        let mut config = CompressConfig::default();
        assert!(
            apply_env_overrides(&mut config, env(&[("VIDEO_COMPRESS_THREADS", "many")])).is_err()
        );
        assert!(
            apply_env_overrides(&mut config, env(&[("VIDEO_COMPRESS_JSON_LOGS", "maybe")])).is_err()
        );
    }

    #[test]
    fn cli_wins_over_env() {
        let mut config = CompressConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("VIDEO_COMPRESS_LOG_LEVEL", "warn"),
                ("VIDEO_COMPRESS_SCRATCH_DIR", "/env/scratch"),
            ]),
        )
        .unwrap();

        let cli = Cli::parse_from([
            "video-compress",
            "--log-level",
            "debug",
            "--scratch-dir",
            "/cli/scratch",
            "clear-cache",
        ]);
        apply_cli_overrides(&mut config, &cli);

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.scratch_dir, PathBuf::from("/cli/scratch"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(load_config_file(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn explicit_file_is_loaded() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("vc.toml");
        std::fs::write(&path, "[video_compress]\nencoder_preset = \"veryfast\"\n").unwrap();

        let (config, file) = load_config_file(Some(&path)).unwrap();
        assert_eq!(config.encoder_preset, "veryfast");
        assert_eq!(file, Some(path));
    }
}
