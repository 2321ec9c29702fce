// TOML config adapter - Configuration management using TOML files

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::errors::*;
use crate::ports::LogLevel;

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressConfig {
    /// Private directory for compressed outputs and thumbnails
    pub scratch_dir: PathBuf,
    /// Explicit ffmpeg binary; resolved on `PATH` when unset
    pub ffmpeg_path: Option<PathBuf>,
    /// Explicit ffprobe binary; resolved on `PATH` when unset
    pub ffprobe_path: Option<PathBuf>,
    pub log_level: String,
    pub json_logs: bool,
    pub video_codec: String,
    pub audio_codec: String,
    pub encoder_preset: String,
    /// Encoder threads; derived from the CPU count when unset
    pub threads: Option<usize>,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir().join("video_compress"),
            ffmpeg_path: None,
            ffprobe_path: None,
            log_level: "info".to_string(),
            json_logs: false,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            encoder_preset: "medium".to_string(),
            threads: None,
        }
    }
}

impl CompressConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), DomainError> {
        LogLevel::parse(&self.log_level)?;
        if self.scratch_dir.as_os_str().is_empty() {
            return Err(DomainError::ConfigFail(
                "scratch_dir cannot be empty".to_string(),
            ));
        }
        if self.threads == Some(0) {
            return Err(DomainError::ConfigFail(
                "threads must be at least 1".to_string(),
            ));
        }
        for (key, value) in [
            ("video_codec", &self.video_codec),
            ("audio_codec", &self.audio_codec),
            ("encoder_preset", &self.encoder_preset),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::ConfigFail(format!("{} cannot be empty", key)));
            }
        }
        Ok(())
    }

    pub fn log_level(&self) -> Result<LogLevel, DomainError> {
        LogLevel::parse(&self.log_level)
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct ConfigFile {
    #[serde(default)]
    video_compress: CompressConfig,
}

/// TOML configuration loader
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Parse a `[video_compress]` table; missing keys keep their defaults
    pub fn parse(toml_content: &str) -> Result<CompressConfig, DomainError> {
        let file: ConfigFile = toml::from_str(toml_content)
            .map_err(|e| DomainError::ConfigFail(format!("Failed to parse TOML config: {}", e)))?;
        Ok(file.video_compress)
    }

    /// Load configuration from file
    pub fn load(file_path: &Path) -> Result<CompressConfig, DomainError> {
        let content = std::fs::read_to_string(file_path).map_err(|e| {
            DomainError::ConfigFail(format!(
                "Failed to read config file {}: {}",
                file_path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }

    /// Save configuration to file
    pub fn save(config: &CompressConfig, file_path: &Path) -> Result<(), DomainError> {
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DomainError::ConfigFail(format!("Failed to create config directory: {}", e))
            })?;
        }
        let content = toml::to_string_pretty(&ConfigFile {
            video_compress: config.clone(),
        })
        .map_err(|e| DomainError::ConfigFail(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(file_path, content)
            .map_err(|e| DomainError::ConfigFail(format!("Failed to write config file: {}", e)))
    }

    /// Candidate config locations, most specific first
    pub fn default_locations() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("video_compress.toml")];
        if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(config_home).join("video-compress").join("config.toml"));
        } else if let Some(home) = std::env::var_os("HOME") {
            paths.push(
                PathBuf::from(home)
                    .join(".config")
                    .join("video-compress")
                    .join("config.toml"),
            );
        }
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = TomlConfigAdapter::parse(
            r#"
            [video_compress]
            scratch_dir = "/var/tmp/vc"
            threads = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.scratch_dir, PathBuf::from("/var/tmp/vc"));
        assert_eq!(config.threads, Some(2));
        assert_eq!(config.video_codec, "libx264");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(
            TomlConfigAdapter::parse("").unwrap(),
            CompressConfig::default()
        );
    }

    #[test]
    fn invalid_toml_is_config_error() {
        assert!(matches!(
            TomlConfigAdapter::parse("[video_compress\nthreads ="),
            Err(DomainError::ConfigFail(_))
        ));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = CompressConfig::default();
        assert!(config.validate().is_ok());

        config.threads = Some(0);
        assert!(config.validate().is_err());

        config.threads = None;
        config.log_level = "chatty".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = CompressConfig {
            json_logs: true,
            encoder_preset: "fast".to_string(),
            ..Default::default()
        };

        TomlConfigAdapter::save(&config, &path).unwrap();
        assert_eq!(TomlConfigAdapter::load(&path).unwrap(), config);
    }
}
