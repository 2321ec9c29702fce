// Tracing log adapter - Structured logging using tracing crate

use std::sync::Mutex;

use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use crate::domain::errors::*;
use crate::ports::*;

/// Tracing log adapter with a runtime-adjustable filter
pub struct TracingLogAdapter {
    current_level: Mutex<LogLevel>,
    handle: Option<reload::Handle<EnvFilter, Registry>>,
}

impl TracingLogAdapter {
    /// Install the global subscriber and keep a handle to its filter.
    ///
    /// `RUST_LOG`, when set, wins over `level` for the initial filter.
    pub fn install(level: LogLevel, json: bool) -> Result<Self, DomainError> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));
        let (filter, handle) = reload::Layer::new(filter);

        let registry = tracing_subscriber::registry().with(filter);
        // stdout carries command results
        let result = if json {
            registry
                .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
                .try_init()
        } else {
            registry
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .try_init()
        };
        result.map_err(|e| {
            DomainError::InitializationFailed(format!("Failed to install log subscriber: {}", e))
        })?;

        Ok(Self {
            current_level: Mutex::new(level),
            handle: Some(handle),
        })
    }

    /// Adapter that only records the level, for embedding without a subscriber
    pub fn detached(level: LogLevel) -> Self {
        Self {
            current_level: Mutex::new(level),
            handle: None,
        }
    }
}

impl LogPort for TracingLogAdapter {
    fn set_log_level(&self, level: LogLevel) -> Result<(), DomainError> {
        if let Some(handle) = &self.handle {
            handle
                .reload(EnvFilter::new(level.as_directive()))
                .map_err(|e| DomainError::ConfigFail(format!("Failed to change log level: {}", e)))?;
        }
        *self.current_level.lock().unwrap_or_else(|e| e.into_inner()) = level;
        info!("Log level changed to: {:?}", level);
        Ok(())
    }

    fn log_level(&self) -> LogLevel {
        *self.current_level.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_adapter_tracks_level() {
        let adapter = TracingLogAdapter::detached(LogLevel::Info);
        assert_eq!(adapter.log_level(), LogLevel::Info);

        adapter.set_log_level(LogLevel::Error).unwrap();
        assert_eq!(adapter.log_level(), LogLevel::Error);
    }

    #[test]
    fn level_codes_follow_engine_logger() {
        assert_eq!(LogLevel::from_code(0).unwrap(), LogLevel::Trace);
        assert_eq!(LogLevel::from_code(1).unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_code(2).unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_code(3).unwrap(), LogLevel::Error);
        assert!(LogLevel::from_code(7).is_err());
    }

    #[test]
    fn level_parse_accepts_names_and_codes() {
        assert_eq!(LogLevel::parse("warning").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::parse("DEBUG").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::parse("3").unwrap(), LogLevel::Error);
        assert!(LogLevel::parse("loud").is_err());
    }
}
