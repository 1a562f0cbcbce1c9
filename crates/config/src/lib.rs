// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process configuration: the `CHENGIS_*` environment variables consumed by
//! the daemon binary, plus the `tracing`/`tracing-subscriber` logging setup
//! that reads two of them.
//!
//! Nothing else in the workspace reads `std::env` directly — every other
//! crate receives a fully-resolved `Config` value.

mod logging;

pub use logging::{init_logging, LogFormat, LoggingError};

use std::time::Duration;
use thiserror::Error;

/// Everything the daemon needs at startup, resolved once from the process
/// environment (and, in the future, an optional TOML file layered under it).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub log_format: LogFormat,
    pub log_level: String,
    pub metrics_enabled: bool,
    pub metrics_path: String,
    pub bind_addr: String,
    pub workspace_root: std::path::PathBuf,
    pub fallback_local: bool,
    pub queue_enabled: bool,
    pub circuit_threshold: u32,
    pub circuit_cooldown_ms: u64,
    pub cancel_grace_ms: u64,
    pub step_output_cap_bytes: usize,
    pub stage_parallelism_cap: Option<usize>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Text,
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_path: "/metrics".to_string(),
            bind_addr: "0.0.0.0:7420".to_string(),
            workspace_root: std::env::temp_dir().join("chengis-workspaces"),
            fallback_local: true,
            queue_enabled: true,
            circuit_threshold: 3,
            circuit_cooldown_ms: 30_000,
            cancel_grace_ms: 5_000,
            step_output_cap_bytes: 1024 * 1024,
            stage_parallelism_cap: None,
        }
    }
}

impl Config {
    /// Resolve configuration from the process environment, falling back to
    /// defaults for every variable that isn't set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Config::default();

        if let Some(v) = env_str("CHENGIS_LOG_FORMAT") {
            cfg.log_format = v.parse().map_err(|_| ConfigError::InvalidValue {
                var: "CHENGIS_LOG_FORMAT",
                value: v,
            })?;
        }
        if let Some(v) = env_str("CHENGIS_LOG_LEVEL") {
            cfg.log_level = v;
        }
        if let Some(v) = env_bool("CHENGIS_METRICS_ENABLED")? {
            cfg.metrics_enabled = v;
        }
        if let Some(v) = env_str("CHENGIS_METRICS_PATH") {
            cfg.metrics_path = v;
        }
        if let Some(v) = env_str("CHENGIS_BIND_ADDR") {
            cfg.bind_addr = v;
        }
        if let Some(v) = env_str("CHENGIS_WORKSPACE_ROOT") {
            cfg.workspace_root = std::path::PathBuf::from(v);
        }
        if let Some(v) = env_bool("CHENGIS_FALLBACK_LOCAL")? {
            cfg.fallback_local = v;
        }
        if let Some(v) = env_bool("CHENGIS_QUEUE_ENABLED")? {
            cfg.queue_enabled = v;
        }
        if let Some(v) = env_u64("CHENGIS_CIRCUIT_THRESHOLD")? {
            cfg.circuit_threshold = v as u32;
        }
        if let Some(v) = env_u64("CHENGIS_CIRCUIT_COOLDOWN_MS")? {
            cfg.circuit_cooldown_ms = v;
        }
        if let Some(v) = env_u64("CHENGIS_STAGE_PARALLELISM_CAP")? {
            cfg.stage_parallelism_cap = Some(v as usize);
        }

        Ok(cfg)
    }

    pub fn circuit_cooldown(&self) -> Duration {
        Duration::from_millis(self.circuit_cooldown_ms)
    }

    pub fn cancel_grace(&self) -> Duration {
        Duration::from_millis(self.cancel_grace_ms)
    }
}

fn env_str(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|s| !s.is_empty())
}

fn env_bool(var: &'static str) -> Result<Option<bool>, ConfigError> {
    match env_str(var) {
        None => Ok(None),
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue { var, value: v }),
        },
    }
}

fn env_u64(var: &'static str) -> Result<Option<u64>, ConfigError> {
    match env_str(var) {
        None => Ok(None),
        Some(v) => v
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { var, value: v }),
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
