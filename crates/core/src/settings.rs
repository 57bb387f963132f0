// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed configuration bag with per-key validation.
//!
//! Seven of the eight keys are persisted as overrides in the store's `config`
//! table; `db_path` lives in the `queuectl.toml` sidecar next to the database
//! because it must be known before the database can be opened.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default database file name, relative to the data directory.
pub const DEFAULT_DB_PATH: &str = "queuectl.db";

/// Every recognized configuration key, in display order.
pub const KEYS: [&str; 8] = [
    "max_retries",
    "backoff_base",
    "backoff_max_delay",
    "worker_poll_interval",
    "worker_heartbeat_interval",
    "job_timeout",
    "db_path",
    "log_level",
];

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },

    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config file error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config file error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Worker log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

crate::simple_display! {
    LogLevel {
        Debug => "DEBUG",
        Info => "INFO",
        Warning => "WARNING",
        Error => "ERROR",
    }
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" | "WARN" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// The typed settings bag. All intervals and timeouts are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub max_retries: u32,
    pub backoff_base: f64,
    pub backoff_max_delay: u64,
    pub worker_poll_interval: u64,
    pub worker_heartbeat_interval: u64,
    pub job_timeout: u64,
    pub db_path: String,
    pub log_level: LogLevel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: 2.0,
            backoff_max_delay: 3600,
            worker_poll_interval: 1,
            worker_heartbeat_interval: 5,
            job_timeout: 300,
            db_path: DEFAULT_DB_PATH.to_string(),
            log_level: LogLevel::Info,
        }
    }
}

impl Settings {
    /// Set `key` from its string form, validating the schema constraints.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        match key {
            "max_retries" => {
                let parsed = parse_min_int(key, value, 1)?;
                if parsed > u64::from(u32::MAX) {
                    return Err(SettingsError::Invalid {
                        key: key.to_string(),
                        reason: "out of range".to_string(),
                    });
                }
                self.max_retries = parsed as u32;
            }
            "backoff_base" => self.backoff_base = parse_base(key, value)?,
            "backoff_max_delay" => self.backoff_max_delay = parse_min_int(key, value, 1)?,
            "worker_poll_interval" => self.worker_poll_interval = parse_min_int(key, value, 1)?,
            "worker_heartbeat_interval" => {
                self.worker_heartbeat_interval = parse_min_int(key, value, 1)?
            }
            "job_timeout" => self.job_timeout = parse_min_int(key, value, 1)?,
            "db_path" => {
                if value.is_empty() {
                    return Err(SettingsError::Invalid {
                        key: key.to_string(),
                        reason: "must be non-empty".to_string(),
                    });
                }
                self.db_path = value.to_string();
            }
            "log_level" => {
                self.log_level = value.parse().map_err(|reason| SettingsError::Invalid {
                    key: key.to_string(),
                    reason,
                })?
            }
            other => return Err(SettingsError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// The string form of `key`'s current value.
    pub fn value(&self, key: &str) -> Result<String, SettingsError> {
        match key {
            "max_retries" => Ok(self.max_retries.to_string()),
            "backoff_base" => Ok(fmt_number(self.backoff_base)),
            "backoff_max_delay" => Ok(self.backoff_max_delay.to_string()),
            "worker_poll_interval" => Ok(self.worker_poll_interval.to_string()),
            "worker_heartbeat_interval" => Ok(self.worker_heartbeat_interval.to_string()),
            "job_timeout" => Ok(self.job_timeout.to_string()),
            "db_path" => Ok(self.db_path.clone()),
            "log_level" => Ok(self.log_level.to_string()),
            other => Err(SettingsError::UnknownKey(other.to_string())),
        }
    }

    /// Restore `key` to its default.
    pub fn reset_key(&mut self, key: &str) -> Result<(), SettingsError> {
        let defaults = Settings::default();
        let value = defaults.value(key)?;
        self.apply(key, &value)
    }

    /// All keys with their current string values, in display order.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        KEYS.iter()
            .map(|key| {
                let value = match self.value(key) {
                    Ok(v) => v,
                    Err(_) => unreachable!("KEYS only contains known keys"),
                };
                (*key, value)
            })
            .collect()
    }
}

fn parse_min_int(key: &str, value: &str, min: u64) -> Result<u64, SettingsError> {
    let parsed: u64 = value.parse().map_err(|_| SettingsError::Invalid {
        key: key.to_string(),
        reason: format!("must be an integer >= {min}"),
    })?;
    if parsed < min {
        return Err(SettingsError::Invalid {
            key: key.to_string(),
            reason: format!("must be an integer >= {min}"),
        });
    }
    Ok(parsed)
}

fn parse_base(key: &str, value: &str) -> Result<f64, SettingsError> {
    let parsed: f64 = value.parse().map_err(|_| SettingsError::Invalid {
        key: key.to_string(),
        reason: "must be a number >= 1".to_string(),
    })?;
    if !parsed.is_finite() || parsed < 1.0 {
        return Err(SettingsError::Invalid {
            key: key.to_string(),
            reason: "must be a number >= 1".to_string(),
        });
    }
    Ok(parsed)
}

fn fmt_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

// ── db_path sidecar ─────────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    db_path: Option<String>,
}

/// Read the `db_path` override from the sidecar, if the file exists.
pub fn read_db_path_override(path: &Path) -> Result<Option<String>, SettingsError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)?;
    let file: SettingsFile = toml::from_str(&raw)?;
    Ok(file.db_path)
}

/// Write the `db_path` override to the sidecar (overwrites).
pub fn write_db_path_override(path: &Path, db_path: &str) -> Result<(), SettingsError> {
    let file = SettingsFile {
        db_path: Some(db_path.to_string()),
    };
    std::fs::write(path, toml::to_string(&file)?)?;
    Ok(())
}

/// Remove the sidecar override, restoring the default `db_path`.
pub fn clear_db_path_override(path: &Path) -> Result<(), SettingsError> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
