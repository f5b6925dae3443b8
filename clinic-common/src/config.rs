//! Configuration locations and the observability section.
//!
//! All configuration lives in one directory, `~/.clinic-valuation` unless
//! `CLINIC_VALUATION_HOME` points elsewhere (a leading `~` is expanded).
//!
//! # Configuration Priority
//!
//! 1. Environment variables (`CLINIC_VALUATION_*` prefix)
//! 2. Modular files (`calibration.json`, `benchmarks.json`)
//! 3. Base `config.json`
//! 4. Default values
//!
//! # Environment Variable Mapping
//!
//! - `CLINIC_VALUATION_HOME` → configuration directory
//! - `CLINIC_VALUATION_LOG_LEVEL` → observability.log_level
//! - `CLINIC_VALUATION_LOG_FORMAT` → observability.log_format

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::validation::{Validate, ValidationError, ValidationResult, Violations};

/// Environment variable prefix shared by every override.
pub const ENV_PREFIX: &str = "CLINIC_VALUATION_";

const DEFAULT_DIR_NAME: &str = ".clinic-valuation";

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    if let Some(dir) = env_var("HOME") {
        return PathBuf::from(shellexpand::tilde(&dir).into_owned());
    }

    directories::UserDirs::new().map_or_else(
        || PathBuf::from(DEFAULT_DIR_NAME),
        |dirs| dirs.home_dir().join(DEFAULT_DIR_NAME),
    )
}

/// Get the base configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Read `CLINIC_VALUATION_<suffix>`, ignoring empty values.
pub fn env_var(suffix: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{suffix}"))
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// Read and parse `CLINIC_VALUATION_<suffix>`.
///
/// Unparseable values are logged and ignored so a typo in the environment
/// falls back to the file value rather than aborting.
pub fn env_parse<T: std::str::FromStr>(suffix: &str) -> Option<T> {
    let raw = env_var(suffix)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(
                variable = %format!("{ENV_PREFIX}{suffix}"),
                value = %raw,
                "Ignoring unparseable override"
            );
            None
        }
    }
}

// ============================================================================
// Observability Configuration
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Base log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Output format: "json" or "pretty"
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

impl ObservabilityConfig {
    /// Apply `CLINIC_VALUATION_LOG_LEVEL` / `CLINIC_VALUATION_LOG_FORMAT`.
    pub fn apply_env_overrides(&mut self) {
        if let Some(level) = env_var("LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(format) = env_var("LOG_FORMAT") {
            self.log_format = format;
        }
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            v.push(ValidationError::InvalidValue {
                field: "observability.log_level".into(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.log_format.to_lowercase().as_str()) {
            v.push(ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            });
        }

        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_observability_is_valid() {
        assert!(ObservabilityConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_log_level_and_format() {
        let config = ObservabilityConfig {
            log_level: "loud".into(),
            log_format: "xml".into(),
        };
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.fields(),
            vec!["observability.log_level", "observability.log_format"]
        );
    }

    #[test]
    fn test_observability_deserializes_with_defaults() {
        let config: ObservabilityConfig = serde_json::from_str(r#"{"log_level":"debug"}"#).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, "pretty");
    }

    #[test]
    fn test_config_path_is_inside_config_dir() {
        assert!(config_path().starts_with(config_dir()));
        assert!(config_path().ends_with("config.json"));
    }
}
