//! Modular configuration loader.
//!
//! Supports loading configuration from multiple files:
//! - `config.json` - Core configuration
//! - `calibration.json` - Engine design constants (merged under `calibration`)
//! - `benchmarks.json` - Industry benchmark tables (merged under `calibration.benchmarks`)
//!
//! Files are loaded from the configuration directory with deep merging;
//! later files win.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::config_dir;
use crate::error::Error;

/// Configuration file names, in merge order.
pub const CONFIG_FILES: &[&str] = &["config.json", "calibration.json", "benchmarks.json"];

/// Where each modular file is grafted into the merged document.
const MOUNT_POINTS: &[(&str, &[&str])] = &[
    ("calibration.json", &["calibration"]),
    ("benchmarks.json", &["calibration", "benchmarks"]),
];

/// Load a JSON file and return its contents as a Value.
/// Returns None if file doesn't exist.
fn load_json_file(path: &Path) -> Result<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }

    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    Ok(Some(value))
}

/// Deep merge two JSON values.
/// Source values override target values, with object merging at each level.
pub fn merge_json(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target_map), Value::Object(source_map)) => {
            for (key, source_value) in source_map {
                match target_map.get_mut(&key) {
                    Some(target_value) => merge_json(target_value, source_value),
                    None => {
                        target_map.insert(key, source_value);
                    }
                }
            }
        }
        (target, source) => {
            *target = source;
        }
    }
}

/// Merge `source` into `root` at the nested object path `mount`,
/// creating intermediate objects as needed.
///
/// A non-object value already sitting on the path is a configuration error.
fn merge_at(root: &mut Value, file: &str, mount: &[&str], source: Value) -> Result<()> {
    let mut cursor = root;
    for key in mount {
        let Value::Object(map) = cursor else {
            return Err(Error::Config(format!(
                "{file} mounts under `{}`, which is not an object",
                mount.join(".")
            ))
            .into());
        };
        cursor = map
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Default::default()));
    }
    merge_json(cursor, source);
    Ok(())
}

/// Load modular configuration from the config directory.
///
/// Priority (lowest to highest):
/// 1. Base config.json
/// 2. Modular files (calibration.json, benchmarks.json)
/// 3. Environment variables (applied separately by the typed config)
pub fn load_modular_config(dir: Option<PathBuf>) -> Result<Value> {
    let cfg_dir = dir.unwrap_or_else(config_dir);

    tracing::debug!("Loading modular config from {}", cfg_dir.display());

    let mut config = load_json_file(&cfg_dir.join("config.json"))?
        .unwrap_or(Value::Object(Default::default()));

    for (file, mount) in MOUNT_POINTS {
        if let Some(section) = load_json_file(&cfg_dir.join(file))? {
            merge_at(&mut config, file, mount, section)?;
            tracing::debug!(file = %file, "Merged modular config file");
        }
    }

    Ok(config)
}

/// Load the merged configuration and deserialize it into `T`.
pub fn load_typed<T: DeserializeOwned>(dir: Option<PathBuf>) -> Result<T> {
    let merged = load_modular_config(dir)?;
    serde_json::from_value(merged).context("Failed to deserialize merged configuration")
}

/// Check which modular config files exist.
pub fn check_modular_files(dir: Option<PathBuf>) -> Vec<(String, bool)> {
    let cfg_dir = dir.unwrap_or_else(config_dir);

    CONFIG_FILES
        .iter()
        .map(|file| {
            let path = cfg_dir.join(file);
            (file.to_string(), path.exists())
        })
        .collect()
}
