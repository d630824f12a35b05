//! Loading `config.ini`.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::{Ini, Properties};
use thiserror::Error;

use super::MapConfig;
use crate::tile::Viewport;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read or parse the config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl MapConfig {
    /// Load configuration from the default path.
    ///
    /// A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }
}

/// Get the path to the config directory.
pub fn config_directory() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("movingmap")
}

/// Get the path to the config file.
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

/// Overlays the values found in `ini` onto the defaults.
fn parse_ini(ini: &Ini) -> Result<MapConfig, ConfigFileError> {
    let mut config = MapConfig::default();

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = non_empty(section, "directory") {
            config.cache.directory = PathBuf::from(v);
        }
        if let Some(v) = section.get("texture_capacity") {
            config.cache.texture_capacity =
                parse_limit("cache", "texture_capacity", v, "must be a positive integer")?;
        }
        if let Some(v) = section.get("corrupt_tiles") {
            config.cache.corrupt_tiles =
                v.parse().map_err(|reason| ConfigFileError::InvalidValue {
                    section: "cache".to_string(),
                    key: "corrupt_tiles".to_string(),
                    value: v.to_string(),
                    reason,
                })?;
        }
    }

    // [source] section
    if let Some(section) = ini.section(Some("source")) {
        if let Some(v) = non_empty(section, "host") {
            config.source.host = v.to_string();
        }
        if let Some(v) = non_empty(section, "user_agent") {
            config.source.user_agent = v.to_string();
        }
        if let Some(v) = section.get("timeout_secs") {
            config.source.timeout_secs = parse_value(
                "source",
                "timeout_secs",
                v,
                "must be a non-negative integer (seconds, 0 disables)",
            )?;
        }
        if let Some(v) = section.get("max_concurrent_fetches") {
            config.source.max_concurrent_fetches = parse_limit(
                "source",
                "max_concurrent_fetches",
                v,
                "must be a positive integer",
            )?;
        }
    }

    // [telemetry] section
    if let Some(section) = ini.section(Some("telemetry")) {
        if let Some(v) = non_empty(section, "address") {
            config.telemetry.address = v.to_string();
        }
    }

    // [view] section
    if let Some(section) = ini.section(Some("view")) {
        if let Some(v) = section.get("width") {
            config.view.width = parse_positive("view", "width", v, "must be a positive integer")?;
        }
        if let Some(v) = section.get("height") {
            config.view.height = parse_positive("view", "height", v, "must be a positive integer")?;
        }
        if let Some(v) = section.get("zoom") {
            let zoom: u8 = parse_value("view", "zoom", v, "must be an integer between 1 and 19")?;
            config.view.zoom = Viewport::clamp_zoom(zoom);
        }
    }

    Ok(config)
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_value<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn parse_positive<T: FromStr + PartialOrd + Default>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    let parsed: T = parse_value(section, key, value, reason)?;
    if parsed <= T::default() {
        return Err(invalid(section, key, value, reason));
    }
    Ok(parsed)
}

/// Parses an optional bound. Empty, `none` and `unbounded` mean no bound.
fn parse_limit<T: FromStr + PartialOrd + Default>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<Option<T>, ConfigFileError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "none" | "unbounded" => Ok(None),
        _ => parse_positive(section, key, value, reason).map(Some),
    }
}
