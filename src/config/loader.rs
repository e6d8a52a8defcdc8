// src/config/loader.rs
//! Settings loader for TOML files with environment overrides
//!
//! A settings file carries a `[checker]` table with the fields of
//! [`CheckerSettings`] and an optional `[thresholds]` table of default
//! thresholds keyed `"<model>.<mode>"`:
//!
//! ```toml
//! [checker]
//! model = "cnn5s"
//! return_mode = "three_value"
//!
//! [thresholds]
//! "cnn5s.three_value" = [0.35, 0.75]
//! ```
//!
//! Variables named `ECG_QUALITY_<FIELD>` override the `[checker]` fields;
//! `ECG_QUALITY_THRESHOLDS` takes a comma-separated list.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::config::constants::paths;
use crate::config::CheckerSettings;
use crate::error::ConfigError;
use crate::model::ThresholdTable;

/// Settings and default thresholds read by a [`SettingsLoader`]
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSettings {
    /// Checker settings from the `[checker]` table and overrides
    pub settings: CheckerSettings,
    /// Default thresholds from the `[thresholds]` table
    pub thresholds: ThresholdTable,
}

#[derive(Debug, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    checker: CheckerSettings,
    #[serde(default)]
    thresholds: BTreeMap<String, Vec<f32>>,
}

/// Loader layering defaults, an optional file and environment variables
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    path: Option<PathBuf>,
    env_prefix: String,
}

impl SettingsLoader {
    /// Loader reading only defaults and the environment
    pub fn new() -> Self {
        Self {
            path: None,
            env_prefix: paths::ENV_PREFIX.to_string(),
        }
    }

    /// Loader reading `path` before applying environment overrides
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            ..Self::new()
        }
    }

    /// Change the environment variable prefix
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load from the configured file and the process environment
    pub fn load(&self) -> Result<LoadedSettings, ConfigError> {
        self.load_with_env(std::env::vars())
    }

    /// Load using an explicit set of environment variables
    pub fn load_with_env<I>(&self, vars: I) -> Result<LoadedSettings, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let content = match &self.path {
            Some(path) => {
                debug!(path = %path.display(), "reading quality checker settings");
                std::fs::read_to_string(path)?
            }
            None => String::new(),
        };
        self.parse(&content, vars)
    }

    /// Parse settings from a TOML string, then apply `vars` as overrides
    pub fn parse<I>(&self, content: &str, vars: I) -> Result<LoadedSettings, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut document: toml::Value = toml::from_str(content)?;
        self.apply_environment_overrides(&mut document, vars)?;

        let file: SettingsFile = document
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Parse(e.to_string()))?;

        Ok(LoadedSettings {
            settings: file.checker,
            thresholds: ThresholdTable::from_entries(file.thresholds)?,
        })
    }

    fn apply_environment_overrides<I>(
        &self,
        document: &mut toml::Value,
        vars: I,
    ) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(field) = key.strip_prefix(&self.env_prefix) else {
                continue;
            };
            let field = field.to_lowercase();

            let parsed = if field == "thresholds" {
                Self::parse_threshold_list(&value)?
            } else {
                Self::parse_env_value(&value)
            };

            debug!(variable = %key, "applying settings override");
            Self::set_checker_value(document, field, parsed);
        }
        Ok(())
    }

    fn parse_env_value(value: &str) -> toml::Value {
        if let Ok(int_val) = value.parse::<i64>() {
            toml::Value::Integer(int_val)
        } else if let Ok(float_val) = value.parse::<f64>() {
            toml::Value::Float(float_val)
        } else if let Ok(bool_val) = value.parse::<bool>() {
            toml::Value::Boolean(bool_val)
        } else {
            toml::Value::String(value.to_string())
        }
    }

    fn parse_threshold_list(value: &str) -> Result<toml::Value, ConfigError> {
        value
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<f64>()
                    .map(toml::Value::Float)
                    .map_err(|_| {
                        ConfigError::Parse(format!("threshold '{}' is not a number", part))
                    })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(toml::Value::Array)
    }

    fn set_checker_value(document: &mut toml::Value, field: String, value: toml::Value) {
        if let toml::Value::Table(root) = document {
            let checker = root
                .entry("checker".to_string())
                .or_insert_with(|| toml::Value::Table(toml::value::Table::new()));
            if let toml::Value::Table(table) = checker {
                table.insert(field, value);
            }
        }
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}
