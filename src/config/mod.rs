// src/config/mod.rs
//! Checker configuration: raw settings, validation and loading

pub mod constants;
pub mod loader;
pub mod processing_config;

pub use constants::*;
pub use loader::{LoadedSettings, SettingsLoader};
pub use processing_config::*;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::{Classifier, ModelKind, ModelRegistry, ThresholdRegistry};

/// Raw construction arguments of a quality checker
///
/// Names are kept as strings so that settings read from files or the
/// environment are validated by the same code path as programmatic ones.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CheckerSettings {
    /// Model identifier, e.g. `cnn2s`
    #[serde(default = "defaults::model")]
    pub model: String,

    /// Step between windows as a ratio of the window length
    #[serde(default = "defaults::stride")]
    pub stride: f32,

    /// One of `score`, `three_value`, `binary_clean`, `binary_qrs`
    #[serde(default = "defaults::return_mode")]
    pub return_mode: String,

    /// Explicit thresholds; the default registry is consulted when absent
    #[serde(default)]
    pub thresholds: Option<Vec<f32>>,

    /// `full` or `intervals`
    #[serde(default = "defaults::return_type")]
    pub return_type: String,

    /// Input sampling rate; only 250 Hz is accepted
    #[serde(default = "defaults::sampling_rate_hz")]
    pub sampling_rate_hz: u32,

    /// Clean the signal before scoring
    #[serde(default = "defaults::clean_data")]
    pub clean_data: bool,

    /// Force near-flat windows to the worst quality score
    #[serde(default = "defaults::check_window_range")]
    pub check_window_range: bool,

    /// Minimum max-min range (mV) used by the window range check
    #[serde(default = "defaults::window_min_range")]
    pub window_min_range: f32,
}

/// Default value providers using constants
mod defaults {
    use crate::config::constants::*;

    pub fn model() -> String { "cnn2s".to_string() }
    pub fn stride() -> f32 { windowing::DEFAULT_STRIDE_RATIO }
    pub fn return_mode() -> String { "score".to_string() }
    pub fn return_type() -> String { "full".to_string() }
    pub fn sampling_rate_hz() -> u32 { signal::DEFAULT_SAMPLING_RATE_HZ }
    pub fn clean_data() -> bool { true }
    pub fn check_window_range() -> bool { quality::DEFAULT_CHECK_WINDOW_RANGE }
    pub fn window_min_range() -> f32 { quality::DEFAULT_WINDOW_MIN_RANGE_MV }
}

impl Default for CheckerSettings {
    fn default() -> Self {
        Self {
            model: defaults::model(),
            stride: defaults::stride(),
            return_mode: defaults::return_mode(),
            thresholds: None,
            return_type: defaults::return_type(),
            sampling_rate_hz: defaults::sampling_rate_hz(),
            clean_data: defaults::clean_data(),
            check_window_range: defaults::check_window_range(),
            window_min_range: defaults::window_min_range(),
        }
    }
}

impl CheckerSettings {
    /// Settings for `model` with every other field at its default
    pub fn for_model(model: ModelKind) -> Self {
        Self {
            model: model.as_str().to_string(),
            ..Self::default()
        }
    }

    /// Set the return mode
    pub fn with_mode(mut self, mode: ReturnMode) -> Self {
        self.return_mode = mode.as_str().to_string();
        self
    }

    /// Set explicit thresholds
    pub fn with_thresholds(mut self, thresholds: Vec<f32>) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    /// Set the output granularity
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.return_type = granularity.as_str().to_string();
        self
    }

    /// Set the stride ratio
    pub fn with_stride(mut self, ratio: f32) -> Self {
        self.stride = ratio;
        self
    }

    /// Enable or disable signal cleaning
    pub fn with_cleaning(mut self, clean_data: bool) -> Self {
        self.clean_data = clean_data;
        self
    }

    /// Configure the near-flat window check
    pub fn with_window_range_check(mut self, enabled: bool, min_range: f32) -> Self {
        self.check_window_range = enabled;
        self.window_min_range = min_range;
        self
    }

    /// Validate the settings into an immutable [`ProcessingConfig`].
    ///
    /// Checks run in a fixed order and the first violation is returned:
    /// model name, return mode, thresholds, return type, sampling rate,
    /// stride, window range. The classifier registry is not consulted here.
    pub fn resolve(
        &self,
        defaults: &dyn ThresholdRegistry,
    ) -> Result<ProcessingConfig, ConfigError> {
        let model: ModelKind = self.model.parse()?;
        let mode: ReturnMode = self.return_mode.parse()?;

        let classification = match (&self.thresholds, mode) {
            (Some(thresholds), _) => Classification::from_thresholds(mode, thresholds)?,
            (None, ReturnMode::Score) => Classification::Score,
            (None, _) => {
                let thresholds = defaults.lookup(model, mode).ok_or_else(|| {
                    ConfigError::InvalidThresholds {
                        mode,
                        reason: format!("no default thresholds are registered for model {}", model),
                    }
                })?;
                Classification::from_thresholds(mode, &thresholds)?
            }
        };

        let granularity: Granularity = self.return_type.parse()?;

        if self.sampling_rate_hz != signal::SUPPORTED_SAMPLING_RATE_HZ {
            return Err(ConfigError::UnsupportedSamplingRate {
                requested: self.sampling_rate_hz,
                supported: signal::SUPPORTED_SAMPLING_RATE_HZ,
            });
        }

        let window_length = model.input_length(self.sampling_rate_hz);
        let stride = resolve_stride(window_length, self.stride, self.sampling_rate_hz)?;

        if !self.window_min_range.is_finite() || self.window_min_range < 0.0 {
            return Err(ConfigError::InvalidWindowRange(self.window_min_range));
        }

        Ok(ProcessingConfig::new(
            model,
            window_length,
            stride,
            classification,
            granularity,
            self.sampling_rate_hz,
            self.clean_data,
            self.check_window_range,
            self.window_min_range,
        ))
    }

    /// Validate the settings and fetch the classifier for the chosen model.
    ///
    /// Fails fast when the registry has no classifier for the model or the
    /// classifier's window length disagrees with the model definition.
    pub fn validate(
        &self,
        models: &dyn ModelRegistry,
        defaults: &dyn ThresholdRegistry,
    ) -> Result<(ProcessingConfig, Arc<dyn Classifier>), ConfigError> {
        let config = self.resolve(defaults)?;
        let model = config.model();

        let classifier = models
            .classifier(model)
            .ok_or(ConfigError::ModelUnavailable(model))?;

        config.check_classifier(classifier.as_ref())?;

        Ok((config, classifier))
    }

    /// Serialize settings as a TOML `[checker]` document
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        #[derive(Serialize)]
        struct Document<'a> {
            checker: &'a CheckerSettings,
        }

        toml::to_string_pretty(&Document { checker: self })
            .map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
