// src/config/processing_config.rs
//! Resolved processing configuration
//!
//! A [`ProcessingConfig`] is produced once by validating
//! [`CheckerSettings`](super::CheckerSettings) and is read-only afterwards.
//! Every invariant the processing engine relies on is established here:
//! window and stride lengths in samples, the classification mode together
//! with its sorted thresholds, and the degeneracy check parameters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::constants::{quality, windowing};
use crate::error::ConfigError;
use crate::model::{Classifier, ModelKind};

/// How window scores are reduced into output values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnMode {
    /// Continuous mean score in [0, 1]
    #[serde(alias = "continuous")]
    Score,
    /// Three categories split by two thresholds
    ThreeValue,
    /// Class 1 against classes 2 and 3
    BinaryClean,
    /// Classes 1 and 2 against class 3
    BinaryQrs,
}

impl ReturnMode {
    /// Every mode, in documentation order
    pub const ALL: [ReturnMode; 4] = [
        ReturnMode::Score,
        ReturnMode::ThreeValue,
        ReturnMode::BinaryClean,
        ReturnMode::BinaryQrs,
    ];

    /// Wire name of the mode
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnMode::Score => "score",
            ReturnMode::ThreeValue => "three_value",
            ReturnMode::BinaryClean => "binary_clean",
            ReturnMode::BinaryQrs => "binary_qrs",
        }
    }

    /// Number of thresholds this mode consumes
    pub fn threshold_count(&self) -> usize {
        match self {
            ReturnMode::Score => 0,
            ReturnMode::BinaryClean | ReturnMode::BinaryQrs => 1,
            ReturnMode::ThreeValue => 2,
        }
    }
}

impl fmt::Display for ReturnMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReturnMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "score" | "continuous" => Ok(ReturnMode::Score),
            "three_value" => Ok(ReturnMode::ThreeValue),
            "binary_clean" => Ok(ReturnMode::BinaryClean),
            "binary_qrs" => Ok(ReturnMode::BinaryQrs),
            other => Err(ConfigError::InvalidMode(other.to_string())),
        }
    }
}

/// Resolution of the output sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// One value per input sample
    Full,
    /// One value per stride-sized interval
    Intervals,
}

impl Granularity {
    /// Wire name of the granularity
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Full => "full",
            Granularity::Intervals => "intervals",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(Granularity::Full),
            "intervals" => Ok(Granularity::Intervals),
            other => Err(ConfigError::InvalidGranularity(other.to_string())),
        }
    }
}

/// Classification mode together with its validated thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classification {
    /// Mean scores pass through
    Score,
    /// Class 1 below `threshold`, class 2 otherwise
    BinaryClean {
        /// Upper bound of clean scores
        threshold: f32,
    },
    /// Class 1 below `threshold`, class 2 otherwise
    BinaryQrs {
        /// Upper bound of scores with a detectable QRS
        threshold: f32,
    },
    /// Classes 1, 2 and 3 split at `lower` and `upper`
    ThreeValue {
        /// Upper bound of class 1, never above `upper`
        lower: f32,
        /// Upper bound of class 2
        upper: f32,
    },
}

impl Classification {
    /// Validate thresholds against the arity and range rules of `mode`.
    ///
    /// Continuous scoring accepts no thresholds at all, the binary modes
    /// exactly one and the three-value mode exactly two, all within [0, 1].
    /// The three-value pair is sorted ascending before it is stored.
    pub fn from_thresholds(mode: ReturnMode, thresholds: &[f32]) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidThresholds { mode, reason };

        if thresholds.len() != mode.threshold_count() {
            return Err(invalid(format!(
                "threshold count does not correspond to return mode: expected {}, got {}",
                mode.threshold_count(),
                thresholds.len()
            )));
        }

        if let Some(bad) = thresholds
            .iter()
            .find(|t| !(quality::MIN_SCORE..=quality::MAX_SCORE).contains(*t))
        {
            return Err(invalid(format!("threshold value {} not in 0 to 1 interval", bad)));
        }

        Ok(match mode {
            ReturnMode::Score => Classification::Score,
            ReturnMode::BinaryClean => Classification::BinaryClean { threshold: thresholds[0] },
            ReturnMode::BinaryQrs => Classification::BinaryQrs { threshold: thresholds[0] },
            ReturnMode::ThreeValue => {
                let (lower, upper) = if thresholds[0] <= thresholds[1] {
                    (thresholds[0], thresholds[1])
                } else {
                    (thresholds[1], thresholds[0])
                };
                Classification::ThreeValue { lower, upper }
            }
        })
    }

    /// Mode this classification implements
    pub fn mode(&self) -> ReturnMode {
        match self {
            Classification::Score => ReturnMode::Score,
            Classification::BinaryClean { .. } => ReturnMode::BinaryClean,
            Classification::BinaryQrs { .. } => ReturnMode::BinaryQrs,
            Classification::ThreeValue { .. } => ReturnMode::ThreeValue,
        }
    }

    /// Thresholds in ascending order
    pub fn thresholds(&self) -> Vec<f32> {
        match *self {
            Classification::Score => Vec::new(),
            Classification::BinaryClean { threshold } | Classification::BinaryQrs { threshold } => {
                vec![threshold]
            }
            Classification::ThreeValue { lower, upper } => vec![lower, upper],
        }
    }
}

/// Resolve a stride ratio into an absolute sample count.
///
/// The stride is at least one second of samples and always divides the
/// window length evenly: the smallest divisor of `window_length` that is
/// not below `max(round(ratio * window_length), sampling_rate_hz)`, or the
/// window length itself when no smaller divisor qualifies.
pub fn resolve_stride(
    window_length: usize,
    ratio: f32,
    sampling_rate_hz: u32,
) -> Result<usize, ConfigError> {
    if !ratio.is_finite() || ratio < 0.0 {
        return Err(ConfigError::InvalidStride(ratio));
    }

    let one_second = sampling_rate_hz as usize * windowing::MIN_SPAN_SECONDS;
    let requested = (ratio as f64 * window_length as f64).round() as usize;
    let candidate = requested.max(one_second).max(1);

    Ok((candidate..window_length)
        .find(|d| window_length % d == 0)
        .unwrap_or(window_length))
}

/// Immutable configuration shared by every call of a checker
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingConfig {
    model: ModelKind,
    window_length: usize,
    stride: usize,
    classification: Classification,
    granularity: Granularity,
    sampling_rate_hz: u32,
    clean_data: bool,
    check_window_range: bool,
    window_min_range: f32,
}

impl ProcessingConfig {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        model: ModelKind,
        window_length: usize,
        stride: usize,
        classification: Classification,
        granularity: Granularity,
        sampling_rate_hz: u32,
        clean_data: bool,
        check_window_range: bool,
        window_min_range: f32,
    ) -> Self {
        Self {
            model,
            window_length,
            stride,
            classification,
            granularity,
            sampling_rate_hz,
            clean_data,
            check_window_range,
            window_min_range,
        }
    }

    /// Model whose classifier scores the windows
    pub fn model(&self) -> ModelKind {
        self.model
    }

    /// Window length in samples
    pub fn window_length(&self) -> usize {
        self.window_length
    }

    /// Stride length in samples
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Classification mode with its thresholds
    pub fn classification(&self) -> Classification {
        self.classification
    }

    /// Output mode without thresholds
    pub fn mode(&self) -> ReturnMode {
        self.classification.mode()
    }

    /// Sorted threshold list
    pub fn thresholds(&self) -> Vec<f32> {
        self.classification.thresholds()
    }

    /// Output resolution
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Expected input sampling rate
    pub fn sampling_rate_hz(&self) -> u32 {
        self.sampling_rate_hz
    }

    /// Whether signals are cleaned before scoring
    pub fn clean_data(&self) -> bool {
        self.clean_data
    }

    /// Whether near-flat windows skip the classifier
    pub fn check_window_range(&self) -> bool {
        self.check_window_range
    }

    /// Minimum max-min range (mV) a window needs to be sent to the classifier
    pub fn window_min_range(&self) -> f32 {
        self.window_min_range
    }

    /// Number of output positions for a signal of `signal_length` samples
    pub fn output_length(&self, signal_length: usize) -> usize {
        match self.granularity {
            Granularity::Full => signal_length,
            Granularity::Intervals => signal_length / self.stride,
        }
    }

    /// Fail unless `classifier` takes windows of exactly this configuration's length
    pub fn check_classifier(&self, classifier: &dyn Classifier) -> Result<(), ConfigError> {
        if classifier.input_length() != self.window_length {
            return Err(ConfigError::InputLengthMismatch {
                model: self.model,
                expected: self.window_length,
                actual: classifier.input_length(),
            });
        }
        Ok(())
    }
}
