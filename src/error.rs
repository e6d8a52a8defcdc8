// src/error.rs
//! Unified error handling for ECG quality grading
//!
//! Configuration problems are detected eagerly when a checker is built and
//! surface as [`ConfigError`]; no partially valid configuration is ever
//! produced. Once a checker exists, the only per-call failures come from the
//! external collaborators (classifier and signal cleaner), and they are
//! carried to the caller unmodified inside [`QualityError`].

use std::error::Error;
use thiserror::Error;

use crate::config::ReturnMode;
use crate::model::ModelKind;

/// Result type alias for quality grading operations
pub type QualityResult<T> = Result<T, QualityError>;

/// Errors raised while validating construction parameters or loading settings
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Model name is not one of the supported model identifiers
    #[error("'{0}' is not a known model that can be used")]
    UnknownModel(String),

    /// Return mode name is not recognised
    #[error("unknown return mode '{0}', expected score, three_value, binary_clean or binary_qrs")]
    InvalidMode(String),

    /// Threshold count or values do not fit the classification mode
    #[error("invalid thresholds for {mode} mode: {reason}")]
    InvalidThresholds {
        /// Mode the thresholds were given for
        mode: ReturnMode,
        /// What is wrong with them
        reason: String,
    },

    /// Output granularity name is not recognised
    #[error("return type needs to be one of: intervals, full (got '{0}')")]
    InvalidGranularity(String),

    /// The classifiers were trained at a single fixed rate
    #[error("sampling rate of {requested} Hz is not supported, ECG must be {supported} Hz")]
    UnsupportedSamplingRate {
        /// Rate asked for
        requested: u32,
        /// The only accepted rate
        supported: u32,
    },

    /// Stride ratio is negative or not a finite number
    #[error("stride ratio must be a non-negative finite number (got {0})")]
    InvalidStride(f32),

    /// Degeneracy range is negative or not a finite number
    #[error("window minimum range must be a non-negative finite number (got {0})")]
    InvalidWindowRange(f32),

    /// Model name is valid but the registry holds no classifier for it
    #[error("no classifier is registered for model {0}")]
    ModelUnavailable(ModelKind),

    /// Registered classifier disagrees with the window length of its model
    #[error("{model} classifier takes {actual}-sample windows, the model defines {expected}")]
    InputLengthMismatch {
        /// Model the classifier was registered for
        model: ModelKind,
        /// Window length defined by the model
        expected: usize,
        /// Window length the classifier takes
        actual: usize,
    },

    /// Settings file could not be read
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file or override could not be parsed
    #[error("failed to parse settings: {0}")]
    Parse(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Failure reported by a classifier collaborator
#[derive(Debug, Error)]
#[error("classifier failed: {message}")]
pub struct ClassifierError {
    message: String,
    #[source]
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl ClassifierError {
    /// Create an error from a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an error wrapping an underlying cause
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Error message without the source chain
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure reported by a signal cleaner collaborator
#[derive(Debug, Error)]
pub enum CleaningError {
    /// Filter parameters cannot be realised at the sampling rate
    #[error("invalid cleaning parameters: {0}")]
    InvalidParameters(String),

    /// Cleaner output length differs from its input
    #[error("cleaner changed the signal length from {expected} to {actual} samples")]
    LengthChanged {
        /// Input length
        expected: usize,
        /// Output length
        actual: usize,
    },
}

/// Pipeline stage an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Settings validation
    Configuration,
    /// Signal cleaning
    Cleaning,
    /// Window classification
    Scoring,
}

/// Error returned by the public processing entry points
#[derive(Debug, Error)]
pub enum QualityError {
    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Classifier failure, unmodified
    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    /// Cleaner failure
    #[error(transparent)]
    Cleaning(#[from] CleaningError),
}

impl QualityError {
    /// Stage of the pipeline that produced this error
    pub fn stage(&self) -> ProcessingStage {
        match self {
            QualityError::Config(_) => ProcessingStage::Configuration,
            QualityError::Classifier(_) => ProcessingStage::Scoring,
            QualityError::Cleaning(_) => ProcessingStage::Cleaning,
        }
    }
}
