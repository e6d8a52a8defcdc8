//! ECG-Quality: sliding-window signal quality grading for single-lead ECG
//!
//! A single-lead ECG recording sampled at 250 Hz is cut into fixed-length,
//! overlapping windows. Each window is scored by a pretrained classifier,
//! overlapping scores are averaged back onto the signal timeline, and the
//! averages are optionally thresholded into quality categories. It features:
//!
//! - Four classifier variants with 2 s and 5 s windows
//! - Continuous, binary and three-level output modes
//! - Sample-resolution or stride-interval output
//! - Degenerate (flat) window detection without invoking the classifier
//! - Sequential and rayon-parallel window scoring with identical results
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ecg_quality::{
//!     CheckerSettings, EcgQualityChecker, FnClassifier, InMemoryModelRegistry, ModelKind,
//!     ReturnMode, ThresholdTable,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Any pretrained model behind the `Classifier` trait
//!     let models = InMemoryModelRegistry::new()
//!         .with(ModelKind::Cnn2s, FnClassifier::constant(500, 0.2));
//!
//!     let settings = CheckerSettings::for_model(ModelKind::Cnn2s)
//!         .with_mode(ReturnMode::BinaryClean)
//!         .with_thresholds(vec![0.5]);
//!     let checker = EcgQualityChecker::new(&settings, &models, &ThresholdTable::new())?;
//!
//!     let signal = vec![0.0_f32; 2500];
//!     let quality = checker.process_signal(&signal)?;
//!     for segment in quality.segments() {
//!         println!("{:?}", segment);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod checker;
pub mod config;
pub mod error;
pub mod model;
pub mod processing;

// Re-export commonly used types for convenience
pub use checker::EcgQualityChecker;

pub use config::{
    CheckerSettings, Classification, Granularity, LoadedSettings, ProcessingConfig, ReturnMode,
    SettingsLoader,
};

pub use error::{
    ClassifierError, CleaningError, ConfigError, ProcessingStage, QualityError, QualityResult,
};

pub use model::{
    Architecture, Classifier, FnClassifier, InMemoryModelRegistry, ModelKind, ModelRegistry,
    ThresholdRegistry, ThresholdTable,
};

pub use processing::{
    EcgCleaner, NoopCleaner, QualityClass, QualityOutput, QualitySegment, QualityValues,
    SignalCleaner,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: "Sliding-window ECG signal quality grading".to_string(),
        models: ModelKind::ALL.iter().map(|m| m.as_str().to_string()).collect(),
        modes: ReturnMode::ALL.iter().map(|m| m.as_str().to_string()).collect(),
    }
}

/// Library version information
#[derive(Debug, Clone)]
pub struct VersionInfo {
    /// Library name
    pub name: String,
    /// Version string
    pub version: String,
    /// Description
    pub description: String,
    /// Supported model identifiers
    pub models: Vec<String>,
    /// Supported return modes
    pub modes: Vec<String>,
}
