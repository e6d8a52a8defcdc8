// src/model/mod.rs
//! Classifier collaborators
//!
//! The neural networks themselves live outside this crate. They are reached
//! through the [`Classifier`] trait and selected from a [`ModelRegistry`]
//! by a [`ModelKind`], the closed set of supported model identifiers.

pub mod thresholds;

pub use thresholds::{ThresholdRegistry, ThresholdTable};

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, ConfigError};

/// Supported model identifiers, each with a fixed window length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelKind {
    /// CNN over 2 second windows
    #[serde(rename = "cnn2s")]
    Cnn2s,
    /// CNN over 5 second windows
    #[serde(rename = "cnn5s")]
    Cnn5s,
    /// LSTM over 2 second windows
    #[serde(rename = "lstm2s")]
    Lstm2s,
    /// Omni-Scale CNN over 2 second windows
    #[serde(rename = "oscnn2s")]
    OsCnn2s,
}

/// Network family behind a model identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    /// Convolutional network
    Cnn,
    /// Long short-term memory network
    Lstm,
    /// Omni-scale convolutional network
    OmniScaleCnn,
}

impl ModelKind {
    /// Every supported model
    pub const ALL: [ModelKind; 4] = [
        ModelKind::Cnn2s,
        ModelKind::Cnn5s,
        ModelKind::Lstm2s,
        ModelKind::OsCnn2s,
    ];

    /// Wire name of the model
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Cnn2s => "cnn2s",
            ModelKind::Cnn5s => "cnn5s",
            ModelKind::Lstm2s => "lstm2s",
            ModelKind::OsCnn2s => "oscnn2s",
        }
    }

    /// Window duration in seconds
    pub fn window_seconds(&self) -> usize {
        match self {
            ModelKind::Cnn5s => 5,
            ModelKind::Cnn2s | ModelKind::Lstm2s | ModelKind::OsCnn2s => 2,
        }
    }

    /// Window length in samples at `sampling_rate_hz`
    pub fn input_length(&self, sampling_rate_hz: u32) -> usize {
        self.window_seconds() * sampling_rate_hz as usize
    }

    /// Network family of the model
    pub fn architecture(&self) -> Architecture {
        match self {
            ModelKind::Cnn2s | ModelKind::Cnn5s => Architecture::Cnn,
            ModelKind::Lstm2s => Architecture::Lstm,
            ModelKind::OsCnn2s => Architecture::OmniScaleCnn,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownModel(s.to_string()))
    }
}

/// A pretrained window classifier
///
/// Implementations are treated as pure functions from a window of
/// `input_length()` samples to a score in [0, 1]. They must be safe to call
/// from several threads at once.
pub trait Classifier: Send + Sync {
    /// Number of samples in every window passed to [`classify`](Self::classify)
    fn input_length(&self) -> usize;

    /// Score one window
    fn classify(&self, window: &[f32]) -> Result<f32, ClassifierError>;
}

impl<C: Classifier + ?Sized> Classifier for Arc<C> {
    fn input_length(&self) -> usize {
        (**self).input_length()
    }

    fn classify(&self, window: &[f32]) -> Result<f32, ClassifierError> {
        (**self).classify(window)
    }
}

/// Source of classifiers keyed by model identifier
pub trait ModelRegistry {
    /// Classifier for `model`, if one is available
    fn classifier(&self, model: ModelKind) -> Option<Arc<dyn Classifier>>;
}

/// Registry backed by a map of already constructed classifiers
#[derive(Clone, Default)]
pub struct InMemoryModelRegistry {
    models: HashMap<ModelKind, Arc<dyn Classifier>>,
}

impl InMemoryModelRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `classifier` for `model`, replacing any previous one
    pub fn register(
        &mut self,
        model: ModelKind,
        classifier: impl Classifier + 'static,
    ) -> &mut Self {
        self.models.insert(model, Arc::new(classifier));
        self
    }

    /// Builder form of [`register`](Self::register)
    pub fn with(mut self, model: ModelKind, classifier: impl Classifier + 'static) -> Self {
        self.register(model, classifier);
        self
    }

    /// Whether a classifier is registered for `model`
    pub fn contains(&self, model: ModelKind) -> bool {
        self.models.contains_key(&model)
    }

    /// Number of registered classifiers
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether no classifier is registered
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl ModelRegistry for InMemoryModelRegistry {
    fn classifier(&self, model: ModelKind) -> Option<Arc<dyn Classifier>> {
        self.models.get(&model).cloned()
    }
}

impl fmt::Debug for InMemoryModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut models: Vec<_> = self.models.keys().collect();
        models.sort();
        f.debug_struct("InMemoryModelRegistry")
            .field("models", &models)
            .finish()
    }
}

/// Classifier adapter over a closure
pub struct FnClassifier<F> {
    input_length: usize,
    score: F,
}

impl<F> FnClassifier<F>
where
    F: Fn(&[f32]) -> Result<f32, ClassifierError> + Send + Sync,
{
    /// Classifier taking `input_length`-sample windows scored by `score`
    pub fn new(input_length: usize, score: F) -> Self {
        Self { input_length, score }
    }
}

impl FnClassifier<fn(&[f32]) -> Result<f32, ClassifierError>> {
    /// Classifier returning the same score for every window
    pub fn constant(
        input_length: usize,
        score: f32,
    ) -> FnClassifier<impl Fn(&[f32]) -> Result<f32, ClassifierError> + Send + Sync> {
        FnClassifier::new(input_length, move |_: &[f32]| Ok(score))
    }
}

impl<F> Classifier for FnClassifier<F>
where
    F: Fn(&[f32]) -> Result<f32, ClassifierError> + Send + Sync,
{
    fn input_length(&self) -> usize {
        self.input_length
    }

    fn classify(&self, window: &[f32]) -> Result<f32, ClassifierError> {
        (self.score)(window)
    }
}

impl<F> fmt::Debug for FnClassifier<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnClassifier")
            .field("input_length", &self.input_length)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_window_lengths() {
        assert_eq!(ModelKind::Cnn2s.input_length(250), 500);
        assert_eq!(ModelKind::Cnn5s.input_length(250), 1250);
        assert_eq!(ModelKind::Lstm2s.input_length(250), 500);
        assert_eq!(ModelKind::OsCnn2s.input_length(250), 500);
    }

    #[test]
    fn test_model_parsing() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.as_str().parse::<ModelKind>().unwrap(), kind);
            assert_eq!(kind.to_string(), kind.as_str());
        }
        assert!(matches!(
            "cnn3s".parse::<ModelKind>(),
            Err(ConfigError::UnknownModel(name)) if name == "cnn3s"
        ));
    }

    #[test]
    fn test_model_serde_names() {
        let json = serde_json::to_string(&ModelKind::OsCnn2s).unwrap();
        assert_eq!(json, "\"oscnn2s\"");
        let parsed: ModelKind = serde_json::from_str("\"lstm2s\"").unwrap();
        assert_eq!(parsed, ModelKind::Lstm2s);
        assert_eq!(parsed.architecture(), Architecture::Lstm);
    }

    #[test]
    fn test_registry_lookup() {
        let registry = InMemoryModelRegistry::new()
            .with(ModelKind::Cnn2s, FnClassifier::constant(500, 0.3));

        assert!(registry.contains(ModelKind::Cnn2s));
        assert!(!registry.contains(ModelKind::Cnn5s));
        assert_eq!(registry.len(), 1);

        let classifier = registry.classifier(ModelKind::Cnn2s).unwrap();
        assert_eq!(classifier.input_length(), 500);
        assert_eq!(classifier.classify(&[0.0; 500]).unwrap(), 0.3);
        assert!(registry.classifier(ModelKind::Lstm2s).is_none());
    }

    #[test]
    fn test_fn_classifier_sees_window() {
        let classifier =
            FnClassifier::new(4, |window: &[f32]| Ok(window.iter().sum::<f32>() / 4.0));
        assert_eq!(classifier.classify(&[0.0, 0.5, 0.5, 1.0]).unwrap(), 0.5);
    }
}
