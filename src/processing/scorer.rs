// src/processing/scorer.rs
//! Per-window scoring with the low-amplitude short-circuit

use tracing::trace;

use crate::config::constants::quality;
use crate::config::ProcessingConfig;
use crate::error::ClassifierError;
use crate::model::Classifier;

/// Outcome of scoring one window
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowScore {
    /// Window range fell below the configured minimum, classifier skipped
    Degenerate,
    /// Score returned by the classifier
    Classified(f32),
}

impl WindowScore {
    /// Score on the classifier's [0, 1] scale
    pub fn value(&self) -> f32 {
        match *self {
            WindowScore::Degenerate => quality::WORST_QUALITY_SCORE,
            WindowScore::Classified(score) => score,
        }
    }

    /// Whether the classifier was skipped
    pub fn is_degenerate(&self) -> bool {
        matches!(self, WindowScore::Degenerate)
    }
}

/// Peak-to-peak amplitude of a window (0 for an empty window)
pub fn window_range(window: &[f32]) -> f32 {
    if window.is_empty() {
        return 0.0;
    }
    let (min, max) = window
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), &x| (min.min(x), max.max(x)));
    max - min
}

/// Scores windows, forcing near-flat ones to the worst quality score
///
/// The classifiers under-detect low-amplitude noise, so when the range
/// check is enabled a window whose peak-to-peak amplitude is strictly below
/// the configured minimum never reaches the classifier.
#[derive(Clone, Copy)]
pub struct WindowScorer<'a> {
    classifier: &'a dyn Classifier,
    check_range: bool,
    min_range: f32,
}

impl<'a> WindowScorer<'a> {
    /// Scorer with an explicit range check setting
    pub fn new(classifier: &'a dyn Classifier, check_range: bool, min_range: f32) -> Self {
        Self {
            classifier,
            check_range,
            min_range,
        }
    }

    /// Scorer using the range check of `config`
    pub fn from_config(classifier: &'a dyn Classifier, config: &ProcessingConfig) -> Self {
        Self::new(classifier, config.check_window_range(), config.window_min_range())
    }

    /// Whether `window` is flat enough to skip the classifier
    pub fn is_degenerate(&self, window: &[f32]) -> bool {
        self.check_range && window_range(window) < self.min_range
    }

    /// Score a window.
    ///
    /// Classifier failures are returned untouched; a classifier score that is
    /// not a finite number in [0, 1] is reported as a classifier failure.
    pub fn score(&self, window: &[f32]) -> Result<WindowScore, ClassifierError> {
        if self.is_degenerate(window) {
            trace!(range = window_range(window), "window below minimum range");
            return Ok(WindowScore::Degenerate);
        }

        let score = self.classifier.classify(window)?;
        if !(quality::MIN_SCORE..=quality::MAX_SCORE).contains(&score) {
            return Err(ClassifierError::new(format!(
                "score {} is outside the [0, 1] interval",
                score
            )));
        }
        Ok(WindowScore::Classified(score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FnClassifier;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_window_range() {
        assert_eq!(window_range(&[]), 0.0);
        assert_eq!(window_range(&[0.3]), 0.0);
        assert!((window_range(&[-0.2, 0.5, 0.1]) - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_flat_window_short_circuits() {
        let calls = AtomicUsize::new(0);
        let classifier = FnClassifier::new(4, |_: &[f32]| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(0.0)
        });
        let scorer = WindowScorer::new(&classifier, true, 0.1);

        let score = scorer.score(&[0.01, 0.02, 0.0, 0.05]).unwrap();
        assert_eq!(score, WindowScore::Degenerate);
        assert_eq!(score.value(), 1.0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let score = scorer.score(&[0.0, 0.5, -0.5, 0.2]).unwrap();
        assert_eq!(score, WindowScore::Classified(0.0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_range_equal_to_minimum_is_classified() {
        let classifier = FnClassifier::constant(2, 0.25);
        let scorer = WindowScorer::new(&classifier, true, 0.5);
        assert_eq!(scorer.score(&[0.0, 0.5]).unwrap(), WindowScore::Classified(0.25));
    }

    #[test]
    fn test_disabled_check_always_classifies() {
        let classifier = FnClassifier::constant(3, 0.4);
        let scorer = WindowScorer::new(&classifier, false, 0.1);
        assert!(!scorer.is_degenerate(&[0.0; 3]));
        assert_eq!(scorer.score(&[0.0; 3]).unwrap().value(), 0.4);
    }

    #[test]
    fn test_out_of_range_score_rejected() {
        let classifier = FnClassifier::constant(2, 1.5);
        let scorer = WindowScorer::new(&classifier, false, 0.1);
        assert!(scorer.score(&[0.0, 1.0]).is_err());

        let classifier = FnClassifier::constant(2, f32::NAN);
        let scorer = WindowScorer::new(&classifier, false, 0.1);
        assert!(scorer.score(&[0.0, 1.0]).is_err());
    }

    #[test]
    fn test_classifier_error_passes_through() {
        let classifier = FnClassifier::new(2, |_: &[f32]| Err(ClassifierError::new("offline")));
        let scorer = WindowScorer::new(&classifier, true, 0.1);
        let err = scorer.score(&[0.0, 1.0]).unwrap_err();
        assert_eq!(err.message(), "offline");
    }
}
