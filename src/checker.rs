// src/checker.rs
//! ECG quality checker
//!
//! The checker is built once from [`CheckerSettings`] and then grades any
//! number of signals. Every call runs the same pipeline to completion:
//! optional cleaning, window scheduling, window scoring, overlap
//! aggregation and mode reduction.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::{CheckerSettings, Granularity, ProcessingConfig};
use crate::error::{ClassifierError, CleaningError, ConfigError, QualityResult};
use crate::model::{Classifier, ModelRegistry, ThresholdRegistry};
use crate::processing::aggregator::{
    AccumulationBuffer, IndexMapping, IntervalMapping, SampleMapping,
};
use crate::processing::cleaning::{EcgCleaner, SignalCleaner};
use crate::processing::mapper::{QualityMapper, QualityOutput};
use crate::processing::scheduler::WindowPlan;
use crate::processing::scorer::{WindowScore, WindowScorer};

/// Sliding-window ECG quality grader
#[derive(Clone)]
pub struct EcgQualityChecker {
    config: ProcessingConfig,
    classifier: Arc<dyn Classifier>,
    cleaner: Arc<dyn SignalCleaner>,
    mapper: QualityMapper,
}

impl EcgQualityChecker {
    /// Validate `settings` and build a checker around the registered classifier.
    ///
    /// Uses [`EcgCleaner`] when cleaning is enabled; see
    /// [`with_cleaner`](Self::with_cleaner) to substitute another one.
    pub fn new(
        settings: &CheckerSettings,
        models: &dyn ModelRegistry,
        defaults: &dyn ThresholdRegistry,
    ) -> Result<Self, ConfigError> {
        let (config, classifier) = settings.validate(models, defaults)?;

        info!(
            model = %config.model(),
            mode = %config.mode(),
            granularity = %config.granularity(),
            window_length = config.window_length(),
            stride = config.stride(),
            "quality checker ready"
        );

        Self::from_parts(config, classifier)
    }

    /// Build a checker from an already resolved configuration.
    ///
    /// Fails with [`ConfigError::InputLengthMismatch`] when `classifier`
    /// does not take windows of the configured length.
    pub fn from_parts(
        config: ProcessingConfig,
        classifier: Arc<dyn Classifier>,
    ) -> Result<Self, ConfigError> {
        config.check_classifier(classifier.as_ref())?;

        let mapper = QualityMapper::new(config.classification());
        Ok(Self {
            config,
            classifier,
            cleaner: Arc::new(EcgCleaner::default()),
            mapper,
        })
    }

    /// Replace the signal cleaner used when cleaning is enabled
    pub fn with_cleaner(mut self, cleaner: impl SignalCleaner + 'static) -> Self {
        self.cleaner = Arc::new(cleaner);
        self
    }

    /// Resolved configuration shared by every call
    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Grade a signal in millivolts sampled at the configured rate.
    ///
    /// A signal shorter than one window is not an error: no window is
    /// scored and every output position is undefined.
    pub fn process_signal(&self, signal: &[f32]) -> QualityResult<QualityOutput> {
        let signal = self.prepare(signal)?;
        let scorer = self.scorer();
        let window_length = self.config.window_length();

        let scored = self.plan(signal.len()).map(|start| {
            scorer
                .score(&signal[start..start + window_length])
                .map(|score| (start, score))
        });

        Ok(self.aggregate(signal.len(), scored)?)
    }

    /// Same result as [`process_signal`](Self::process_signal), with windows
    /// scored concurrently.
    ///
    /// Window `i` starts at `i * stride`. Scores are collected in window
    /// order before a single sequential aggregation pass, so each window
    /// still contributes exactly once.
    pub fn process_signal_parallel(&self, signal: &[f32]) -> QualityResult<QualityOutput> {
        let signal = self.prepare(signal)?;
        let scorer = self.scorer();
        let window_length = self.config.window_length();
        let stride = self.config.stride();

        let windows = self.plan(signal.len()).len();
        let scores = (0..windows)
            .into_par_iter()
            .map(|i| i * stride)
            .map(|start| scorer.score(&signal[start..start + window_length]))
            .collect::<Result<Vec<_>, _>>()?;

        let scored = scores
            .into_iter()
            .enumerate()
            .map(|(i, score)| Ok((i * stride, score)));
        Ok(self.aggregate(signal.len(), scored)?)
    }

    fn scorer(&self) -> WindowScorer<'_> {
        WindowScorer::from_config(self.classifier.as_ref(), &self.config)
    }

    fn plan(&self, signal_length: usize) -> WindowPlan {
        let plan = WindowPlan::new(
            signal_length,
            self.config.window_length(),
            self.config.stride(),
        );
        if plan.len() == 0 {
            warn!(
                signal_length,
                window_length = self.config.window_length(),
                "signal shorter than one window, output is entirely undefined"
            );
        }
        plan
    }

    fn prepare<'s>(&self, signal: &'s [f32]) -> Result<Cow<'s, [f32]>, CleaningError> {
        if !self.config.clean_data() {
            return Ok(Cow::Borrowed(signal));
        }

        let cleaned = self.cleaner.clean(signal, self.config.sampling_rate_hz())?;
        if cleaned.len() != signal.len() {
            return Err(CleaningError::LengthChanged {
                expected: signal.len(),
                actual: cleaned.len(),
            });
        }
        Ok(Cow::Owned(cleaned))
    }

    fn aggregate<I>(
        &self,
        signal_length: usize,
        scored: I,
    ) -> Result<QualityOutput, ClassifierError>
    where
        I: Iterator<Item = Result<(usize, WindowScore), ClassifierError>>,
    {
        match self.config.granularity() {
            Granularity::Full => self.accumulate(SampleMapping, signal_length, scored),
            Granularity::Intervals => {
                let mapping = IntervalMapping::new(self.config.stride());
                self.accumulate(mapping, signal_length, scored)
            }
        }
    }

    fn accumulate<M, I>(
        &self,
        mapping: M,
        signal_length: usize,
        scored: I,
    ) -> Result<QualityOutput, ClassifierError>
    where
        M: IndexMapping,
        I: Iterator<Item = Result<(usize, WindowScore), ClassifierError>>,
    {
        let resolution = mapping.resolution();
        let window_length = self.config.window_length();
        let mut buffer = AccumulationBuffer::new(mapping, signal_length, window_length);
        let mut windows = 0usize;
        let mut degenerate = 0usize;

        for item in scored {
            let (start, score) = item?;
            windows += 1;
            if score.is_degenerate() {
                degenerate += 1;
            }
            buffer.add(start, score.value());
        }

        let uncovered = buffer.uncovered();
        debug!(signal_length, windows, degenerate, uncovered, "windows aggregated");
        if windows > 0 && uncovered > 0 {
            warn!(uncovered, "trailing positions received no window and are undefined");
        }

        Ok(self
            .mapper
            .map(buffer.means(), self.config.granularity(), resolution))
    }
}

impl fmt::Debug for EcgQualityChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcgQualityChecker")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReturnMode;
    use crate::error::QualityError;
    use crate::model::{FnClassifier, InMemoryModelRegistry, ModelKind, ThresholdTable};
    use crate::processing::cleaning::NoopCleaner;

    fn checker(settings: CheckerSettings, score: f32) -> EcgQualityChecker {
        let models = InMemoryModelRegistry::new()
            .with(ModelKind::Cnn2s, FnClassifier::constant(500, score));
        EcgQualityChecker::new(&settings, &models, &ThresholdTable::new()).unwrap()
    }

    fn plain(mode: ReturnMode) -> CheckerSettings {
        CheckerSettings::default()
            .with_mode(mode)
            .with_cleaning(false)
            .with_window_range_check(false, 0.1)
    }

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| (i % 50) as f32 / 25.0).collect()
    }

    #[test]
    fn test_constant_score_is_exact() {
        let checker = checker(plain(ReturnMode::Score), 0.2);
        let output = checker.process_signal(&ramp(1000)).unwrap();

        assert_eq!(output.len(), 1000);
        assert!(output.scores().unwrap().iter().all(|v| *v == Some(0.2)));
    }

    #[test]
    fn test_trailing_samples_undefined() {
        let checker = checker(plain(ReturnMode::Score), 0.2);
        let output = checker.process_signal(&ramp(1100)).unwrap();

        assert_eq!(output.undefined_count(), 100);
        assert_eq!(output.get(999), Some(0.2));
        assert_eq!(output.get(1000), None);
    }

    #[test]
    fn test_interval_granularity() {
        let settings = plain(ReturnMode::Score).with_granularity(Granularity::Intervals);
        let checker = checker(settings, 0.4);
        let output = checker.process_signal(&ramp(1100)).unwrap();

        assert_eq!(output.len(), 4);
        assert_eq!(output.resolution(), 250);
        assert_eq!(output.defined_count(), 4);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let classifier = FnClassifier::new(500, |window: &[f32]| {
            let mean_abs = window.iter().map(|x| x.abs()).sum::<f32>() / window.len() as f32;
            Ok(mean_abs.min(1.0))
        });
        let models = InMemoryModelRegistry::new().with(ModelKind::Cnn2s, classifier);
        let settings = plain(ReturnMode::Score);
        let checker = EcgQualityChecker::new(&settings, &models, &ThresholdTable::new()).unwrap();

        let signal: Vec<f32> = (0..3000)
            .map(|i| ((i as f32) * 0.05).sin() * (i as f32 / 3000.0))
            .collect();
        assert_eq!(
            checker.process_signal(&signal).unwrap(),
            checker.process_signal_parallel(&signal).unwrap()
        );
    }

    #[test]
    fn test_from_parts_checks_window_length() {
        let config = plain(ReturnMode::Score)
            .resolve(&ThresholdTable::new())
            .unwrap();

        let wrong: Arc<dyn Classifier> = Arc::new(FnClassifier::constant(1250, 0.2));
        assert!(matches!(
            EcgQualityChecker::from_parts(config.clone(), wrong),
            Err(ConfigError::InputLengthMismatch { expected: 500, actual: 1250, .. })
        ));

        let right: Arc<dyn Classifier> = Arc::new(FnClassifier::constant(500, 0.2));
        let checker = EcgQualityChecker::from_parts(config, right).unwrap();
        assert_eq!(checker.process_signal(&ramp(500)).unwrap().get(0), Some(0.2));
    }

    #[test]
    fn test_cleaner_length_checked() {
        struct Truncating;
        impl SignalCleaner for Truncating {
            fn clean(&self, signal: &[f32], _: u32) -> Result<Vec<f32>, CleaningError> {
                Ok(signal[1..].to_vec())
            }
        }

        let settings = plain(ReturnMode::Score).with_cleaning(true);
        let truncating = checker(settings.clone(), 0.2).with_cleaner(Truncating);
        let err = truncating.process_signal(&ramp(1000)).unwrap_err();
        assert!(matches!(
            err,
            QualityError::Cleaning(CleaningError::LengthChanged {
                expected: 1000,
                actual: 999
            })
        ));

        let noop = checker(settings, 0.2).with_cleaner(NoopCleaner);
        assert!(noop.process_signal(&ramp(1000)).is_ok());
    }
}
