// src/processing/mapper.rs
//! Reduction of mean window scores into the requested output mode

use serde::{Deserialize, Serialize};

use crate::config::{Classification, Granularity, ReturnMode};

/// Categorical quality value
///
/// The numeric value is what callers see (1.0, 2.0 or 3.0); what each
/// category means depends on the mode, see [`describe`](Self::describe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QualityClass {
    /// Value 1.0, best quality
    One,
    /// Value 2.0
    Two,
    /// Value 3.0, only produced in three-value mode
    Three,
}

impl QualityClass {
    /// Numeric value of the category
    pub fn value(self) -> f32 {
        match self {
            QualityClass::One => 1.0,
            QualityClass::Two => 2.0,
            QualityClass::Three => 3.0,
        }
    }

    /// Human readable label of this category under `mode`
    pub fn describe(self, mode: ReturnMode) -> &'static str {
        match (mode, self) {
            (ReturnMode::BinaryClean, QualityClass::One) => "clean",
            (ReturnMode::BinaryClean, _) => "noisy or unusable",
            (ReturnMode::BinaryQrs, QualityClass::One) => "QRS detectable",
            (ReturnMode::BinaryQrs, _) => "unusable",
            (_, QualityClass::One) => "clean",
            (_, QualityClass::Two) => "QRS detectable only",
            (_, QualityClass::Three) => "unusable",
        }
    }
}

/// Output values, continuous or categorical, `None` where undefined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityValues {
    /// Mean scores in score mode
    Scores(Vec<Option<f32>>),
    /// Categories in the thresholded modes
    Classes(Vec<Option<QualityClass>>),
}

/// A run of consecutive positions sharing one value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualitySegment {
    /// First sample of the run
    pub start: usize,
    /// One past the last sample of the run
    pub end: usize,
    /// Shared value, `None` for an undefined run
    pub value: Option<f32>,
}

/// Final quality sequence aligned to the sample or interval timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityOutput {
    mode: ReturnMode,
    granularity: Granularity,
    resolution: usize,
    values: QualityValues,
}

impl QualityOutput {
    /// Mode the values were produced in
    pub fn mode(&self) -> ReturnMode {
        self.mode
    }

    /// Output resolution
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Samples covered by one output position
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Output values
    pub fn values(&self) -> &QualityValues {
        &self.values
    }

    /// Take the output values
    pub fn into_values(self) -> QualityValues {
        self.values
    }

    /// Number of output positions
    pub fn len(&self) -> usize {
        match &self.values {
            QualityValues::Scores(v) => v.len(),
            QualityValues::Classes(v) => v.len(),
        }
    }

    /// Whether there are no output positions
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Continuous scores, if this output is in score mode
    pub fn scores(&self) -> Option<&[Option<f32>]> {
        match &self.values {
            QualityValues::Scores(v) => Some(v),
            QualityValues::Classes(_) => None,
        }
    }

    /// Categories, if this output is in a categorical mode
    pub fn classes(&self) -> Option<&[Option<QualityClass>]> {
        match &self.values {
            QualityValues::Classes(v) => Some(v),
            QualityValues::Scores(_) => None,
        }
    }

    /// Numeric value at `index`; `None` when undefined or out of bounds
    pub fn get(&self, index: usize) -> Option<f32> {
        match &self.values {
            QualityValues::Scores(v) => v.get(index).copied().flatten(),
            QualityValues::Classes(v) => v.get(index).copied().flatten().map(QualityClass::value),
        }
    }

    /// Numeric values in order, `None` where undefined
    pub fn iter(&self) -> impl Iterator<Item = Option<f32>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    /// Number of defined positions
    pub fn defined_count(&self) -> usize {
        self.iter().filter(Option::is_some).count()
    }

    /// Number of undefined positions
    pub fn undefined_count(&self) -> usize {
        self.len() - self.defined_count()
    }

    /// Plain numeric rendering with undefined positions as NaN
    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.iter().map(|v| v.unwrap_or(f32::NAN)).collect()
    }

    /// Collapse runs of equal values into segments in sample coordinates.
    ///
    /// Undefined positions form their own runs.
    pub fn segments(&self) -> Vec<QualitySegment> {
        let mut segments: Vec<QualitySegment> = Vec::new();
        for (index, value) in self.iter().enumerate() {
            let start = index * self.resolution;
            let end = start + self.resolution;
            match segments.last_mut() {
                Some(last) if last.value == value => last.end = end,
                _ => segments.push(QualitySegment { start, end, value }),
            }
        }
        segments
    }
}

/// Turns mean scores into the configured output mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityMapper {
    classification: Classification,
}

impl QualityMapper {
    /// Mapper applying `classification`
    pub fn new(classification: Classification) -> Self {
        Self { classification }
    }

    /// Category of one defined mean score; `None` in score mode
    pub fn classify(&self, mean: f32) -> Option<QualityClass> {
        match self.classification {
            Classification::Score => None,
            Classification::BinaryClean { threshold } | Classification::BinaryQrs { threshold } => {
                Some(if mean < threshold { QualityClass::One } else { QualityClass::Two })
            }
            Classification::ThreeValue { lower, upper } => Some(if mean < lower {
                QualityClass::One
            } else if mean < upper {
                QualityClass::Two
            } else {
                QualityClass::Three
            }),
        }
    }

    /// Map mean scores, leaving undefined positions undefined
    pub fn map(
        &self,
        means: Vec<Option<f32>>,
        granularity: Granularity,
        resolution: usize,
    ) -> QualityOutput {
        let values = match self.classification {
            Classification::Score => QualityValues::Scores(means),
            _ => QualityValues::Classes(
                means
                    .into_iter()
                    .map(|mean| mean.and_then(|m| self.classify(m)))
                    .collect(),
            ),
        };

        QualityOutput {
            mode: self.classification.mode(),
            granularity,
            resolution,
            values,
        }
    }
}
