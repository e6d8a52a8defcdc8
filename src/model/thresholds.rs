// src/model/thresholds.rs
//! Default threshold registry
//!
//! Default thresholds are tuned per model and per classification mode by
//! whoever ships the models, so this crate only defines the lookup seam and
//! a table implementation populated by the caller or a settings file.

use std::collections::BTreeMap;

use crate::config::ReturnMode;
use crate::error::ConfigError;
use crate::model::ModelKind;

/// Lookup of default thresholds for a model and classification mode
pub trait ThresholdRegistry {
    /// Default thresholds of `model` in `mode`, if any
    fn lookup(&self, model: ModelKind, mode: ReturnMode) -> Option<Vec<f32>>;
}

/// Threshold registry backed by an ordered table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdTable {
    entries: BTreeMap<(ModelKind, ReturnMode), Vec<f32>>,
}

impl ThresholdTable {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the thresholds of `model` in `mode`
    pub fn insert(&mut self, model: ModelKind, mode: ReturnMode, thresholds: Vec<f32>) {
        self.entries.insert((model, mode), thresholds);
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with(mut self, model: ModelKind, mode: ReturnMode, thresholds: Vec<f32>) -> Self {
        self.insert(model, mode, thresholds);
        self
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a table from `"<model>.<mode>"` keys, as written in settings files
    pub fn from_entries<I>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, Vec<f32>)>,
    {
        let mut table = Self::new();
        for (key, thresholds) in entries {
            let (model, mode) = key.split_once('.').ok_or_else(|| {
                ConfigError::Parse(format!(
                    "threshold key '{}' must have the form <model>.<mode>",
                    key
                ))
            })?;
            table.insert(model.parse()?, mode.parse()?, thresholds);
        }
        Ok(table)
    }

    /// Inverse of [`from_entries`](Self::from_entries)
    pub fn to_entries(&self) -> BTreeMap<String, Vec<f32>> {
        self.entries
            .iter()
            .map(|((model, mode), thresholds)| (format!("{}.{}", model, mode), thresholds.clone()))
            .collect()
    }
}

impl ThresholdRegistry for ThresholdTable {
    fn lookup(&self, model: ModelKind, mode: ReturnMode) -> Option<Vec<f32>> {
        self.entries.get(&(model, mode)).cloned()
    }
}
