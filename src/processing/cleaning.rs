// src/processing/cleaning.rs
//! ECG signal cleaning ahead of window scoring
//!
//! The classifiers were trained on cleaned ECG. [`EcgCleaner`] removes
//! baseline wander with a zero-phase Butterworth high-pass and smooths
//! powerline interference with a zero-phase moving average whose width is
//! one powerline period.

use std::f64::consts::PI;

use crate::config::constants::cleaning;
use crate::error::CleaningError;

/// Signal cleaner collaborator; must preserve signal length
pub trait SignalCleaner: Send + Sync {
    /// Clean `signal` sampled at `sampling_rate_hz`, returning as many samples
    fn clean(&self, signal: &[f32], sampling_rate_hz: u32) -> Result<Vec<f32>, CleaningError>;
}

/// Cleaner that returns the signal unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCleaner;

impl SignalCleaner for NoopCleaner {
    fn clean(&self, signal: &[f32], _sampling_rate_hz: u32) -> Result<Vec<f32>, CleaningError> {
        Ok(signal.to_vec())
    }
}

/// Filter section applied with fresh state on every pass
#[derive(Debug, Clone, PartialEq)]
enum Section {
    FirstOrder { b0: f64, b1: f64, a1: f64 },
    Biquad { b0: f64, b1: f64, b2: f64, a1: f64, a2: f64 },
    MovingAverage { width: usize },
}

impl Section {
    fn apply(&self, data: &mut [f64]) {
        match *self {
            Section::FirstOrder { b0, b1, a1 } => {
                let (mut x1, mut y1) = (0.0, 0.0);
                for sample in data.iter_mut() {
                    let x = *sample;
                    let y = b0 * x + b1 * x1 - a1 * y1;
                    x1 = x;
                    y1 = y;
                    *sample = y;
                }
            }
            Section::Biquad { b0, b1, b2, a1, a2 } => {
                let (mut x1, mut x2, mut y1, mut y2) = (0.0, 0.0, 0.0, 0.0);
                for sample in data.iter_mut() {
                    let x = *sample;
                    let y = b0 * x + b1 * x1 + b2 * x2 - a1 * y1 - a2 * y2;
                    x2 = x1;
                    x1 = x;
                    y2 = y1;
                    y1 = y;
                    *sample = y;
                }
            }
            Section::MovingAverage { width } => {
                let width = width.max(1);
                let mut history = vec![0.0; width];
                let mut sum = 0.0;
                for (i, sample) in data.iter_mut().enumerate() {
                    let slot = i % width;
                    sum += *sample - history[slot];
                    history[slot] = *sample;
                    *sample = sum / width as f64;
                }
            }
        }
    }
}

/// Default ECG cleaner: high-pass baseline removal plus powerline smoothing
#[derive(Debug, Clone, PartialEq)]
pub struct EcgCleaner {
    highpass_cutoff_hz: f32,
    highpass_order: usize,
    powerline_hz: f32,
}

impl Default for EcgCleaner {
    fn default() -> Self {
        Self {
            highpass_cutoff_hz: cleaning::HIGHPASS_CUTOFF_HZ,
            highpass_order: cleaning::HIGHPASS_ORDER,
            powerline_hz: cleaning::POWERLINE_FREQ_HZ,
        }
    }
}

impl EcgCleaner {
    /// Cleaner with a custom high-pass cutoff and order and powerline frequency
    pub fn new(
        highpass_cutoff_hz: f32,
        highpass_order: usize,
        powerline_hz: f32,
    ) -> Result<Self, CleaningError> {
        if !(highpass_cutoff_hz.is_finite() && highpass_cutoff_hz > 0.0) {
            return Err(CleaningError::InvalidParameters(format!(
                "high-pass cutoff must be positive (got {} Hz)",
                highpass_cutoff_hz
            )));
        }
        if highpass_order == 0 {
            return Err(CleaningError::InvalidParameters(
                "high-pass order must be at least 1".to_string(),
            ));
        }
        if !(powerline_hz.is_finite() && powerline_hz > 0.0) {
            return Err(CleaningError::InvalidParameters(format!(
                "powerline frequency must be positive (got {} Hz)",
                powerline_hz
            )));
        }
        Ok(Self {
            highpass_cutoff_hz,
            highpass_order,
            powerline_hz,
        })
    }

    /// Butterworth high-pass as cascaded second-order sections, plus one
    /// first-order section for odd orders.
    fn highpass_sections(&self, sampling_rate_hz: u32) -> Result<Vec<Section>, CleaningError> {
        let fs = sampling_rate_hz as f64;
        let cutoff = self.highpass_cutoff_hz as f64;
        if cutoff >= fs / 2.0 {
            return Err(CleaningError::InvalidParameters(format!(
                "high-pass cutoff {} Hz must be below Nyquist ({} Hz)",
                cutoff,
                fs / 2.0
            )));
        }

        let n = self.highpass_order;
        let omega = 2.0 * PI * cutoff / fs;
        let (sin_w, cos_w) = omega.sin_cos();
        let mut sections = Vec::with_capacity(n / 2 + 1);

        for k in 0..n / 2 {
            let q = 1.0 / (2.0 * (PI * (2 * k + 1) as f64 / (2 * n) as f64).sin());
            let alpha = sin_w / (2.0 * q);
            let a0 = 1.0 + alpha;
            sections.push(Section::Biquad {
                b0: (1.0 + cos_w) / 2.0 / a0,
                b1: -(1.0 + cos_w) / a0,
                b2: (1.0 + cos_w) / 2.0 / a0,
                a1: -2.0 * cos_w / a0,
                a2: (1.0 - alpha) / a0,
            });
        }

        if n % 2 == 1 {
            let k = (PI * cutoff / fs).tan();
            let norm = 1.0 + k;
            sections.push(Section::FirstOrder {
                b0: 1.0 / norm,
                b1: -1.0 / norm,
                a1: (k - 1.0) / norm,
            });
        }

        Ok(sections)
    }

    fn powerline_section(&self, sampling_rate_hz: u32) -> Section {
        let width = if sampling_rate_hz >= cleaning::POWERLINE_MIN_SAMPLING_RATE_HZ {
            (sampling_rate_hz as f32 / self.powerline_hz).round() as usize
        } else {
            2
        };
        Section::MovingAverage { width: width.max(1) }
    }
}

/// Run `sections` forward then backward over an odd-extended copy of `signal`.
///
/// The first sample is subtracted up front so that the sections, which
/// start from rest, see no step at the leading edge. `sections` must reject
/// DC, as the result is not shifted back.
fn zero_phase(sections: &[Section], signal: &[f32], pad: usize) -> Vec<f32> {
    let n = signal.len();
    let pad = pad.min(n.saturating_sub(1));
    let offset = signal[0] as f64;
    let at = |i: usize| signal[i] as f64 - offset;
    let last = at(n - 1);

    let mut data = Vec::with_capacity(n + 2 * pad);
    data.extend((1..=pad).rev().map(|i| -at(i)));
    data.extend((0..n).map(at));
    data.extend((1..=pad).map(|i| 2.0 * last - at(n - 1 - i)));

    for _ in 0..2 {
        for section in sections {
            section.apply(&mut data);
        }
        data.reverse();
    }

    data[pad..pad + n].iter().map(|&x| x as f32).collect()
}

impl SignalCleaner for EcgCleaner {
    fn clean(&self, signal: &[f32], sampling_rate_hz: u32) -> Result<Vec<f32>, CleaningError> {
        if sampling_rate_hz == 0 {
            return Err(CleaningError::InvalidParameters(
                "sampling rate must be positive".to_string(),
            ));
        }
        if signal.len() < 2 {
            return Ok(signal.to_vec());
        }

        let mut sections = self.highpass_sections(sampling_rate_hz)?;
        sections.push(self.powerline_section(sampling_rate_hz));

        let pad = sampling_rate_hz as usize * cleaning::EDGE_PADDING_SECONDS;
        Ok(zero_phase(&sections, signal, pad))
    }
}
