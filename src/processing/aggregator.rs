// src/processing/aggregator.rs
//! Overlap aggregation of window scores
//!
//! Sample-resolution and interval-resolution output share one accumulation
//! loop; they differ only in how a window maps onto buffer positions, which
//! is captured by the [`IndexMapping`] strategy.

use std::ops::Range;

use ndarray::{s, Array1};

/// Maps a scored window onto accumulation buffer positions
pub trait IndexMapping {
    /// Number of buffer positions for a signal of `signal_length` samples
    fn buffer_len(&self, signal_length: usize) -> usize;

    /// Positions touched by the window `[start, start + window_length)`
    fn span(&self, start: usize, window_length: usize) -> Range<usize>;

    /// Samples represented by one buffer position
    fn resolution(&self) -> usize;
}

/// One position per signal sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleMapping;

impl IndexMapping for SampleMapping {
    fn buffer_len(&self, signal_length: usize) -> usize {
        signal_length
    }

    fn span(&self, start: usize, window_length: usize) -> Range<usize> {
        start..start + window_length
    }

    fn resolution(&self) -> usize {
        1
    }
}

/// One position per stride-sized interval
///
/// A window starting at `start` covers intervals
/// `[start / stride, (start + window_length) / stride)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalMapping {
    stride: usize,
}

impl IntervalMapping {
    /// Mapping onto intervals of `stride` samples
    pub fn new(stride: usize) -> Self {
        debug_assert!(stride > 0, "stride must be positive");
        Self { stride: stride.max(1) }
    }
}

impl IndexMapping for IntervalMapping {
    fn buffer_len(&self, signal_length: usize) -> usize {
        signal_length / self.stride
    }

    fn span(&self, start: usize, window_length: usize) -> Range<usize> {
        start / self.stride..(start + window_length) / self.stride
    }

    fn resolution(&self) -> usize {
        self.stride
    }
}

/// Per-position score sums and contribution counts for one call
///
/// Counts only ever grow, and each window adds to each position it covers
/// exactly once.
#[derive(Debug, Clone)]
pub struct AccumulationBuffer<M: IndexMapping> {
    mapping: M,
    window_length: usize,
    sums: Array1<f64>,
    counts: Array1<u32>,
}

impl<M: IndexMapping> AccumulationBuffer<M> {
    /// Zeroed buffer for a signal of `signal_length` samples
    pub fn new(mapping: M, signal_length: usize, window_length: usize) -> Self {
        let len = mapping.buffer_len(signal_length);
        Self {
            mapping,
            window_length,
            sums: Array1::zeros(len),
            counts: Array1::zeros(len),
        }
    }

    /// Add the score of the window starting at `start`
    pub fn add(&mut self, start: usize, score: f32) {
        let span = self.mapping.span(start, self.window_length);
        let end = span.end.min(self.len());
        let begin = span.start.min(end);

        let mut sums = self.sums.slice_mut(s![begin..end]);
        sums += f64::from(score);
        let mut counts = self.counts.slice_mut(s![begin..end]);
        counts += 1;
    }

    /// Number of positions
    pub fn len(&self) -> usize {
        self.sums.len()
    }

    /// Whether the buffer has no positions
    pub fn is_empty(&self) -> bool {
        self.sums.is_empty()
    }

    /// Index mapping in use
    pub fn mapping(&self) -> &M {
        &self.mapping
    }

    /// Contributing window count per position
    pub fn counts(&self) -> &Array1<u32> {
        &self.counts
    }

    /// Positions no window contributed to
    pub fn uncovered(&self) -> usize {
        self.counts.iter().filter(|&&count| count == 0).count()
    }

    /// Mean score per position, `None` where nothing contributed
    pub fn means(&self) -> Vec<Option<f32>> {
        self.sums
            .iter()
            .zip(self.counts.iter())
            .map(|(&sum, &count)| (count > 0).then(|| (sum / f64::from(count)) as f32))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::scheduler::WindowPlan;

    #[test]
    fn test_interval_span() {
        let mapping = IntervalMapping::new(250);
        assert_eq!(mapping.span(0, 500), 0..2);
        assert_eq!(mapping.span(250, 500), 1..3);
        assert_eq!(mapping.buffer_len(1100), 4);
        assert_eq!(mapping.resolution(), 250);
    }

    #[test]
    fn test_sample_counts_follow_overlap() {
        let mut buffer = AccumulationBuffer::new(SampleMapping, 1000, 500);
        for start in WindowPlan::new(1000, 500, 250) {
            buffer.add(start, 0.5);
        }

        assert_eq!(buffer.len(), 1000);
        assert_eq!(buffer.counts()[0], 1);
        assert_eq!(buffer.counts()[249], 1);
        assert_eq!(buffer.counts()[250], 2);
        assert_eq!(buffer.counts()[749], 2);
        assert_eq!(buffer.counts()[750], 1);
        assert_eq!(buffer.uncovered(), 0);
    }

    #[test]
    fn test_interval_counts_follow_overlap() {
        let mut buffer = AccumulationBuffer::new(IntervalMapping::new(250), 1000, 500);
        for start in WindowPlan::new(1000, 500, 250) {
            buffer.add(start, 0.5);
        }
        assert_eq!(buffer.counts().to_vec(), vec![1, 2, 2, 1]);
    }

    #[test]
    fn test_means_average_contributions() {
        let mut buffer = AccumulationBuffer::new(SampleMapping, 6, 4);
        buffer.add(0, 0.2);
        buffer.add(2, 0.6);

        let means = buffer.means();
        assert_eq!(means[0], Some(0.2));
        assert!((means[2].unwrap() - 0.4).abs() < 1e-6);
        assert_eq!(means[5], Some(0.6));
    }

    #[test]
    fn test_uncovered_positions_are_undefined() {
        let mut buffer = AccumulationBuffer::new(SampleMapping, 1100, 500);
        for start in WindowPlan::new(1100, 500, 250) {
            buffer.add(start, 0.3);
        }

        let means = buffer.means();
        assert_eq!(buffer.uncovered(), 100);
        assert_eq!(means[999], Some(0.3));
        assert!(means[1000..].iter().all(Option::is_none));
    }

    #[test]
    fn test_empty_buffer() {
        let buffer = AccumulationBuffer::new(IntervalMapping::new(250), 200, 500);
        assert!(buffer.is_empty());
        assert!(buffer.means().is_empty());
    }
}
