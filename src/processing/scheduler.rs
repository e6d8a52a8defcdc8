// src/processing/scheduler.rs
//! Window scheduling over a finite signal

use std::iter::FusedIterator;

/// Lazy sequence of window start offsets `0, stride, 2 * stride, ...`
///
/// Only windows lying entirely inside the signal are produced, so no partial
/// window is ever scored. Both output granularities consume the same plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowPlan {
    signal_length: usize,
    window_length: usize,
    stride: usize,
    next_start: usize,
}

impl WindowPlan {
    /// Plan over a signal of `signal_length` samples
    pub fn new(signal_length: usize, window_length: usize, stride: usize) -> Self {
        debug_assert!(stride > 0, "stride must be positive");
        Self {
            signal_length,
            window_length,
            stride: stride.max(1),
            next_start: 0,
        }
    }

    /// Total number of windows in a fresh plan
    pub fn window_count(signal_length: usize, window_length: usize, stride: usize) -> usize {
        Self::new(signal_length, window_length, stride).len()
    }

    /// Window length in samples
    pub fn window_length(&self) -> usize {
        self.window_length
    }

    /// Distance between consecutive starts
    pub fn stride(&self) -> usize {
        self.stride
    }

    fn fits(&self, start: usize) -> bool {
        start
            .checked_add(self.window_length)
            .is_some_and(|end| end <= self.signal_length)
    }
}

impl Iterator for WindowPlan {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if !self.fits(self.next_start) {
            return None;
        }
        let start = self.next_start;
        self.next_start = self.next_start.saturating_add(self.stride);
        Some(start)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.fits(self.next_start) {
            (self.signal_length - self.window_length - self.next_start) / self.stride + 1
        } else {
            0
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for WindowPlan {}

impl FusedIterator for WindowPlan {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_offsets() {
        let starts: Vec<usize> = WindowPlan::new(1000, 500, 250).collect();
        assert_eq!(starts, vec![0, 250, 500]);
    }

    #[test]
    fn test_plan_drops_partial_windows() {
        let starts: Vec<usize> = WindowPlan::new(1100, 500, 250).collect();
        assert_eq!(starts, vec![0, 250, 500]);

        let starts: Vec<usize> = WindowPlan::new(1250, 500, 250).collect();
        assert_eq!(starts, vec![0, 250, 500, 750]);
    }

    #[test]
    fn test_short_signal_has_empty_plan() {
        let mut plan = WindowPlan::new(499, 500, 250);
        assert_eq!(plan.len(), 0);
        assert_eq!(plan.next(), None);

        assert_eq!(WindowPlan::window_count(0, 500, 250), 0);
        assert_eq!(WindowPlan::window_count(500, 500, 250), 1);
    }

    #[test]
    fn test_exact_size_tracks_progress() {
        let mut plan = WindowPlan::new(2000, 500, 250);
        assert_eq!(plan.len(), 7);
        plan.next();
        plan.next();
        assert_eq!(plan.len(), 5);
        assert_eq!(plan.by_ref().count(), 5);
        assert_eq!(plan.next(), None);
    }
}
