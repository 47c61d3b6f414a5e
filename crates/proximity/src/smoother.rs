//! Depth smoothing window

use std::collections::VecDeque;

/// Default window size (samples)
pub const DEFAULT_WINDOW: usize = 3;

/// Fixed-capacity FIFO of recent depth samples; reports the mean of its contents
#[derive(Debug, Clone)]
pub struct DepthSmoother {
    window: VecDeque<f32>,
    capacity: usize,
}

impl DepthSmoother {
    /// Create a smoother holding at most `capacity` samples (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest when full, and return the new mean
    pub fn update(&mut self, sample: f32) -> f32 {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(sample);

        let sum: f64 = self.window.iter().map(|&v| f64::from(v)).sum();
        (sum / self.window.len() as f64) as f32
    }

    /// Mean of the current contents
    pub fn mean(&self) -> Option<f32> {
        if self.window.is_empty() {
            return None;
        }
        let sum: f64 = self.window.iter().map(|&v| f64::from(v)).sum();
        Some((sum / self.window.len() as f64) as f32)
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }
}

impl Default for DepthSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mean_of_window() {
        let mut smoother = DepthSmoother::default();

        assert_eq!(smoother.update(4.0), 4.0);
        assert_eq!(smoother.update(6.0), 5.0);
        assert_eq!(smoother.update(5.0), 5.0);

        // [6, 5, 8]
        let mean = smoother.update(8.0);
        assert!((mean - 6.333).abs() < 0.001);
        assert_eq!(smoother.len(), 3);
    }

    #[test]
    fn test_empty_has_no_mean() {
        let mut smoother = DepthSmoother::default();
        assert_eq!(smoother.mean(), None);

        smoother.update(2.0);
        smoother.clear();
        assert!(smoother.is_empty());
        assert_eq!(smoother.mean(), None);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut smoother = DepthSmoother::new(0);
        assert_eq!(smoother.capacity(), 1);
        smoother.update(3.0);
        assert_eq!(smoother.update(9.0), 9.0);
    }

    proptest! {
        #[test]
        fn test_mean_is_last_three(samples in prop::collection::vec(0.0f32..100.0, 1..50)) {
            let mut smoother = DepthSmoother::default();
            let mut last = 0.0;
            for &sample in &samples {
                last = smoother.update(sample);
            }

            let tail = &samples[samples.len().saturating_sub(3)..];
            let expected = tail.iter().sum::<f32>() / tail.len() as f32;
            prop_assert!((last - expected).abs() < 1e-3);
            prop_assert!(smoother.len() <= 3);
        }
    }
}
