//! Trailing rolling statistics over the target series.

use std::collections::VecDeque;

/// Trailing mean over the last `window` observations.
///
/// Before the window fills, the mean is taken over the points seen so far,
/// so every observation has a defined value.
pub struct RollingMean {
    /// Window size in rows.
    window: usize,
    /// Values currently in the window.
    values: VecDeque<f64>,
    /// Running sum of the window.
    sum: f64,
}

impl RollingMean {
    /// Create a new rolling mean.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            values: VecDeque::with_capacity(window),
            sum: 0.0,
        }
    }

    /// Add an observation and return the mean including it.
    pub fn push(&mut self, value: f64) -> f64 {
        if self.values.len() >= self.window {
            if let Some(old) = self.values.pop_front() {
                self.sum -= old;
            }
        }
        self.values.push_back(value);
        self.sum += value;
        self.mean().unwrap_or(value)
    }

    /// Current mean, if any observation has been added.
    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.sum / self.values.len() as f64)
        }
    }
}

/// Rolling means of `series` for a window, one per element.
pub fn rolling_means(series: &[f64], window: usize) -> Vec<f64> {
    let mut roll = RollingMean::new(window);
    series.iter().map(|&v| roll.push(v)).collect()
}

/// Values `lag` rows earlier; the first `lag` entries are `None`.
pub fn lagged(series: &[f64], lag: usize) -> Vec<Option<f64>> {
    (0..series.len())
        .map(|i| i.checked_sub(lag).map(|j| series[j]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_mean() {
        let roll = RollingMean::new(5);
        assert!(roll.mean().is_none());
    }

    #[test]
    fn test_partial_window_uses_available_points() {
        let means = rolling_means(&[2.0, 4.0, 6.0], 5);
        assert_relative_eq!(means[0], 2.0);
        assert_relative_eq!(means[1], 3.0);
        assert_relative_eq!(means[2], 4.0);
    }

    #[test]
    fn test_window_slides() {
        let mut roll = RollingMean::new(2);
        roll.push(1.0);
        roll.push(3.0);
        let m = roll.push(5.0);
        assert_relative_eq!(m, 4.0);
        assert_relative_eq!(roll.mean().unwrap(), 4.0);
    }

    #[test]
    fn test_lagged() {
        let lags = lagged(&[1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(lags, vec![None, None, Some(1.0), Some(2.0)]);
    }
}
