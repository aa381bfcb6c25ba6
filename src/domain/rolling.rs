//! Fixed-capacity sliding window with incremental mean and variance.
//!
//! Uses Welford's update while the window fills, then the add-one/drop-one
//! form once it is full:
//!
//! mean' = mean + (x_new - x_old) / n
//! M2'   = M2 + (x_new - x_old) * (x_new - mean' + x_old - mean)
//!
//! Population variance is M2 / n.
//!
//! A non-finite value poisons both accumulators. While that happens the state
//! is rebuilt from the buffered values on every push, so the statistics become
//! finite again as soon as the value slides out.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    values: VecDeque<f64>,
    mean: f64,
    m2: f64,
}

impl RollingWindow {
    /// A zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
            mean: 0.0,
            m2: 0.0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    pub fn push(&mut self, value: f64) {
        if self.is_full() {
            if let Some(old) = self.values.pop_front() {
                let n = self.capacity as f64;
                let old_mean = self.mean;
                self.mean += (value - old) / n;
                self.m2 += (value - old) * (value - self.mean + old - old_mean);
                // Rounding can push M2 fractionally below zero.
                if self.m2 < 0.0 {
                    self.m2 = 0.0;
                }
                self.values.push_back(value);
                self.rebuild_if_poisoned();
                return;
            }
        }

        self.values.push_back(value);
        let n = self.values.len() as f64;
        let delta = value - self.mean;
        self.mean += delta / n;
        self.m2 += delta * (value - self.mean);
        self.rebuild_if_poisoned();
    }

    fn rebuild_if_poisoned(&mut self) {
        if self.mean.is_finite() && self.m2.is_finite() {
            return;
        }
        let n = self.values.len() as f64;
        self.mean = self.values.iter().sum::<f64>() / n;
        self.m2 = self.values.iter().map(|v| (v - self.mean).powi(2)).sum();
    }

    pub fn mean(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(self.mean)
        }
    }

    pub fn population_variance(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(self.m2 / self.values.len() as f64)
        }
    }

    pub fn population_stddev(&self) -> Option<f64> {
        self.population_variance().map(f64::sqrt)
    }
}
