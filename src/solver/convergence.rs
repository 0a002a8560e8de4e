//! Stopping policies.
//!
//! Two interchangeable policies decide when an iterative process has produced
//! a good-enough answer:
//!
//! - [`ThresholdPolicy`]: stop once a gap drops to a threshold. The
//!   Brown-Robinson loop feeds it `v_upper_min - v_lower_max` every iteration.
//! - [`RollingStabilityPolicy`]: stop once the last `W` outcomes agree. Outer
//!   loops feed it one value per solve, e.g. the game value at each
//!   discretization level of a continuous game.

use std::collections::VecDeque;

use crate::solver::config::{ConfigError, StabilityConfig};
use crate::solver::matrix::Payoff;

/// A policy that consumes a stream of observations and says when to stop.
pub trait ConvergencePolicy<O> {
    /// Record an observation; returns `true` once the policy is satisfied.
    fn observe(&mut self, observation: O) -> bool;

    /// Forget all observations.
    fn reset(&mut self) {}
}

/// Stop once the observed gap is at most `threshold`.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdPolicy<T> {
    threshold: T,
}

impl<T: Payoff> ThresholdPolicy<T> {
    /// Create a policy; the threshold must be positive.
    pub fn new(threshold: T) -> Result<Self, ConfigError> {
        if threshold <= T::zero() {
            return Err(ConfigError::invalid(
                "eps_threshold",
                format!("must be positive, got {:?}", threshold),
            ));
        }
        Ok(Self { threshold })
    }

    /// The configured threshold.
    pub fn threshold(&self) -> T {
        self.threshold
    }

    /// Whether `gap` is small enough.
    #[inline]
    pub fn is_satisfied(&self, gap: T) -> bool {
        gap <= self.threshold
    }
}

impl<T: Payoff> ConvergencePolicy<T> for ThresholdPolicy<T> {
    fn observe(&mut self, gap: T) -> bool {
        self.is_satisfied(gap)
    }
}

/// Stop once the sample standard deviation of the last `capacity` outcomes
/// falls below `deviation_threshold`.
///
/// The window is a FIFO: once full it is tested, and if it is not yet stable
/// the oldest entry is evicted to make room for the next outcome.
#[derive(Debug, Clone)]
pub struct RollingStabilityPolicy {
    window: VecDeque<f64>,
    capacity: usize,
    deviation_threshold: f64,
    last_deviation: Option<f64>,
}

impl RollingStabilityPolicy {
    /// Create a policy with window size `capacity`.
    pub fn new(capacity: usize, deviation_threshold: f64) -> Result<Self, ConfigError> {
        StabilityConfig::default()
            .with_window(capacity, deviation_threshold)
            .validate()?;

        Ok(Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            deviation_threshold,
            last_deviation: None,
        })
    }

    /// Create a policy from the window settings of a [`StabilityConfig`].
    pub fn from_config(config: &StabilityConfig) -> Result<Self, ConfigError> {
        Self::new(config.window, config.deviation_threshold)
    }

    /// Append an outcome; returns `true` when the full window is stable.
    pub fn push(&mut self, value: f64) -> bool {
        self.window.push_back(value);
        if self.window.len() < self.capacity {
            return false;
        }

        let deviation = sample_std_dev(self.window.iter().copied());
        self.last_deviation = Some(deviation);
        if deviation < self.deviation_threshold {
            return true;
        }

        self.window.pop_front();
        false
    }

    /// Deviation of the most recent full window.
    pub fn last_deviation(&self) -> Option<f64> {
        self.last_deviation
    }

    /// Current window contents, oldest first.
    pub fn window(&self) -> impl Iterator<Item = f64> + '_ {
        self.window.iter().copied()
    }

    /// Configured window size.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl ConvergencePolicy<f64> for RollingStabilityPolicy {
    fn observe(&mut self, value: f64) -> bool {
        self.push(value)
    }

    fn reset(&mut self) {
        self.window.clear();
        self.last_deviation = None;
    }
}

/// Sample (n - 1) standard deviation.
fn sample_std_dev<I>(values: I) -> f64
where
    I: Iterator<Item = f64> + Clone,
{
    let n = values.clone().count();
    if n < 2 {
        return 0.0;
    }
    let mean = values.clone().sum::<f64>() / n as f64;
    let sum_sq: f64 = values.map(|v| (v - mean) * (v - mean)).sum();
    (sum_sq / (n - 1) as f64).sqrt()
}
