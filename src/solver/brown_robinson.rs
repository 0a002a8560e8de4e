//! Brown-Robinson iterative method (fictitious play).
//!
//! Each player repeatedly plays a pure best response to the opponent's
//! empirical mix of past plays. The empirical frequencies converge to optimal
//! mixed strategies, and after `k` plays
//!
//! ```text
//! v_upper = max_i x[i] / k   >=  game value  >=  v_lower = min_j y[j] / k
//! ```
//!
//! where `x` accumulates the columns the column player has picked and `y` the
//! rows the row player has picked. The best bounds seen so far are tracked and
//! the run stops once their gap is at most the configured threshold.
//!
//! The gap is not guaranteed to shrink at any particular rate, and for a
//! degenerate tolerance it may never reach the threshold. Runs are therefore
//! capped by iteration count (and optionally wall-clock time) unless the
//! caller opts into [`SolverConfig::unbounded`].

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;

use crate::solver::config::SolverConfig;
use crate::solver::convergence::ThresholdPolicy;
use crate::solver::error::SolverError;
use crate::solver::extremum::{Equality, ExtremumFinder};
use crate::solver::matrix::{Payoff, PayoffMatrix};

/// Why a run stopped before the gap closed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum AbortReason {
    /// The iteration counter reached `max_iterations`.
    IterationCap {
        /// The configured cap.
        limit: u64,
    },
    /// The wall-clock cap elapsed.
    TimeLimit {
        /// The configured cap in seconds.
        limit_secs: f64,
    },
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbortReason::IterationCap { limit } => write!(f, "iteration cap {} reached", limit),
            AbortReason::TimeLimit { limit_secs } => {
                write!(f, "time limit of {}s exceeded", limit_secs)
            }
        }
    }
}

/// Run state of the solver loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SolverStatus {
    /// Still iterating.
    Running,
    /// The gap dropped to the threshold.
    Converged,
    /// A safety cap fired first.
    Aborted(AbortReason),
}

/// Snapshot of one iteration.
///
/// The first step of a trace describes the initial state (both players on
/// pure strategy 0) with the tracked bounds. Later steps hold the pure
/// strategies played in that iteration and that iteration's own bound
/// estimates, while `eps` is always the gap between the tracked bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolverStep<T> {
    /// Iteration counter `k` after this step.
    pub iteration: u64,
    /// Row player's pure strategy for this step.
    pub row_choice: usize,
    /// Column player's pure strategy for this step.
    pub col_choice: usize,
    /// Cumulative row-player payoffs.
    pub x: Vec<T>,
    /// Cumulative column-player losses.
    pub y: Vec<T>,
    /// Upper value estimate `max(x) / k`.
    pub v_upper: T,
    /// Lower value estimate `min(y) / k`.
    pub v_lower: T,
    /// Gap between the tracked bounds.
    pub eps: T,
}

/// Progress report passed to [`BrownRobinson::solve_with_callback`].
#[derive(Debug, Clone)]
pub struct SolverProgress {
    /// Current iteration counter.
    pub iteration: u64,
    /// Tracked upper bound.
    pub v_upper: f64,
    /// Tracked lower bound.
    pub v_lower: f64,
    /// Gap between the tracked bounds.
    pub eps: f64,
    /// Elapsed time in seconds.
    pub elapsed_seconds: f64,
}

/// Result of a solve.
#[derive(Debug, Clone, Serialize)]
pub struct Solution<T> {
    /// Row player's empirical mixed strategy.
    pub row_strategy: Vec<T>,
    /// Column player's empirical mixed strategy.
    pub column_strategy: Vec<T>,
    /// Best (smallest) upper bound on the game value.
    pub v_upper: T,
    /// Best (largest) lower bound on the game value.
    pub v_lower: T,
    /// Final iteration counter `k`.
    pub iterations: u64,
    /// Whether the run converged or was aborted.
    pub status: SolverStatus,
    /// Per-iteration trace, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<SolverStep<T>>>,
    /// Wall-clock time spent.
    pub elapsed_seconds: f64,
}

impl<T: Payoff> Solution<T> {
    /// Gap between the bounds.
    pub fn gap(&self) -> T {
        self.v_upper - self.v_lower
    }

    /// Midpoint of the bounds.
    pub fn value_estimate(&self) -> T {
        self.v_upper.midpoint(self.v_lower)
    }

    /// Whether the gap closed before any cap fired.
    pub fn is_converged(&self) -> bool {
        self.status == SolverStatus::Converged
    }

    /// Turn an aborted run into [`SolverError::NonConvergence`].
    pub fn into_converged(self) -> Result<Self, SolverError> {
        match self.status {
            SolverStatus::Aborted(reason) => Err(SolverError::NonConvergence {
                iterations: self.iterations,
                v_upper: self.v_upper.as_f64(),
                v_lower: self.v_lower.as_f64(),
                reason: reason.to_string(),
            }),
            _ => Ok(self),
        }
    }
}

/// Running totals of one solve.
struct IterationState<T> {
    x: Vec<T>,
    y: Vec<T>,
    row_counts: Vec<u64>,
    col_counts: Vec<u64>,
    k: u64,
    v_upper_min: T,
    v_lower_max: T,
    next_row: usize,
    next_col: usize,
}

impl<T: Payoff> IterationState<T> {
    /// Both players open with pure strategy 0.
    fn start<R: Rng + ?Sized>(
        matrix: &PayoffMatrix<T>,
        upper: &ExtremumFinder<T>,
        lower: &ExtremumFinder<T>,
        rng: &mut R,
    ) -> Result<Self, SolverError> {
        let (m, n) = matrix.dimensions();
        let x: Vec<T> = matrix.column(0).collect();
        let y: Vec<T> = matrix.row(0).to_vec();

        let mut row_counts = vec![0; m];
        let mut col_counts = vec![0; n];
        row_counts[0] = 1;
        col_counts[0] = 1;

        let (v_upper_min, next_row) = upper.random(x.iter().copied(), rng)?;
        let (v_lower_max, next_col) = lower.random(y.iter().copied(), rng)?;

        Ok(Self {
            x,
            y,
            row_counts,
            col_counts,
            k: 1,
            v_upper_min,
            v_lower_max,
            next_row,
            next_col,
        })
    }

    fn eps(&self) -> T {
        self.v_upper_min - self.v_lower_max
    }

    /// Play the pending best responses and pick the next ones.
    ///
    /// Returns the pure strategies played and this iteration's raw
    /// `(v_upper, v_lower)` estimates.
    fn advance<R: Rng + ?Sized>(
        &mut self,
        matrix: &PayoffMatrix<T>,
        upper: &ExtremumFinder<T>,
        lower: &ExtremumFinder<T>,
        rng: &mut R,
    ) -> Result<(usize, usize, T, T), SolverError> {
        let played_row = self.next_row;
        let played_col = self.next_col;

        self.k += 1;
        self.row_counts[played_row] += 1;
        self.col_counts[played_col] += 1;

        for (acc, cell) in self.x.iter_mut().zip(matrix.column(played_col)) {
            *acc = *acc + cell;
        }
        for (acc, &cell) in self.y.iter_mut().zip(matrix.row(played_row)) {
            *acc = *acc + cell;
        }

        let k = T::from_count(self.k)?;
        let (x_max, next_row) = upper.random(self.x.iter().copied(), rng)?;
        let (y_min, next_col) = lower.random(self.y.iter().copied(), rng)?;
        self.next_row = next_row;
        self.next_col = next_col;

        let v_upper = x_max / k;
        let v_lower = y_min / k;
        if v_upper < self.v_upper_min {
            self.v_upper_min = v_upper;
        }
        if v_lower > self.v_lower_max {
            self.v_lower_max = v_lower;
        }

        Ok((played_row, played_col, v_upper, v_lower))
    }

    fn frequencies(counts: &[u64], k: u64) -> Result<Vec<T>, SolverError> {
        let total = T::from_count(k)?;
        counts
            .iter()
            .map(|&c| Ok(T::from_count(c)? / total))
            .collect()
    }

    fn step(&self, row_choice: usize, col_choice: usize, v_upper: T, v_lower: T) -> SolverStep<T> {
        SolverStep {
            iteration: self.k,
            row_choice,
            col_choice,
            x: self.x.clone(),
            y: self.y.clone(),
            v_upper,
            v_lower,
            eps: self.eps(),
        }
    }

    fn progress(&self, start: Instant) -> SolverProgress {
        SolverProgress {
            iteration: self.k,
            v_upper: self.v_upper_min.as_f64(),
            v_lower: self.v_lower_max.as_f64(),
            eps: self.eps().as_f64(),
            elapsed_seconds: start.elapsed().as_secs_f64(),
        }
    }
}

/// The Brown-Robinson solver.
///
/// Owns the configuration and the random source used for tie-breaking. Each
/// call to [`solve`](Self::solve) starts from scratch; only the random
/// generator's state carries over between calls.
///
/// # Example
/// ```
/// use brown_robinson::solver::{BrownRobinson, PayoffMatrix, SolverConfig};
///
/// let matrix = PayoffMatrix::new(vec![vec![4.0, 0.0], vec![0.0, 1.0]]).unwrap();
/// let mut solver = BrownRobinson::new(SolverConfig::default().with_seed(1)).unwrap();
/// let solution = solver.solve(&matrix).unwrap();
///
/// assert!(solution.is_converged());
/// assert!(solution.v_lower <= 0.8 && 0.8 <= solution.v_upper);
/// ```
pub struct BrownRobinson<R = StdRng> {
    config: SolverConfig,
    rng: R,
}

impl BrownRobinson<StdRng> {
    /// Create a solver; seeds from `config.seed` or from entropy.
    pub fn new(config: SolverConfig) -> Result<Self, SolverError> {
        let rng = config.rng();
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> BrownRobinson<R> {
    /// Create a solver with a caller-supplied random source.
    pub fn with_rng(config: SolverConfig, rng: R) -> Result<Self, SolverError> {
        config.validate()?;
        Ok(Self { config, rng })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Mutable access to the random source.
    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    /// Solve `matrix`.
    ///
    /// Returns a solution flagged [`SolverStatus::Aborted`] if a cap fires;
    /// use [`Solution::into_converged`] to treat that as an error.
    pub fn solve<T: Payoff>(&mut self, matrix: &PayoffMatrix<T>) -> Result<Solution<T>, SolverError> {
        self.solve_with_callback(matrix, 0, |_| {})
    }

    /// Solve `matrix`, calling `callback` every `interval` iterations.
    ///
    /// An `interval` of 0 disables the callback.
    pub fn solve_with_callback<T, F>(
        &mut self,
        matrix: &PayoffMatrix<T>,
        interval: u64,
        mut callback: F,
    ) -> Result<Solution<T>, SolverError>
    where
        T: Payoff,
        F: FnMut(&SolverProgress),
    {
        let start = Instant::now();
        let threshold = ThresholdPolicy::new(self.config.threshold::<T>()?)?;
        let equality: Equality<T> = self.config.equality()?;
        let upper = ExtremumFinder::max(equality);
        let lower = ExtremumFinder::min(equality);
        let time_limit = self.config.time_limit_secs.map(Duration::from_secs_f64);

        log::debug!(
            "brown-robinson on {}x{} matrix, eps {:?}, cap {:?}",
            matrix.rows(),
            matrix.cols(),
            threshold.threshold(),
            self.config.max_iterations
        );

        let mut state = IterationState::start(matrix, &upper, &lower, &mut self.rng)?;
        let mut trace = self.config.record_trace.then(|| {
            vec![state.step(0, 0, state.v_upper_min, state.v_lower_max)]
        });

        let mut status = if threshold.is_satisfied(state.eps()) {
            SolverStatus::Converged
        } else {
            SolverStatus::Running
        };

        while status == SolverStatus::Running {
            if let Some(reason) = self.cap_reached(state.k, start, time_limit) {
                status = SolverStatus::Aborted(reason);
                break;
            }

            let (row, col, v_upper, v_lower) =
                state.advance(matrix, &upper, &lower, &mut self.rng)?;

            if let Some(steps) = trace.as_mut() {
                steps.push(state.step(row, col, v_upper, v_lower));
            }

            if interval > 0 && state.k % interval == 0 {
                callback(&state.progress(start));
            }

            if threshold.is_satisfied(state.eps()) {
                status = SolverStatus::Converged;
            }
        }

        match status {
            SolverStatus::Aborted(reason) => log::warn!(
                "brown-robinson aborted after {} iterations ({}), gap {:?}",
                state.k,
                reason,
                state.eps()
            ),
            _ => log::debug!(
                "brown-robinson converged after {} iterations: {:?} <= v <= {:?}",
                state.k,
                state.v_lower_max,
                state.v_upper_min
            ),
        }

        Ok(Solution {
            row_strategy: IterationState::<T>::frequencies(&state.row_counts, state.k)?,
            column_strategy: IterationState::<T>::frequencies(&state.col_counts, state.k)?,
            v_upper: state.v_upper_min,
            v_lower: state.v_lower_max,
            iterations: state.k,
            status,
            trace,
            elapsed_seconds: start.elapsed().as_secs_f64(),
        })
    }

    fn cap_reached(&self, k: u64, start: Instant, time_limit: Option<Duration>) -> Option<AbortReason> {
        if let Some(limit) = self.config.max_iterations {
            if k >= limit {
                return Some(AbortReason::IterationCap { limit });
            }
        }
        match time_limit {
            Some(limit) if start.elapsed() >= limit => Some(AbortReason::TimeLimit {
                limit_secs: limit.as_secs_f64(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::matrix::Rational;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use rand::SeedableRng;

    fn matrix(rows: &[&[i64]]) -> PayoffMatrix<f64> {
        PayoffMatrix::from_integers(rows).unwrap()
    }

    fn seeded(config: SolverConfig) -> BrownRobinson {
        BrownRobinson::with_rng(config, StdRng::seed_from_u64(42)).unwrap()
    }

    fn assert_distribution(strategy: &[f64]) {
        assert!(strategy.iter().all(|&p| p >= 0.0));
        assert_relative_eq!(strategy.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_two_by_two_brackets_mixed_value() {
        let m = matrix(&[&[4, 0], &[0, 1]]);
        let solution = seeded(SolverConfig::default().with_eps(0.1)).solve(&m).unwrap();

        assert!(solution.is_converged());
        assert!(solution.gap() <= 0.1);
        assert!(solution.v_lower <= 0.8 && 0.8 <= solution.v_upper);
        assert_abs_diff_eq!(solution.value_estimate(), 0.8, epsilon = 0.1);
        assert_distribution(&solution.row_strategy);
        assert_distribution(&solution.column_strategy);
    }

    #[test]
    fn test_reference_three_by_three() {
        let m = matrix(&[&[17, 4, 9], &[0, 16, 9], &[12, 2, 19]]);
        let solution = seeded(SolverConfig::default().with_eps(0.1)).solve(&m).unwrap();

        assert!(solution.is_converged());
        assert!(solution.gap() <= 0.1);
        // Optimal row strategy is close to (0.53, 0.45, 0.03).
        assert_abs_diff_eq!(solution.row_strategy[0], 0.5, epsilon = 0.1);
        assert_abs_diff_eq!(solution.row_strategy[1], 0.44, epsilon = 0.1);
        assert!(solution.v_lower < 9.3 && solution.v_upper > 9.2);
    }

    #[test]
    fn test_tie_tolerance_keeps_bounds_bracketing() {
        let m = matrix(&[&[17, 4, 9], &[0, 16, 9], &[12, 2, 19]]);
        let value = 1783.0 / 192.0;
        let solution = seeded(
            SolverConfig::default()
                .with_eps(0.1)
                .with_tie_tolerance(1.0)
                .with_trace(true),
        )
        .solve(&m)
        .unwrap();

        assert!(solution.is_converged());
        assert!(solution.v_lower <= value && value <= solution.v_upper);
        for step in solution.trace.as_ref().unwrap() {
            assert!(step.v_upper >= value, "upper estimate below value at k = {}", step.iteration);
            assert!(step.v_lower <= value, "lower estimate above value at k = {}", step.iteration);
        }
    }

    #[test]
    fn test_saddle_matrix_stops_at_first_iteration() {
        let m = matrix(&[&[3, 5], &[1, 2]]);
        let solution = seeded(SolverConfig::default().with_eps(1e-9)).solve(&m).unwrap();

        assert_eq!(solution.iterations, 1);
        assert_eq!(solution.v_upper, 3.0);
        assert_eq!(solution.v_lower, 3.0);
        assert_eq!(solution.row_strategy, vec![1.0, 0.0]);
        assert_eq!(solution.column_strategy, vec![1.0, 0.0]);
    }

    #[test]
    fn test_single_cell() {
        let m = matrix(&[&[7]]);
        let solution = seeded(SolverConfig::default()).solve(&m).unwrap();

        assert_eq!(solution.iterations, 1);
        assert_eq!(solution.gap(), 0.0);
        assert_eq!(solution.row_strategy, vec![1.0]);
    }

    #[test]
    fn test_saddle_value_approached_as_eps_shrinks() {
        // Saddle at (1, 1) with value 2, but pure strategy 0 is played first.
        let m = matrix(&[&[0, 1, 5], &[3, 2, 4], &[1, 0, 6]]);
        for eps in [0.5, 0.1, 0.01] {
            let solution = seeded(SolverConfig::default().with_eps(eps)).solve(&m).unwrap();
            assert!(solution.is_converged());
            assert!(solution.v_lower <= 2.0 && 2.0 <= solution.v_upper);
            assert!(solution.gap() <= eps);
        }
    }

    #[test]
    fn test_trace_invariants() {
        let m = matrix(&[&[17, 4, 9], &[0, 16, 9], &[12, 2, 19]]);
        let solution = seeded(SolverConfig::default().with_eps(0.1).with_trace(true))
            .solve(&m)
            .unwrap();
        let trace = solution.trace.as_ref().unwrap();

        assert_eq!(trace.len() as u64, solution.iterations);
        assert_eq!(trace[0].iteration, 1);
        assert_eq!((trace[0].row_choice, trace[0].col_choice), (0, 0));
        assert_eq!(trace[0].x, vec![17.0, 0.0, 12.0]);
        assert_eq!(trace[0].y, vec![17.0, 4.0, 9.0]);

        let mut previous_eps = f64::INFINITY;
        for (k, step) in trace.iter().enumerate() {
            assert_eq!(step.iteration, k as u64 + 1);
            assert!(step.eps >= 0.0, "tracked bounds crossed at step {}", k);
            assert!(step.eps <= previous_eps, "tracked gap widened at step {}", k);
            previous_eps = step.eps;

            let x_total: f64 = step.x.iter().sum();
            let y_total: f64 = step.y.iter().sum();
            assert!(x_total.is_finite() && y_total.is_finite());
        }
        assert_eq!(trace.last().unwrap().eps, solution.gap());
    }

    /// Irrational value, so the float bounds can never meet exactly.
    fn pi_game() -> PayoffMatrix<f64> {
        PayoffMatrix::new(vec![vec![std::f64::consts::PI, 0.0], vec![0.0, 1.0]]).unwrap()
    }

    #[test]
    fn test_iteration_cap_aborts() {
        let m = pi_game();
        let solution = seeded(SolverConfig::default().with_eps(1e-12).with_max_iterations(50))
            .solve(&m)
            .unwrap();

        assert_eq!(solution.iterations, 50);
        assert_eq!(
            solution.status,
            SolverStatus::Aborted(AbortReason::IterationCap { limit: 50 })
        );
        assert_distribution(&solution.row_strategy);

        match solution.into_converged() {
            Err(SolverError::NonConvergence { iterations, .. }) => assert_eq!(iterations, 50),
            other => panic!("expected NonConvergence, got {:?}", other.map(|s| s.status)),
        }
    }

    #[test]
    fn test_time_limit_aborts() {
        let m = pi_game();
        let solution = seeded(
            SolverConfig::default()
                .with_eps(1e-15)
                .unbounded()
                .with_time_limit(1e-3),
        )
        .solve(&m)
        .unwrap();

        assert!(matches!(
            solution.status,
            SolverStatus::Aborted(AbortReason::TimeLimit { .. })
        ));
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let m = matrix(&[&[1, -1], &[-1, 1]]);
        let config = SolverConfig::default().with_eps(0.05).with_seed(2024);

        let a = BrownRobinson::new(config.clone()).unwrap().solve(&m).unwrap();
        let b = BrownRobinson::new(config).unwrap().solve(&m).unwrap();

        assert_eq!(a.row_strategy, b.row_strategy);
        assert_eq!(a.column_strategy, b.column_strategy);
        assert_eq!(a.v_upper, b.v_upper);
        assert_eq!(a.v_lower, b.v_lower);
        assert_eq!(a.iterations, b.iterations);
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        assert!(matches!(
            BrownRobinson::new(SolverConfig::default().with_eps(0.0)),
            Err(SolverError::Config(_))
        ));
    }

    #[test]
    fn test_rational_solve_is_exact() {
        let m: PayoffMatrix<Rational> = PayoffMatrix::from_integers(&[&[4, 0], &[0, 1]]).unwrap();
        let mut solver = seeded(SolverConfig::default().with_eps(0.125));
        let solution = solver.solve(&m).unwrap();

        let value = Rational::new(4, 5);
        assert!(solution.v_lower <= value && value <= solution.v_upper);
        assert!(solution.gap() <= Rational::new(1, 8));

        let k = Rational::from_integer(solution.iterations as i64);
        let row_sum: Rational = solution.row_strategy.iter().copied().sum();
        assert_eq!(row_sum, Rational::from_integer(1));
        assert!(solution.row_strategy.iter().all(|p| (*p * k).is_integer()));
    }

    #[test]
    fn test_progress_callback() {
        let m = matrix(&[&[4, 0], &[0, 1]]);
        let mut calls = Vec::new();
        let solution = seeded(SolverConfig::default().with_eps(0.01))
            .solve_with_callback(&m, 5, |progress| calls.push(progress.iteration))
            .unwrap();

        assert_eq!(calls.len() as u64, solution.iterations / 5);
        assert!(calls.iter().all(|k| k % 5 == 0));
    }
}
