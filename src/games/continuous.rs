//! Continuous games on the unit square, solved by discretization.
//!
//! The kernel
//!
//! ```text
//! h(x, y) = a·x² + b·y² + c·x·y + d·x + e·y,    x, y ∈ [0, 1]
//! ```
//!
//! is sampled on an `(n+1)×(n+1)` grid `h(i/n, j/n)`. Each grid is a finite
//! matrix game: it is checked for a saddle point and otherwise solved with
//! the Brown-Robinson method. The grid is refined one step at a time and each
//! level's value is fed to a [`RollingStabilityPolicy`] until the last `W`
//! values agree.
//!
//! ```text
//!   n = 2        n = 3          n = 4
//!  ┌─┬─┬─┐     ┌─┬─┬─┬─┐      ┌─┬─┬─┬─┬─┐
//!  │ │ │ │ ──▶ │ │ │ │ │ ──▶  │ │ │ │ │ │ ──▶ ... until stable
//!  └─┴─┴─┘     └─┴─┴─┴─┘      └─┴─┴─┴─┴─┘
//!   v(2)         v(3)           v(4)
//! ```
//!
//! For a convex-concave kernel (`a < 0 < b`) the equilibrium also has a
//! closed form, see [`BilinearKernel::equilibrium`].

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::solver::config::{to_domain, ConfigError, GameConfig, SaddleConfig, SolverConfig, StabilityConfig};
use crate::solver::{
    GameOutcome, GameSolver, MatrixGame, Payoff, PayoffMatrix, RollingStabilityPolicy, SolverError,
};

/// Quadratic payoff kernel `h(x, y) = a·x² + b·y² + c·x·y + d·x + e·y`.
///
/// The row player picks `x` and maximizes, the column player picks `y` and
/// minimizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BilinearKernel<T> {
    /// Coefficient of `x²`.
    pub a: T,
    /// Coefficient of `y²`.
    pub b: T,
    /// Coefficient of `x·y`.
    pub c: T,
    /// Coefficient of `x`.
    pub d: T,
    /// Coefficient of `y`.
    pub e: T,
}

/// Analytic equilibrium of a convex-concave kernel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KernelEquilibrium<T> {
    /// Row player's optimal point.
    pub x: T,
    /// Column player's optimal point.
    pub y: T,
    /// Value of the game, `h(x, y)`.
    pub value: T,
}

impl<T: Payoff> BilinearKernel<T> {
    /// Create a kernel from its coefficients.
    pub fn new(a: T, b: T, c: T, d: T, e: T) -> Self {
        Self { a, b, c, d, e }
    }

    /// Create a kernel from `f64` coefficients.
    pub fn from_f64(a: f64, b: f64, c: f64, d: f64, e: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            a: to_domain("a", a)?,
            b: to_domain("b", b)?,
            c: to_domain("c", c)?,
            d: to_domain("d", d)?,
            e: to_domain("e", e)?,
        })
    }

    /// The textbook kernel `-5x² + 10/3·y² + 10xy - 2x - 8y`.
    ///
    /// Its equilibrium is `x = 2/5`, `y = 3/5` with value `-14/5`.
    pub fn reference() -> Result<Self, ConfigError> {
        let int = |field: &str, v: i64| {
            T::from_i64(v).ok_or_else(|| {
                ConfigError::invalid(field, format!("{} is not representable in the payoff type", v))
            })
        };
        Ok(Self {
            a: int("a", -5)?,
            b: int("b", 10)? / int("b", 3)?,
            c: int("c", 10)?,
            d: int("d", -2)?,
            e: int("e", -8)?,
        })
    }

    /// Evaluate `h(x, y)`.
    #[inline]
    pub fn evaluate(&self, x: T, y: T) -> T {
        self.a * x * x + self.b * y * y + self.c * x * y + self.d * x + self.e * y
    }

    /// Sample the kernel on the `(n+1)×(n+1)` grid `h(i/n, j/n)`.
    pub fn discretize(&self, n: usize) -> Result<PayoffMatrix<T>, SolverError> {
        let grid = Discretization::new(*self, n)?;
        grid.payoff_matrix()
    }

    /// Closed-form stationary point of `∂h/∂x = ∂h/∂y = 0`.
    ///
    /// ```text
    /// det = 4ab - c²
    /// x   = (c·e - 2b·d) / det
    /// y   = (c·d - 2a·e) / det
    /// ```
    ///
    /// Only meaningful when `h` is concave in `x` and convex in `y`
    /// (`a < 0 < b`) and the point lies inside the unit square.
    pub fn equilibrium(&self) -> Result<KernelEquilibrium<T>, ConfigError> {
        if !(self.a < T::zero() && T::zero() < self.b) {
            return Err(ConfigError::invalid(
                "kernel",
                format!(
                    "not convex-concave: need a < 0 < b, got a = {:?}, b = {:?}",
                    self.a, self.b
                ),
            ));
        }

        let two = T::one() + T::one();
        let det = two * two * self.a * self.b - self.c * self.c;
        if det.is_zero() {
            return Err(ConfigError::invalid("kernel", "stationary system is singular"));
        }

        let x = (self.c * self.e - two * self.b * self.d) / det;
        let y = (self.c * self.d - two * self.a * self.e) / det;

        let unit = |v: T| T::zero() <= v && v <= T::one();
        if !(unit(x) && unit(y)) {
            return Err(ConfigError::invalid(
                "kernel",
                format!("stationary point ({:?}, {:?}) lies outside the unit square", x, y),
            ));
        }

        Ok(KernelEquilibrium {
            x,
            y,
            value: self.evaluate(x, y),
        })
    }
}

/// One grid resolution of a [`BilinearKernel`].
#[derive(Debug, Clone, Copy)]
pub struct Discretization<T> {
    kernel: BilinearKernel<T>,
    n: usize,
}

impl<T: Payoff> Discretization<T> {
    /// Grid with `n + 1` points per axis; `n` must be at least 1.
    pub fn new(kernel: BilinearKernel<T>, n: usize) -> Result<Self, ConfigError> {
        if n == 0 {
            return Err(ConfigError::invalid("n", "grid resolution must be at least 1"));
        }
        Ok(Self { kernel, n })
    }

    /// Grid resolution.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Coordinate of grid index `i`, i.e. `i / n`.
    pub fn grid_point(&self, i: usize) -> Result<T, SolverError> {
        Ok(T::from_count(i as u64)? / T::from_count(self.n as u64)?)
    }
}

impl<T: Payoff> MatrixGame for Discretization<T> {
    type Payoff = T;

    fn payoff_matrix(&self) -> Result<PayoffMatrix<T>, SolverError> {
        let points = (0..=self.n)
            .map(|i| self.grid_point(i))
            .collect::<Result<Vec<T>, SolverError>>()?;

        Ok(PayoffMatrix::from_fn(points.len(), points.len(), |i, j| {
            self.kernel.evaluate(points[i], points[j])
        })?)
    }

    fn name(&self) -> String {
        format!("kernel grid n={}", self.n)
    }
}

/// Outcome of one discretization level.
#[derive(Debug, Clone, Serialize)]
pub struct LevelResult {
    /// Grid resolution.
    pub n: usize,
    /// Whether the grid had a saddle point.
    pub saddle: bool,
    /// Row player's grid point.
    pub x: f64,
    /// Column player's grid point.
    pub y: f64,
    /// Game value at this level.
    pub value: f64,
    /// Brown-Robinson iterations, when the iterative solver ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u64>,
}

/// Result of a converged sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    /// Every level solved, in order.
    pub levels: Vec<LevelResult>,
    /// Resolution at which the window stabilized.
    pub converged_level: usize,
    /// Row player's point at the final level.
    pub x: f64,
    /// Column player's point at the final level.
    pub y: f64,
    /// Game value at the final level.
    pub value: f64,
    /// Standard deviation of the final window.
    pub deviation: f64,
}

/// Refines the grid until the level values stabilize.
///
/// # Example
/// ```
/// use brown_robinson::games::continuous::{BilinearKernel, DiscretizationSweep};
/// use brown_robinson::solver::GameConfig;
///
/// let mut config = GameConfig::default();
/// config.solver.seed = Some(3);
/// config.stability = config.stability.with_window(3, 0.05);
///
/// let kernel = BilinearKernel::<f64>::reference().unwrap();
/// let report = DiscretizationSweep::new(&config).unwrap().run(&kernel).unwrap();
/// assert!((report.value + 2.8).abs() < 0.1);
/// ```
pub struct DiscretizationSweep<R = StdRng> {
    stability: StabilityConfig,
    solver: GameSolver<R>,
}

impl DiscretizationSweep<StdRng> {
    /// Create a sweep from a full configuration.
    ///
    /// The inner solves use `stability.solver_eps` as their gap threshold.
    pub fn new(config: &GameConfig) -> Result<Self, SolverError> {
        let rng = config.solver.rng();
        Self::with_rng(
            config.stability.clone(),
            config.saddle.clone(),
            config.solver.clone(),
            rng,
        )
    }
}

impl<R: Rng> DiscretizationSweep<R> {
    /// Create a sweep with a caller-supplied random source.
    pub fn with_rng(
        stability: StabilityConfig,
        saddle: SaddleConfig,
        solver: SolverConfig,
        rng: R,
    ) -> Result<Self, SolverError> {
        stability.validate()?;
        let solver = solver.with_eps(stability.solver_eps);
        Ok(Self {
            solver: GameSolver::with_rng(saddle, solver, rng)?,
            stability,
        })
    }

    /// Get reference to the stability configuration.
    pub fn config(&self) -> &StabilityConfig {
        &self.stability
    }

    /// Run the sweep.
    pub fn run<T: Payoff>(&mut self, kernel: &BilinearKernel<T>) -> Result<SweepReport, SolverError> {
        self.run_with_callback(kernel, |_| {})
    }

    /// Run the sweep, calling `callback` after every level.
    ///
    /// Fails with [`SolverError::SweepExhausted`] after `max_levels` levels
    /// without stabilizing, and with [`SolverError::NonConvergence`] if an
    /// inner solve hits its iteration or time cap.
    pub fn run_with_callback<T, F>(
        &mut self,
        kernel: &BilinearKernel<T>,
        mut callback: F,
    ) -> Result<SweepReport, SolverError>
    where
        T: Payoff,
        F: FnMut(&LevelResult),
    {
        let mut policy = RollingStabilityPolicy::from_config(&self.stability)?;
        let mut levels = Vec::new();

        for n in (self.stability.start_level..).take(self.stability.max_levels) {
            let level = self.solve_level(kernel, n)?;
            log::debug!(
                "level n={}: value {:.6} at ({:.4}, {:.4}){}",
                n,
                level.value,
                level.x,
                level.y,
                if level.saddle { " [saddle]" } else { "" }
            );
            callback(&level);

            let stable = policy.push(level.value);
            levels.push(level);

            if stable {
                let deviation = policy.last_deviation().unwrap_or(0.0);
                let last = &levels[levels.len() - 1];
                log::info!(
                    "sweep stabilized at n={} (deviation {:.2e}): value {:.6}",
                    n,
                    deviation,
                    last.value
                );
                return Ok(SweepReport {
                    converged_level: n,
                    x: last.x,
                    y: last.y,
                    value: last.value,
                    deviation,
                    levels,
                });
            }
        }

        log::warn!(
            "sweep did not stabilize after {} levels (last deviation {:?})",
            levels.len(),
            policy.last_deviation()
        );
        Err(SolverError::SweepExhausted {
            levels: levels.len(),
            last_deviation: policy.last_deviation(),
        })
    }

    fn solve_level<T: Payoff>(
        &mut self,
        kernel: &BilinearKernel<T>,
        n: usize,
    ) -> Result<LevelResult, SolverError> {
        let grid = Discretization::new(*kernel, n)?;
        let matrix = grid.payoff_matrix()?;

        let (row, col, value, saddle, iterations) = match self.solver.solve_matrix(&matrix)? {
            GameOutcome::Saddle(point) => (point.row, point.col, point.value, true, None),
            GameOutcome::Mixed(solution) => {
                let solution = solution.into_converged()?;
                let (row, col, cell) = matrix.find_closest(solution.value_estimate());
                (row, col, cell, false, Some(solution.iterations))
            }
        };

        Ok(LevelResult {
            n,
            saddle,
            x: grid.grid_point(row)?.as_f64(),
            y: grid.grid_point(col)?.as_f64(),
            value: value.as_f64(),
            iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::Rational;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use rand::SeedableRng;

    fn sweep(stability: StabilityConfig, seed: u64) -> DiscretizationSweep {
        DiscretizationSweep::with_rng(
            stability,
            SaddleConfig::default(),
            SolverConfig::default(),
            StdRng::seed_from_u64(seed),
        )
        .unwrap()
    }

    #[test]
    fn test_evaluate_and_discretize() {
        let kernel = BilinearKernel::<f64>::reference().unwrap();
        assert_relative_eq!(kernel.evaluate(0.4, 0.6), -2.8, epsilon = 1e-12);

        let m = kernel.discretize(2).unwrap();
        assert_eq!(m.dimensions(), (3, 3));
        assert_eq!(m.get(0, 0), 0.0);
        assert_relative_eq!(m.get(2, 2), kernel.evaluate(1.0, 1.0), epsilon = 1e-12);
        assert_relative_eq!(m.get(1, 2), kernel.evaluate(0.5, 1.0), epsilon = 1e-12);

        assert!(kernel.discretize(0).is_err());
    }

    #[test]
    fn test_reference_equilibrium() {
        let kernel = BilinearKernel::<Rational>::reference().unwrap();
        let eq = kernel.equilibrium().unwrap();

        assert_eq!(eq.x, Rational::new(2, 5));
        assert_eq!(eq.y, Rational::new(3, 5));
        assert_eq!(eq.value, Rational::new(-14, 5));
    }

    #[test]
    fn test_equilibrium_requires_convex_concave() {
        let kernel = BilinearKernel::new(1.0, 1.0, 0.0, 0.0, 0.0);
        assert!(kernel.equilibrium().is_err());

        // Stationary point at x = 2 is off the square.
        let kernel = BilinearKernel::new(-1.0, 1.0, 0.0, 4.0, 0.0);
        assert!(kernel.equilibrium().is_err());
    }

    #[test]
    fn test_reference_sweep_converges() {
        let kernel = BilinearKernel::<f64>::reference().unwrap();
        let report = sweep(StabilityConfig::default(), 7).run(&kernel).unwrap();

        assert_eq!(report.converged_level, 22);
        assert_eq!(report.levels.len(), 21);
        assert_eq!(report.levels[0].n, 2);
        assert!(report.deviation < 0.001);
        assert_abs_diff_eq!(report.value, -2.8, epsilon = 0.01);
        assert_abs_diff_eq!(report.x, 0.4, epsilon = 0.05);
        assert_abs_diff_eq!(report.y, 0.6, epsilon = 0.05);
    }

    #[test]
    fn test_short_window_stops_early() {
        let kernel = BilinearKernel::<f64>::reference().unwrap();
        let stability = StabilityConfig::default().with_window(3, 0.05);
        let mut seen = Vec::new();
        let report = sweep(stability, 1)
            .run_with_callback(&kernel, |level| seen.push(level.n))
            .unwrap();

        assert_eq!(report.converged_level, 5);
        assert_eq!(seen, vec![2, 3, 4, 5]);
        assert_abs_diff_eq!(report.value, -2.8, epsilon = 1e-9);
    }

    #[test]
    fn test_sweep_exhausted() {
        let kernel = BilinearKernel::<f64>::reference().unwrap();
        let stability = StabilityConfig::default().with_window(3, 0.001).with_max_levels(2);

        match sweep(stability, 1).run(&kernel) {
            Err(SolverError::SweepExhausted {
                levels,
                last_deviation,
            }) => {
                assert_eq!(levels, 2);
                assert!(last_deviation.is_none());
            }
            other => panic!("expected SweepExhausted, got {:?}", other.map(|r| r.converged_level)),
        }
    }

    #[test]
    fn test_saddle_kernel_levels() {
        // h = x - y: the row player takes x = 1, the column player y = 1.
        let kernel = BilinearKernel::new(0.0, 0.0, 0.0, 1.0, -1.0);
        let report = sweep(StabilityConfig::default().with_window(3, 0.001), 2)
            .run(&kernel)
            .unwrap();

        assert!(report.levels.iter().all(|level| level.saddle));
        assert!(report.levels.iter().all(|level| level.iterations.is_none()));
        assert_eq!(report.converged_level, 4);
        assert_eq!((report.x, report.y, report.value), (1.0, 1.0, 0.0));
    }

    #[test]
    fn test_rational_sweep() {
        let kernel = BilinearKernel::<Rational>::reference().unwrap();
        let stability = StabilityConfig::default().with_window(3, 0.05);
        let report = sweep(stability, 4).run(&kernel).unwrap();

        assert!(report.deviation < 0.05);
        assert_abs_diff_eq!(report.value, -2.8, epsilon = 0.1);
    }
}
