//! Game sources and the saddle-point-first workflow.
//!
//! Anything that can produce a payoff matrix implements [`MatrixGame`]: a
//! hand-built matrix, a named preset, or a sampled continuous game. The
//! [`GameSolver`] checks for a pure saddle point first and only falls back to
//! the Brown-Robinson iteration when there is none.

use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;

use crate::solver::brown_robinson::{BrownRobinson, Solution, SolverProgress};
use crate::solver::config::{GameConfig, SaddleConfig, SolverConfig};
use crate::solver::error::SolverError;
use crate::solver::matrix::{Payoff, PayoffMatrix};
use crate::solver::saddle::{SaddlePoint, SaddlePointDetector};

/// A source of a two-player zero-sum payoff matrix.
///
/// # Example
/// ```ignore
/// struct Duel { accuracy: f64 }
///
/// impl MatrixGame for Duel {
///     type Payoff = f64;
///
///     fn payoff_matrix(&self) -> Result<PayoffMatrix<f64>, SolverError> {
///         // ... build the matrix from the game's parameters
///     }
/// }
/// ```
pub trait MatrixGame {
    /// Numeric type of the payoffs.
    type Payoff: Payoff;

    /// Build the payoff matrix (row player's perspective).
    fn payoff_matrix(&self) -> Result<PayoffMatrix<Self::Payoff>, SolverError>;

    /// Human-readable name for logs and reports.
    fn name(&self) -> String {
        "matrix game".to_string()
    }
}

impl<T: Payoff> MatrixGame for PayoffMatrix<T> {
    type Payoff = T;

    fn payoff_matrix(&self) -> Result<PayoffMatrix<T>, SolverError> {
        Ok(self.clone())
    }

    fn name(&self) -> String {
        format!("{}x{} matrix", self.rows(), self.cols())
    }
}

/// How a game was solved.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameOutcome<T> {
    /// A pure-strategy equilibrium exists.
    Saddle(SaddlePoint<T>),
    /// No saddle point; approximated by fictitious play.
    Mixed(Solution<T>),
}

impl<T: Payoff> GameOutcome<T> {
    /// Value of the game (bound midpoint for mixed outcomes).
    pub fn value(&self) -> T {
        match self {
            GameOutcome::Saddle(saddle) => saddle.value,
            GameOutcome::Mixed(solution) => solution.value_estimate(),
        }
    }

    /// Whether a pure saddle point was found.
    pub fn is_saddle(&self) -> bool {
        matches!(self, GameOutcome::Saddle(_))
    }

    /// The mixed solution, if the iterative solver ran.
    pub fn solution(&self) -> Option<&Solution<T>> {
        match self {
            GameOutcome::Mixed(solution) => Some(solution),
            GameOutcome::Saddle(_) => None,
        }
    }
}

/// Saddle-point detection followed by the iterative fallback.
pub struct GameSolver<R = StdRng> {
    saddle: SaddleConfig,
    solver: BrownRobinson<R>,
}

impl GameSolver<StdRng> {
    /// Create a solver from a full configuration.
    pub fn new(config: &GameConfig) -> Result<Self, SolverError> {
        Self::from_parts(config.saddle.clone(), config.solver.clone())
    }

    /// Create a solver from its two sections.
    pub fn from_parts(saddle: SaddleConfig, solver: SolverConfig) -> Result<Self, SolverError> {
        let rng = solver.rng();
        Self::with_rng(saddle, solver, rng)
    }
}

impl<R: Rng> GameSolver<R> {
    /// Create a solver with a caller-supplied random source.
    pub fn with_rng(saddle: SaddleConfig, solver: SolverConfig, rng: R) -> Result<Self, SolverError> {
        Ok(Self {
            saddle,
            solver: BrownRobinson::with_rng(solver, rng)?,
        })
    }

    /// The iterative solver used for the fallback.
    pub fn solver(&mut self) -> &mut BrownRobinson<R> {
        &mut self.solver
    }

    /// Solve any [`MatrixGame`].
    pub fn solve<G: MatrixGame>(&mut self, game: &G) -> Result<GameOutcome<G::Payoff>, SolverError> {
        let matrix = game.payoff_matrix()?;
        log::debug!("solving {}", game.name());
        self.solve_matrix(&matrix)
    }

    /// Solve a payoff matrix.
    pub fn solve_matrix<T: Payoff>(
        &mut self,
        matrix: &PayoffMatrix<T>,
    ) -> Result<GameOutcome<T>, SolverError> {
        self.solve_matrix_with_callback(matrix, 0, |_| {})
    }

    /// Solve a payoff matrix, reporting iterative progress every `interval`
    /// iterations. The callback never fires when a saddle point exists.
    pub fn solve_matrix_with_callback<T, F>(
        &mut self,
        matrix: &PayoffMatrix<T>,
        interval: u64,
        callback: F,
    ) -> Result<GameOutcome<T>, SolverError>
    where
        T: Payoff,
        F: FnMut(&SolverProgress),
    {
        let detector = SaddlePointDetector::new(self.saddle.clone(), self.solver.config().equality()?);

        if let Some(saddle) = detector.find(matrix)? {
            return Ok(GameOutcome::Saddle(saddle));
        }

        let solution = self.solver.solve_with_callback(matrix, interval, callback)?;
        Ok(GameOutcome::Mixed(solution))
    }
}
