//! Errors produced while scanning or solving a matrix game.

use crate::solver::config::ConfigError;

/// Errors that can occur while solving a game.
#[derive(Debug, Clone)]
pub enum SolverError {
    /// An extremum was requested over an empty sequence.
    EmptyInput,

    /// The configuration (or an input matrix) failed validation.
    Config(ConfigError),

    /// A square matrix was required but a rectangular one was supplied.
    NotSquare {
        /// Number of rows in the offending matrix.
        rows: usize,
        /// Number of columns in the offending matrix.
        cols: usize,
    },

    /// The solver stopped on a safety cap before the gap closed.
    NonConvergence {
        /// Iterations completed before the run was aborted.
        iterations: u64,
        /// Best upper bound reached (as `f64` for reporting).
        v_upper: f64,
        /// Best lower bound reached (as `f64` for reporting).
        v_lower: f64,
        /// Which cap fired.
        reason: String,
    },

    /// The discretization sweep ran out of levels without stabilizing.
    SweepExhausted {
        /// Number of discretization levels that were solved.
        levels: usize,
        /// Standard deviation of the last full window, if one was reached.
        last_deviation: Option<f64>,
    },
}

impl std::fmt::Display for SolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverError::EmptyInput => write!(f, "Cannot take an extremum of an empty sequence"),
            SolverError::Config(e) => write!(f, "Configuration error: {}", e),
            SolverError::NotSquare { rows, cols } => {
                write!(f, "Expected a square matrix, got {}x{}", rows, cols)
            }
            SolverError::NonConvergence {
                iterations,
                v_upper,
                v_lower,
                reason,
            } => write!(
                f,
                "No convergence after {} iterations ({}); bounds [{}, {}], gap {}",
                iterations,
                reason,
                v_lower,
                v_upper,
                v_upper - v_lower
            ),
            SolverError::SweepExhausted {
                levels,
                last_deviation,
            } => match last_deviation {
                Some(dev) => write!(
                    f,
                    "Discretization did not stabilize after {} levels (last deviation {})",
                    levels, dev
                ),
                None => write!(
                    f,
                    "Discretization did not stabilize after {} levels (window never filled)",
                    levels
                ),
            },
        }
    }
}

impl std::error::Error for SolverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SolverError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for SolverError {
    fn from(e: ConfigError) -> Self {
        SolverError::Config(e)
    }
}
