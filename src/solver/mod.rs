//! Matrix game solver module.
//!
//! This module approximates the value and optimal mixed strategies of
//! two-player zero-sum matrix games.
//!
//! # Overview
//!
//! Solving a game happens in two stages:
//! 1. Scan the matrix for a pure-strategy saddle point ([`SaddlePointDetector`]).
//!    If one exists it is the answer.
//! 2. Otherwise run the Brown-Robinson iterative method ([`BrownRobinson`]):
//!    both players repeatedly best-respond to each other's history of play,
//!    producing an upper and a lower bound on the game value whose gap
//!    shrinks as iterations accumulate.
//!
//! Both stages are built on the tie-aware [`ExtremumFinder`]. When the solver
//! stops is decided by a [`ConvergencePolicy`]: a gap threshold inside a
//! single solve, or a rolling-window stability test across repeated solves.
//!
//! # Example
//!
//! ```
//! use brown_robinson::solver::{GameConfig, GameOutcome, GameSolver, PayoffMatrix};
//!
//! let matrix = PayoffMatrix::new(vec![
//!     vec![17.0, 4.0, 9.0],
//!     vec![0.0, 16.0, 9.0],
//!     vec![12.0, 2.0, 19.0],
//! ])
//! .unwrap();
//!
//! let mut config = GameConfig::default();
//! config.solver.seed = Some(42);
//!
//! let mut solver = GameSolver::new(&config).unwrap();
//! match solver.solve(&matrix).unwrap() {
//!     GameOutcome::Saddle(point) => println!("pure equilibrium at {:?}", point),
//!     GameOutcome::Mixed(solution) => {
//!         println!("{} <= v <= {}", solution.v_lower, solution.v_upper);
//!         println!("row player mixes {:?}", solution.row_strategy);
//!     }
//! }
//! ```
//!
//! # Numeric domain
//!
//! Everything is generic over [`Payoff`], implemented for `f64` and for the
//! exact [`Rational`] type. Ties use an explicit [`Equality`] rule; the
//! default is exact comparison.
//!
//! # References
//!
//! - Brown, G. W. "Iterative solution of games by fictitious play" (1951)
//! - Robinson, J. "An iterative method of solving a game" (1951)

pub mod brown_robinson;
pub mod config;
pub mod convergence;
pub mod error;
pub mod extremum;
pub mod game;
pub mod matrix;
pub mod saddle;

// Re-export main types for convenient access
pub use brown_robinson::{
    AbortReason, BrownRobinson, Solution, SolverProgress, SolverStatus, SolverStep,
};
pub use config::{ConfigError, GameConfig, SaddleConfig, SolverConfig, StabilityConfig};
pub use convergence::{ConvergencePolicy, RollingStabilityPolicy, ThresholdPolicy};
pub use error::SolverError;
pub use extremum::{Direction, Equality, Extremum, ExtremumFinder, TiePolicy};
pub use game::{GameOutcome, GameSolver, MatrixGame};
pub use matrix::{Payoff, PayoffMatrix, Rational};
pub use saddle::{SaddlePoint, SaddlePointDetector, SaddleScan};
