//! # Brown-Robinson
//!
//! Approximate solutions of two-player zero-sum matrix games by fictitious
//! play (the Brown-Robinson iterative method).
//!
//! ## Features
//!
//! - **Saddle-point detection**: pure equilibria are found by a maximin /
//!   minimax scan before any iteration runs
//! - **Iterative solver**: upper and lower value bounds with a configurable
//!   gap threshold, iteration cap and time limit
//! - **Exact arithmetic**: every algorithm is generic over `f64` and
//!   exact rationals
//! - **Seedable tie-breaking**: reproducible runs for testing
//! - **Continuous games**: grid refinement with a rolling-stability stop
//!
//! ## Quick Start
//!
//! ```
//! use brown_robinson::{BrownRobinson, PayoffMatrix, SolverConfig};
//!
//! let matrix = PayoffMatrix::new(vec![vec![4.0, 0.0], vec![0.0, 1.0]]).unwrap();
//! let mut solver = BrownRobinson::new(SolverConfig::default().with_seed(9)).unwrap();
//! let solution = solver.solve(&matrix).unwrap();
//!
//! println!("{} <= v <= {}", solution.v_lower, solution.v_upper);
//! ```
//!
//! ## Modules
//!
//! - [`solver`]: Extremum search, saddle points, the iterative solver and
//!   stopping policies
//! - [`games`]: Preset matrices and continuous kernels
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          GameSolver                             │
//! │  - SaddlePointDetector     - BrownRobinson (ThresholdPolicy)    │
//! └─────────────────────────────────────────────────────────────────┘
//!                  │                              │
//!                  │ built on                     │ implements MatrixGame
//!                  ▼                              ▼
//!          ┌───────────────┐         ┌────────────┼─────────────┐
//!          │ ExtremumFinder│         │            │             │
//!          └───────────────┘         ▼            ▼             ▼
//!                              ┌──────────┐ ┌──────────┐ ┌──────────────┐
//!                              │ Payoff   │ │ Presets  │ │ Discretized  │
//!                              │ Matrix   │ │          │ │ kernel grids │
//!                              └──────────┘ └──────────┘ └──────────────┘
//!                                                              │
//!                                       DiscretizationSweep ◀──┘
//!                                       (RollingStabilityPolicy)
//! ```

#![warn(missing_docs)]

/// Matrix game solver module.
///
/// This is the core module containing the Brown-Robinson method and the
/// algorithms it is built on.
pub mod solver;

/// Game sources module.
///
/// Contains preset matrices and continuous games solved by discretization.
pub mod games;

// Re-export commonly used types at crate root for convenience
pub use solver::{
    BrownRobinson, GameConfig, GameOutcome, GameSolver, MatrixGame, PayoffMatrix, Rational,
    Solution, SolverConfig, SolverError,
};
