//! Game sources for the matrix solver.
//!
//! These modules produce payoff matrices for the [`crate::solver`] module:
//!
//! 1. **Validation**: presets with known values (the classic 2×2 game,
//!    matching pennies, a dominated game with a saddle point) check that the
//!    saddle scan and the iterative method agree with theory.
//!
//! 2. **Continuous games**: a quadratic kernel on the unit square is sampled
//!    on finer and finer grids until the game value stabilizes.
//!
//! ## Available Games
//!
//! - [`presets`]: Hand-built matrices, selectable by name from the CLI
//! - [`continuous`]: Quadratic kernels, their grids and the stability sweep
//!
//! ## Adding New Games
//!
//! Implement [`MatrixGame`](crate::solver::MatrixGame) for a type that can
//! build its payoff matrix; [`GameSolver`](crate::solver::GameSolver) then
//! solves it like any other matrix.

pub mod continuous;
pub mod presets;

pub use continuous::{BilinearKernel, Discretization, DiscretizationSweep, SweepReport};
pub use presets::Preset;
