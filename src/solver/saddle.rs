//! Pure-strategy saddle-point detection.
//!
//! A saddle point is a cell that is the minimum of its row and the maximum of
//! its column. When one exists the game's value is that cell and no iteration
//! is needed.
//!
//! The scan works in two passes:
//!
//! ```text
//! row pass:    floor   = max_i min_j a[i][j]   (cells attaining it)
//! column pass: ceiling = min_j max_i a[i][j]   (cells attaining it)
//! ```
//!
//! The game has a unique pure equilibrium exactly when both cell sets are
//! the same singleton.

use serde::Serialize;

use crate::solver::config::SaddleConfig;
use crate::solver::error::SolverError;
use crate::solver::extremum::{Equality, ExtremumFinder};
use crate::solver::matrix::{Payoff, PayoffMatrix};

/// A pure-strategy equilibrium.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SaddlePoint<T> {
    /// Row player's pure strategy.
    pub row: usize,
    /// Column player's pure strategy.
    pub col: usize,
    /// Value of the game.
    pub value: T,
}

/// Both passes of a saddle-point scan.
#[derive(Debug, Clone, PartialEq)]
pub struct SaddleScan<T> {
    /// Best row minimum (maximin).
    pub floor: T,
    /// `(row, col)` cells attaining the floor.
    pub floor_cells: Vec<(usize, usize)>,
    /// Smallest column maximum (minimax).
    pub ceiling: T,
    /// `(row, col)` cells attaining the ceiling.
    pub ceiling_cells: Vec<(usize, usize)>,
}

impl<T> SaddleScan<T> {
    /// The unique saddle cell, if the scan found one.
    pub fn saddle_cell(&self) -> Option<(usize, usize)> {
        match (self.floor_cells.as_slice(), self.ceiling_cells.as_slice()) {
            ([floor], [ceiling]) if floor == ceiling => Some(*floor),
            _ => None,
        }
    }
}

/// Scans a payoff matrix for a unique pure-strategy equilibrium.
#[derive(Debug, Clone)]
pub struct SaddlePointDetector<T> {
    config: SaddleConfig,
    equality: Equality<T>,
}

impl<T: Payoff> SaddlePointDetector<T> {
    /// Create a detector with the given options and tie rule.
    pub fn new(config: SaddleConfig, equality: Equality<T>) -> Self {
        Self { config, equality }
    }

    /// Detector with default options and exact ties.
    pub fn exact() -> Self {
        Self::new(SaddleConfig::default(), Equality::Exact)
    }

    /// Run both passes and return their results.
    pub fn scan(&self, matrix: &PayoffMatrix<T>) -> Result<SaddleScan<T>, SolverError> {
        if self.config.require_square {
            matrix.require_square()?;
        }

        let row_min = ExtremumFinder::min(self.equality);
        let col_max = ExtremumFinder::max(self.equality);

        let mut floor: Option<T> = None;
        let mut floor_cells = Vec::new();
        for (i, row) in matrix.row_slices().enumerate() {
            let ext = row_min.all(row.iter().copied())?;
            let cells = ext.indices.iter().map(|&j| (i, j));
            match floor {
                Some(current) if self.equality.same(ext.value, current) => {
                    floor_cells.extend(cells);
                }
                Some(current) if ext.value < current => {}
                _ => {
                    floor = Some(ext.value);
                    floor_cells.clear();
                    floor_cells.extend(cells);
                }
            }
        }
        let floor = floor.ok_or(SolverError::EmptyInput)?;

        let mut ceiling: Option<T> = None;
        let mut ceiling_cells = Vec::new();
        for j in 0..matrix.cols() {
            let ext = col_max.all(matrix.column(j))?;
            let cells = ext.indices.iter().map(|&i| (i, j));
            match ceiling {
                None => {
                    ceiling = Some(ext.value);
                    ceiling_cells.extend(cells);
                }
                Some(current) if self.config.legacy_column_ties => {
                    // Historical rule: strict improvement first, then ties
                    // measured against the row floor.
                    if ext.value < current {
                        ceiling = Some(ext.value);
                        ceiling_cells.clear();
                        ceiling_cells.extend(cells);
                    } else if self.equality.same(ext.value, floor) {
                        ceiling_cells.extend(cells);
                    }
                }
                Some(current) => {
                    if self.equality.same(ext.value, current) {
                        ceiling_cells.extend(cells);
                    } else if ext.value < current {
                        ceiling = Some(ext.value);
                        ceiling_cells.clear();
                        ceiling_cells.extend(cells);
                    }
                }
            }
        }
        let ceiling = ceiling.ok_or(SolverError::EmptyInput)?;

        Ok(SaddleScan {
            floor,
            floor_cells,
            ceiling,
            ceiling_cells,
        })
    }

    /// The unique saddle point of `matrix`, if there is one.
    pub fn find(&self, matrix: &PayoffMatrix<T>) -> Result<Option<SaddlePoint<T>>, SolverError> {
        let scan = self.scan(matrix)?;

        match scan.saddle_cell() {
            Some((row, col)) => {
                let value = matrix.get(row, col);
                log::debug!("saddle point at ({}, {}) with value {:?}", row, col, value);
                Ok(Some(SaddlePoint { row, col, value }))
            }
            None => {
                log::debug!(
                    "no saddle point: floor {:?} at {:?}, ceiling {:?} at {:?}",
                    scan.floor,
                    scan.floor_cells,
                    scan.ceiling,
                    scan.ceiling_cells
                );
                Ok(None)
            }
        }
    }
}
