//! Payoff matrices and the numeric domain they are written in.
//!
//! A [`PayoffMatrix`] holds an `m×n` zero-sum game from the row player's
//! point of view: entry `(i, j)` is what the row player receives when it plays
//! `i` and the column player plays `j`. The column player receives the
//! negation, so it is never stored.

use std::fmt::Debug;

use num_rational::Ratio;
use num_traits::{FromPrimitive, Num, Signed, ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::solver::config::ConfigError;
use crate::solver::error::SolverError;

/// Exact rational payoffs.
pub type Rational = Ratio<i64>;

/// Numeric types a game can be solved in.
///
/// Implemented for every type with the required arithmetic, which covers
/// `f64` and [`Rational`].
pub trait Payoff:
    Num + Signed + FromPrimitive + ToPrimitive + Copy + PartialOrd + Debug
{
    /// Convert an iteration or play count into the payoff domain.
    fn from_count(count: u64) -> Result<Self, SolverError> {
        Self::from_u64(count).ok_or_else(|| {
            SolverError::Config(ConfigError::invalid(
                "count",
                format!("{} is not representable in the payoff type", count),
            ))
        })
    }

    /// Lossy conversion for reporting, logging and statistics.
    fn as_f64(self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }

    /// Arithmetic midpoint of two values.
    fn midpoint(self, other: Self) -> Self {
        (self + other) / (Self::one() + Self::one())
    }
}

impl<T> Payoff for T where
    T: Num + Signed + FromPrimitive + ToPrimitive + Copy + PartialOrd + Debug
{
}

/// An `m×n` payoff matrix stored row-major.
///
/// Matrices are validated on construction: at least one row, at least one
/// column, and every row the same length. Serialized as an array of rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "Vec<Vec<T>>",
    into = "Vec<Vec<T>>",
    bound(serialize = "T: Clone + Serialize", deserialize = "T: Deserialize<'de>")
)]
pub struct PayoffMatrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T> PayoffMatrix<T> {
    /// Build a matrix from its rows.
    ///
    /// # Errors
    /// [`ConfigError::InvalidMatrix`] when there are no rows, no columns, or
    /// the rows differ in length.
    pub fn new(rows: Vec<Vec<T>>) -> Result<Self, ConfigError> {
        let m = rows.len();
        if m == 0 {
            return Err(ConfigError::InvalidMatrix("matrix has no rows".to_string()));
        }

        let n = rows[0].len();
        if n == 0 {
            return Err(ConfigError::InvalidMatrix("matrix has no columns".to_string()));
        }

        let mut data = Vec::with_capacity(m * n);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n {
                return Err(ConfigError::InvalidMatrix(format!(
                    "row {} has {} entries, expected {}",
                    i,
                    row.len(),
                    n
                )));
            }
            data.extend(row);
        }

        Ok(Self {
            rows: m,
            cols: n,
            data,
        })
    }

    /// Build an `m×n` matrix from a cell function.
    pub fn from_fn<F>(m: usize, n: usize, mut f: F) -> Result<Self, ConfigError>
    where
        F: FnMut(usize, usize) -> T,
    {
        if m == 0 || n == 0 {
            return Err(ConfigError::InvalidMatrix(format!(
                "dimensions must be positive, got {}x{}",
                m, n
            )));
        }

        let mut data = Vec::with_capacity(m * n);
        for i in 0..m {
            for j in 0..n {
                data.push(f(i, j));
            }
        }

        Ok(Self {
            rows: m,
            cols: n,
            data,
        })
    }

    /// Number of row-player strategies.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of column-player strategies.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Whether the matrix has as many rows as columns.
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Fail with [`SolverError::NotSquare`] unless the matrix is square.
    pub fn require_square(&self) -> Result<(), SolverError> {
        if self.is_square() {
            Ok(())
        } else {
            Err(SolverError::NotSquare {
                rows: self.rows,
                cols: self.cols,
            })
        }
    }

    /// Row `i` as a slice.
    ///
    /// # Panics
    /// If `i >= rows()`.
    pub fn row(&self, i: usize) -> &[T] {
        let start = i * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Iterate over all rows.
    pub fn row_slices(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.data.chunks(self.cols)
    }
}

impl<T: Copy> PayoffMatrix<T> {
    /// Entry `(i, j)`.
    ///
    /// # Panics
    /// If the index is out of bounds.
    pub fn get(&self, i: usize, j: usize) -> T {
        assert!(j < self.cols, "column {} out of bounds ({} columns)", j, self.cols);
        self.data[i * self.cols + j]
    }

    /// Column `j`, top to bottom.
    pub fn column(&self, j: usize) -> impl Iterator<Item = T> + '_ {
        assert!(j < self.cols, "column {} out of bounds ({} columns)", j, self.cols);
        self.data.iter().skip(j).step_by(self.cols).copied()
    }

    /// Copy of the matrix as nested rows.
    pub fn to_rows(&self) -> Vec<Vec<T>> {
        self.row_slices().map(|row| row.to_vec()).collect()
    }
}

impl<T: Payoff> PayoffMatrix<T> {
    /// The cell whose value is closest to `value`.
    ///
    /// Ties resolve to the first cell in row-major order.
    pub fn find_closest(&self, value: T) -> (usize, usize, T) {
        let mut best = (0, 0, self.data[0]);
        let mut best_distance = (self.data[0] - value).abs();

        for (idx, &cell) in self.data.iter().enumerate().skip(1) {
            let distance = (cell - value).abs();
            if distance < best_distance {
                best_distance = distance;
                best = (idx / self.cols, idx % self.cols, cell);
            }
        }

        best
    }

    /// Build a matrix from integer rows.
    pub fn from_integers(rows: &[&[i64]]) -> Result<Self, ConfigError> {
        let converted = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&v| {
                        T::from_i64(v).ok_or_else(|| {
                            ConfigError::InvalidMatrix(format!(
                                "{} is not representable in the payoff type",
                                v
                            ))
                        })
                    })
                    .collect::<Result<Vec<T>, ConfigError>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(converted)
    }
}

impl<T> TryFrom<Vec<Vec<T>>> for PayoffMatrix<T> {
    type Error = ConfigError;

    fn try_from(rows: Vec<Vec<T>>) -> Result<Self, Self::Error> {
        Self::new(rows)
    }
}

impl<T: Clone> From<PayoffMatrix<T>> for Vec<Vec<T>> {
    fn from(matrix: PayoffMatrix<T>) -> Self {
        matrix.data.chunks(matrix.cols).map(|row| row.to_vec()).collect()
    }
}

impl<T: std::fmt::Display> std::fmt::Display for PayoffMatrix<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.row_slices() {
            let cells: Vec<String> = row.iter().map(|v| format!("{:>8}", v)).collect();
            writeln!(f, "[{} ]", cells.join(""))?;
        }
        Ok(())
    }
}
