//! Tie-aware extremum search.
//!
//! Used directly by saddle-point detection (where every tied index matters)
//! and inside the fictitious-play loop (where one tied index is drawn at
//! random so symmetric payoffs do not lock the players into a cycle).

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::solver::error::SolverError;
use crate::solver::matrix::Payoff;

/// Which end of the ordering to search for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Largest value.
    Max,
    /// Smallest value.
    Min,
}

impl Direction {
    /// Whether `candidate` is strictly better than `best` in this direction.
    #[inline]
    pub fn improves<T: PartialOrd>(self, candidate: T, best: T) -> bool {
        match self {
            Direction::Max => candidate > best,
            Direction::Min => candidate < best,
        }
    }
}

/// How tied indices are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TiePolicy {
    /// One tied index, drawn uniformly at random.
    Random,
    /// Every tied index in ascending order. Consumes no randomness.
    All,
}

/// When two payoffs count as equal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Equality<T> {
    /// Bitwise/structural equality.
    Exact,
    /// `|a - b| <= tolerance`.
    Within(T),
}

impl<T: Payoff> Equality<T> {
    /// Whether `a` and `b` tie under this rule.
    #[inline]
    pub fn same(&self, a: T, b: T) -> bool {
        match *self {
            Equality::Exact => a == b,
            Equality::Within(tolerance) => (a - b).abs() <= tolerance,
        }
    }
}

/// The extreme value of a sequence and the indices attaining it.
#[derive(Debug, Clone, PartialEq)]
pub struct Extremum<T> {
    /// The extreme value.
    pub value: T,
    /// Indices attaining it, ascending. Never empty.
    pub indices: Vec<usize>,
}

impl<T> Extremum<T> {
    /// Draw one of the tied indices uniformly at random.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.indices[rng.gen_range(0..self.indices.len())]
    }

    /// Whether exactly one index attains the extremum.
    pub fn is_unique(&self) -> bool {
        self.indices.len() == 1
    }
}

/// Extremum search with an explicit tie rule.
#[derive(Debug, Clone, Copy)]
pub struct ExtremumFinder<T> {
    direction: Direction,
    equality: Equality<T>,
}

impl<T: Payoff> ExtremumFinder<T> {
    /// Create a finder for the given direction and tie rule.
    pub fn new(direction: Direction, equality: Equality<T>) -> Self {
        Self {
            direction,
            equality,
        }
    }

    /// Finder for maxima.
    pub fn max(equality: Equality<T>) -> Self {
        Self::new(Direction::Max, equality)
    }

    /// Finder for minima.
    pub fn min(equality: Equality<T>) -> Self {
        Self::new(Direction::Min, equality)
    }

    /// The direction this finder searches in.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Find the extremum and every index attaining it.
    ///
    /// `value` is always the true extremum. With a tolerance, every index
    /// within the tolerance of that value counts as tied.
    ///
    /// # Errors
    /// [`SolverError::EmptyInput`] if `values` yields nothing.
    pub fn all<I>(&self, values: I) -> Result<Extremum<T>, SolverError>
    where
        I: IntoIterator<Item = T>,
    {
        let values: Vec<T> = values.into_iter().collect();
        let best = values
            .iter()
            .copied()
            .reduce(|best, value| {
                if self.direction.improves(value, best) {
                    value
                } else {
                    best
                }
            })
            .ok_or(SolverError::EmptyInput)?;

        let indices = values
            .iter()
            .enumerate()
            .filter(|&(_, &value)| self.equality.same(value, best))
            .map(|(i, _)| i)
            .collect();

        Ok(Extremum {
            value: best,
            indices,
        })
    }

    /// Find the extremum and one index attaining it, chosen at random.
    pub fn random<I, R>(&self, values: I, rng: &mut R) -> Result<(T, usize), SolverError>
    where
        I: IntoIterator<Item = T>,
        R: Rng + ?Sized,
    {
        let extremum = self.all(values)?;
        let index = extremum.pick(rng);
        Ok((extremum.value, index))
    }

    /// Find the extremum under the given tie policy.
    ///
    /// With [`TiePolicy::Random`] the returned `indices` holds exactly one
    /// entry.
    pub fn find<I, R>(
        &self,
        values: I,
        policy: TiePolicy,
        rng: &mut R,
    ) -> Result<Extremum<T>, SolverError>
    where
        I: IntoIterator<Item = T>,
        R: Rng + ?Sized,
    {
        let extremum = self.all(values)?;
        match policy {
            TiePolicy::All => Ok(extremum),
            TiePolicy::Random => {
                let index = extremum.pick(rng);
                Ok(Extremum {
                    value: extremum.value,
                    indices: vec![index],
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::matrix::Rational;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_all_reports_every_tie() {
        let finder = ExtremumFinder::max(Equality::Exact);
        let ext = finder.all([3.0, 5.0, 5.0, 2.0]).unwrap();

        assert_eq!(ext.value, 5.0);
        assert_eq!(ext.indices, vec![1, 2]);
        assert!(!ext.is_unique());
    }

    #[test]
    fn test_min_replaces_on_strictly_better() {
        let finder = ExtremumFinder::min(Equality::Exact);
        let ext = finder.all([4, 1, 7, 1, 0].map(f64::from)).unwrap();

        assert_eq!(ext.value, 0.0);
        assert_eq!(ext.indices, vec![4]);
    }

    #[test]
    fn test_empty_input() {
        let finder = ExtremumFinder::<f64>::max(Equality::Exact);
        assert!(matches!(finder.all(Vec::new()), Err(SolverError::EmptyInput)));

        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            finder.random(std::iter::empty(), &mut rng),
            Err(SolverError::EmptyInput)
        ));
    }

    #[test]
    fn test_random_reaches_every_tie() {
        let finder = ExtremumFinder::max(Equality::Exact);
        let mut seen = [false; 4];

        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let (value, index) = finder.random([3.0, 5.0, 5.0, 2.0], &mut rng).unwrap();
            assert_eq!(value, 5.0);
            assert!(index == 1 || index == 2, "index {} is not a maximum", index);
            seen[index] = true;
        }

        assert!(seen[1] && seen[2], "both tied maxima should be drawn");
    }

    #[test]
    fn test_random_is_reproducible() {
        let finder = ExtremumFinder::min(Equality::Exact);
        let values = [1.0, 1.0, 1.0, 1.0, 1.0];

        let draw = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..20)
                .map(|_| finder.random(values, &mut rng).unwrap().1)
                .collect::<Vec<_>>()
        };

        assert_eq!(draw(9), draw(9));
    }

    #[test]
    fn test_find_policies() {
        let finder = ExtremumFinder::max(Equality::Exact);
        let mut rng = StdRng::seed_from_u64(3);

        let all = finder.find([3.0, 5.0, 5.0, 2.0], TiePolicy::All, &mut rng).unwrap();
        assert_eq!(all.indices, vec![1, 2]);

        let one = finder.find([3.0, 5.0, 5.0, 2.0], TiePolicy::Random, &mut rng).unwrap();
        assert_eq!(one.indices.len(), 1);
        assert!(all.indices.contains(&one.indices[0]));
    }

    #[test]
    fn test_tolerance_ties() {
        let values = [1.0, 1.0 + 1e-12, 0.5];

        let exact = ExtremumFinder::max(Equality::Exact).all(values).unwrap();
        assert_eq!(exact.indices, vec![1]);

        let loose = ExtremumFinder::max(Equality::Within(1e-9)).all(values).unwrap();
        assert_eq!(loose.value, 1.0 + 1e-12);
        assert_eq!(loose.indices, vec![0, 1]);
    }

    #[test]
    fn test_tolerance_keeps_true_extremum() {
        let max = ExtremumFinder::max(Equality::Within(0.5));

        let ext = max.all([1.0, 1.4]).unwrap();
        assert_eq!(ext.value, 1.4);
        assert_eq!(ext.indices, vec![0, 1]);

        // 1.0 is tied with 1.4 but not with the final maximum.
        let ext = max.all([1.0, 1.4, 1.8]).unwrap();
        assert_eq!(ext.value, 1.8);
        assert_eq!(ext.indices, vec![1, 2]);

        let ext = ExtremumFinder::min(Equality::Within(0.5)).all([2.0, 1.6, 1.2]).unwrap();
        assert_eq!(ext.value, 1.2);
        assert_eq!(ext.indices, vec![1, 2]);
    }

    #[test]
    fn test_rational_ties_are_exact() {
        let values = [Rational::new(1, 3), Rational::new(2, 6), Rational::new(1, 4)];
        let ext = ExtremumFinder::max(Equality::Exact).all(values).unwrap();

        assert_eq!(ext.value, Rational::new(1, 3));
        assert_eq!(ext.indices, vec![0, 1]);
    }
}
