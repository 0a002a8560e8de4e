//! Hand-built matrix games with known solutions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::solver::{MatrixGame, Payoff, PayoffMatrix, SolverError};

const REFERENCE: &[&[i64]] = &[&[17, 4, 9], &[0, 16, 9], &[12, 2, 19]];
const TWO_BY_TWO: &[&[i64]] = &[&[4, 0], &[0, 1]];
const MATCHING_PENNIES: &[&[i64]] = &[&[1, -1], &[-1, 1]];
const ROCK_PAPER_SCISSORS: &[&[i64]] = &[&[0, -1, 1], &[1, 0, -1], &[-1, 1, 0]];
const DOMINATED: &[&[i64]] = &[&[0, 1, 5], &[3, 2, 4], &[1, 0, 6]];

/// Named payoff matrices.
///
/// | Preset | Value | Saddle |
/// |---|---|---|
/// | `reference` | 1783/192 ≈ 9.29 | no |
/// | `two-by-two` | 4/5 | no |
/// | `matching-pennies` | 0 | no |
/// | `rock-paper-scissors` | 0 | no |
/// | `dominated` | 2 | yes, at (1, 1) |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// 3×3 game `[[17, 4, 9], [0, 16, 9], [12, 2, 19]]`.
    Reference,
    /// `[[4, 0], [0, 1]]`, value 4/5 with row strategy (1/5, 4/5).
    TwoByTwo,
    /// `[[1, -1], [-1, 1]]`.
    MatchingPennies,
    /// Win 1, lose -1, draw 0.
    RockPaperScissors,
    /// 3×3 game with a saddle point of value 2.
    Dominated,
}

impl Preset {
    /// Every preset, in display order.
    pub const ALL: [Preset; 5] = [
        Preset::Reference,
        Preset::TwoByTwo,
        Preset::MatchingPennies,
        Preset::RockPaperScissors,
        Preset::Dominated,
    ];

    /// Command-line name.
    pub fn cli_name(self) -> &'static str {
        match self {
            Preset::Reference => "reference",
            Preset::TwoByTwo => "two-by-two",
            Preset::MatchingPennies => "matching-pennies",
            Preset::RockPaperScissors => "rock-paper-scissors",
            Preset::Dominated => "dominated",
        }
    }

    fn cells(self) -> &'static [&'static [i64]] {
        match self {
            Preset::Reference => REFERENCE,
            Preset::TwoByTwo => TWO_BY_TWO,
            Preset::MatchingPennies => MATCHING_PENNIES,
            Preset::RockPaperScissors => ROCK_PAPER_SCISSORS,
            Preset::Dominated => DOMINATED,
        }
    }

    /// The preset's payoff matrix in any payoff domain.
    pub fn matrix<T: Payoff>(self) -> Result<PayoffMatrix<T>, SolverError> {
        Ok(PayoffMatrix::from_integers(self.cells())?)
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cli_name())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .iter()
            .copied()
            .find(|p| p.cli_name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Preset::ALL.iter().map(|p| p.cli_name()).collect();
                format!("unknown preset '{}', expected one of: {}", s, names.join(", "))
            })
    }
}

impl MatrixGame for Preset {
    type Payoff = f64;

    fn payoff_matrix(&self) -> Result<PayoffMatrix<f64>, SolverError> {
        self.matrix()
    }

    fn name(&self) -> String {
        self.cli_name().to_string()
    }
}
