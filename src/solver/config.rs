//! Configuration options for the matrix game solvers.
//!
//! Scalars are stored as `f64` so configurations round-trip through JSON.
//! They are converted into the payoff domain `T` once per solve, so every
//! comparison during a run happens in the same numeric type as the matrix.

use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::solver::extremum::Equality;
use crate::solver::matrix::Payoff;

/// Configuration for the Brown-Robinson (fictitious play) solver.
///
/// # Example
/// ```
/// use brown_robinson::solver::SolverConfig;
///
/// let config = SolverConfig::default().with_eps(0.01).with_seed(7);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.max_iterations, Some(1_000_000));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Stop once `v_upper_min - v_lower_max <= eps_threshold`.
    pub eps_threshold: f64,

    /// Safety cap on the iteration counter `k`.
    ///
    /// `None` reproduces the unbounded loop: the solver runs until the gap
    /// closes and never returns if it does not. Opt in with
    /// [`SolverConfig::unbounded`].
    pub max_iterations: Option<u64>,

    /// Optional wall-clock cap in seconds.
    pub time_limit_secs: Option<f64>,

    /// Tolerance used when deciding whether two payoffs tie.
    ///
    /// `None` means exact equality, which is what exact-rational payoffs need.
    pub tie_tolerance: Option<f64>,

    /// Record one [`SolverStep`](crate::solver::SolverStep) per iteration.
    pub record_trace: bool,

    /// Random seed for tie-breaking.
    ///
    /// If `None`, the generator is seeded from entropy.
    pub seed: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            eps_threshold: 0.1,
            max_iterations: Some(1_000_000),
            time_limit_secs: None,
            tie_tolerance: None,
            record_trace: false,
            seed: None,
        }
    }
}

impl SolverConfig {
    /// Create a new SolverConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration used for the inner solves of a discretization sweep.
    pub fn precise() -> Self {
        Self {
            eps_threshold: 0.01,
            ..Default::default()
        }
    }

    /// Builder method: set the gap threshold.
    pub fn with_eps(mut self, eps_threshold: f64) -> Self {
        self.eps_threshold = eps_threshold;
        self
    }

    /// Builder method: set the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Builder method: remove the iteration cap.
    pub fn unbounded(mut self) -> Self {
        self.max_iterations = None;
        self
    }

    /// Builder method: set a wall-clock cap in seconds.
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit_secs = Some(seconds);
        self
    }

    /// Builder method: compare payoffs within `tolerance` when detecting ties.
    pub fn with_tie_tolerance(mut self, tolerance: f64) -> Self {
        self.tie_tolerance = Some(tolerance);
        self
    }

    /// Builder method: record the per-iteration trace.
    pub fn with_trace(mut self, enable: bool) -> Self {
        self.record_trace = enable;
        self
    }

    /// Builder method: set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.eps_threshold.is_finite() || self.eps_threshold <= 0.0 {
            return Err(ConfigError::invalid(
                "eps_threshold",
                format!("must be a positive number, got {}", self.eps_threshold),
            ));
        }

        if self.max_iterations == Some(0) {
            return Err(ConfigError::invalid(
                "max_iterations",
                "must be at least 1 (use `null` for no cap)",
            ));
        }

        if let Some(limit) = self.time_limit_secs {
            if !limit.is_finite() || limit <= 0.0 {
                return Err(ConfigError::invalid(
                    "time_limit_secs",
                    format!("must be a positive number of seconds, got {}", limit),
                ));
            }
        }

        if let Some(tolerance) = self.tie_tolerance {
            if !tolerance.is_finite() || tolerance < 0.0 {
                return Err(ConfigError::invalid(
                    "tie_tolerance",
                    format!("must be non-negative, got {}", tolerance),
                ));
            }
        }

        Ok(())
    }

    /// Random source for tie-breaking: seeded from `seed`, otherwise from entropy.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// The gap threshold expressed in the payoff domain.
    pub fn threshold<T: Payoff>(&self) -> Result<T, ConfigError> {
        to_domain("eps_threshold", self.eps_threshold)
    }

    /// The tie rule expressed in the payoff domain.
    pub fn equality<T: Payoff>(&self) -> Result<Equality<T>, ConfigError> {
        match self.tie_tolerance {
            None => Ok(Equality::Exact),
            Some(tolerance) => Ok(Equality::Within(to_domain("tie_tolerance", tolerance)?)),
        }
    }
}

/// Options for saddle-point detection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaddleConfig {
    /// Record column-pass ties against the row-pass floor instead of the
    /// running column ceiling.
    ///
    /// This reproduces the historical scan bit for bit. The returned saddle
    /// point is the same either way; only the intermediate ceiling cell set
    /// differs.
    #[serde(default)]
    pub legacy_column_ties: bool,

    /// Reject rectangular matrices with [`SolverError::NotSquare`](crate::solver::SolverError::NotSquare).
    #[serde(default)]
    pub require_square: bool,
}

impl SaddleConfig {
    /// Builder method: enable the historical column tie rule.
    pub fn with_legacy_column_ties(mut self, enable: bool) -> Self {
        self.legacy_column_ties = enable;
        self
    }

    /// Builder method: require square matrices.
    pub fn with_require_square(mut self, enable: bool) -> Self {
        self.require_square = enable;
        self
    }
}

/// Options for the rolling-stability policy and the discretization sweep
/// that drives it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    /// Number of most recent outcomes kept in the window.
    pub window: usize,

    /// Converged once the window's sample standard deviation drops below this.
    pub deviation_threshold: f64,

    /// Give up after solving this many discretization levels.
    pub max_levels: usize,

    /// First grid resolution `n` (the grid has `n + 1` points per axis).
    pub start_level: usize,

    /// Gap threshold for the iterative solve at each level.
    pub solver_eps: f64,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            window: 10,
            deviation_threshold: 0.001,
            max_levels: 200,
            start_level: 2,
            solver_eps: 0.01,
        }
    }
}

impl StabilityConfig {
    /// Builder method: set window size and deviation threshold.
    pub fn with_window(mut self, window: usize, deviation_threshold: f64) -> Self {
        self.window = window;
        self.deviation_threshold = deviation_threshold;
        self
    }

    /// Builder method: set the maximum number of levels.
    pub fn with_max_levels(mut self, max_levels: usize) -> Self {
        self.max_levels = max_levels;
        self
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window < 2 {
            return Err(ConfigError::invalid(
                "window",
                format!("a sample deviation needs at least 2 values, got {}", self.window),
            ));
        }

        if !self.deviation_threshold.is_finite() || self.deviation_threshold <= 0.0 {
            return Err(ConfigError::invalid(
                "deviation_threshold",
                format!("must be a positive number, got {}", self.deviation_threshold),
            ));
        }

        if self.max_levels == 0 {
            return Err(ConfigError::invalid("max_levels", "must be at least 1"));
        }

        if self.start_level == 0 {
            return Err(ConfigError::invalid("start_level", "grid resolution must be at least 1"));
        }

        if !self.solver_eps.is_finite() || self.solver_eps <= 0.0 {
            return Err(ConfigError::invalid(
                "solver_eps",
                format!("must be a positive number, got {}", self.solver_eps),
            ));
        }

        Ok(())
    }
}

/// Complete configuration for a solving session, loadable from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameConfig {
    /// Iterative solver options.
    #[serde(default)]
    pub solver: SolverConfig,

    /// Saddle-point detection options.
    #[serde(default)]
    pub saddle: SaddleConfig,

    /// Discretization sweep options.
    #[serde(default)]
    pub stability: StabilityConfig,
}

impl GameConfig {
    /// Load configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_json_str(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.solver.validate()?;
        self.stability.validate()
    }
}

/// Convert a configuration scalar into the payoff domain.
pub(crate) fn to_domain<T: Payoff>(field: &str, value: f64) -> Result<T, ConfigError> {
    T::from_f64(value).ok_or_else(|| {
        ConfigError::invalid(field, format!("{} is not representable in the payoff type", value))
    })
}

/// Errors that can occur when validating configuration or input data.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// A field holds an out-of-range value.
    InvalidValue {
        /// Name of the offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },
    /// A payoff matrix is empty or ragged.
    InvalidMatrix(String),
    /// Reading a configuration or matrix file failed.
    IoError(String),
    /// A configuration or matrix file is not valid JSON.
    ParseError(String),
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { field, message } => {
                write!(f, "Invalid value for '{}': {}", field, message)
            }
            Self::InvalidMatrix(message) => write!(f, "Invalid payoff matrix: {}", message),
            Self::IoError(e) => write!(f, "IO error: {}", e),
            Self::ParseError(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::matrix::Rational;

    #[test]
    fn test_default_config() {
        let config = SolverConfig::default();

        assert_eq!(config.eps_threshold, 0.1);
        assert_eq!(config.max_iterations, Some(1_000_000));
        assert!(config.tie_tolerance.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_fails() {
        assert!(SolverConfig::default().with_eps(0.0).validate().is_err());
        assert!(SolverConfig::default().with_eps(-1.0).validate().is_err());
        assert!(SolverConfig::default().with_eps(f64::NAN).validate().is_err());
        assert!(SolverConfig::default().with_max_iterations(0).validate().is_err());
        assert!(SolverConfig::default().with_time_limit(0.0).validate().is_err());
        assert!(SolverConfig::default().with_tie_tolerance(-0.5).validate().is_err());

        let err = SolverConfig::default().with_eps(0.0).validate().unwrap_err();
        assert!(err.to_string().contains("eps_threshold"));
    }

    #[test]
    fn test_unbounded_is_explicit() {
        let config = SolverConfig::default().unbounded();
        assert!(config.max_iterations.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        use rand::Rng;

        let config = SolverConfig::default().with_seed(17);
        let (mut a, mut b) = (config.rng(), config.rng());
        for _ in 0..8 {
            assert_eq!(a.gen::<u64>(), b.gen::<u64>());
        }
    }

    #[test]
    fn test_threshold_in_rational_domain() {
        let config = SolverConfig::default().with_eps(0.25);
        let threshold: Rational = config.threshold().unwrap();
        assert_eq!(threshold, Rational::new(1, 4));

        let exact: Equality<Rational> = config.equality().unwrap();
        assert_eq!(exact, Equality::Exact);
    }

    #[test]
    fn test_stability_validation() {
        assert!(StabilityConfig::default().validate().is_ok());
        assert!(StabilityConfig::default().with_window(1, 0.001).validate().is_err());
        assert!(StabilityConfig::default().with_window(10, 0.0).validate().is_err());
        assert!(StabilityConfig::default().with_max_levels(0).validate().is_err());
    }

    #[test]
    fn test_parse_game_config() {
        let json = r#"{
            "solver": {
                "eps_threshold": 0.05,
                "max_iterations": 5000,
                "time_limit_secs": null,
                "tie_tolerance": 1e-9,
                "record_trace": true,
                "seed": 42
            },
            "saddle": { "legacy_column_ties": true },
            "stability": {
                "window": 5,
                "deviation_threshold": 0.01,
                "max_levels": 50,
                "start_level": 3,
                "solver_eps": 0.02
            }
        }"#;

        let config = GameConfig::from_json_str(json).unwrap();
        assert_eq!(config.solver.eps_threshold, 0.05);
        assert_eq!(config.solver.max_iterations, Some(5000));
        assert_eq!(config.solver.seed, Some(42));
        assert!(config.saddle.legacy_column_ties);
        assert!(!config.saddle.require_square);
        assert_eq!(config.stability.window, 5);
        assert_eq!(config.stability.start_level, 3);
    }

    #[test]
    fn test_minimal_game_config() {
        let config = GameConfig::from_json_str("{}").unwrap();
        assert_eq!(config.solver.eps_threshold, 0.1);
        assert_eq!(config.stability.window, 10);
    }

    #[test]
    fn test_invalid_game_config_rejected() {
        let json = r#"{ "solver": { "eps_threshold": -1.0 } }"#;
        assert!(matches!(
            GameConfig::from_json_str(json),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            GameConfig::from_json_str("not json"),
            Err(ConfigError::ParseError(_))
        ));
    }
}
