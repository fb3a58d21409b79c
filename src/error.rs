//! Error types.
//!
//! Configuration problems are detected before a run starts; once a run has
//! passed validation it always completes.

use thiserror::Error;

/// A violated constraint on the problem instance or the annealing settings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The asset universe is empty (N = 0).
    #[error("asset universe is empty (N = 0)")]
    EmptyUniverse,

    /// K lies outside `1..=N`.
    #[error("cardinality K = {k} is outside 1..={n}")]
    CardinalityOutOfRange { k: usize, n: usize },

    /// K = 0 or K = N: every feasible state has an empty swap neighborhood.
    #[error("cardinality K = {k} with N = {n} leaves no swap move (need 0 < K < N)")]
    DegenerateCardinality { k: usize, n: usize },

    /// A vector or matrix does not have the length implied by N.
    #[error("{field} has length {found}, expected {expected}")]
    DimensionMismatch {
        field: String,
        expected: usize,
        found: usize,
    },

    /// `sigma[row][col] != sigma[col][row]` beyond tolerance.
    #[error("sigma is not symmetric at ({row}, {col}): {upper} vs {lower}")]
    AsymmetricSigma {
        row: usize,
        col: usize,
        upper: f64,
        lower: f64,
    },

    /// Risk-aversion coefficient is negative (or NaN).
    #[error("lambda must be >= 0, got {0}")]
    NegativeLambda(f64),

    /// Penalty coefficient is not strictly positive (or NaN).
    #[error("penalty_A must be > 0, got {0}")]
    NonPositivePenalty(f64),

    /// A schedule temperature is not strictly positive (or not finite).
    #[error("{name} must be a positive finite temperature, got {value}")]
    NonPositiveTemperature { name: &'static str, value: f64 },

    /// A selection vector holds an entry other than 0 or 1.
    #[error("selection entry {index} is {value}, expected 0 or 1")]
    NonBinarySelection { index: usize, value: u8 },

    /// Any other invalid annealing setting.
    #[error("invalid annealing setting: {0}")]
    InvalidSchedule(String),
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum QuboError {
    /// Instance or configuration rejected before the run.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Reading or writing an instance/submission file failed.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON document.
    #[cfg(feature = "serde")]
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}
