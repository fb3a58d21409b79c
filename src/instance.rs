//! Problem instance: the immutable parameter bundle consumed by the optimizer.

use crate::energy;
use crate::error::ConfigError;
use crate::selection::Selection;

#[cfg(feature = "serde")]
use crate::error::QuboError;
#[cfg(feature = "serde")]
use std::path::Path;

/// Relative tolerance for the symmetry check on `sigma`.
const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// A cardinality-constrained portfolio QUBO instance.
///
/// JSON layout (keys written in sorted order):
///
/// ```json
/// { "K": 2, "lambda": 0.5, "mu": [..], "penalty_A": 10.0,
///   "sigma": [[..], ..], "tickers": [..] }
/// ```
///
/// The optimizer never mutates an instance; [`validate`](Self::validate) is
/// run once before every search.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProblemInstance {
    /// Required number of selected assets.
    #[cfg_attr(feature = "serde", serde(rename = "K"))]
    pub k: usize,

    /// Risk-aversion coefficient, `>= 0`.
    pub lambda: f64,

    /// Expected returns, length N.
    pub mu: Vec<f64>,

    /// Cardinality penalty coefficient, `> 0`.
    #[cfg_attr(feature = "serde", serde(rename = "penalty_A"))]
    pub penalty_a: f64,

    /// Covariance matrix, N×N and symmetric.
    pub sigma: Vec<Vec<f64>>,

    /// Asset names, length N.
    pub tickers: Vec<String>,
}

impl ProblemInstance {
    /// Builds and validates an instance.
    pub fn new(
        tickers: Vec<String>,
        k: usize,
        lambda: f64,
        penalty_a: f64,
        mu: Vec<f64>,
        sigma: Vec<Vec<f64>>,
    ) -> Result<Self, ConfigError> {
        let instance = Self {
            k,
            lambda,
            mu,
            penalty_a,
            sigma,
            tickers,
        };
        instance.validate()?;
        Ok(instance)
    }

    /// Like [`new`](Self::new), naming assets `asset_0 .. asset_{N-1}`.
    pub fn unnamed(
        k: usize,
        lambda: f64,
        penalty_a: f64,
        mu: Vec<f64>,
        sigma: Vec<Vec<f64>>,
    ) -> Result<Self, ConfigError> {
        let tickers = (0..mu.len()).map(|i| format!("asset_{i}")).collect();
        Self::new(tickers, k, lambda, penalty_a, mu, sigma)
    }

    /// Universe size N.
    pub fn n(&self) -> usize {
        self.mu.len()
    }

    /// Checks every constraint the search relies on.
    ///
    /// Order of checks: universe size, dimensions, cardinality, coefficients,
    /// symmetry. The first violation is reported. Positive semidefiniteness
    /// of `sigma` is not checked.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let n = self.mu.len();
        if n == 0 {
            return Err(ConfigError::EmptyUniverse);
        }

        check_len("tickers", n, self.tickers.len())?;
        check_len("sigma", n, self.sigma.len())?;
        for (i, row) in self.sigma.iter().enumerate() {
            check_len(&format!("sigma[{i}]"), n, row.len())?;
        }

        if self.k > n {
            return Err(ConfigError::CardinalityOutOfRange { k: self.k, n });
        }
        if self.k == 0 || self.k == n {
            return Err(ConfigError::DegenerateCardinality { k: self.k, n });
        }

        if self.lambda.is_nan() || self.lambda < 0.0 {
            return Err(ConfigError::NegativeLambda(self.lambda));
        }
        if self.penalty_a.is_nan() || self.penalty_a <= 0.0 {
            return Err(ConfigError::NonPositivePenalty(self.penalty_a));
        }

        for row in 0..n {
            for col in (row + 1)..n {
                let upper = self.sigma[row][col];
                let lower = self.sigma[col][row];
                let scale = 1.0_f64.max(upper.abs()).max(lower.abs());
                // NaN entries are left to the search, which reports them
                if (upper - lower).abs() > SYMMETRY_TOLERANCE * scale {
                    return Err(ConfigError::AsymmetricSigma {
                        row,
                        col,
                        upper,
                        lower,
                    });
                }
            }
        }

        Ok(())
    }

    /// QUBO energy of `x` under this instance.
    pub fn energy(&self, x: &Selection) -> f64 {
        energy::energy(
            x.as_slice(),
            &self.mu,
            &self.sigma,
            self.k,
            self.lambda,
            self.penalty_a,
        )
    }

    /// Whether `x` has exactly K ones.
    pub fn is_feasible(&self, x: &Selection) -> bool {
        x.len() == self.n() && x.cardinality() == self.k
    }

    /// Ticker names of the selected assets, in index order.
    pub fn selected_tickers(&self, x: &Selection) -> Vec<&str> {
        x.selected_indices()
            .into_iter()
            .filter_map(|i| self.tickers.get(i).map(String::as_str))
            .collect()
    }

    /// Parses an instance from JSON. The result is not validated.
    #[cfg(feature = "serde")]
    pub fn from_json_str(json: &str) -> Result<Self, QuboError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses an instance file. The result is not validated.
    #[cfg(feature = "serde")]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, QuboError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| QuboError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Deterministic JSON: sorted keys, 2-space indent, trailing newline.
    #[cfg(feature = "serde")]
    pub fn to_json_string(&self) -> Result<String, QuboError> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }

    /// Writes [`to_json_string`](Self::to_json_string), creating parent
    /// directories as needed.
    #[cfg(feature = "serde")]
    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), QuboError> {
        let path = path.as_ref();
        let io_err = |source| QuboError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, self.to_json_string()?).map_err(io_err)
    }
}

fn check_len(field: &str, expected: usize, found: usize) -> Result<(), ConfigError> {
    if expected == found {
        Ok(())
    } else {
        Err(ConfigError::DimensionMismatch {
            field: field.to_string(),
            expected,
            found,
        })
    }
}
