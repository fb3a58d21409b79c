//! Cardinality-constrained portfolio selection as a QUBO, solved by
//! swap-move simulated annealing.
//!
//! Given N assets with expected returns `mu`, covariance `sigma`, a
//! risk-aversion coefficient `lambda` and a required portfolio size K, the
//! crate searches for the binary selection `x` minimizing
//!
//! ```text
//! E(x) = -mu·x + lambda * xᵀ·sigma·x + penalty_A * (sum(x) - K)²
//! ```
//!
//! - [`instance`]: the immutable problem bundle, validation, JSON codec.
//! - [`energy`]: the QUBO objective, its term breakdown and swap deltas.
//! - [`sa`]: the annealing search (initializer, swap neighborhood,
//!   schedule, Metropolis acceptance, driver).
//! - [`selection`]: selection vectors and the submission artifact.
//!
//! # Example
//!
//! ```
//! use u_qubo::instance::ProblemInstance;
//!
//! let instance = ProblemInstance::unnamed(
//!     2,
//!     0.5,
//!     10.0,
//!     vec![0.01, 0.03, 0.02, 0.04],
//!     vec![
//!         vec![0.04, 0.00, 0.01, 0.00],
//!         vec![0.00, 0.09, 0.00, 0.02],
//!         vec![0.01, 0.00, 0.01, 0.00],
//!         vec![0.00, 0.02, 0.00, 0.16],
//!     ],
//! )
//! .unwrap();
//!
//! let (best, energy) = u_qubo::run(&instance, 5_000, 1.0, 1e-4, 42).unwrap();
//! assert_eq!(best.cardinality(), 2);
//! assert!((instance.energy(&best) - energy).abs() < 1e-12);
//! ```
//!
//! # Architecture
//!
//! Built in the same Layer 2 (Algorithms) style as the other U-Engine
//! metaheuristic crates: a configuration struct with builder methods, a
//! stateless runner, and a result record. Randomness is always an explicit,
//! seedable RNG, so runs are reproducible and independent runs can execute
//! in parallel.

pub mod energy;
pub mod error;
pub mod instance;
pub mod sa;
pub mod selection;

pub use error::{ConfigError, QuboError};
pub use instance::ProblemInstance;
pub use selection::{Selection, Submission};

use sa::{AnnealConfig, AnnealRunner};

/// Runs a geometric-cooling search and returns the incumbent and its energy.
///
/// Shorthand for [`AnnealRunner::run`] with the given budget, temperature
/// endpoints and seed and defaults for everything else.
pub fn run(
    instance: &ProblemInstance,
    iterations: usize,
    t_start: f64,
    t_end: f64,
    seed: u64,
) -> Result<(Selection, f64), QuboError> {
    let config = AnnealConfig::default()
        .with_iterations(iterations)
        .with_initial_temperature(t_start)
        .with_final_temperature(t_end)
        .with_seed(seed);
    let result = AnnealRunner::run(instance, &config)?;
    Ok((result.best, result.best_energy))
}
