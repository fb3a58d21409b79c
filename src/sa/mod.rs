//! Swap-move Simulated Annealing (SA) for cardinality-constrained QUBO.
//!
//! A single-solution trajectory metaheuristic inspired by the physical
//! annealing process. Every move swaps one selected asset for one
//! unselected asset, so the cardinality constraint holds on every visited
//! state. Worsening moves are accepted with a probability that decreases
//! as the temperature falls, allowing the search to escape local optima.
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Metropolis et al. (1953), "Equation of State Calculations by Fast
//!   Computing Machines"
//! - Lundy & Mees (1986), "Convergence of an Annealing Algorithm"

mod acceptance;
mod config;
mod moves;
mod partition;
mod runner;
mod schedule;

pub use acceptance::{Decision, Metropolis};
pub use config::{AnnealConfig, CoolingSchedule, EnergyEvaluation};
pub use moves::{initial_state, propose_swap};
pub use partition::{IndexPartition, Swap};
pub use runner::{AnnealObserver, AnnealResult, AnnealRunner, RestartResult, StepView};
pub use schedule::{geometric_rate, AnnealingSchedule};
