//! Annealing configuration and cooling schedules.

use crate::error::ConfigError;

/// Cooling schedule for temperature reduction.
///
/// Every schedule is pinned to the same endpoints: it starts at
/// `initial_temperature` and reaches `final_temperature` after exactly
/// `iterations` steps.
///
/// # References
///
/// - Geometric: standard textbook approach
/// - Linear: fixed-duration cooling
/// - LundyMees: Lundy & Mees (1986), with convergence proof
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CoolingSchedule {
    /// Geometric (exponential) cooling: `T_{k+1} = alpha * T_k` with
    /// `alpha = (T_end / T_start)^(1 / iterations)`.
    #[default]
    Geometric,

    /// Linear cooling: `T_k = T_start - k * (T_start - T_end) / iterations`.
    Linear,

    /// Lundy-Mees cooling: `T_{k+1} = T_k / (1 + beta * T_k)` with
    /// `beta = (T_start - T_end) / (iterations * T_start * T_end)`.
    ///
    /// Cools fast at high T, slow at low T.
    LundyMees,
}

/// How the energy of a proposed swap is obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EnergyEvaluation {
    /// Recompute the full O(N²) energy for every proposal.
    #[default]
    Full,

    /// O(1) swap delta from a cached `sigma·x`, O(N) update on acceptance.
    ///
    /// Rounding differs slightly from `Full`, so trajectories may diverge
    /// on near-ties.
    Incremental,
}

/// Configuration for a single annealing run.
///
/// # Examples
///
/// ```
/// use u_qubo::sa::{AnnealConfig, CoolingSchedule};
///
/// let config = AnnealConfig::default()
///     .with_iterations(20_000)
///     .with_initial_temperature(2.0)
///     .with_final_temperature(1e-5)
///     .with_cooling(CoolingSchedule::Geometric)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnnealConfig {
    /// Total number of proposed swaps. Zero returns the initial state.
    pub iterations: usize,

    /// Starting temperature `T_start`.
    pub initial_temperature: f64,

    /// Temperature `T_end` reached after `iterations` steps.
    pub final_temperature: f64,

    /// Cooling schedule.
    pub cooling: CoolingSchedule,

    /// Energy evaluation strategy.
    pub evaluation: EnergyEvaluation,

    /// Lower clamp on the temperature used in the acceptance rule.
    pub temperature_floor: f64,

    /// Incumbent energy is recorded every this many steps.
    pub history_interval: usize,

    /// Random seed. Same seed, same trajectory.
    pub seed: u64,
}

impl Default for AnnealConfig {
    fn default() -> Self {
        Self {
            iterations: 50_000,
            initial_temperature: 1.0,
            final_temperature: 1e-4,
            cooling: CoolingSchedule::default(),
            evaluation: EnergyEvaluation::default(),
            temperature_floor: 1e-12,
            history_interval: 100,
            seed: 42,
        }
    }
}

impl AnnealConfig {
    pub fn with_iterations(mut self, n: usize) -> Self {
        self.iterations = n;
        self
    }

    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = t;
        self
    }

    pub fn with_final_temperature(mut self, t: f64) -> Self {
        self.final_temperature = t;
        self
    }

    pub fn with_cooling(mut self, cooling: CoolingSchedule) -> Self {
        self.cooling = cooling;
        self
    }

    pub fn with_evaluation(mut self, evaluation: EnergyEvaluation) -> Self {
        self.evaluation = evaluation;
        self
    }

    pub fn with_temperature_floor(mut self, t: f64) -> Self {
        self.temperature_floor = t;
        self
    }

    pub fn with_history_interval(mut self, n: usize) -> Self {
        self.history_interval = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive_temperature("initial_temperature", self.initial_temperature)?;
        positive_temperature("final_temperature", self.final_temperature)?;
        positive_temperature("temperature_floor", self.temperature_floor)?;

        if self.history_interval == 0 {
            return Err(ConfigError::InvalidSchedule(
                "history_interval must be at least 1".into(),
            ));
        }
        match self.cooling {
            CoolingSchedule::Geometric => {}
            CoolingSchedule::Linear | CoolingSchedule::LundyMees => {
                if self.final_temperature > self.initial_temperature {
                    return Err(ConfigError::InvalidSchedule(format!(
                        "{:?} cooling needs final_temperature <= initial_temperature, got {} > {}",
                        self.cooling, self.final_temperature, self.initial_temperature
                    )));
                }
            }
        }
        Ok(())
    }
}

fn positive_temperature(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositiveTemperature { name, value })
    }
}
