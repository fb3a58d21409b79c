//! Temperature schedule over a fixed iteration budget.

use super::config::{AnnealConfig, CoolingSchedule};

/// Geometric cooling factor taking `t_start` to `t_end` in `iterations`
/// multiplicative steps. Defined as 1 for an empty budget.
pub fn geometric_rate(t_start: f64, t_end: f64, iterations: usize) -> f64 {
    if iterations == 0 {
        1.0
    } else {
        (t_end / t_start).powf(1.0 / iterations as f64)
    }
}

/// Tracks the current temperature of a run.
#[derive(Debug, Clone)]
pub struct AnnealingSchedule {
    cooling: CoolingSchedule,
    t_start: f64,
    t_end: f64,
    iterations: usize,
    rate: f64,
    beta: f64,
    step: usize,
    temperature: f64,
}

impl AnnealingSchedule {
    pub fn new(config: &AnnealConfig) -> Self {
        Self::from_endpoints(
            config.cooling,
            config.initial_temperature,
            config.final_temperature,
            config.iterations,
        )
    }

    pub fn from_endpoints(
        cooling: CoolingSchedule,
        t_start: f64,
        t_end: f64,
        iterations: usize,
    ) -> Self {
        let beta = if iterations == 0 {
            0.0
        } else {
            (t_start - t_end) / (iterations as f64 * t_start * t_end)
        };
        Self {
            cooling,
            t_start,
            t_end,
            iterations,
            rate: geometric_rate(t_start, t_end, iterations),
            beta,
            step: 0,
            temperature: t_start,
        }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Number of completed steps.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Geometric cooling factor (meaningful for `CoolingSchedule::Geometric`).
    pub fn cooling_rate(&self) -> f64 {
        self.rate
    }

    /// Advances one step and returns the new temperature.
    pub fn advance(&mut self) -> f64 {
        self.step += 1;
        self.temperature = match self.cooling {
            CoolingSchedule::Geometric => self.temperature * self.rate,

            CoolingSchedule::Linear => {
                if self.iterations == 0 {
                    self.t_end
                } else {
                    let t = self.t_start
                        - self.step as f64 * (self.t_start - self.t_end) / self.iterations as f64;
                    t.max(self.t_end)
                }
            }

            CoolingSchedule::LundyMees => self.temperature / (1.0 + self.beta * self.temperature),
        };
        self.temperature
    }
}
