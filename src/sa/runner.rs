//! Annealing search loop.
//!
//! # Algorithm
//!
//! 1. Validate the instance and configuration
//! 2. Draw a random feasible selection; it is also the incumbent
//! 3. For each of the `iterations` steps:
//!    a. Propose a swap and apply it tentatively
//!    b. Evaluate the new energy and the delta
//!    c. Metropolis test; commit on accept, revert on reject
//!    d. Update the incumbent on strict improvement
//!    e. Cool
//! 4. Return the incumbent, never the final current state

use super::acceptance::{Decision, Metropolis};
use super::config::{AnnealConfig, EnergyEvaluation};
use super::moves::{initial_state, propose_swap};
use super::partition::Swap;
use super::schedule::AnnealingSchedule;
use crate::energy::{swap_delta, SigmaRowCache};
use crate::error::ConfigError;
use crate::instance::ProblemInstance;
use crate::selection::Selection;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Result of an annealing run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnnealResult {
    /// Best selection visited (the incumbent).
    pub best: Selection,

    /// Energy of `best`.
    pub best_energy: f64,

    /// Current selection when the budget ran out.
    pub final_selection: Selection,

    /// Energy of `final_selection`.
    pub final_energy: f64,

    /// Number of proposed swaps.
    pub iterations: usize,

    /// Temperature after the last step.
    pub final_temperature: f64,

    /// Number of accepted moves (including improvements).
    pub accepted_moves: usize,

    /// Number of strictly improving moves.
    pub improving_moves: usize,

    /// Proposals whose energy came out NaN or infinite.
    pub non_finite_energies: usize,

    /// Incumbent energy at the start, every `history_interval` steps, and
    /// at the end. Non-increasing.
    pub energy_history: Vec<f64>,
}

/// Snapshot handed to an [`AnnealObserver`] after each step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepView {
    /// Zero-based index of the step just completed.
    pub step: usize,
    /// Temperature the acceptance test ran at.
    pub temperature: f64,
    /// The proposed move.
    pub swap: Swap,
    /// What the acceptance test decided.
    pub decision: Decision,
    /// Energy of the current selection after commit or revert.
    pub current_energy: f64,
    pub best_energy: f64,
}

/// Per-step callback receiving the step snapshot and the current selection
/// (after commit or revert). Any `FnMut(&StepView, &Selection)` is an
/// observer.
pub trait AnnealObserver {
    fn on_step(&mut self, view: &StepView, current: &Selection);
}

impl<F: FnMut(&StepView, &Selection)> AnnealObserver for F {
    fn on_step(&mut self, view: &StepView, current: &Selection) {
        self(view, current)
    }
}

struct Silent;

impl AnnealObserver for Silent {
    fn on_step(&mut self, _view: &StepView, _current: &Selection) {}
}

/// Results of independent restarts over several seeds.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RestartResult {
    /// Seeds in input order.
    pub seeds: Vec<u64>,
    /// One result per seed, same order.
    pub runs: Vec<AnnealResult>,
    /// Index of the lowest best energy; ties go to the earliest seed.
    pub best_index: usize,
}

impl RestartResult {
    pub fn best(&self) -> &AnnealResult {
        &self.runs[self.best_index]
    }
}

/// Executes swap-move simulated annealing.
pub struct AnnealRunner;

impl AnnealRunner {
    /// Runs one search seeded from `config.seed`.
    pub fn run(
        instance: &ProblemInstance,
        config: &AnnealConfig,
    ) -> Result<AnnealResult, ConfigError> {
        Self::run_observed(instance, config, &mut Silent)
    }

    /// Runs one search, calling `observer` after every step.
    pub fn run_observed<O: AnnealObserver>(
        instance: &ProblemInstance,
        config: &AnnealConfig,
        observer: &mut O,
    ) -> Result<AnnealResult, ConfigError> {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self::run_with_rng(instance, config, &mut rng, observer)
    }

    /// Runs one search drawing every random number from `rng`.
    ///
    /// `config.seed` is ignored. The RNG is consumed by the initial shuffle,
    /// then per step by the two swap draws and, unless the delta is negative
    /// or NaN, one acceptance draw.
    #[tracing::instrument(
        level = "debug",
        name = "anneal",
        skip_all,
        fields(n = instance.n(), k = instance.k, iterations = config.iterations)
    )]
    pub fn run_with_rng<R: Rng, O: AnnealObserver>(
        instance: &ProblemInstance,
        config: &AnnealConfig,
        rng: &mut R,
        observer: &mut O,
    ) -> Result<AnnealResult, ConfigError> {
        instance.validate()?;
        config.validate()?;

        let n = instance.n();
        let k = instance.k;

        // Initialize
        let (mut current, mut partition) = initial_state(n, k, rng);
        debug_assert!(partition.neighborhood_size() > 0);
        let mut current_energy = instance.energy(&current);
        let mut cache = match config.evaluation {
            EnergyEvaluation::Full => None,
            EnergyEvaluation::Incremental => Some(SigmaRowCache::new(&instance.sigma, &current)),
        };
        let mut best = current.clone();
        let mut best_energy = current_energy;

        let mut schedule = AnnealingSchedule::new(config);
        let metropolis = Metropolis::new(config.temperature_floor);

        let mut accepted_moves = 0usize;
        let mut improving_moves = 0usize;
        let mut non_finite_energies = 0usize;

        if !current_energy.is_finite() {
            tracing::warn!(energy = current_energy, "initial energy is not finite");
        }

        let mut energy_history = vec![best_energy];

        for step in 0..config.iterations {
            let temperature = schedule.temperature();
            // unreachable after validation (0 < K < N)
            let swap = propose_swap(&partition, rng)
                .ok_or(ConfigError::DegenerateCardinality { k, n })?;

            current.set(swap.removed, false);
            current.set(swap.added, true);

            let (new_energy, delta) = match &cache {
                Some(cache) => {
                    let delta = swap_delta(instance, cache, swap);
                    (current_energy + delta, delta)
                }
                None => {
                    let e = instance.energy(&current);
                    (e, e - current_energy)
                }
            };

            if !new_energy.is_finite() {
                if non_finite_energies == 0 {
                    tracing::warn!(
                        step,
                        energy = new_energy,
                        "non-finite energy; NaN deltas are rejected"
                    );
                }
                non_finite_energies += 1;
            }

            let decision = metropolis.decide(delta, temperature, rng);
            if decision.is_accepted() {
                partition.commit(swap);
                if let Some(cache) = cache.as_mut() {
                    cache.apply(&instance.sigma, swap);
                }
                current_energy = new_energy;
                accepted_moves += 1;
                if decision == Decision::Improving {
                    improving_moves += 1;
                }

                if current_energy < best_energy {
                    best.clone_from(&current);
                    best_energy = current_energy;
                }
            } else {
                current.set(swap.removed, true);
                current.set(swap.added, false);
            }

            debug_assert!(partition.matches(current.as_slice()));
            debug_assert_eq!(current.cardinality(), k);

            schedule.advance();

            let view = StepView {
                step,
                temperature,
                swap,
                decision,
                current_energy,
                best_energy,
            };
            observer.on_step(&view, &current);

            if (step + 1).is_multiple_of(config.history_interval) {
                energy_history.push(best_energy);
                tracing::trace!(
                    step = step + 1,
                    temperature = schedule.temperature(),
                    current_energy,
                    best_energy,
                    "progress"
                );
            }
        }

        if energy_history
            .last()
            .is_none_or(|&last| last.to_bits() != best_energy.to_bits())
        {
            energy_history.push(best_energy);
        }

        tracing::debug!(
            best_energy,
            final_energy = current_energy,
            accepted_moves,
            improving_moves,
            non_finite_energies,
            final_temperature = schedule.temperature(),
            "annealing finished"
        );

        Ok(AnnealResult {
            best,
            best_energy,
            final_selection: current,
            final_energy: current_energy,
            iterations: schedule.step(),
            final_temperature: schedule.temperature(),
            accepted_moves,
            improving_moves,
            non_finite_energies,
            energy_history,
        })
    }

    /// Runs one independent search per seed and picks the best.
    ///
    /// Each run owns its RNG and state; with the `parallel` feature the runs
    /// execute on the rayon pool. Results do not depend on the feature.
    pub fn run_restarts(
        instance: &ProblemInstance,
        config: &AnnealConfig,
        seeds: &[u64],
    ) -> Result<RestartResult, ConfigError> {
        if seeds.is_empty() {
            return Err(ConfigError::InvalidSchedule(
                "restarts need at least one seed".into(),
            ));
        }
        instance.validate()?;
        config.validate()?;

        let run_one = |&seed: &u64| Self::run(instance, &config.clone().with_seed(seed));

        #[cfg(feature = "parallel")]
        let runs = {
            use rayon::prelude::*;
            seeds.par_iter().map(run_one).collect::<Result<Vec<_>, _>>()?
        };
        #[cfg(not(feature = "parallel"))]
        let runs = seeds.iter().map(run_one).collect::<Result<Vec<_>, _>>()?;

        let mut best_index = 0;
        for (i, run) in runs.iter().enumerate().skip(1) {
            if run.best_energy < runs[best_index].best_energy {
                best_index = i;
            }
        }
        tracing::debug!(
            restarts = runs.len(),
            best_seed = seeds[best_index],
            best_energy = runs[best_index].best_energy,
            "restarts finished"
        );

        Ok(RestartResult {
            seeds: seeds.to_vec(),
            runs,
            best_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sa::CoolingSchedule;

    fn four_assets() -> ProblemInstance {
        ProblemInstance::unnamed(
            2,
            0.0,
            10.0,
            vec![1.0, 2.0, 3.0, 4.0],
            vec![vec![0.0; 4]; 4],
        )
        .unwrap()
    }

    /// 12 assets with a banded covariance; large enough that the landscape
    /// has local minima under swaps.
    fn banded(n: usize, k: usize) -> ProblemInstance {
        let mu: Vec<f64> = (0..n).map(|i| 0.01 * ((i * 7) % 11) as f64).collect();
        let sigma: Vec<Vec<f64>> = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| match i.abs_diff(j) {
                        0 => 0.05 + 0.01 * (i % 3) as f64,
                        1 => 0.02,
                        2 => 0.01,
                        _ => 0.0,
                    })
                    .collect()
            })
            .collect();
        ProblemInstance::unnamed(k, 0.5, 10.0, mu, sigma).unwrap()
    }

    /// Exhaustive minimum over all K-subsets.
    fn brute_force(instance: &ProblemInstance) -> f64 {
        let n = instance.n();
        (0u32..(1 << n))
            .filter(|m| m.count_ones() as usize == instance.k)
            .map(|m| {
                let idx: Vec<usize> = (0..n).filter(|&i| m & (1 << i) != 0).collect();
                instance.energy(&Selection::from_indices(n, &idx))
            })
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn test_finds_top_returns_without_risk() {
        let result = AnnealRunner::run(&four_assets(), &AnnealConfig::default().with_iterations(2000))
            .unwrap();
        assert_eq!(result.best.as_slice(), &[0, 0, 1, 1]);
        assert_eq!(result.best_energy, -7.0);
        assert_eq!(result.iterations, 2000);
    }

    #[test]
    fn test_matches_brute_force_optimum() {
        let inst = banded(12, 4);
        let optimum = brute_force(&inst);
        let config = AnnealConfig::default().with_iterations(20_000);
        let restarts = AnnealRunner::run_restarts(&inst, &config, &[1, 2, 3, 4]).unwrap();
        let result = restarts.best();
        assert!(
            (result.best_energy - optimum).abs() < 1e-12,
            "expected {optimum}, got {}",
            result.best_energy
        );
        assert!(inst.is_feasible(&result.best));
    }

    #[test]
    fn test_best_energy_matches_best_selection() {
        let inst = banded(10, 3);
        let result = AnnealRunner::run(&inst, &AnnealConfig::default().with_iterations(3000)).unwrap();
        assert!((inst.energy(&result.best) - result.best_energy).abs() < 1e-12);
        assert!((inst.energy(&result.final_selection) - result.final_energy).abs() < 1e-12);
        assert!(result.best_energy <= result.final_energy);
    }

    #[test]
    fn test_zero_iterations_returns_initial_state() {
        let inst = banded(10, 3);
        let config = AnnealConfig::default().with_iterations(0).with_seed(9);
        let result = AnnealRunner::run(&inst, &config).unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let (initial, _) = initial_state(10, 3, &mut rng);

        assert_eq!(result.best, initial);
        assert_eq!(result.final_selection, initial);
        assert_eq!(result.best_energy, inst.energy(&initial));
        assert_eq!(result.best_energy, result.final_energy);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.accepted_moves, 0);
        assert_eq!(result.final_temperature, config.initial_temperature);
        assert_eq!(result.energy_history, vec![result.best_energy]);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let inst = banded(12, 5);
        let config = AnnealConfig::default().with_iterations(5000).with_seed(123);
        let a = AnnealRunner::run(&inst, &config).unwrap();
        let b = AnnealRunner::run(&inst, &config).unwrap();
        assert_eq!(a.best, b.best);
        assert_eq!(a.best_energy.to_bits(), b.best_energy.to_bits());
        assert_eq!(a.accepted_moves, b.accepted_moves);
        assert_eq!(a.energy_history, b.energy_history);
    }

    #[test]
    fn test_observer_sees_every_step() {
        let inst = banded(8, 3);
        let config = AnnealConfig::default().with_iterations(500);
        let mut steps = 0usize;
        let mut last_best = f64::INFINITY;
        let mut observer = |view: &StepView, current: &Selection| {
            assert_eq!(view.step, steps);
            assert_eq!(current.cardinality(), 3);
            assert!(view.best_energy <= last_best);
            assert!(view.best_energy <= view.current_energy);
            last_best = view.best_energy;
            steps += 1;
        };
        let result = AnnealRunner::run_observed(&inst, &config, &mut observer).unwrap();
        assert_eq!(steps, 500);
        assert_eq!(last_best, result.best_energy);
    }

    #[test]
    fn test_rejected_moves_leave_state_unchanged() {
        let inst = banded(8, 3);
        // cold start: almost every uphill move is rejected
        let config = AnnealConfig::default()
            .with_iterations(300)
            .with_initial_temperature(1e-9)
            .with_final_temperature(1e-10);
        let mut prev: Option<(Selection, f64)> = None;
        let mut observer = |view: &StepView, current: &Selection| {
            if let Some((x, e)) = &prev {
                if !view.decision.is_accepted() {
                    assert_eq!(current, x);
                    assert_eq!(view.current_energy, *e);
                } else {
                    assert!(!current.is_selected(view.swap.removed));
                    assert!(current.is_selected(view.swap.added));
                }
            }
            prev = Some((current.clone(), view.current_energy));
        };
        let result = AnnealRunner::run_observed(&inst, &config, &mut observer).unwrap();
        assert!(result.accepted_moves < result.iterations);
    }

    #[test]
    fn test_energy_history_non_increasing() {
        let inst = banded(12, 4);
        let config = AnnealConfig::default()
            .with_iterations(10_000)
            .with_history_interval(250);
        let result = AnnealRunner::run(&inst, &config).unwrap();
        assert!(result.energy_history.len() >= 40);
        for window in result.energy_history.windows(2) {
            assert!(
                window[1] <= window[0],
                "best energy history should be non-increasing: {} > {}",
                window[1],
                window[0]
            );
        }
        assert_eq!(*result.energy_history.last().unwrap(), result.best_energy);
    }

    #[test]
    fn test_final_temperature_near_end() {
        let config = AnnealConfig::default().with_iterations(10_000);
        let result = AnnealRunner::run(&banded(6, 2), &config).unwrap();
        let rel = (result.final_temperature - config.final_temperature).abs() / config.final_temperature;
        assert!(rel < 1e-6);
    }

    #[test]
    fn test_high_temperature_accepts_most_moves() {
        let inst = banded(10, 4);
        let config = AnnealConfig::default()
            .with_iterations(2000)
            .with_initial_temperature(1e8)
            .with_final_temperature(1e7);
        let result = AnnealRunner::run(&inst, &config).unwrap();
        let ratio = result.accepted_moves as f64 / result.iterations as f64;
        assert!(ratio > 0.95, "expected high acceptance at high temp, got {ratio}");
        assert!(result.accepted_moves >= result.improving_moves);
    }

    #[test]
    fn test_incremental_reaches_same_optimum() {
        let inst = banded(12, 4);
        let optimum = brute_force(&inst);
        let config = AnnealConfig::default()
            .with_iterations(20_000)
            .with_evaluation(EnergyEvaluation::Incremental);
        let restarts = AnnealRunner::run_restarts(&inst, &config, &[1, 2, 3, 4]).unwrap();
        let result = restarts.best();
        assert!((result.best_energy - optimum).abs() < 1e-9);
        assert!((inst.energy(&result.best) - result.best_energy).abs() < 1e-9);
    }

    #[test]
    fn test_alternate_schedules_complete() {
        let inst = banded(10, 3);
        let optimum = brute_force(&inst);
        for cooling in [CoolingSchedule::Linear, CoolingSchedule::LundyMees] {
            let config = AnnealConfig::default()
                .with_iterations(20_000)
                .with_cooling(cooling);
            let result = AnnealRunner::run(&inst, &config).unwrap();
            assert!(
                result.best_energy - optimum < 0.05,
                "{cooling:?}: {} vs optimum {optimum}",
                result.best_energy
            );
            assert!((result.final_temperature - config.final_temperature).abs() < 1e-6);
        }
    }

    #[test]
    fn test_degenerate_k_rejected_before_search() {
        let mut inst = four_assets();
        inst.k = 4;
        let err = AnnealRunner::run(&inst, &AnnealConfig::default()).unwrap_err();
        assert_eq!(err, ConfigError::DegenerateCardinality { k: 4, n: 4 });

        inst.k = 0;
        let mut calls = 0;
        let mut observer = |_: &StepView, _: &Selection| calls += 1;
        let err = AnnealRunner::run_observed(&inst, &AnnealConfig::default(), &mut observer)
            .unwrap_err();
        assert_eq!(err, ConfigError::DegenerateCardinality { k: 0, n: 4 });
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AnnealConfig::default().with_final_temperature(-1.0);
        assert!(matches!(
            AnnealRunner::run(&four_assets(), &config),
            Err(ConfigError::NonPositiveTemperature { .. })
        ));
    }

    #[test]
    fn test_nan_energy_counted_and_rejected() {
        let mut inst = banded(6, 2);
        inst.mu[5] = f64::NAN;
        // first seed whose start state leaves asset 5 out
        let seed = (0u64..)
            .find(|&s| !initial_state(6, 2, &mut ChaCha8Rng::seed_from_u64(s)).0.is_selected(5))
            .unwrap();
        let config = AnnealConfig::default().with_iterations(500).with_seed(seed);

        let mut saw_nan_reject = false;
        let mut observer = |view: &StepView, current: &Selection| {
            assert!(!current.is_selected(5));
            if view.swap.added == 5 {
                assert_eq!(view.decision, Decision::NonFinite);
                saw_nan_reject = true;
            }
        };
        let result = AnnealRunner::run_observed(&inst, &config, &mut observer).unwrap();

        assert!(saw_nan_reject);
        assert!(result.non_finite_energies > 0);
        assert!(result.best_energy.is_finite());
        assert!(result.final_energy.is_finite());
        assert_eq!(result.best.cardinality(), 2);
        assert!(!result.best.is_selected(5));
        assert!(!result.final_selection.is_selected(5));
    }

    #[test]
    fn test_restarts_pick_lowest_energy() {
        let inst = banded(12, 4);
        let config = AnnealConfig::default().with_iterations(300);
        let seeds = [1, 2, 3, 4, 5];
        let restarts = AnnealRunner::run_restarts(&inst, &config, &seeds).unwrap();
        assert_eq!(restarts.runs.len(), 5);
        for (run, &seed) in restarts.runs.iter().zip(&seeds) {
            let single = AnnealRunner::run(&inst, &config.clone().with_seed(seed)).unwrap();
            assert_eq!(run.best, single.best);
            assert!(restarts.best().best_energy <= run.best_energy);
        }
    }

    #[test]
    fn test_restarts_need_seeds() {
        let err = AnnealRunner::run_restarts(&four_assets(), &AnnealConfig::default(), &[])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSchedule(_)));
    }
}
