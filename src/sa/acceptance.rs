//! Metropolis acceptance criterion.

use rand::Rng;

/// Outcome of an acceptance test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Strict improvement, accepted without drawing.
    Improving,
    /// Non-improving move accepted by the random draw.
    Uphill,
    /// Rejected by the random draw.
    Rejected,
    /// The energy delta was NaN; rejected without drawing.
    NonFinite,
}

impl Decision {
    pub fn is_accepted(self) -> bool {
        matches!(self, Decision::Improving | Decision::Uphill)
    }
}

/// Accepts improving moves always and worsening moves with probability
/// `exp(-delta / max(T, floor))`.
#[derive(Debug, Clone, Copy)]
pub struct Metropolis {
    floor: f64,
}

impl Default for Metropolis {
    fn default() -> Self {
        Self { floor: 1e-12 }
    }
}

impl Metropolis {
    /// `floor` clamps the temperature from below.
    pub fn new(floor: f64) -> Self {
        Self { floor }
    }

    /// Acceptance probability of a non-improving move, in `[0, 1]`.
    pub fn probability(&self, delta: f64, temperature: f64) -> f64 {
        (-delta / temperature.max(self.floor)).exp()
    }

    /// Decides on a move with energy change `delta` at `temperature`.
    ///
    /// Draws one uniform `[0, 1)` number from `rng` unless the move strictly
    /// improves or `delta` is NaN.
    pub fn decide<R: Rng>(&self, delta: f64, temperature: f64, rng: &mut R) -> Decision {
        if delta.is_nan() {
            Decision::NonFinite
        } else if delta < 0.0 {
            Decision::Improving
        } else if rng.random::<f64>() < self.probability(delta, temperature) {
            Decision::Uphill
        } else {
            Decision::Rejected
        }
    }

    /// `decide(..).is_accepted()`.
    pub fn accept<R: Rng>(&self, delta: f64, temperature: f64, rng: &mut R) -> bool {
        self.decide(delta, temperature, rng).is_accepted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_improving_always_accepted() {
        let m = Metropolis::default();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..1000 {
            assert_eq!(m.decide(-1e-9, 1e-9, &mut rng), Decision::Improving);
        }
    }

    #[test]
    fn test_zero_delta_always_accepted() {
        let m = Metropolis::default();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for &t in &[1e-15, 1e-4, 1.0, 1e6] {
            for _ in 0..1000 {
                assert!(m.accept(0.0, t, &mut rng));
            }
        }
    }

    #[test]
    fn test_infinite_delta_never_accepted() {
        let m = Metropolis::default();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..1000 {
            assert_eq!(m.decide(f64::INFINITY, 1e6, &mut rng), Decision::Rejected);
        }
        assert_eq!(m.probability(f64::INFINITY, 1.0), 0.0);
        assert!(m.probability(1e6, 1.0) < 1e-300);
    }

    #[test]
    fn test_nan_rejected_without_draw() {
        let m = Metropolis::default();
        let mut a = ChaCha8Rng::seed_from_u64(5);
        let mut b = ChaCha8Rng::seed_from_u64(5);
        assert_eq!(m.decide(f64::NAN, 1.0, &mut a), Decision::NonFinite);
        assert_eq!(a.random::<u64>(), b.random::<u64>());
    }

    #[test]
    fn test_floor_clamps_temperature() {
        let m = Metropolis::new(1e-3);
        assert_eq!(m.probability(1e-3, 0.0), m.probability(1e-3, 1e-3));
        assert!((m.probability(1e-3, -5.0) - (-1.0f64).exp()).abs() < 1e-15);
    }

    #[test]
    fn test_uphill_frequency_matches_probability() {
        let m = Metropolis::default();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let (delta, t) = (1.0, 1.0);
        let trials = 20_000;
        let accepted = (0..trials)
            .filter(|_| m.accept(delta, t, &mut rng))
            .count();
        let freq = accepted as f64 / trials as f64;
        assert!((freq - (-1.0f64).exp()).abs() < 0.02, "frequency {freq}");
    }
}
