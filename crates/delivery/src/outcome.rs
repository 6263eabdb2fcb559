//! Randomness behind simulated sends: outcome classification and the
//! artificial per-recipient latency.

use campaign_core::types::DeliveryStatus;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Source of simulated delivery randomness. Injected so tests can swap in a
/// seeded or scripted generator.
pub trait OutcomeSource: Send + Sync {
    /// `Sent` or `Failed`.
    fn draw_outcome(&self) -> DeliveryStatus;

    /// A latency in `[0, max]`.
    fn draw_latency(&self, max: Duration) -> Duration;
}

fn classify(success: bool) -> DeliveryStatus {
    if success {
        DeliveryStatus::Sent
    } else {
        DeliveryStatus::Failed
    }
}

fn latency_within<R: Rng + ?Sized>(rng: &mut R, max: Duration) -> Duration {
    let max_ms = max.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rng.gen_range(0..=max_ms))
}

/// Thread-local entropy, independent per draw.
#[derive(Debug, Clone)]
pub struct RandomOutcomes {
    success_rate: f64,
}

impl RandomOutcomes {
    pub fn new(success_rate: f64) -> Self {
        Self {
            success_rate: success_rate.clamp(0.0, 1.0),
        }
    }
}

impl OutcomeSource for RandomOutcomes {
    fn draw_outcome(&self) -> DeliveryStatus {
        classify(rand::thread_rng().gen_bool(self.success_rate))
    }

    fn draw_latency(&self, max: Duration) -> Duration {
        latency_within(&mut rand::thread_rng(), max)
    }
}

/// Deterministic sequence for a given seed (draw order across concurrent
/// recipients is still unspecified).
pub struct SeededOutcomes {
    success_rate: f64,
    rng: Mutex<StdRng>,
}

impl SeededOutcomes {
    pub fn new(success_rate: f64, seed: u64) -> Self {
        Self {
            success_rate: success_rate.clamp(0.0, 1.0),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl OutcomeSource for SeededOutcomes {
    fn draw_outcome(&self) -> DeliveryStatus {
        classify(self.rng.lock().gen_bool(self.success_rate))
    }

    fn draw_latency(&self, max: Duration) -> Duration {
        latency_within(&mut *self.rng.lock(), max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extreme_rates() {
        let always = RandomOutcomes::new(1.0);
        let never = RandomOutcomes::new(0.0);
        for _ in 0..100 {
            assert_eq!(always.draw_outcome(), DeliveryStatus::Sent);
            assert_eq!(never.draw_outcome(), DeliveryStatus::Failed);
        }
    }

    #[test]
    fn test_rate_is_clamped() {
        let source = RandomOutcomes::new(7.0);
        assert_eq!(source.draw_outcome(), DeliveryStatus::Sent);
    }

    #[test]
    fn test_latency_bounded() {
        let source = RandomOutcomes::new(0.9);
        let max = Duration::from_millis(25);
        for _ in 0..200 {
            assert!(source.draw_latency(max) <= max);
        }
        assert_eq!(source.draw_latency(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn test_seeded_sequences_repeat() {
        let a = SeededOutcomes::new(0.5, 42);
        let b = SeededOutcomes::new(0.5, 42);
        let draws_a: Vec<_> = (0..64).map(|_| a.draw_outcome()).collect();
        let draws_b: Vec<_> = (0..64).map(|_| b.draw_outcome()).collect();
        assert_eq!(draws_a, draws_b);
        assert!(draws_a.contains(&DeliveryStatus::Sent));
        assert!(draws_a.contains(&DeliveryStatus::Failed));
    }
}
