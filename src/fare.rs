//! Fare amounts are mocked: the engine only needs "a plausible number in a
//! bounded range". The randomness lives behind this capability trait so the
//! lifecycle logic stays deterministic under test.

use rand::Rng;

pub trait FareEstimator: Send + Sync {
    /// Fare assigned when a ride completes.
    fn completion_fare(&self) -> f64;

    /// Pre-ride estimate for a pickup/dropoff pair.
    fn estimate(&self, pickup: &str, dropoff: &str) -> f64;
}

/// Production estimator: uniform draws, rounded to cents.
pub struct RandomFares;

impl FareEstimator for RandomFares {
    fn completion_fare(&self) -> f64 {
        let raw = rand::thread_rng().gen_range(5.0..=50.0);
        round_cents(raw)
    }

    fn estimate(&self, pickup: &str, dropoff: &str) -> f64 {
        let base_fare = 10.0;
        let distance_factor = (pickup.len() + dropoff.len()) as f64 * 0.1;
        let surge = rand::thread_rng().gen_range(0.8..=1.5);
        round_cents((base_fare + distance_factor) * surge)
    }
}

/// Deterministic estimator for tests.
pub struct FixedFares(pub f64);

impl FareEstimator for FixedFares {
    fn completion_fare(&self) -> f64 {
        self.0
    }

    fn estimate(&self, _pickup: &str, _dropoff: &str) -> f64 {
        self.0
    }
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_fare_stays_in_range_and_has_cent_precision() {
        let fares = RandomFares;
        for _ in 0..200 {
            let fare = fares.completion_fare();
            assert!((5.0..=50.0).contains(&fare), "fare out of range: {fare}");
            let cents = fare * 100.0;
            assert!((cents - cents.round()).abs() < 1e-9);
        }
    }

    #[test]
    fn estimate_grows_with_location_length() {
        // surge is in [0.8, 1.5], so even the max-surge short pair stays
        // below the min-surge long pair here
        let fares = RandomFares;
        let short = fares.estimate("A", "B");
        let long = fares.estimate(&"x".repeat(200), &"y".repeat(200));
        assert!(long > short);
    }

    #[test]
    fn fixed_estimator_is_constant() {
        let fares = FixedFares(25.5);
        assert_eq!(fares.completion_fare(), 25.5);
        assert_eq!(fares.estimate("a", "b"), 25.5);
    }
}
