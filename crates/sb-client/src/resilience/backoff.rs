//! Exponential backoff with jitter between retries

use rand::Rng;
use std::time::Duration;

/// Nominal delay before retry number `attempt` (1-based), without jitter.
///
/// `min(base * multiplier^(attempt-1), max)`
pub fn calculate_backoff_delay(
    attempt: u32,
    base: Duration,
    max: Duration,
    multiplier: f64,
) -> Duration {
    let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
    let secs = base.as_secs_f64() * multiplier.powi(exponent);
    Duration::from_secs_f64(secs.min(max.as_secs_f64()).max(0.0))
}

/// Spread `delay` uniformly over `[delay * (1 - jitter), delay * (1 + jitter)]`
pub fn apply_jitter(delay: Duration, jitter: f64) -> Duration {
    if jitter.is_nan() || jitter <= 0.0 || delay.is_zero() {
        return delay;
    }
    let jitter = jitter.min(1.0);
    let factor = 1.0 + rand::thread_rng().gen_range(-jitter..=jitter);
    Duration::from_secs_f64(delay.as_secs_f64() * factor.max(0.0))
}

/// Stateful backoff sequence for a run of retries
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    /// Retry number of the next delay
    attempt: u32,
    base: Duration,
    max: Duration,
    multiplier: f64,
    jitter: f64,
}

impl ExponentialBackoff {
    /// Create a new backoff with custom parameters
    pub fn new(base: Duration, max: Duration, multiplier: f64, jitter: f64) -> Self {
        Self {
            attempt: 1,
            base,
            max,
            multiplier,
            jitter,
        }
    }

    /// Get the next delay and advance the backoff
    pub fn next_delay(&mut self) -> Duration {
        let delay = calculate_backoff_delay(self.attempt, self.base, self.max, self.multiplier);
        self.attempt = self.attempt.saturating_add(1);
        apply_jitter(delay, self.jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Duration = Duration::from_millis(1000);
    const MAX: Duration = Duration::from_millis(10000);

    #[test]
    fn test_delay_without_jitter() {
        assert_eq!(calculate_backoff_delay(1, BASE, MAX, 2.0), Duration::from_millis(1000));
        assert_eq!(calculate_backoff_delay(2, BASE, MAX, 2.0), Duration::from_millis(2000));
        assert_eq!(calculate_backoff_delay(3, BASE, MAX, 2.0), Duration::from_millis(4000));
        assert_eq!(calculate_backoff_delay(10, BASE, MAX, 2.0), Duration::from_millis(10000));
    }

    #[test]
    fn test_delay_huge_attempt_is_capped() {
        assert_eq!(calculate_backoff_delay(u32::MAX, BASE, MAX, 2.0), MAX);
    }

    #[test]
    fn test_jitter_stays_within_quarter() {
        for attempt in 1..=6 {
            let nominal = calculate_backoff_delay(attempt, BASE, MAX, 2.0);
            for _ in 0..200 {
                let jittered = apply_jitter(nominal, 0.25);
                assert!(jittered >= nominal.mul_f64(0.75), "{:?} < 75% of {:?}", jittered, nominal);
                assert!(jittered <= nominal.mul_f64(1.25), "{:?} > 125% of {:?}", jittered, nominal);
            }
        }
    }

    #[test]
    fn test_backoff_increases() {
        let mut backoff = ExponentialBackoff::new(
            Duration::from_secs(1),
            Duration::from_secs(60),
            2.0,
            0.0, // No jitter for deterministic test
        );

        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(), Duration::from_secs(2));
        assert_eq!(backoff.next_delay(), Duration::from_secs(4));
    }

    #[test]
    fn test_unusable_jitter_leaves_delay_alone() {
        assert_eq!(apply_jitter(BASE, f64::NAN), BASE);
        assert_eq!(apply_jitter(BASE, -0.5), BASE);
        assert_eq!(apply_jitter(Duration::ZERO, 0.25), Duration::ZERO);
    }

    #[test]
    fn test_oversized_jitter_is_clamped() {
        for _ in 0..200 {
            assert!(apply_jitter(BASE, f64::INFINITY) <= BASE * 2);
            assert!(apply_jitter(BASE, 5.0) <= BASE * 2);
        }
    }

    #[test]
    fn test_backoff_max() {
        let mut backoff =
            ExponentialBackoff::new(Duration::from_secs(30), Duration::from_secs(60), 2.0, 0.0);

        assert_eq!(backoff.next_delay(), Duration::from_secs(30));
        assert_eq!(backoff.next_delay(), Duration::from_secs(60)); // Capped at max
        assert_eq!(backoff.next_delay(), Duration::from_secs(60)); // Still capped
    }
}
