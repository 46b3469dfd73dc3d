//! Randomized perturbation of the inter-message delay.
//!
//! The randomness source is a capability so tests can substitute a
//! deterministic sequence; the default is an OS-seeded uniform source.

use std::sync::Mutex;
use std::time::Duration;

/// Produces a bounded random offset for the inter-message delay.
pub trait JitterSource: Send + Sync {
    /// Sample an offset in seconds, uniformly distributed over
    /// `[-range, +range]`.
    fn sample(&self, range: Duration) -> f64;
}

/// Uniform jitter backed by `fastrand`.
pub struct UniformJitter {
    rng: Mutex<fastrand::Rng>,
}

impl UniformJitter {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    /// Seeded variant for reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }
}

impl Default for UniformJitter {
    fn default() -> Self {
        Self::new()
    }
}

impl JitterSource for UniformJitter {
    fn sample(&self, range: Duration) -> f64 {
        let unit = self.rng.lock().unwrap().f64();
        (unit * 2.0 - 1.0) * range.as_secs_f64()
    }
}

/// Jitter source that always returns the same offset. Test helper.
pub struct FixedJitter(pub f64);

impl JitterSource for FixedJitter {
    fn sample(&self, _range: Duration) -> f64 {
        self.0
    }
}

/// Compute the delay before the next message.
///
/// With no jitter (or a zero range) this is `base` unchanged; otherwise the
/// sampled offset is added and the result clamped at zero so a large
/// negative offset can never produce a negative wait.
pub fn jittered_delay(
    base: Duration,
    jitter: Option<Duration>,
    source: &dyn JitterSource,
) -> Duration {
    match jitter {
        Some(range) if !range.is_zero() => {
            let secs = base.as_secs_f64() + source.sample(range);
            if secs <= 0.0 {
                Duration::ZERO
            } else {
                Duration::from_secs_f64(secs)
            }
        }
        _ => base,
    }
}
