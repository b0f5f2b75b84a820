use std::time::Duration;

use crate::BackoffOptions;

/// Per-call exponential backoff state.
///
/// Each call owns its own instance, including its random source, so
/// concurrent calls never share jitter state.
#[derive(Debug)]
pub struct Backoff {
    min: Duration,
    max: Duration,
    factor: f64,
    jitter: bool,
    attempt: u32,
    rng: fastrand::Rng,
}

impl Backoff {
    /// Creates a fresh backoff at attempt zero.
    pub fn new(opts: &BackoffOptions) -> Self {
        Self {
            min: opts.min,
            max: opts.max,
            factor: opts.factor,
            jitter: opts.jitter,
            attempt: 0,
            rng: fastrand::Rng::new(),
        }
    }

    /// Number of waits handed out so far.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Returns the wait for the current attempt and advances the counter.
    ///
    /// The result always lies in `[min, max]`. Without jitter it equals
    /// `min(max, min * factor^attempt)`; with jitter it is drawn uniformly
    /// between `min` and that bound.
    pub fn next_wait(&mut self) -> Duration {
        let bound = self.bound(self.attempt);
        self.attempt = self.attempt.saturating_add(1);

        if !self.jitter || bound <= self.min {
            return bound;
        }
        let spread = bound - self.min;
        self.min + spread.mul_f64(self.rng.f64())
    }

    fn bound(&self, attempt: u32) -> Duration {
        if self.min >= self.max {
            return self.max;
        }
        let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
        let min_secs = self.min.as_secs_f64();
        let grown = min_secs * self.factor.powi(exp);

        if !grown.is_finite() || grown >= self.max.as_secs_f64() {
            self.max
        } else if grown <= min_secs {
            self.min
        } else {
            Duration::from_secs_f64(grown)
        }
    }
}
