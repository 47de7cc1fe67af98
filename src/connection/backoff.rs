//! Reconnection backoff timing

use tokio::time::Duration;

/// Exponential reconnection backoff
///
/// The delay doubles per iteration and is clamped at `max_iterations`. The
/// iteration counter itself keeps counting past the maximum so observers can
/// report how many attempts were made; only a successful open or an explicit
/// re-initialization resets it.
#[derive(Debug)]
pub struct ReconnectBackoff {
    iteration: u32,
    max_iterations: u32,
}

impl ReconnectBackoff {
    /// Create a backoff starting at iteration 0
    pub fn new(max_iterations: u32) -> Self {
        Self {
            iteration: 0,
            max_iterations,
        }
    }

    /// Current reconnection iteration
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Delay before the next attempt: 2^min(iteration, max) seconds
    pub fn delay(&self) -> Duration {
        let exp = self.iteration.min(self.max_iterations);
        Duration::from_secs(2u64.saturating_pow(exp))
    }

    /// Whether scheduled retries are used up
    pub fn exhausted(&self) -> bool {
        self.iteration > self.max_iterations
    }

    /// Count a fired retry
    pub fn advance(&mut self) {
        self.iteration = self.iteration.saturating_add(1);
    }

    /// Start over after a successful open or a re-initialization
    pub fn reset(&mut self) {
        self.iteration = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_per_iteration() {
        let mut backoff = ReconnectBackoff::new(4);

        assert_eq!(backoff.delay(), Duration::from_secs(1));
        backoff.advance();
        assert_eq!(backoff.delay(), Duration::from_secs(2));
        backoff.advance();
        assert_eq!(backoff.delay(), Duration::from_secs(4));
        backoff.advance();
        assert_eq!(backoff.delay(), Duration::from_secs(8));
        backoff.advance();
        assert_eq!(backoff.delay(), Duration::from_secs(16));
    }

    #[test]
    fn test_delay_is_clamped_beyond_max() {
        let mut backoff = ReconnectBackoff::new(2);
        for _ in 0..10 {
            backoff.advance();
        }

        // Iteration keeps counting, the delay does not
        assert_eq!(backoff.iteration(), 10);
        assert_eq!(backoff.delay(), Duration::from_secs(4));
    }

    #[test]
    fn test_exhaustion_boundary() {
        let mut backoff = ReconnectBackoff::new(1);
        assert!(!backoff.exhausted());

        backoff.advance();
        assert!(!backoff.exhausted());

        backoff.advance();
        assert!(backoff.exhausted());
    }

    #[test]
    fn test_reset() {
        let mut backoff = ReconnectBackoff::new(4);
        backoff.advance();
        backoff.advance();
        assert_eq!(backoff.iteration(), 2);

        backoff.reset();
        assert_eq!(backoff.iteration(), 0);
        assert_eq!(backoff.delay(), Duration::from_secs(1));
        assert!(!backoff.exhausted());
    }
}
