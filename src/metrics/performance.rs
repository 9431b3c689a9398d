//! Monotonic millisecond clock used for generation timing.

use std::time::Duration;
use tokio::time::Instant;

/// Millisecond clock anchored at session creation.
///
/// Backed by `tokio::time::Instant`, so paused-time tests advance it
/// deterministically.
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    epoch: Instant,
}

impl SessionClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// Milliseconds elapsed since the clock was created.
    pub fn now_ms(&self) -> i64 {
        i64::try_from(self.elapsed().as_millis()).unwrap_or(i64::MAX)
    }

    /// Milliseconds from the clock's creation to `instant`, zero if earlier.
    pub fn ms_at(&self, instant: Instant) -> i64 {
        let since = instant.saturating_duration_since(self.epoch);
        i64::try_from(since.as_millis()).unwrap_or(i64::MAX)
    }

    pub fn elapsed(&self) -> Duration {
        self.epoch.elapsed()
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_clock_follows_paused_time() {
        let clock = SessionClock::new();
        assert_eq!(clock.now_ms(), 0);

        tokio::time::advance(Duration::from_millis(250)).await;
        assert_eq!(clock.now_ms(), 250);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ms_at_measures_from_epoch() {
        let before = Instant::now();
        tokio::time::advance(Duration::from_millis(5)).await;
        let clock = SessionClock::new();

        tokio::time::advance(Duration::from_millis(40)).await;
        let stamped = Instant::now();
        tokio::time::advance(Duration::from_millis(60)).await;

        assert_eq!(clock.ms_at(stamped), 40);
        assert_eq!(clock.ms_at(before), 0);
        assert_eq!(clock.now_ms(), 100);
    }
}
