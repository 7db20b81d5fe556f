use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Fires once per report interval, starting one interval after creation.
pub(crate) struct Timer {
    interval: Interval,
    previous: Instant,
    period: Duration,
}

impl Timer {
    pub fn new(period: Duration) -> Self {
        let now = Instant::now();
        let mut interval = interval_at(now + period, period);
        // A slow sample skips ticks rather than bursting to catch up; `tick` still reports the
        // full span since the previous one.
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            interval,
            previous: now,
            period,
        }
    }

    /// Wait for the next tick, returning the time covered since the previous one. Cancel safe.
    pub async fn tick(&mut self) -> Duration {
        let now = self.interval.tick().await;
        let covered = now.saturating_duration_since(self.previous);
        self.previous = now;
        covered
    }
}

impl std::fmt::Display for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", humantime::format_duration(self.period))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_tick_after_one_period() {
        let mut timer = Timer::new(Duration::from_secs(10));
        assert_eq!(timer.to_string(), "10s");

        let start = Instant::now();
        assert_eq!(timer.tick().await, Duration::from_secs(10));
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn skipped_ticks_are_covered() {
        let mut timer = Timer::new(Duration::from_secs(1));
        tokio::time::sleep(Duration::from_millis(3500)).await;

        let first = timer.tick().await;
        assert_eq!(first, Duration::from_secs(1));

        let second = timer.tick().await;
        assert_eq!(second, Duration::from_secs(3));
    }
}
