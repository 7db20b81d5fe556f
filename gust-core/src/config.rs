use crate::{
    ConfigError, DEFAULT_GRACEFUL_STOP, DEFAULT_ITERATIONS, DEFAULT_REPORT_INTERVAL, DEFAULT_VUS,
};
use std::num::{NonZeroU32, NonZeroU64, NonZeroUsize};
use std::time::{Duration, Instant};

#[doc(hidden)]
#[derive(Clone, Debug)]
pub struct ScenarioConfig {
    pub name: String,
    pub vus: NonZeroUsize,
    pub duration: Option<Duration>,
    pub iterations: Option<NonZeroU64>,
    pub rps: Option<NonZeroU32>,
    pub graceful_stop: Duration,
    pub report_interval: Duration,
}

impl ScenarioConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            vus: DEFAULT_VUS,
            duration: None,
            iterations: None,
            rps: None,
            graceful_stop: DEFAULT_GRACEFUL_STOP,
            report_interval: DEFAULT_REPORT_INTERVAL,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration.is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::ZeroDuration);
        }

        if self.report_interval.is_zero() {
            return Err(ConfigError::ZeroReportInterval);
        }

        // Both end up as offsets from the start of the run.
        let now = Instant::now();
        let end = self.duration.unwrap_or_default();
        if now.checked_add(end).is_none() {
            return Err(ConfigError::DurationTooLong {
                name: "duration",
                duration: end,
            });
        }
        if now
            .checked_add(end)
            .and_then(|end| end.checked_add(self.graceful_stop))
            .is_none()
        {
            return Err(ConfigError::DurationTooLong {
                name: "graceful stop",
                duration: self.graceful_stop,
            });
        }

        Ok(())
    }

    /// The shared iteration budget for this run.
    ///
    /// A run with neither a duration nor an explicit budget executes a single iteration. A run
    /// with only a duration has no budget.
    pub fn iteration_budget(&self) -> Option<NonZeroU64> {
        match (self.duration, self.iterations) {
            (_, Some(iterations)) => Some(iterations),
            (Some(_), None) => None,
            (None, None) => Some(DEFAULT_ITERATIONS),
        }
    }
}

/// Parse a human readable duration such as `3000s`, `50m` or `1h 30m`.
pub fn parse_duration(input: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(input.trim()).map_err(|source| ConfigError::InvalidDuration {
        input: input.to_string(),
        source,
    })
}
