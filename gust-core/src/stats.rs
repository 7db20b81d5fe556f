use serde::Serialize;
use serde_with::{serde_as, DurationSecondsWithFrac};
use std::fmt;
use std::time::Duration;

/// Statistics for a completed Scenario run
///
/// Returned when a scenario future resolves, and printed as the end-of-run summary.
#[serde_as]
#[derive(Clone, Debug, Default, Serialize)]
pub struct RunStatistics {
    pub vus: usize,
    pub iterations: u64,
    pub interrupted_iterations: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub error_rate: f64,
    /// Transactions per second over the whole run.
    pub tps: f64,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub latency_avg: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub latency_min: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub latency_max: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub latency_p50: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub latency_p90: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub latency_p95: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub latency_p99: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub elapsed: Duration,
}

impl RunStatistics {
    pub fn transactions(&self) -> u64 {
        self.success_count + self.error_count
    }
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "vus............: {}", self.vus)?;
        writeln!(
            f,
            "iterations.....: {} ({} interrupted)",
            self.iterations, self.interrupted_iterations
        )?;
        writeln!(
            f,
            "transactions...: {} ok, {} failed ({:.2}% errors)",
            self.success_count,
            self.error_count,
            self.error_rate * 100.
        )?;
        writeln!(f, "throughput.....: {:.2}/s", self.tps)?;
        writeln!(
            f,
            "latency........: avg={:?} min={:?} max={:?} p50={:?} p90={:?} p95={:?} p99={:?}",
            self.latency_avg,
            self.latency_min,
            self.latency_max,
            self.latency_p50,
            self.latency_p90,
            self.latency_p95,
            self.latency_p99,
        )?;
        write!(
            f,
            "elapsed........: {}",
            humantime::format_duration(truncate_to_millis(self.elapsed))
        )
    }
}

fn truncate_to_millis(dur: Duration) -> Duration {
    Duration::from_millis(dur.as_millis() as u64)
}
