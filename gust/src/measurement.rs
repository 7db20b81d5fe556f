use gust_core::RunStatistics;
use pdatastructs::tdigest::{TDigest, K1};
use std::fmt;
use std::time::Duration;
use tracing::error;

const TDIGEST_BACKLOG_SIZE: usize = 100;

/// Transaction counts and latencies over some window of a run.
#[derive(Debug, Clone)]
pub(crate) struct Measurement {
    pub success: u64,
    pub error: u64,
    pub elapsed: Duration,
    latency: TDigest<K1>,
    latency_count: u64,
    latency_sum: Duration,
    latency_min: Option<Duration>,
    latency_max: Duration,
}

impl Measurement {
    pub fn new(success: u64, error: u64, elapsed: Duration) -> Self {
        Self {
            success,
            error,
            elapsed,
            latency: default_tdigest(),
            latency_count: 0,
            latency_sum: Duration::ZERO,
            latency_min: None,
            latency_max: Duration::ZERO,
        }
    }

    pub fn add_counts(&mut self, success: u64, error: u64) {
        self.success += success;
        self.error += error;
    }

    pub fn populate_latencies(&mut self, dur: &[Duration]) {
        for latency in dur {
            self.latency.insert(latency.as_secs_f64());
            self.latency_count += 1;
            self.latency_sum += *latency;
            self.latency_min = Some(self.latency_min.map_or(*latency, |min| min.min(*latency)));
            self.latency_max = self.latency_max.max(*latency);
        }
    }

    pub fn total(&self) -> u64 {
        self.success + self.error
    }

    pub fn tps(&self) -> f64 {
        if self.elapsed.is_zero() {
            return 0.;
        }
        self.total() as f64 / self.elapsed.as_secs_f64()
    }

    pub fn error_rate(&self) -> f64 {
        if self.total() == 0 {
            return 0.;
        }
        self.error as f64 / self.total() as f64
    }

    pub fn latency(&self, quantile: f64) -> Duration {
        if self.latency_count == 0 {
            return Duration::ZERO;
        }

        let secs = self.latency.quantile(quantile);

        // TDigest can still hand back NaN for sparse data.
        let secs = if secs.is_finite() {
            secs.max(0.)
        } else {
            error!("NaN latency calculation for quantile {quantile}.");
            0.
        };

        Duration::from_secs_f64(secs)
    }

    pub fn mean_latency(&self) -> Duration {
        match u32::try_from(self.latency_count) {
            Ok(0) => Duration::ZERO,
            Ok(count) => self.latency_sum / count,
            Err(_) => Duration::from_secs_f64(
                self.latency_sum.as_secs_f64() / self.latency_count as f64,
            ),
        }
    }

    pub fn into_statistics(self, vus: usize, iterations: u64, interrupted: u64) -> RunStatistics {
        RunStatistics {
            vus,
            iterations,
            interrupted_iterations: interrupted,
            success_count: self.success,
            error_count: self.error,
            error_rate: self.error_rate(),
            tps: self.tps(),
            latency_avg: self.mean_latency(),
            latency_min: self.latency_min.unwrap_or_default(),
            latency_max: self.latency_max,
            latency_p50: self.latency(0.5),
            latency_p90: self.latency(0.9),
            latency_p95: self.latency(0.95),
            latency_p99: self.latency(0.99),
            elapsed: self.elapsed,
        }
    }
}

impl Default for Measurement {
    fn default() -> Self {
        Self::new(0, 0, Duration::ZERO)
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TPS={:.2}, Errors={:.1}%, avg={:?}, p95={:?}",
            self.tps(),
            self.error_rate() * 100.,
            self.mean_latency(),
            self.latency(0.95),
        )
    }
}

fn default_tdigest() -> TDigest<K1> {
    TDigest::new(K1::new(10.), TDIGEST_BACKLOG_SIZE)
}
