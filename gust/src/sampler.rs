mod task_atomics;
mod timer;

pub(crate) use task_atomics::{ProvisionalData, TaskAtomics};

use crate::measurement::Measurement;
use gust_core::ScenarioConfig;
use std::time::Duration;
use timer::Timer;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Periodically drains the shared counters into per-interval samples while accumulating the
/// measurement for the whole run.
pub(crate) struct Sampler {
    timer: Timer,
    task_atomics: TaskAtomics,
    total: Measurement,
}

impl Sampler {
    pub fn new(config: &ScenarioConfig) -> Self {
        let timer = Timer::new(config.report_interval);
        debug!("Sampling every {timer}");
        Self {
            timer,
            task_atomics: TaskAtomics::new(config.rps),
            total: Measurement::default(),
        }
    }

    pub fn task_atomics(&self) -> &TaskAtomics {
        &self.task_atomics
    }

    /// Wait until the next sample is due. Cancel safe.
    pub async fn tick(&mut self) -> Duration {
        self.timer.tick().await
    }

    pub fn sample(&mut self, elapsed: Duration) -> Measurement {
        let data = self.task_atomics.collect();
        self.accumulate(&data);

        let mut measurement = Measurement::new(data.success, data.error, elapsed);
        measurement.populate_latencies(&data.latency);
        measurement
    }

    /// Fold in anything recorded since the last sample and return the measurement for the whole
    /// run.
    pub fn finish(mut self, elapsed: Duration) -> Measurement {
        let data = self.task_atomics.collect();
        self.accumulate(&data);
        self.total.elapsed = elapsed;
        self.total
    }

    fn accumulate(&mut self, data: &ProvisionalData) {
        self.total.add_counts(data.success, data.error);
        self.total.populate_latencies(&data.latency);
    }
}
