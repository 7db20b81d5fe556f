//! Scenario logic
use crate::sampler::Sampler;
use crate::vu::{Schedule, VuPool};
use crate::GustError;
use gust_core::{Options, RunStatistics, ScenarioConfig};
use std::{
    future::Future,
    path::{Path, PathBuf},
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};
use tokio::time::Instant;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

#[cfg(feature = "cli")]
use crate::cli::GustCli;

/// Load test scenario structure
///
/// Handler for running scenarios. Not intended for manual creation, use the
/// [`#[scenario]`](gust_macros::scenario) macro which will add these methods to functions.
#[pin_project::pin_project]
pub struct Scenario<T> {
    func: T,
    runner_fut: Option<Pin<Box<dyn Future<Output = RunStatistics> + Send>>>,
    config: ScenarioConfig,
    summary_export: Option<PathBuf>,
    invalid: Option<GustError>,
}

impl<T> Scenario<T> {
    #[doc(hidden)]
    pub fn new(name: &str, func: T) -> Self {
        Self {
            func,
            runner_fut: None,
            config: ScenarioConfig::new(name),
            summary_export: None,
            invalid: None,
        }
    }

    fn apply(mut self, options: &Options) -> Self {
        if let Err(err) = options.apply(&mut self.config) {
            self.invalid.get_or_insert(err.into());
        }
        self
    }
}

impl<T, F> Future for Scenario<T>
where
    T: Fn() -> F + Send + Sync + 'static + Clone,
    F: Future<Output = ()> + Send + 'static,
{
    type Output = RunStatistics;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        if this.runner_fut.is_none() {
            let func = this.func.clone();
            let config = this.config.clone();
            let summary_export = this.summary_export.take();
            let invalid = this.invalid.take();

            *this.runner_fut = Some(Box::pin(async move {
                if let Some(err) = invalid.or_else(|| config.validate().err().map(Into::into)) {
                    error!("Not running scenario {}: {err}", config.name);
                    return RunStatistics::default();
                }

                let stats = run_scenario(func, config).await;

                if let Some(path) = summary_export {
                    if let Err(err) = export_summary(&stats, &path) {
                        error!("{err}");
                    }
                }

                stats
            }));
        }

        if let Some(runner) = this.runner_fut {
            runner.as_mut().poll(cx)
        } else {
            unreachable!()
        }
    }
}

pub trait ConfigurableScenario<T: Send>: Future<Output = T> + Sized + Send {
    fn vus(self, vus: usize) -> Self;
    fn duration(self, duration: Duration) -> Self;
    fn iterations(self, iterations: u64) -> Self;
    fn rps(self, rps: u32) -> Self;
    fn graceful_stop(self, graceful_stop: Duration) -> Self;
    fn report_interval(self, report_interval: Duration) -> Self;
    fn options(self, options: Options) -> Self;
    fn summary_export(self, path: impl Into<PathBuf>) -> Self;
    #[cfg(feature = "cli")]
    #[cfg_attr(docsrs, doc(cfg(feature = "cli")))]
    fn with_args(self) -> Self;
    #[cfg(feature = "cli")]
    #[cfg_attr(docsrs, doc(cfg(feature = "cli")))]
    fn with_cli(self, cli: GustCli) -> Self;
}

impl<T, F> ConfigurableScenario<RunStatistics> for Scenario<T>
where
    T: Fn() -> F + Send + Sync + 'static + Clone,
    F: Future<Output = ()> + Send + 'static,
{
    /// Run the scenario with the given number of concurrent virtual users.
    ///
    /// # Example
    /// ```no_run
    /// use gust::prelude::*;
    /// use std::time::Duration;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     my_scenario()
    ///         .vus(10)
    ///         .duration(Duration::from_secs(3000))
    ///         .await;
    /// }
    ///
    /// #[scenario]
    /// async fn my_scenario() {
    /// }
    /// ```
    fn vus(self, vus: usize) -> Self {
        self.apply(&Options {
            vus: Some(vus),
            ..Default::default()
        })
    }

    /// Run the scenario for the given duration. No iteration starts once it has elapsed.
    fn duration(self, duration: Duration) -> Self {
        self.apply(&Options {
            duration: Some(duration),
            ..Default::default()
        })
    }

    /// Run a fixed number of iterations, shared between all VUs.
    ///
    /// Combined with `.duration()`, the run ends at whichever limit is reached first.
    fn iterations(self, iterations: u64) -> Self {
        self.apply(&Options {
            iterations: Some(iterations),
            ..Default::default()
        })
    }

    /// Limit the number of transactions per second across all VUs.
    fn rps(self, rps: u32) -> Self {
        self.apply(&Options {
            rps: Some(rps),
            ..Default::default()
        })
    }

    /// How long iterations still running at the end of the duration may take to finish before
    /// they are interrupted. Defaults to 30 seconds.
    fn graceful_stop(self, graceful_stop: Duration) -> Self {
        self.apply(&Options {
            graceful_stop: Some(graceful_stop),
            ..Default::default()
        })
    }

    /// How often a progress line is logged. Defaults to 10 seconds.
    fn report_interval(mut self, report_interval: Duration) -> Self {
        self.config.report_interval = report_interval;
        self
    }

    /// Apply a set of [`Options`], e.g. the options block of a load script.
    ///
    /// # Example
    /// ```no_run
    /// use gust::prelude::*;
    /// use std::time::Duration;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let options = Options {
    ///         vus: Some(10),
    ///         duration: Some(Duration::from_secs(3000)),
    ///         ..Default::default()
    ///     };
    ///
    ///     my_scenario().options(options).await;
    /// }
    ///
    /// #[scenario]
    /// async fn my_scenario() {
    /// }
    /// ```
    fn options(self, options: Options) -> Self {
        self.apply(&options)
    }

    /// Write the final [`RunStatistics`] to `path` as JSON once the run completes.
    fn summary_export(mut self, path: impl Into<PathBuf>) -> Self {
        self.summary_export = Some(path.into());
        self
    }

    /// Apply the default gust command line arguments and environment variables (see
    /// [`GustCli`]). Call this last so that the command line overrides options set in code.
    ///
    /// # Example
    /// ```ignore
    /// $ ./my_load_test --vus 2 --duration 30s
    /// $ GUST_DURATION=5m ./my_load_test --config options.json
    /// ```
    #[cfg(feature = "cli")]
    fn with_args(self) -> Self {
        use clap::Parser;
        self.with_cli(GustCli::parse())
    }

    /// Apply already parsed command line arguments.
    #[cfg(feature = "cli")]
    fn with_cli(mut self, cli: GustCli) -> Self {
        match cli.options() {
            Ok(options) => self = self.apply(&options),
            Err(err) => {
                self.invalid.get_or_insert(err);
            }
        }

        if let Some(path) = cli.summary_export {
            self.summary_export = Some(path);
        }

        self
    }
}

#[instrument(name="scenario", skip_all, fields(name = %config.name))]
pub(crate) async fn run_scenario<T, F>(scenario: T, config: ScenarioConfig) -> RunStatistics
where
    T: Fn() -> F + Send + Sync + 'static + Clone,
    F: Future<Output = ()> + Send + 'static,
{
    info!("Running {} with config {:?}", config.name, &config);

    let start = Instant::now();
    let deadline = config
        .duration
        .and_then(|duration| start.checked_add(duration));

    let mut sampler = Sampler::new(&config);
    let schedule = Schedule::new(&config, deadline);
    let mut vus = VuPool::spawn(scenario, &config, schedule, sampler.task_atomics());

    let mut draining = false;
    let mut stop_deadline: Option<Instant> = None;
    loop {
        tokio::select! {
            elapsed = sampler.tick() => {
                let measurement = sampler.sample(elapsed);
                info!(
                    "[{}] VUs={}, Iterations={}, {measurement}",
                    format_elapsed(start.elapsed()),
                    vus.active(),
                    vus.completed(),
                );
            }
            more = vus.join_next() => {
                if !more {
                    break;
                }
            }
            _ = sleep_until(deadline), if !draining => {
                let graceful = config.graceful_stop;
                let active = vus.active();
                if active > 0 {
                    info!(
                        "Duration reached. Waiting up to {} for {active} VUs to finish their iteration.",
                        humantime::format_duration(graceful),
                    );
                }
                draining = true;
                stop_deadline = Instant::now().checked_add(graceful);
            }
            _ = sleep_until(stop_deadline), if draining => {
                let interrupted = vus.abort_all().await;
                warn!("Graceful stop elapsed. Interrupted {interrupted} iterations.");
                break;
            }
        }
    }

    let measurement = sampler.finish(start.elapsed());
    let stats = measurement.into_statistics(config.vus.get(), vus.completed(), vus.interrupted());

    info!("Scenario complete");
    debug!("Final measurement: {stats:?}");

    stats
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn format_elapsed(elapsed: Duration) -> humantime::FormattedDuration {
    humantime::format_duration(Duration::from_secs(elapsed.as_secs()))
}

fn export_summary(stats: &RunStatistics, path: &Path) -> Result<(), GustError> {
    let json = serde_json::to_string_pretty(stats)?;
    std::fs::write(path, json).map_err(|source| GustError::WriteSummary {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Summary written to {}", path.display());
    Ok(())
}
