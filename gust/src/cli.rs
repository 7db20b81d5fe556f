//! Command line and environment overrides for a scenario.
use crate::GustError;
use clap::Parser;
use gust_core::{parse_duration, Options};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default gust command line arguments, used by [`ConfigurableScenario::with_args`].
///
/// Every flag can also be given through its environment variable. Values given here take
/// precedence over the `--config` file, which takes precedence over options set in code.
///
/// [`ConfigurableScenario::with_args`]: crate::scenario::ConfigurableScenario::with_args
#[derive(Parser, Debug, Default, Clone)]
#[command(about = "Run a gust load test scenario")]
pub struct GustCli {
    /// Number of concurrent virtual users
    #[arg(short = 'u', long, env = "GUST_VUS")]
    pub vus: Option<usize>,

    /// How long to run for, e.g. `3000s`, `50m` or `1h 30m`
    #[arg(short, long, env = "GUST_DURATION", value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Total number of iterations, shared between all VUs
    #[arg(short, long, env = "GUST_ITERATIONS")]
    pub iterations: Option<u64>,

    /// Maximum number of transactions per second across all VUs
    #[arg(long, env = "GUST_RPS")]
    pub rps: Option<u32>,

    /// How long in-flight iterations may run once the duration has elapsed
    #[arg(long, env = "GUST_GRACEFUL_STOP", value_parser = parse_duration)]
    pub graceful_stop: Option<Duration>,

    /// JSON file with run options, e.g. `{ "vus": 10, "duration": "3000s" }`
    #[arg(short, long, env = "GUST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write the end-of-run statistics to this file as JSON
    #[arg(long, env = "GUST_SUMMARY_EXPORT")]
    pub summary_export: Option<PathBuf>,
}

impl GustCli {
    /// The options given directly as flags.
    pub fn flag_options(&self) -> Options {
        Options {
            vus: self.vus,
            duration: self.duration,
            iterations: self.iterations,
            rps: self.rps,
            graceful_stop: self.graceful_stop,
        }
    }

    /// The options from the config file (if any) with the flags laid on top.
    pub fn options(&self) -> Result<Options, GustError> {
        let file_options = match &self.config {
            Some(path) => read_options(path)?,
            None => Options::default(),
        };

        Ok(file_options.merge(self.flag_options()))
    }
}

pub fn read_options(path: &Path) -> Result<Options, GustError> {
    let json = std::fs::read_to_string(path).map_err(|source| GustError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Options::from_json_str(&json)?)
}
