use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("vus must be greater than zero")]
    ZeroVus,

    #[error("duration must be greater than zero")]
    ZeroDuration,

    #[error("iterations must be greater than zero")]
    ZeroIterations,

    #[error("rps must be greater than zero")]
    ZeroRps,

    #[error("{name} of {duration:?} is too long to schedule")]
    DurationTooLong {
        name: &'static str,
        duration: std::time::Duration,
    },

    #[error("report interval must be greater than zero")]
    ZeroReportInterval,

    #[error("Invalid duration `{input}`: {source}")]
    InvalidDuration {
        input: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error("Invalid options document: {0}")]
    Json(#[from] serde_json::Error),
}
