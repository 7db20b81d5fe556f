use std::num::{NonZeroU64, NonZeroUsize};
use std::time::Duration;

/// Number of VUs used when nothing else is configured.
pub const DEFAULT_VUS: NonZeroUsize = NonZeroUsize::MIN;

/// Iteration budget used when a scenario has neither a duration nor an iteration count.
pub const DEFAULT_ITERATIONS: NonZeroU64 = NonZeroU64::MIN;

/// How long in-flight iterations may keep running once a scenario has ended.
pub const DEFAULT_GRACEFUL_STOP: Duration = Duration::from_secs(30);

/// Interval between progress samples.
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(10);
