use governor::DefaultDirectRateLimiter;
use metrics_util::AtomicBucket;
use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::time::Instant;

/// Metric names for a single transaction, generated by the `#[transaction]` macro.
#[derive(Copy, Clone, Debug)]
pub struct TransactionLabels {
    pub success: &'static str,
    pub error: &'static str,
    pub latency: &'static str,
}

/// Transaction hook used by the `#[transaction]` macro. Not intended to be used manually.
pub async fn transaction_hook<T, R, E>(labels: TransactionLabels, func: T) -> T::Output
where
    T: Future<Output = Result<R, E>>,
{
    let Ok(hook) = TRANSACTION_HOOK.try_with(|v| v.clone()) else {
        tracing::warn!(
            "Transaction {} called outside of a scenario; it will not be measured.",
            labels.latency.trim_end_matches("_latency")
        );
        return func.await;
    };

    if let Some(limiter) = &hook.limiter {
        limiter.until_ready().await;
    }

    let start = Instant::now();
    let res = func.await;
    let elapsed = start.elapsed();

    hook.latency.push(elapsed);

    #[cfg(feature = "metrics")]
    metrics::histogram!(labels.latency).record(elapsed.as_secs_f64());

    if res.is_ok() {
        hook.success.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        metrics::counter!(labels.success).increment(1);
    } else {
        hook.error.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        metrics::counter!(labels.error).increment(1);
    }

    res
}

#[derive(Clone)]
pub(crate) struct TransactionData {
    pub limiter: Option<Arc<DefaultDirectRateLimiter>>,
    pub success: Arc<AtomicU64>,
    pub error: Arc<AtomicU64>,
    pub latency: Arc<AtomicBucket<Duration>>,
}

tokio::task_local! {
    pub(crate) static TRANSACTION_HOOK: TransactionData;
}
