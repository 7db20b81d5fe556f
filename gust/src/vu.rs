//! Virtual users
//!
//! Every VU is an independent task that runs the scenario function in a loop. Before each
//! iteration the VU checks the run's deadline and claims an iteration from the shared budget; it
//! stops as soon as either says no. VUs share nothing but the engine's counters.
use crate::sampler::TaskAtomics;
use crate::transaction::TRANSACTION_HOOK;
use futures_util::FutureExt;
use gust_core::ScenarioConfig;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::Instant;
#[allow(unused)]
use tracing::{debug, debug_span, error, info, trace, warn, Instrument};

#[derive(Clone, Copy, Debug)]
struct VuState {
    id: usize,
    iteration: u64,
}

tokio::task_local! {
    static VU_STATE: VuState;
}

/// The 1-based number of the VU running the current iteration, or `None` outside a scenario.
pub fn id() -> Option<usize> {
    VU_STATE.try_with(|vu| vu.id).ok()
}

/// The 0-based count of iterations the current VU has started before this one, or `None`
/// outside a scenario.
pub fn iteration() -> Option<u64> {
    VU_STATE.try_with(|vu| vu.iteration).ok()
}

/// Decides whether a VU may start another iteration.
#[derive(Clone, Debug)]
pub(crate) struct Schedule {
    deadline: Option<Instant>,
    remaining: Option<Arc<AtomicU64>>,
}

impl Schedule {
    pub fn new(config: &ScenarioConfig, deadline: Option<Instant>) -> Self {
        Self {
            deadline,
            remaining: config
                .iteration_budget()
                .map(|budget| Arc::new(AtomicU64::new(budget.get()))),
        }
    }

    pub fn next_iteration(&self) -> bool {
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return false;
        }

        match &self.remaining {
            None => true,
            Some(remaining) => remaining
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
                .is_ok(),
        }
    }
}

#[derive(Debug, Default)]
struct IterationCounters {
    completed: AtomicU64,
    interrupted: AtomicU64,
}

/// The running VUs of a scenario.
pub(crate) struct VuPool {
    tasks: JoinSet<()>,
    counters: Arc<IterationCounters>,
}

impl VuPool {
    pub fn spawn<T, F>(
        scenario: T,
        config: &ScenarioConfig,
        schedule: Schedule,
        task_atomics: &TaskAtomics,
    ) -> Self
    where
        T: Fn() -> F + Send + Sync + 'static + Clone,
        F: Future<Output = ()> + Send + 'static,
    {
        let counters = Arc::new(IterationCounters::default());
        let mut tasks = JoinSet::new();

        for id in 1..=config.vus.get() {
            let scenario = scenario.clone();
            let schedule = schedule.clone();
            let counters = counters.clone();

            tasks.spawn(TRANSACTION_HOOK.scope(
                task_atomics.clone_to_transaction_data(),
                run_vu(id, scenario, schedule, counters).instrument(debug_span!("vu", id)),
            ));
        }

        #[cfg(feature = "metrics")]
        metrics::gauge!("gust_vus").set(config.vus.get() as f64);

        Self { tasks, counters }
    }

    /// Wait for the next VU to stop. Returns `false` once no VUs are left. Cancel safe.
    pub async fn join_next(&mut self) -> bool {
        match self.tasks.join_next().await {
            None => false,
            Some(Ok(())) => true,
            Some(Err(err)) if err.is_cancelled() => true,
            Some(Err(err)) => {
                error!("VU task failed: {err}");
                true
            }
        }
    }

    /// Abort every VU still running, counting their in-flight iterations as interrupted.
    ///
    /// VUs that finished before the abort but were not joined yet are not counted.
    pub async fn abort_all(&mut self) -> u64 {
        self.tasks.abort_all();

        let mut interrupted = 0;
        while let Some(res) = self.tasks.join_next().await {
            match res {
                Err(err) if err.is_cancelled() => interrupted += 1,
                Err(err) => error!("VU task failed: {err}"),
                Ok(()) => {}
            }
        }

        self.counters
            .interrupted
            .fetch_add(interrupted, Ordering::Relaxed);
        interrupted
    }

    pub fn active(&self) -> usize {
        self.tasks.len()
    }

    pub fn completed(&self) -> u64 {
        self.counters.completed.load(Ordering::Relaxed)
    }

    pub fn interrupted(&self) -> u64 {
        self.counters.interrupted.load(Ordering::Relaxed)
    }
}

impl Drop for VuPool {
    fn drop(&mut self) {
        #[cfg(feature = "metrics")]
        metrics::gauge!("gust_vus").set(0.);
    }
}

async fn run_vu<T, F>(id: usize, scenario: T, schedule: Schedule, counters: Arc<IterationCounters>)
where
    T: Fn() -> F,
    F: Future<Output = ()>,
{
    let mut iteration = 0;
    while schedule.next_iteration() {
        let state = VuState { id, iteration };
        let res = AssertUnwindSafe(VU_STATE.scope(state, scenario()))
            .catch_unwind()
            .await;

        match res {
            Ok(()) => {
                counters.completed.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "metrics")]
                metrics::counter!("gust_iterations").increment(1);
            }
            Err(_) => {
                error!("Iteration {iteration} of VU {id} panicked.");
                counters.interrupted.fetch_add(1, Ordering::Relaxed);
            }
        }

        iteration += 1;
    }

    trace!("VU {id} stopping after {iteration} iterations.");
}
