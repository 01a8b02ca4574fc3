//! Workload driver: builds every worker (setup phase), then starts them on a
//! linear ramp and lets them iterate until the steady state phase is over.

use futures::future::join_all;
use tokio::time::{sleep_until, Instant};
use tracing::{error, info};

use super::worker::{Worker, WorkerReport};
use crate::state::RunState;

/// Totals of a finished run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub workers: usize,
    pub setup_failures: usize,
    pub iterations: u64,
    pub failures: u64,
}

impl RunSummary {
    /// Failed iterations over all iterations.
    pub fn error_rate(&self) -> f64 {
        if self.iterations == 0 {
            0.0
        } else {
            self.failures as f64 / self.iterations as f64
        }
    }

    fn add(&mut self, report: &WorkerReport) {
        self.iterations += report.iterations;
        self.failures += report.failures;
    }
}

/// Runs `config.workers` workers with ids `1..=workers`.
///
/// A worker whose setup fails is left out of the run; the others proceed.
pub async fn run_workers(state: RunState) -> RunSummary {
    let config = state.config.clone();
    let mut summary = RunSummary {
        workers: config.workers,
        ..Default::default()
    };

    info!(
        workers = config.workers,
        scenario = config.scenario.as_str(),
        "Setting up workers"
    );
    let setups = join_all((1..=config.workers).map(|id| Worker::setup(id, state.clone()))).await;

    let mut ready = Vec::with_capacity(setups.len());
    for (index, setup) in setups.into_iter().enumerate() {
        match setup {
            Ok(worker) => ready.push(worker),
            Err(e) => {
                error!(worker_id = index + 1, error = %e, "Worker setup failed");
                summary.setup_failures += 1;
            }
        }
    }

    let start = Instant::now();
    let ramp_up = config.ramp_up();
    let deadline = start + ramp_up + config.steady_state();
    info!(
        ready = ready.len(),
        ramp_up_secs = ramp_up.as_secs(),
        steady_state_secs = config.steady_state().as_secs(),
        "Starting load"
    );

    let total = config.workers.max(1) as f64;
    let handles = ready
        .into_iter()
        .map(|worker| {
            let offset = ramp_up.mul_f64((worker.id() - 1) as f64 / total);
            tokio::spawn(async move {
                sleep_until(start + offset).await;
                worker.run(deadline).await
            })
        })
        .collect::<Vec<_>>();

    for joined in join_all(handles).await {
        match joined {
            Ok(report) => summary.add(&report),
            Err(e) => error!(error = %e, "Worker task aborted"),
        }
    }

    info!(
        iterations = summary.iterations,
        failures = summary.failures,
        setup_failures = summary.setup_failures,
        error_rate = summary.error_rate(),
        "Load finished"
    );
    summary
}
