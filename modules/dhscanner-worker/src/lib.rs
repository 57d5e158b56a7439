//! The generic worker control loop every stage runs, grounded on
//! `workers/interface.py`'s `AbstractWorker`: claim every job waiting for
//! this stage, process them concurrently, advance the ones that succeeded,
//! sleep one second, repeat forever. A concrete stage supplies only
//! `process()`; this crate owns claim/advance/sleep and the bounded
//! fan-out.

use std::time::Duration;

use async_trait::async_trait;
use dhscanner_coordinator::StatusCoordinator;
use dhscanner_model::{JobId, JobStatus};
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

/// Per-tick pause between one drain of waiting jobs and the next scan.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Upper bound on how many jobs a single tick processes concurrently. A
/// stage with more waiting jobs than this processes them over several
/// ticks rather than spawning unboundedly.
pub const DEFAULT_CONCURRENCY: usize = 16;

#[async_trait]
pub trait Worker: Send + Sync {
    /// Run this stage's work for one job. A per-job failure is the stage's
    /// concern to log; returning `Err` here only prevents *that* job from
    /// advancing — it never stops the loop or the other jobs in the tick.
    async fn process(&self, job_id: &JobId) -> anyhow::Result<()>;

    /// The status this worker claims jobs from.
    fn waiting_status(&self) -> JobStatus;
}

/// Run `worker`'s control loop forever. Intended to be the entire body of
/// a stage binary's `main()`.
pub async fn run_worker_loop(coordinator: StatusCoordinator, worker: impl Worker, concurrency: usize) -> ! {
    loop {
        let waiting = worker.waiting_status();
        let job_ids = coordinator.list_waiting_for(waiting).await;

        if job_ids.is_empty() {
            tokio::time::sleep(TICK_INTERVAL).await;
            continue;
        }

        info!(count = job_ids.len(), status = waiting.as_str(), "worker tick: processing jobs");

        let succeeded: Vec<JobId> = stream::iter(job_ids.into_iter())
            .map(|job_id| {
                let worker = &worker;
                async move {
                    match worker.process(&job_id).await {
                        Ok(()) => Some(job_id),
                        Err(e) => {
                            warn!(job_id = %job_id, error = %e, "stage processing failed for job");
                            None
                        }
                    }
                }
            })
            .buffer_unordered(concurrency)
            .filter_map(|res| async move { res })
            .collect()
            .await;

        if !succeeded.is_empty() {
            coordinator.mark_jobs_finished(&succeeded, waiting).await;
        }

        tokio::time::sleep(TICK_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingWorker {
        calls: Arc<AtomicUsize>,
        waiting: JobStatus,
        fail_every: Option<usize>,
    }

    #[async_trait]
    impl Worker for CountingWorker {
        async fn process(&self, _job_id: &JobId) -> anyhow::Result<()> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(every) = self.fail_every {
                if n % every == 0 {
                    anyhow::bail!("simulated failure");
                }
            }
            Ok(())
        }

        fn waiting_status(&self) -> JobStatus {
            self.waiting
        }
    }

    #[test]
    fn tick_interval_is_one_second() {
        assert_eq!(TICK_INTERVAL, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn worker_process_failure_does_not_panic() {
        let calls = Arc::new(AtomicUsize::new(0));
        let worker = CountingWorker {
            calls: calls.clone(),
            waiting: JobStatus::WaitingForNativeParsing,
            fail_every: Some(1),
        };
        let job_id = JobId::new();
        assert!(worker.process(&job_id).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
