//! Queue processor: drains the admission queue onto the bounded worker pool.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::job::{JobContext, run_job};
use super::{MediaDownloader, QueuedJob};

/// Decrements the active-job counter when a worker finishes, however it ends
struct ActiveSlot(Arc<AtomicUsize>);

impl ActiveSlot {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for ActiveSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MediaDownloader {
    /// Start the queue processor task
    ///
    /// This method spawns a background task that continuously:
    /// 1. Waits for the next job in the admission queue (FIFO)
    /// 2. Acquires a permit from the concurrency limiter (respects max_concurrent_jobs)
    /// 3. Spawns a worker for that job
    /// 4. Repeats until every sender is dropped
    ///
    /// The task only holds the shared registry, engine, and config, so it ends
    /// on its own once the last `MediaDownloader` clone is gone.
    pub(crate) fn start_queue_processor(
        &self,
        mut job_rx: tokio::sync::mpsc::Receiver<QueuedJob>,
    ) -> tokio::task::JoinHandle<()> {
        let registry = self.registry.clone();
        let engine = self.engine.clone();
        let config = self.config.clone();
        let concurrent_limit = self.queue_state.concurrent_limit.clone();
        let queued = self.queue_state.queued.clone();
        let active = self.queue_state.active.clone();

        tokio::spawn(async move {
            while let Some(job) = job_rx.recv().await {
                // Acquire a permit from the semaphore (blocks if at max concurrent jobs)
                let permit = match concurrent_limit.clone().acquire_owned().await {
                    Ok(p) => p,
                    Err(_) => {
                        tracing::error!(task_id = %job.id, "worker pool closed, dropping job");
                        queued.fetch_sub(1, Ordering::SeqCst);
                        let _ = registry.fail(job.id, "Service is shutting down").await;
                        break;
                    }
                };

                let slot = ActiveSlot::enter(active.clone());
                queued.fetch_sub(1, Ordering::SeqCst);

                let ctx = JobContext {
                    id: job.id,
                    request: job.request,
                    work_dir: job.work_dir,
                    registry: Arc::clone(&registry),
                    engine: Arc::clone(&engine),
                    config: Arc::clone(&config),
                };

                // Spawn the worker
                tokio::spawn(async move {
                    let _permit = permit;
                    let _slot = slot;
                    run_job(ctx).await;
                });
            }
            tracing::debug!("Queue processor stopped");
        })
    }
}
