//! Shutdown coordination.

use std::sync::atomic::Ordering;
use std::time::Duration;

use super::MediaDownloader;

/// Poll interval while waiting for in-flight jobs
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

impl MediaDownloader {
    /// Gracefully shut down the job runner
    ///
    /// This method performs a graceful shutdown sequence:
    /// 1. Stops accepting new jobs (submissions fail with `ShuttingDown`)
    /// 2. Waits for queued and running jobs to finish, up to
    ///    `server.api.shutdown_timeout_secs`
    ///
    /// Running jobs are never cancelled; on timeout they are abandoned when
    /// the runtime stops. Returns whether every job finished in time.
    pub async fn shutdown(&self) -> bool {
        tracing::info!("Initiating graceful shutdown");

        // 1. Stop accepting new jobs
        self.queue_state.accepting_new.store(false, Ordering::SeqCst);
        tracing::info!("Stopped accepting new jobs");

        // 2. Wait for in-flight jobs with timeout
        let timeout = Duration::from_secs(self.config.server.api.shutdown_timeout_secs);
        match tokio::time::timeout(timeout, self.wait_for_in_flight_jobs()).await {
            Ok(()) => {
                tracing::info!("All jobs completed gracefully");
                true
            }
            Err(_) => {
                let stats = self.queue_stats().await;
                tracing::warn!(
                    queued = stats.queued,
                    active = stats.active,
                    "Timeout waiting for jobs to complete, proceeding with shutdown"
                );
                false
            }
        }
    }

    /// Whether new submissions are accepted
    pub fn is_accepting(&self) -> bool {
        self.queue_state.accepting_new.load(Ordering::SeqCst)
    }

    async fn wait_for_in_flight_jobs(&self) {
        loop {
            let queued = self.queue_state.queued.load(Ordering::SeqCst);
            let active = self.queue_state.active.load(Ordering::SeqCst);
            if queued == 0 && active == 0 {
                return;
            }

            tracing::debug!(queued, active, "Waiting for jobs to complete");
            tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
        }
    }
}
