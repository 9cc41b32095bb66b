//! Job admission and queue statistics.

use std::sync::atomic::Ordering;

use tokio::sync::mpsc::error::TrySendError;

use crate::error::{Error, Result};
use crate::janitor;
use crate::types::{JobRequest, MediaFormat, QueueStats, TaskId};

use super::{MediaDownloader, QueuedJob};

impl MediaDownloader {
    /// Accept a new job and return its task id immediately
    ///
    /// The task is registered in `starting` state with its own working
    /// directory, then handed to the admission queue. The quality label is not
    /// interpreted here; an unusable label fails the job once a worker picks it
    /// up.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if `url` is empty
    /// - [`Error::ShuttingDown`] after [`MediaDownloader::shutdown`]
    /// - [`Error::QueueFull`] when `queue_capacity` jobs are already waiting;
    ///   the just-created task is discarded
    pub async fn submit(
        &self,
        url: impl Into<String>,
        format: MediaFormat,
        quality: impl Into<String>,
    ) -> Result<TaskId> {
        if !self.queue_state.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let url = url.into().trim().to_string();
        if url.is_empty() {
            return Err(Error::Validation("URL is required".to_string()));
        }

        let request = JobRequest {
            url,
            format,
            quality: quality.into(),
        };

        let work_dir = janitor::create_work_dir(&self.config.download.work_root).await?;
        let work_path = work_dir.path().to_path_buf();
        let id = self.registry.create_with_work_dir(work_dir).await;

        self.queue_state.queued.fetch_add(1, Ordering::SeqCst);
        let job = QueuedJob {
            id,
            request,
            work_dir: work_path,
        };

        match self.queue_state.job_tx.try_send(job) {
            Ok(()) => {
                tracing::info!(task_id = %id, "Job accepted");
                Ok(id)
            }
            Err(TrySendError::Full(job)) => {
                self.reject(job).await;
                let capacity = self.config.download.queue_capacity;
                tracing::warn!(capacity, "Admission queue full, rejecting job");
                Err(Error::QueueFull { capacity })
            }
            Err(TrySendError::Closed(job)) => {
                self.reject(job).await;
                Err(Error::ShuttingDown)
            }
        }
    }

    /// Roll back a job that never made it into the queue
    async fn reject(&self, job: QueuedJob) {
        self.queue_state.queued.fetch_sub(1, Ordering::SeqCst);
        // Removing the record drops its TempDir, which removes the work dir
        self.registry.remove(job.id).await;
    }

    /// Snapshot of admission queue and worker pool occupancy
    pub async fn queue_stats(&self) -> QueueStats {
        QueueStats {
            queued: self.queue_state.queued.load(Ordering::SeqCst),
            active: self.queue_state.active.load(Ordering::SeqCst),
            tracked: self.registry.len().await,
        }
    }
}
