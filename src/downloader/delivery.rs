//! Status queries and one-shot artifact retrieval.

use crate::error::Result;
use crate::janitor::{self, DeliveryCopy};
use crate::types::{TaskId, TaskInfo};

use super::MediaDownloader;

impl MediaDownloader {
    /// Current state of a task, as shown to polling clients
    ///
    /// Read-only; returns [`crate::Error::TaskNotFound`] for ids this process
    /// never issued or whose artifact was already retrieved.
    pub async fn status(&self, id: TaskId) -> Result<TaskInfo> {
        Ok(self.registry.get(id).await?.to_info())
    }

    /// Hand a completed task's artifact off for delivery
    ///
    /// Takes the task out of the registry, copies its artifact into a fresh
    /// directory under `delivery_root`, and releases the job's working
    /// directory. Only one caller per task can succeed; the rest see
    /// [`crate::Error::TaskNotFound`]. If the artifact is gone or the copy
    /// fails, the task stays `complete` and its work dir is kept. The
    /// returned copy is removed when it (or the stream made from it) is
    /// dropped.
    pub async fn take_delivery(&self, id: TaskId) -> Result<DeliveryCopy> {
        let completed = self
            .registry
            .take_if_complete(id)
            .await
            .inspect_err(|e| {
                if matches!(e, crate::Error::ArtifactMissing { .. }) {
                    tracing::warn!(task_id = %id, error = %e, "Delivery failed");
                }
            })?;
        tracing::info!(task_id = %id, filename = %completed.artifact.filename, "Delivering artifact");

        match janitor::prepare_delivery(&completed, &self.config.download.delivery_root).await {
            Ok(copy) => {
                janitor::finish_delivery(completed);
                Ok(copy)
            }
            Err(e) => {
                tracing::warn!(task_id = %id, error = %e, "Delivery failed, task kept");
                self.registry.restore(completed).await;
                Err(e)
            }
        }
    }
}
