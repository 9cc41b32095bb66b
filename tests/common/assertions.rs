//! Polling helpers shared by the integration tests

use media_dl::{Config, MediaDownloader, TaskId, TaskInfo};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use super::FakeEngine;

/// Downloader driving `engine`, rooted in a fresh temp dir that must be kept alive
pub async fn downloader_with(engine: FakeEngine) -> (MediaDownloader, TempDir) {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let mut config = Config::default();
    config.download.work_root = temp_dir.path().join("work");
    config.download.delivery_root = temp_dir.path().join("delivery");

    let downloader = MediaDownloader::with_engine(config, Arc::new(engine))
        .await
        .expect("downloader");
    (downloader, temp_dir)
}

/// Poll status until the task is terminal, recording every distinct status seen
pub async fn poll_until_terminal(
    downloader: &MediaDownloader,
    id: TaskId,
    timeout: Duration,
) -> (TaskInfo, Vec<String>) {
    let mut seen: Vec<String> = Vec::new();

    tokio::time::timeout(timeout, async {
        loop {
            let info = downloader.status(id).await.expect("task is tracked");
            let status = info.status.to_string();
            if seen.last() != Some(&status) {
                seen.push(status);
            }
            if info.status.is_terminal() {
                return (info, seen);
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("task did not finish in time")
}
