//! Shared test helpers for creating MediaDownloader instances in tests.

use crate::config::Config;
use crate::downloader::MediaDownloader;
use crate::engine::{
    EngineEvent, ExtractRequest, Extraction, ExtractionEngine, MediaInfo, ProgressSink,
};
use crate::error::EngineError;
use crate::types::{TaskId, TaskInfo, TaskStatus};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::{TempDir, tempdir};
use tokio::sync::Semaphore;

/// What the scripted engine does once its events are published
#[derive(Clone, Debug)]
pub(crate) enum ScriptedOutcome {
    /// Write `written` into the job dir and report `reported` as the output
    Produce { reported: String, written: String },
    /// Report `reported` without writing anything
    ReportOnly { reported: String },
    /// Fail with these diagnostics
    Fail(String),
    /// Panic inside the engine
    Panic,
}

/// Extraction engine that replays a fixed script
pub(crate) struct ScriptedEngine {
    pub(crate) events: Vec<EngineEvent>,
    pub(crate) outcome: ScriptedOutcome,
    pub(crate) probe: Result<MediaInfo, String>,
    /// When set, each extraction waits for one permit before finishing
    pub(crate) gate: Option<Arc<Semaphore>>,
    /// Extractions currently inside `extract`
    pub(crate) running: Arc<AtomicUsize>,
    /// Highest value `running` reached
    pub(crate) peak: Arc<AtomicUsize>,
}

impl ScriptedEngine {
    /// Engine that reports progress and produces `reported` with `written` on disk
    pub(crate) fn producing(reported: &str, written: &str) -> Self {
        Self::with_outcome(ScriptedOutcome::Produce {
            reported: reported.to_string(),
            written: written.to_string(),
        })
    }

    /// Engine that fails with `diagnostics`
    pub(crate) fn failing(diagnostics: &str) -> Self {
        Self::with_outcome(ScriptedOutcome::Fail(diagnostics.to_string()))
    }

    pub(crate) fn with_outcome(outcome: ScriptedOutcome) -> Self {
        Self {
            events: vec![
                EngineEvent::new("downloading", Some("  0.0%")),
                EngineEvent::new("downloading", Some(" 37.5%")),
                EngineEvent::new("downloading", Some("100.0%")),
                EngineEvent::new("finished", None),
            ],
            outcome,
            probe: Err("ERROR: probe not scripted".to_string()),
            gate: None,
            running: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn with_events(mut self, events: Vec<EngineEvent>) -> Self {
        self.events = events;
        self
    }

    pub(crate) fn with_probe(mut self, probe: Result<MediaInfo, String>) -> Self {
        self.probe = probe;
        self
    }

    /// Hold every extraction until a permit is added to the returned gate
    pub(crate) fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(gate.clone());
        (self, gate)
    }
}

#[async_trait]
impl ExtractionEngine for ScriptedEngine {
    async fn extract(
        &self,
        request: ExtractRequest,
        progress: ProgressSink,
    ) -> Result<Extraction, EngineError> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        for event in &self.events {
            progress.report(event.clone()).await;
        }

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.running.fetch_sub(1, Ordering::SeqCst);

        match &self.outcome {
            ScriptedOutcome::Produce { reported, written } => {
                tokio::fs::write(request.output_dir.join(written), b"media-bytes")
                    .await
                    .unwrap();
                Ok(Extraction {
                    title: Some("Clip".to_string()),
                    output_path: request.output_dir.join(reported),
                })
            }
            ScriptedOutcome::ReportOnly { reported } => Ok(Extraction {
                title: None,
                output_path: request.output_dir.join(reported),
            }),
            ScriptedOutcome::Fail(diagnostics) => Err(EngineError::Failed {
                diagnostics: diagnostics.clone(),
            }),
            ScriptedOutcome::Panic => panic!("scripted engine panic"),
        }
    }

    async fn probe(&self, _url: &str) -> Result<MediaInfo, EngineError> {
        self.probe.clone().map_err(|diagnostics| EngineError::Failed { diagnostics })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Config rooted in a temp dir; returns the dir, which must be kept alive
pub(crate) fn test_config() -> (Config, TempDir) {
    let temp_dir = tempdir().unwrap();
    let mut config = Config::default();
    config.download.work_root = temp_dir.path().join("work");
    config.download.delivery_root = temp_dir.path().join("delivery");
    config.download.max_concurrent_jobs = 3;
    config.server.api.shutdown_timeout_secs = 5;
    (config, temp_dir)
}

/// Helper to create a test MediaDownloader driving `engine`
/// Returns the downloader and the tempdir (which must be kept alive).
pub(crate) async fn create_test_downloader(engine: ScriptedEngine) -> (MediaDownloader, TempDir) {
    let (config, temp_dir) = test_config();
    let downloader = MediaDownloader::with_engine(config, Arc::new(engine))
        .await
        .unwrap();
    (downloader, temp_dir)
}

/// Poll until the task reaches a terminal state
pub(crate) async fn wait_for_terminal(downloader: &MediaDownloader, id: TaskId) -> TaskInfo {
    wait_for_status(downloader, id, |s| s.is_terminal()).await
}

/// Poll until `done` holds for the task's status
pub(crate) async fn wait_for_status(
    downloader: &MediaDownloader,
    id: TaskId,
    done: impl Fn(TaskStatus) -> bool,
) -> TaskInfo {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let info = downloader.status(id).await.unwrap();
            if done(info.status) {
                return info;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("task did not reach the expected state in time")
}
