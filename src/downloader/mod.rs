//! Job runner split into focused submodules.
//!
//! The `MediaDownloader` struct and its methods are organized by domain:
//! - [`submit`] - Admission of new jobs and queue statistics
//! - [`queue_processor`] - Dispatch of queued jobs onto the bounded worker pool
//! - [`job`] - The per-job worker protocol
//! - [`finalize`] - Output filename reconciliation after extraction
//! - [`delivery`] - Status queries and one-shot artifact retrieval
//! - [`probe`] - Metadata preview without downloading
//! - [`lifecycle`] - Shutdown coordination

mod delivery;
mod finalize;
mod job;
mod lifecycle;
mod probe;
mod queue_processor;
mod submit;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::config::{Config, ToolsConfig};
use crate::engine::{ExtractionEngine, UnavailableEngine, YtDlpEngine};
use crate::error::{Error, Result};
use crate::registry::TaskRegistry;
use crate::types::{JobRequest, TaskId};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize};
use std::time::Duration;

/// Admission queue and worker pool state
#[derive(Clone)]
pub(crate) struct QueueState {
    /// Bounded admission queue feeding the dispatcher
    pub(crate) job_tx: tokio::sync::mpsc::Sender<QueuedJob>,
    /// Semaphore limiting concurrently running jobs (max_concurrent_jobs)
    pub(crate) concurrent_limit: Arc<tokio::sync::Semaphore>,
    /// Jobs admitted but not yet holding a worker slot
    pub(crate) queued: Arc<AtomicUsize>,
    /// Jobs currently running
    pub(crate) active: Arc<AtomicUsize>,
    /// Flag to indicate whether new jobs are accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
}

/// A job waiting in the admission queue
#[derive(Debug)]
pub(crate) struct QueuedJob {
    pub(crate) id: TaskId,
    pub(crate) request: JobRequest,
    pub(crate) work_dir: PathBuf,
}

/// Main job runner instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct MediaDownloader {
    /// Task registry shared with the workers
    pub(crate) registry: Arc<TaskRegistry>,
    /// Extraction engine (trait object for pluggable implementations)
    pub(crate) engine: Arc<dyn ExtractionEngine>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Admission queue and worker pool state
    pub(crate) queue_state: QueueState,
}

impl MediaDownloader {
    /// Create a new MediaDownloader using the engine selected by `config.tools`
    ///
    /// An explicit `ytdlp_path` wins; otherwise PATH is searched if allowed.
    /// Without a binary the service still starts and every job fails with an
    /// explanatory message.
    pub async fn new(config: Config) -> Result<Self> {
        let engine = select_engine(&config.tools);
        Self::with_engine(config, engine).await
    }

    /// Create a new MediaDownloader driving the given engine
    ///
    /// Must be called from within a Tokio runtime: the queue dispatcher is
    /// spawned here.
    pub async fn with_engine(config: Config, engine: Arc<dyn ExtractionEngine>) -> Result<Self> {
        config.validate()?;

        for dir in [&config.download.work_root, &config.download.delivery_root] {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create directory '{}': {}", dir.display(), e),
                ))
            })?;
        }

        tracing::info!(
            engine = engine.name(),
            max_concurrent_jobs = config.download.max_concurrent_jobs,
            queue_capacity = config.download.queue_capacity,
            "Extraction engine initialized"
        );

        let (job_tx, job_rx) = tokio::sync::mpsc::channel(config.download.queue_capacity);

        let queue_state = QueueState {
            job_tx,
            concurrent_limit: Arc::new(tokio::sync::Semaphore::new(
                config.download.max_concurrent_jobs,
            )),
            queued: Arc::new(AtomicUsize::new(0)),
            active: Arc::new(AtomicUsize::new(0)),
            accepting_new: Arc::new(AtomicBool::new(true)),
        };

        let downloader = Self {
            registry: Arc::new(TaskRegistry::new()),
            engine,
            config: Arc::new(config),
            queue_state,
        };

        downloader.start_queue_processor(job_rx);

        Ok(downloader)
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Shared task registry
    pub fn registry(&self) -> Arc<TaskRegistry> {
        Arc::clone(&self.registry)
    }

    /// Name of the active extraction engine
    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Spawn the REST API server in a background task
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let downloader = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(downloader, config).await })
    }
}

/// Pick the extraction engine described by the tool settings
pub(crate) fn select_engine(tools: &ToolsConfig) -> Arc<dyn ExtractionEngine> {
    let probe_timeout = Duration::from_secs(tools.socket_timeout_secs);

    if let Some(ref path) = tools.ytdlp_path {
        // Use explicitly configured binary path
        Arc::new(YtDlpEngine::new(path.clone()).with_probe_timeout(probe_timeout))
    } else if tools.search_path {
        // Search PATH for yt-dlp
        match YtDlpEngine::from_path() {
            Some(engine) => Arc::new(engine.with_probe_timeout(probe_timeout)),
            None => {
                tracing::warn!("yt-dlp not found in PATH, downloads will fail");
                Arc::new(UnavailableEngine)
            }
        }
    } else {
        // No binary configured and PATH search disabled
        Arc::new(UnavailableEngine)
    }
}
