//! Job worker: the single-pass protocol run for each admitted job.

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;

use crate::classify::classify;
use crate::config::Config;
use crate::engine::{EngineOptions, ExtractRequest, ExtractionEngine, ProgressSink};
use crate::error::{Error, Result};
use crate::progress::{PROGRESS_CHANNEL_BUFFER, spawn_progress_reporter};
use crate::registry::TaskRegistry;
use crate::types::{Artifact, JobRequest, MediaFormat, Quality, TaskId};

use super::finalize::reconcile_output;

/// How long the worker waits for the progress reporter to drain after the
/// engine returns
const REPORTER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything a worker needs, detached from the `MediaDownloader` handle
pub(crate) struct JobContext {
    pub(crate) id: TaskId,
    pub(crate) request: JobRequest,
    pub(crate) work_dir: PathBuf,
    pub(crate) registry: Arc<TaskRegistry>,
    pub(crate) engine: Arc<dyn ExtractionEngine>,
    pub(crate) config: Arc<Config>,
}

/// Run one job to a terminal state
///
/// Every failure, including a panic inside the engine, ends as a classified
/// `error` record; nothing escapes to the caller.
pub(crate) async fn run_job(ctx: JobContext) {
    let id = ctx.id;
    tracing::info!(
        task_id = %id,
        url = %ctx.request.url,
        format = %ctx.request.format,
        quality = %ctx.request.quality,
        engine = ctx.engine.name(),
        "Job started"
    );

    let outcome = match AssertUnwindSafe(execute(&ctx)).catch_unwind().await {
        Ok(result) => result,
        Err(_) => Err(Error::Other("worker panicked".to_string())),
    };

    match outcome {
        Ok(artifact) => {
            tracing::info!(task_id = %id, filename = %artifact.filename, "Job complete");
        }
        Err(e) => {
            let raw = e.raw_diagnostics();
            let classified = classify(&raw);
            tracing::warn!(
                task_id = %id,
                category = ?classified.category,
                error = %raw,
                "Job failed"
            );
            if let Err(e) = ctx.registry.fail(id, classified.message).await {
                tracing::error!(task_id = %id, error = %e, "Failed to record job failure");
            }
        }
    }
}

/// Steps 1-6 of the worker protocol; step 7 is the caller's error arm
async fn execute(ctx: &JobContext) -> Result<Artifact> {
    let id = ctx.id;

    // 1. downloading
    ctx.registry.mark_downloading(id).await?;

    // 2. engine options
    let (options, quality) = build_options(&ctx.request, &ctx.config)?;

    // 3-4. extraction, with progress flowing through the reporter
    let (tx, rx) = tokio::sync::mpsc::channel(PROGRESS_CHANNEL_BUFFER);
    let mut reporter = spawn_progress_reporter(id, Arc::clone(&ctx.registry), rx);

    let request = ExtractRequest {
        url: ctx.request.url.clone(),
        options,
        output_dir: ctx.work_dir.clone(),
    };
    let extraction = ctx.engine.extract(request, ProgressSink::new(tx)).await;

    // No progress event may land after the terminal status
    match tokio::time::timeout(REPORTER_DRAIN_TIMEOUT, &mut reporter).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::debug!(task_id = %id, error = %e, "progress reporter ended abnormally"),
        Err(_) => {
            tracing::warn!(task_id = %id, "progress reporter did not drain, aborting it");
            reporter.abort();
        }
    }

    let extraction = extraction?;
    tracing::debug!(
        task_id = %id,
        title = extraction.title.as_deref().unwrap_or(""),
        path = %extraction.output_path.display(),
        "Extraction finished"
    );

    // 5. filename reconciliation
    let final_path = reconcile_output(
        ctx.request.format,
        quality,
        &extraction.output_path,
        &ctx.config.tools.audio_codec,
    )
    .await;

    // 6. the artifact must exist at the instant the task completes
    if !tokio::fs::try_exists(&final_path).await.unwrap_or(false) {
        return Err(Error::ArtifactMissing { path: final_path });
    }

    let artifact = Artifact::from_path(final_path);
    ctx.registry.complete(id, artifact.clone()).await?;
    Ok(artifact)
}

/// Engine options for the request, plus the parsed quality for video jobs
fn build_options(request: &JobRequest, config: &Config) -> Result<(EngineOptions, Option<Quality>)> {
    match request.format {
        MediaFormat::Audio => Ok((EngineOptions::audio(&config.tools), None)),
        MediaFormat::Video => {
            let quality: Quality = request.quality.parse().map_err(Error::Validation)?;
            Ok((EngineOptions::video(quality, &config.tools), Some(quality)))
        }
    }
}
