//! Translation of raw engine progress events into task updates
//!
//! The engine publishes [`EngineEvent`]s into a per-job channel; a reporter task
//! drains the channel, translates each event, and applies it to the registry.
//! Progress is best-effort telemetry: malformed percentages become `0` and
//! nothing here can fail the job.

use crate::engine::EngineEvent;
use crate::registry::{TaskRegistry, clamp_percent};
use crate::types::{TaskId, TaskStatus};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tokio::sync::mpsc;

/// Buffer size for the per-job engine event channel
pub(crate) const PROGRESS_CHANNEL_BUFFER: usize = 64;

/// Raw status tags that mean "still fetching"
const IN_PROGRESS_TAGS: &[&str] = &["downloading", "in-progress"];

/// Raw status tag that means "raw media retrieved"
const FINISHED_TAG: &str = "finished";

static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("static regex is valid")
});

/// Normalized effect of one engine event
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProgressUpdate {
    /// New download percentage in [0, 100]
    Percent(f32),
    /// Fetch finished, merge / post-processing may follow
    Merging,
    /// Event has no visible effect
    Ignored,
}

/// Translate one raw event
pub fn translate(event: &EngineEvent) -> ProgressUpdate {
    let tag = event.status.trim();
    if IN_PROGRESS_TAGS.iter().any(|t| tag.eq_ignore_ascii_case(t)) {
        let percent = event.percent.as_deref().map(parse_percent).unwrap_or(0.0);
        ProgressUpdate::Percent(percent)
    } else if tag.eq_ignore_ascii_case(FINISHED_TAG) {
        ProgressUpdate::Merging
    } else {
        ProgressUpdate::Ignored
    }
}

/// Parse a percentage string like `" 42.5%"`, defaulting to `0` on failure
pub fn parse_percent(raw: &str) -> f32 {
    let cleaned = ANSI_ESCAPE.replace_all(raw, "");
    cleaned
        .trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f32>()
        .map(clamp_percent)
        .unwrap_or(0.0)
}

/// Spawn a task that applies engine events for `id` until the channel closes
pub(crate) fn spawn_progress_reporter(
    id: TaskId,
    registry: Arc<TaskRegistry>,
    mut events: mpsc::Receiver<EngineEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            apply(id, &registry, translate(&event)).await;
        }
        tracing::trace!(task_id = %id, "progress channel closed");
    })
}

async fn apply(id: TaskId, registry: &TaskRegistry, update: ProgressUpdate) {
    match update {
        ProgressUpdate::Percent(percent) => {
            if let Err(e) = registry.record_progress(id, percent).await {
                tracing::debug!(task_id = %id, error = %e, "dropping progress update");
            } else {
                tracing::trace!(task_id = %id, percent, "progress");
            }
        }
        ProgressUpdate::Merging => {
            // Multi-format downloads report "finished" once per stream
            let result = registry
                .update(id, |state| {
                    if state.status == TaskStatus::Downloading {
                        state.transition(id, TaskStatus::Merging)?;
                    }
                    Ok(())
                })
                .await;
            match result {
                Ok(state) if state.status == TaskStatus::Merging => {
                    tracing::debug!(task_id = %id, "fetch finished, merging");
                }
                Ok(_) => {}
                Err(e) => tracing::debug!(task_id = %id, error = %e, "dropping merge signal"),
            }
        }
        ProgressUpdate::Ignored => {}
    }
}
