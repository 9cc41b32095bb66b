//! Concurrency-safe task registry
//!
//! The registry is the only shared mutable state between the API layer and the
//! job workers. Every mutation clones the record's state, applies a validated
//! change, and replaces the whole state under the write lock, so readers never
//! see a half-applied update.

use crate::error::{Error, Result};
use crate::types::{Artifact, TaskId, TaskInfo, TaskStatus};
use std::collections::HashMap;
use tempfile::TempDir;
use tokio::sync::RwLock;

/// Observable state of one task
#[derive(Clone, Debug, PartialEq)]
pub struct TaskState {
    /// Current status
    pub status: TaskStatus,
    /// Percentage in [0, 100]
    pub progress: f32,
    /// Classified error text (set iff status is `error`)
    pub message: Option<String>,
    /// Output file (set iff status is `complete`)
    pub artifact: Option<Artifact>,
}

impl TaskState {
    fn starting() -> Self {
        Self {
            status: TaskStatus::Starting,
            progress: 0.0,
            message: None,
            artifact: None,
        }
    }

    /// Move to `to`, rejecting anything the state machine forbids
    pub fn transition(&mut self, id: TaskId, to: TaskStatus) -> Result<()> {
        if !self.status.can_transition_to(to) {
            return Err(Error::InvalidTransition {
                id,
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Render as a status query response
    pub fn to_info(&self) -> TaskInfo {
        TaskInfo {
            status: self.status,
            progress: (self.status != TaskStatus::Error).then_some(self.progress),
            message: self.message.clone(),
            filename: self.artifact.as_ref().map(|a| a.filename.clone()),
        }
    }
}

/// A completed task removed from the registry for delivery
///
/// Owns the job's working directory; dropping it (or calling
/// [`crate::janitor::release_work_dir`]) removes the directory.
#[derive(Debug)]
pub struct CompletedTask {
    /// The task that completed
    pub id: TaskId,
    /// Its artifact, located inside `work_dir`
    pub artifact: Artifact,
    /// The job's working directory
    pub work_dir: Option<TempDir>,
}

struct TaskRecord {
    state: TaskState,
    work_dir: Option<TempDir>,
}

/// Store mapping task identifiers to task records
///
/// Shared as `Arc<TaskRegistry>` between request handlers and workers.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: RwLock<HashMap<TaskId, TaskRecord>>,
}

impl TaskRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fresh `starting` record without a working directory
    pub async fn create(&self) -> TaskId {
        self.insert(None).await
    }

    /// Insert a fresh `starting` record that owns `work_dir`
    pub async fn create_with_work_dir(&self, work_dir: TempDir) -> TaskId {
        self.insert(Some(work_dir)).await
    }

    async fn insert(&self, work_dir: Option<TempDir>) -> TaskId {
        let mut tasks = self.tasks.write().await;
        let mut id = TaskId::new();
        while tasks.contains_key(&id) {
            id = TaskId::new();
        }
        tasks.insert(
            id,
            TaskRecord {
                state: TaskState::starting(),
                work_dir,
            },
        );
        id
    }

    /// Snapshot of a task's state
    pub async fn get(&self, id: TaskId) -> Result<TaskState> {
        self.tasks
            .read()
            .await
            .get(&id)
            .map(|record| record.state.clone())
            .ok_or(Error::TaskNotFound(id))
    }

    /// Apply `mutator` to a copy of the task's state and commit it atomically
    ///
    /// If the mutator fails, the stored state is left untouched.
    pub async fn update<F>(&self, id: TaskId, mutator: F) -> Result<TaskState>
    where
        F: FnOnce(&mut TaskState) -> Result<()>,
    {
        let mut tasks = self.tasks.write().await;
        let record = tasks.get_mut(&id).ok_or(Error::TaskNotFound(id))?;

        let mut next = record.state.clone();
        mutator(&mut next)?;
        record.state = next.clone();
        Ok(next)
    }

    /// `starting -> downloading`
    pub async fn mark_downloading(&self, id: TaskId) -> Result<()> {
        self.update(id, |state| state.transition(id, TaskStatus::Downloading))
            .await
            .map(|_| ())
    }

    /// `downloading -> merging`
    pub async fn mark_merging(&self, id: TaskId) -> Result<()> {
        self.update(id, |state| state.transition(id, TaskStatus::Merging))
            .await
            .map(|_| ())
    }

    /// Record a progress percentage while the task is downloading
    ///
    /// Returns `false` (and changes nothing) when the task has already left
    /// the downloading phase. The value is clamped to [0, 100].
    pub async fn record_progress(&self, id: TaskId, percent: f32) -> Result<bool> {
        let mut applied = false;
        self.update(id, |state| {
            if state.status == TaskStatus::Downloading {
                state.progress = clamp_percent(percent);
                applied = true;
            }
            Ok(())
        })
        .await?;
        Ok(applied)
    }

    /// Terminal success with the produced artifact
    pub async fn complete(&self, id: TaskId, artifact: Artifact) -> Result<()> {
        self.update(id, move |state| {
            state.transition(id, TaskStatus::Complete)?;
            state.progress = 100.0;
            state.message = None;
            state.artifact = Some(artifact);
            Ok(())
        })
        .await
        .map(|_| ())
    }

    /// Terminal failure with a classified message
    pub async fn fail(&self, id: TaskId, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        self.update(id, move |state| {
            state.transition(id, TaskStatus::Error)?;
            state.message = Some(message);
            state.artifact = None;
            Ok(())
        })
        .await
        .map(|_| ())
    }

    /// Atomically remove and return the task if it is complete
    ///
    /// Concurrent callers for the same id are serialized by the write lock:
    /// exactly one receives the task, the rest get [`Error::TaskNotFound`].
    /// A task that exists but is not complete is left in place and reported
    /// as [`Error::TaskNotReady`]. A complete task whose file has vanished
    /// from disk is also left in place and reported as
    /// [`Error::ArtifactMissing`].
    pub async fn take_if_complete(&self, id: TaskId) -> Result<CompletedTask> {
        let mut tasks = self.tasks.write().await;
        let state = tasks
            .get(&id)
            .map(|record| &record.state)
            .ok_or(Error::TaskNotFound(id))?;

        if state.status != TaskStatus::Complete {
            return Err(Error::TaskNotReady {
                id,
                status: state.status,
            });
        }

        if let Some(artifact) = &state.artifact {
            if !tokio::fs::try_exists(&artifact.path).await.unwrap_or(false) {
                return Err(Error::ArtifactMissing {
                    path: artifact.path.clone(),
                });
            }
        }

        let record = tasks.remove(&id).ok_or(Error::TaskNotFound(id))?;
        let artifact = record
            .state
            .artifact
            .ok_or_else(|| Error::Other(format!("complete task {id} has no artifact")))?;

        Ok(CompletedTask {
            id,
            artifact,
            work_dir: record.work_dir,
        })
    }

    /// Put a taken task back as `complete` after its delivery failed
    pub(crate) async fn restore(&self, task: CompletedTask) {
        let CompletedTask {
            id,
            artifact,
            work_dir,
        } = task;
        let state = TaskState {
            status: TaskStatus::Complete,
            progress: 100.0,
            message: None,
            artifact: Some(artifact),
        };
        self.tasks
            .write()
            .await
            .insert(id, TaskRecord { state, work_dir });
    }

    /// Drop a record regardless of state (admission rollback)
    pub(crate) async fn remove(&self, id: TaskId) -> bool {
        self.tasks.write().await.remove(&id).is_some()
    }

    /// Number of tracked records
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Whether no records are tracked
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

/// Clamp to [0, 100], mapping NaN to 0
pub(crate) fn clamp_percent(percent: f32) -> f32 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    }
}
