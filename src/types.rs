//! Core types for media-dl

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;

/// Unique identifier for a download task
///
/// Backed by a random v4 UUID, so identifiers are never reused within (or across)
/// process lifetimes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TaskId(pub uuid::Uuid);

impl TaskId {
    /// Allocate a fresh random identifier
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Get the inner UUID value
    pub fn get(&self) -> uuid::Uuid {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Task status
///
/// Moves forward only: `starting -> downloading -> [merging] -> complete`.
/// `error` is reachable from every non-terminal state. `complete` and `error`
/// are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Accepted, worker not yet running
    Starting,
    /// Engine is fetching media
    Downloading,
    /// Raw media retrieved, merge / post-processing pending
    Merging,
    /// Artifact ready for delivery
    Complete,
    /// Failed with a classified message
    Error,
}

impl TaskStatus {
    /// Whether no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Complete | TaskStatus::Error)
    }

    /// Whether `next` is a legal successor of this status
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        match (self, next) {
            (Starting, Downloading) => true,
            (Downloading, Merging) | (Downloading, Complete) => true,
            (Merging, Complete) => true,
            (Starting | Downloading | Merging, Error) => true,
            _ => false,
        }
    }

    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Starting => "starting",
            TaskStatus::Downloading => "downloading",
            TaskStatus::Merging => "merging",
            TaskStatus::Complete => "complete",
            TaskStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested output kind
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    /// Best video+audio pair, merged into a single container (default)
    #[default]
    Video,
    /// Audio only, transcoded to the configured codec
    Audio,
}

impl std::str::FromStr for MediaFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" => Ok(MediaFormat::Video),
            "audio" => Ok(MediaFormat::Audio),
            other => Err(format!("format must be 'video' or 'audio', got '{other}'")),
        }
    }
}

impl std::fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaFormat::Video => f.write_str("video"),
            MediaFormat::Audio => f.write_str("audio"),
        }
    }
}

/// Requested video quality
///
/// Parsed from labels like `720p` or the sentinel `best`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quality {
    /// Best available, no resolution cap
    Best,
    /// Cap on vertical resolution in pixels
    MaxHeight(u32),
}

impl Quality {
    /// Label used in filenames (`best`, `720p`)
    pub fn label(&self) -> String {
        match self {
            Quality::Best => "best".to_string(),
            Quality::MaxHeight(h) => format!("{h}p"),
        }
    }
}

impl std::str::FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("best") {
            return Ok(Quality::Best);
        }
        trimmed
            .strip_suffix(['p', 'P'])
            .and_then(|digits| digits.parse::<u32>().ok())
            .filter(|h| *h > 0)
            .map(Quality::MaxHeight)
            .ok_or_else(|| format!("unsupported quality '{trimmed}' (expected 'best' or e.g. '720p')"))
    }
}

/// A submitted job as handed to a worker
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobRequest {
    /// Remote media URL
    pub url: String,
    /// Video or audio output
    pub format: MediaFormat,
    /// Raw quality label, parsed by the worker
    pub quality: String,
}

/// Completed output of a job
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    /// Absolute path inside the job's working directory
    pub path: PathBuf,
    /// Display filename (basename of `path`)
    pub filename: String,
}

impl Artifact {
    /// Build an artifact from a path, deriving the display filename
    pub fn from_path(path: PathBuf) -> Self {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "download".to_string());
        Self { path, filename }
    }
}

/// Status query response
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TaskInfo {
    /// Current status
    pub status: TaskStatus,
    /// Percentage in [0, 100]; omitted once the task failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f32>,
    /// Classified error text, present iff status is `error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Artifact filename, present iff status is `complete`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// Queue statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct QueueStats {
    /// Jobs admitted but not yet running
    pub queued: usize,
    /// Jobs currently running
    pub active: usize,
    /// Records held by the registry (including finished, unretrieved ones)
    pub tracked: usize,
}
