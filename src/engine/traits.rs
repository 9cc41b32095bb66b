//! Traits and types for the extraction engine

use super::options::EngineOptions;
use crate::error::EngineError;
use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// One raw progress event as published by an engine
///
/// `status` is the engine's own tag (`downloading`, `finished`, ...) and
/// `percent` is its unparsed percentage text. Interpretation happens in
/// [`crate::progress`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEvent {
    /// Raw status tag
    pub status: String,
    /// Raw percentage string, e.g. `" 42.1%"`
    pub percent: Option<String>,
}

impl EngineEvent {
    /// Build an event from a status tag and optional percentage text
    pub fn new(status: impl Into<String>, percent: Option<&str>) -> Self {
        Self {
            status: status.into(),
            percent: percent.map(str::to_string),
        }
    }
}

/// Per-job channel an engine publishes progress into
///
/// Reporting is best-effort: if nobody is listening any more the event is
/// dropped. Implementations must not keep a clone of the sink alive after
/// [`ExtractionEngine::extract`] returns, since the job waits for the channel
/// to close before finalizing.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ProgressSink {
    /// Wrap the sending half of a job's progress channel
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }

    /// Publish one event, ignoring a closed channel
    pub async fn report(&self, event: EngineEvent) {
        if self.tx.send(event).await.is_err() {
            tracing::trace!("progress receiver gone, dropping event");
        }
    }
}

/// Input for one extraction
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    /// Remote media URL
    pub url: String,
    /// Format selection and post-processing settings
    pub options: EngineOptions,
    /// Job working directory; all output must land here
    pub output_dir: PathBuf,
}

/// Outcome of a successful extraction
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Media title, if the engine reported one
    pub title: Option<String>,
    /// Path the engine reports for the produced file
    ///
    /// For audio jobs this may still carry the pre-transcode extension.
    pub output_path: PathBuf,
}

/// One downloadable format advertised by the remote site
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormatInfo {
    /// Engine-specific format identifier
    pub format_id: Option<String>,
    /// Container extension
    pub ext: Option<String>,
    /// Vertical resolution, absent for audio-only formats
    pub height: Option<u32>,
    /// Video codec (`"none"` for audio-only)
    pub vcodec: Option<String>,
    /// Audio codec (`"none"` for video-only)
    pub acodec: Option<String>,
    /// Exact or approximate size in bytes
    pub filesize: Option<u64>,
}

impl FormatInfo {
    /// Whether this format carries a video stream
    pub fn has_video(&self) -> bool {
        self.height.is_some() && self.vcodec.as_deref() != Some("none")
    }

    /// Whether this format carries only audio
    pub fn is_audio_only(&self) -> bool {
        self.vcodec.as_deref() == Some("none") && self.acodec.as_deref() != Some("none")
    }
}

/// Metadata for a single video
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoInfo {
    /// Media title
    pub title: String,
    /// Duration in seconds
    pub duration: Option<f64>,
    /// Advertised formats
    pub formats: Vec<FormatInfo>,
}

/// Result of probing a URL without downloading
#[derive(Debug, Clone, PartialEq)]
pub enum MediaInfo {
    /// A single video
    Video(VideoInfo),
    /// A playlist or channel
    Playlist {
        /// Playlist title
        title: Option<String>,
        /// Number of entries, when known
        count: Option<usize>,
    },
}

/// Trait for media extraction engines
///
/// An engine resolves a URL to media, downloads it into a job's working
/// directory, and performs any merge or transcode. Implementations can drive
/// external binaries or provide stub functionality for graceful degradation.
///
/// # Examples
///
/// ```no_run
/// use media_dl::engine::{ExtractionEngine, YtDlpEngine};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let engine = YtDlpEngine::from_path().expect("yt-dlp not found in PATH");
/// let info = engine.probe("https://example.com/watch?v=abc").await?;
/// println!("{info:?}");
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait ExtractionEngine: Send + Sync {
    /// Download and post-process the media at `request.url`
    ///
    /// Progress is published into `progress` as it happens.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The engine cannot be started
    /// - The engine reports failure (diagnostics are carried verbatim)
    /// - The engine's output does not identify a produced file
    async fn extract(
        &self,
        request: ExtractRequest,
        progress: ProgressSink,
    ) -> Result<Extraction, EngineError>;

    /// Fetch metadata for `url` without downloading media
    async fn probe(&self, url: &str) -> Result<MediaInfo, EngineError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
