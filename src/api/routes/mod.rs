//! API route handlers
//!
//! Handlers are grouped by concern:
//! - `tasks` - job submission, status polling, file retrieval
//! - `preview` - metadata lookup before downloading
//! - `system` - health, OpenAPI, queue statistics

use crate::preview::{Preview, PreviewFormat};
use crate::types::TaskId;
use serde::{Deserialize, Serialize};

mod preview;
mod system;
mod tasks;

pub use preview::*;
pub use system::*;
pub use tasks::*;

/// Request body for submitting a download
///
/// Every field is optional at the wire level so that missing values produce
/// a JSON error body instead of an extractor rejection.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SubmitRequest {
    /// Media page URL
    pub url: Option<String>,
    /// `video` or `audio` (defaults to the configured format)
    pub format: Option<String>,
    /// `best` or a maximum height such as `720p` (defaults to the configured quality)
    pub quality: Option<String>,
}

/// Response for an accepted submission
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SubmitResponse {
    /// Always `accepted`
    pub status: String,
    /// Identifier to poll
    pub task_id: TaskId,
}

/// Request body for a metadata preview
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct PreviewRequest {
    /// Media page URL
    pub url: Option<String>,
}

/// Successful preview response
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct PreviewResponse {
    /// Always `success`
    pub status: String,
    /// Always `video`; playlists are rejected
    #[serde(rename = "type")]
    pub kind: String,
    /// Media title
    pub title: String,
    /// Duration in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Selectable qualities
    pub formats: Vec<PreviewFormat>,
}

impl From<Preview> for PreviewResponse {
    fn from(preview: Preview) -> Self {
        Self {
            status: "success".to_string(),
            kind: "video".to_string(),
            title: preview.title,
            duration: preview.duration,
            formats: preview.formats,
        }
    }
}
