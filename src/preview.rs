//! Summaries of probed media for the preview endpoint

use crate::engine::VideoInfo;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// One selectable option shown to the user before downloading
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PreviewFormat {
    /// Quality label (`720p`) or `audio`
    pub quality: String,
    /// `video` or `audio`
    #[serde(rename = "type")]
    pub kind: String,
    /// Container extension the download will have
    pub ext: String,
    /// Size in bytes of the largest matching source format, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filesize: Option<u64>,
    /// Source format identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_id: Option<String>,
}

/// Preview of a single video
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Preview {
    /// Media title
    pub title: String,
    /// Duration in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Video qualities high to low, then at most one audio entry
    pub formats: Vec<PreviewFormat>,
}

/// Reduce advertised formats to one entry per resolution plus audio
///
/// `video_ext` and `audio_ext` are the containers downloads are converted to.
pub fn summarize(info: VideoInfo, video_ext: &str, audio_ext: &str) -> Preview {
    let mut by_height: BTreeMap<u32, PreviewFormat> = BTreeMap::new();
    let mut audio: Option<PreviewFormat> = None;

    for format in &info.formats {
        if format.has_video() {
            let Some(height) = format.height else {
                continue;
            };
            let candidate = PreviewFormat {
                quality: format!("{height}p"),
                kind: "video".to_string(),
                ext: video_ext.to_string(),
                filesize: format.filesize,
                format_id: format.format_id.clone(),
            };
            by_height
                .entry(height)
                .and_modify(|existing| {
                    if candidate.filesize > existing.filesize {
                        *existing = candidate.clone();
                    }
                })
                .or_insert(candidate);
        } else if format.is_audio_only() {
            let candidate = PreviewFormat {
                quality: "audio".to_string(),
                kind: "audio".to_string(),
                ext: audio_ext.to_string(),
                filesize: format.filesize,
                format_id: format.format_id.clone(),
            };
            match &audio {
                Some(existing) if existing.filesize >= candidate.filesize => {}
                _ => audio = Some(candidate),
            }
        }
    }

    let mut formats: Vec<PreviewFormat> = by_height.into_values().rev().collect();
    formats.extend(audio);

    Preview {
        title: info.title,
        duration: info.duration,
        formats,
    }
}
