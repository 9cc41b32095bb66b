//! Engine option building from a job's format and quality

use crate::config::ToolsConfig;
use crate::types::Quality;
use std::time::Duration;

/// Output filename template, relative to the job directory
pub const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Audio extraction target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTarget {
    /// Target codec, which is also the final extension (e.g. `mp3`)
    pub codec: String,
    /// Target bitrate in kbps (e.g. `192`)
    pub quality: String,
}

/// Format selection and post-processing settings for one extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Engine format selector expression
    pub format_selector: String,
    /// Output filename template
    pub output_template: String,
    /// Container for merging separate video and audio streams
    pub merge_format: Option<String>,
    /// Transcode to audio after download
    pub extract_audio: Option<AudioTarget>,
    /// Socket-level timeout
    pub socket_timeout: Duration,
}

impl EngineOptions {
    /// Options for a video job capped at `quality`
    ///
    /// Prefers the best video stream at or under the cap plus the best audio
    /// stream, falling back to the best combined format under the cap, then to
    /// the best format overall.
    pub fn video(quality: Quality, tools: &ToolsConfig) -> Self {
        let format_selector = match quality {
            Quality::Best => "bestvideo+bestaudio/best".to_string(),
            Quality::MaxHeight(h) => {
                format!("bestvideo[height<={h}]+bestaudio/best[height<={h}]/best")
            }
        };

        Self {
            format_selector,
            output_template: OUTPUT_TEMPLATE.to_string(),
            merge_format: Some(tools.merge_format.clone()),
            extract_audio: None,
            socket_timeout: Duration::from_secs(tools.socket_timeout_secs),
        }
    }

    /// Options for an audio job
    pub fn audio(tools: &ToolsConfig) -> Self {
        Self {
            format_selector: "bestaudio/best".to_string(),
            output_template: OUTPUT_TEMPLATE.to_string(),
            merge_format: None,
            extract_audio: Some(AudioTarget {
                codec: tools.audio_codec.clone(),
                quality: tools.audio_quality.clone(),
            }),
            socket_timeout: Duration::from_secs(tools.socket_timeout_secs),
        }
    }
}
