//! A fake extraction engine that writes a small file instead of calling yt-dlp

use async_trait::async_trait;
use media_dl::EngineError;
use media_dl::engine::{
    EngineEvent, ExtractRequest, Extraction, ExtractionEngine, FormatInfo, MediaInfo,
    ProgressSink, VideoInfo,
};
use std::time::Duration;

/// Bytes written for every produced file
pub const FAKE_CONTENT: &[u8] = b"fake media payload";

/// Engine that emits a short progress sequence and writes `<title>.<ext>`
pub struct FakeEngine {
    /// Title used for the produced file
    pub title: String,
    /// Extension of the produced file (before any audio conversion)
    pub ext: String,
    /// When set, extraction fails with these diagnostics
    pub failure: Option<String>,
    /// Pause between progress events
    pub step: Duration,
}

impl FakeEngine {
    /// Engine producing `title.mp4`
    pub fn video(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ext: "mp4".to_string(),
            failure: None,
            step: Duration::from_millis(5),
        }
    }

    /// Engine producing `title.<codec>`, as yt-dlp does after audio extraction
    pub fn audio(title: &str, codec: &str) -> Self {
        Self {
            ext: codec.to_string(),
            ..Self::video(title)
        }
    }

    /// Engine whose extractions fail with `diagnostics`
    pub fn failing(diagnostics: &str) -> Self {
        Self {
            failure: Some(diagnostics.to_string()),
            ..Self::video("unused")
        }
    }
}

#[async_trait]
impl ExtractionEngine for FakeEngine {
    async fn extract(
        &self,
        request: ExtractRequest,
        progress: ProgressSink,
    ) -> Result<Extraction, EngineError> {
        for percent in ["  0.0%", " 42.0%", "100.0%"] {
            progress
                .report(EngineEvent::new("downloading", Some(percent)))
                .await;
            tokio::time::sleep(self.step).await;
        }

        if let Some(diagnostics) = &self.failure {
            return Err(EngineError::Failed {
                diagnostics: diagnostics.clone(),
            });
        }

        progress.report(EngineEvent::new("finished", None)).await;

        let output_path = request
            .output_dir
            .join(format!("{}.{}", self.title, self.ext));
        tokio::fs::write(&output_path, FAKE_CONTENT)
            .await
            .map_err(|e| EngineError::MalformedOutput(e.to_string()))?;

        Ok(Extraction {
            title: Some(self.title.clone()),
            output_path,
        })
    }

    async fn probe(&self, _url: &str) -> Result<MediaInfo, EngineError> {
        if let Some(diagnostics) = &self.failure {
            return Err(EngineError::Failed {
                diagnostics: diagnostics.clone(),
            });
        }

        Ok(MediaInfo::Video(VideoInfo {
            title: self.title.clone(),
            duration: Some(60.0),
            formats: vec![FormatInfo {
                format_id: Some("22".to_string()),
                ext: Some("mp4".to_string()),
                height: Some(720),
                vcodec: Some("avc1".to_string()),
                acodec: Some("mp4a".to_string()),
                filesize: Some(1_024),
            }],
        }))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}
