//! Stub engine for graceful degradation

use super::traits::{ExtractRequest, Extraction, ExtractionEngine, MediaInfo, ProgressSink};
use crate::error::EngineError;
use async_trait::async_trait;

const MISSING_ENGINE: &str = "Media extraction requires the yt-dlp binary. \
     Configure ytdlp_path in config or ensure yt-dlp is in PATH.";

/// Engine used when no extraction binary is available
///
/// The service still starts and answers status queries; every job fails with
/// an explanatory message instead.
///
/// # Examples
///
/// ```
/// use media_dl::engine::{ExtractionEngine, UnavailableEngine};
///
/// # #[tokio::main]
/// # async fn main() {
/// let engine = UnavailableEngine;
/// assert!(engine.probe("https://example.com/v").await.is_err());
/// # }
/// ```
pub struct UnavailableEngine;

#[async_trait]
impl ExtractionEngine for UnavailableEngine {
    async fn extract(
        &self,
        _request: ExtractRequest,
        _progress: ProgressSink,
    ) -> Result<Extraction, EngineError> {
        Err(EngineError::Unavailable(MISSING_ENGINE.into()))
    }

    async fn probe(&self, _url: &str) -> Result<MediaInfo, EngineError> {
        Err(EngineError::Unavailable(MISSING_ENGINE.into()))
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolsConfig;
    use crate::engine::EngineOptions;
    use std::path::PathBuf;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn every_operation_reports_missing_binary() {
        let (tx, _rx) = mpsc::channel(1);
        let request = ExtractRequest {
            url: "https://example.com/v".into(),
            options: EngineOptions::audio(&ToolsConfig::default()),
            output_dir: PathBuf::from("/tmp"),
        };

        let result = UnavailableEngine
            .extract(request, ProgressSink::new(tx))
            .await;
        match result {
            Err(EngineError::Unavailable(msg)) => assert!(msg.contains("yt-dlp")),
            other => panic!("expected Unavailable, got {other:?}"),
        }
        assert!(UnavailableEngine.probe("https://example.com/v").await.is_err());
        assert_eq!(UnavailableEngine.name(), "unavailable");
    }
}
