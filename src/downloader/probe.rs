//! Metadata preview without downloading.

use crate::engine::MediaInfo;
use crate::error::{Error, Result};
use crate::preview::{self, Preview};

use super::MediaDownloader;

impl MediaDownloader {
    /// Probe `url` and summarize the qualities a download could produce
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if `url` is empty or points at a playlist
    /// - [`Error::Engine`] if the engine cannot resolve the URL
    pub async fn preview(&self, url: &str) -> Result<Preview> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::Validation("URL is required".to_string()));
        }

        match self.engine.probe(url).await? {
            MediaInfo::Playlist { title, count } => {
                tracing::debug!(url, ?title, ?count, "Preview rejected playlist");
                Err(Error::Validation("Playlists are not supported".to_string()))
            }
            MediaInfo::Video(info) => Ok(preview::summarize(
                info,
                &self.config.tools.merge_format,
                &self.config.tools.audio_codec,
            )),
        }
    }
}
