//! Application state for the API server

use crate::{Config, MediaDownloader};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone) and provides
/// access to the job runner and configuration.
#[derive(Clone)]
pub struct AppState {
    /// The MediaDownloader instance
    pub downloader: Arc<MediaDownloader>,

    /// Configuration (request defaults, CORS, Swagger UI)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(downloader: Arc<MediaDownloader>, config: Arc<Config>) -> Self {
        Self { downloader, config }
    }
}
