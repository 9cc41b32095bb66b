//! # media-dl
//!
//! Asynchronous media download jobs behind a polled REST API.
//!
//! ## Design Philosophy
//!
//! media-dl is designed to be:
//! - **Job-oriented** - Every submission becomes a tracked task with its own working directory
//! - **Bounded** - A fixed worker pool fed by an admission queue gives real backpressure
//! - **Polled** - Clients poll task status and fetch each finished file exactly once
//! - **Engine-agnostic** - Extraction goes through the [`engine::ExtractionEngine`] trait;
//!   `yt-dlp` is the bundled implementation
//!
//! ## Quick Start
//!
//! ```no_run
//! use media_dl::{Config, MediaDownloader, MediaFormat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = MediaDownloader::new(Config::default()).await?;
//!
//!     let id = downloader
//!         .submit("https://example.com/watch?v=1", MediaFormat::Video, "720p")
//!         .await?;
//!
//!     let info = downloader.status(id).await?;
//!     println!("{id}: {}", info.status);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Diagnostic classification into user-facing messages
pub mod classify;
/// Configuration types
pub mod config;
/// Job runner (decomposed into focused submodules)
pub mod downloader;
/// Extraction engine trait and implementations
pub mod engine;
/// Error types
pub mod error;
/// Working directories and delivery copies
pub mod janitor;
/// Preview summaries of probed media
pub mod preview;
/// Engine progress translation
pub mod progress;
/// In-memory task registry
pub mod registry;
/// Core types
pub mod types;

use std::sync::Arc;

// Re-export commonly used types
pub use classify::{ClassifiedError, ErrorCategory, classify};
pub use config::Config;
pub use downloader::MediaDownloader;
pub use engine::{ExtractionEngine, UnavailableEngine, YtDlpEngine};
pub use error::{ApiError, EngineError, Error, Result, ToHttpStatus};
pub use janitor::DeliveryCopy;
pub use preview::{Preview, PreviewFormat};
pub use registry::TaskRegistry;
pub use types::{MediaFormat, Quality, QueueStats, TaskId, TaskInfo, TaskStatus};

/// Serve the REST API until a termination signal arrives, then shut down gracefully.
///
/// On a signal, admission stops first and in-flight jobs get up to
/// `shutdown_timeout_secs` to finish while the API keeps answering polls.
/// The API server is stopped afterwards.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use media_dl::{Config, MediaDownloader, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::default();
///     let downloader = MediaDownloader::new(config).await?;
///
///     // Run with automatic signal handling
///     run_with_shutdown(downloader).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(downloader: MediaDownloader) -> Result<()> {
    let downloader = Arc::new(downloader);
    let config = downloader.get_config();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

    let mut server = tokio::spawn(api::serve_until(downloader.clone(), config, async move {
        let _ = stop_rx.await;
    }));

    tokio::select! {
        _ = wait_for_signal() => {}
        joined = &mut server => {
            // Server ended on its own (bind failure or fatal error)
            return flatten_server_result(joined);
        }
    }

    if downloader.shutdown().await {
        tracing::info!("All jobs finished, stopping API server");
    } else {
        tracing::warn!("Shutdown timeout reached with jobs still running, stopping API server");
    }

    let _ = stop_tx.send(());
    flatten_server_result(server.await)
}

fn flatten_server_result(joined: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    match joined {
        Ok(result) => result,
        Err(e) => Err(Error::ApiServerError(format!("server task failed: {e}"))),
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
