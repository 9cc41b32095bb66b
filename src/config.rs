//! Configuration types for media-dl

use crate::error::{Error, Result};
use crate::types::MediaFormat;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf};
use utoipa::ToSchema;

/// Environment variable that narrows CORS to a single frontend origin
pub const FRONTEND_URL_ENV: &str = "FRONTEND_URL";

/// Environment variable that overrides the API bind address
pub const BIND_ADDRESS_ENV: &str = "MEDIA_DL_BIND";

/// Job execution configuration (directories, concurrency, defaults)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadConfig {
    /// Parent directory for per-job working directories (default: system temp dir)
    #[serde(default = "default_temp_root")]
    pub work_root: PathBuf,

    /// Parent directory for delivery copies (default: system temp dir)
    #[serde(default = "default_temp_root")]
    pub delivery_root: PathBuf,

    /// Maximum jobs running at once (default: 3)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_jobs: usize,

    /// Maximum jobs waiting for a worker slot (default: 64)
    ///
    /// Submissions beyond this are rejected rather than buffered without bound.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Output kind used when a request omits `format` (default: video)
    #[serde(default)]
    pub default_format: MediaFormat,

    /// Quality label used when a request omits `quality` (default: "720p")
    #[serde(default = "default_quality")]
    pub default_quality: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            work_root: default_temp_root(),
            delivery_root: default_temp_root(),
            max_concurrent_jobs: default_max_concurrent(),
            queue_capacity: default_queue_capacity(),
            default_format: MediaFormat::default(),
            default_quality: default_quality(),
        }
    }
}

/// Extraction tool settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ToolsConfig {
    /// Path to yt-dlp executable (auto-detected if None)
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,

    /// Whether to search PATH for yt-dlp if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Socket-level timeout handed to the engine, in seconds (default: 120)
    #[serde(default = "default_socket_timeout")]
    pub socket_timeout_secs: u64,

    /// Target codec for audio jobs (default: "mp3")
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Target audio quality in kbps (default: "192")
    #[serde(default = "default_audio_quality")]
    pub audio_quality: String,

    /// Container for merged video+audio (default: "mp4")
    #[serde(default = "default_merge_format")]
    pub merge_format: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            search_path: true,
            socket_timeout_secs: default_socket_timeout(),
            audio_codec: default_audio_codec(),
            audio_quality: default_audio_quality(),
            merge_format: default_merge_format(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:5001)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Serve Swagger UI at /swagger-ui (default: false)
    #[serde(default)]
    pub swagger_ui: bool,

    /// How long shutdown waits for running jobs, in seconds (default: 30)
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: false,
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

/// API and external server integration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

/// Main configuration for MediaDownloader
///
/// Fields are organized into logical sub-configs:
/// - [`download`](DownloadConfig) - directories, concurrency, request defaults
/// - [`tools`](ToolsConfig) - extraction binary and transcoding targets
/// - [`server`](ServerIntegrationConfig) - REST API
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Job execution settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Extraction tool settings
    #[serde(default)]
    pub tools: ToolsConfig,

    /// API settings
    #[serde(default)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Check settings that would make the service unusable
    pub fn validate(&self) -> Result<()> {
        if self.download.max_concurrent_jobs == 0 {
            return Err(Error::Config {
                message: "max_concurrent_jobs must be at least 1".to_string(),
                key: Some("max_concurrent_jobs".to_string()),
            });
        }
        if self.download.queue_capacity == 0 {
            return Err(Error::Config {
                message: "queue_capacity must be at least 1".to_string(),
                key: Some("queue_capacity".to_string()),
            });
        }
        if self.download.default_quality.parse::<crate::types::Quality>().is_err() {
            return Err(Error::Config {
                message: format!(
                    "default_quality '{}' is not 'best' or '<height>p'",
                    self.download.default_quality
                ),
                key: Some("default_quality".to_string()),
            });
        }
        Ok(())
    }

    /// Apply overrides from the process environment
    ///
    /// - `FRONTEND_URL` restricts CORS to that single origin
    /// - `MEDIA_DL_BIND` replaces the bind address
    pub fn apply_env_overrides(mut self) -> Result<Self> {
        if let Ok(origin) = std::env::var(FRONTEND_URL_ENV)
            && !origin.trim().is_empty()
        {
            tracing::info!(origin = %origin, "Restricting CORS to frontend origin");
            self.server.api.cors_origins = vec![origin.trim().to_string()];
        }

        if let Ok(bind) = std::env::var(BIND_ADDRESS_ENV) {
            self.server.api.bind_address = bind.parse().map_err(|e| Error::Config {
                message: format!("invalid bind address '{bind}': {e}"),
                key: Some(BIND_ADDRESS_ENV.to_string()),
            })?;
        }

        Ok(self)
    }
}

fn default_temp_root() -> PathBuf {
    std::env::temp_dir()
}

fn default_max_concurrent() -> usize {
    3
}

fn default_queue_capacity() -> usize {
    64
}

fn default_quality() -> String {
    "720p".to_string()
}

fn default_true() -> bool {
    true
}

fn default_socket_timeout() -> u64 {
    120
}

fn default_audio_codec() -> String {
    "mp3".to_string()
}

fn default_audio_quality() -> String {
    "192".to_string()
}

fn default_merge_format() -> String {
    "mp4".to_string()
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5001))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_shutdown_timeout() -> u64 {
    30
}
