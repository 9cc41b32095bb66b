//! REST API server example
//!
//! Runs media-dl with the REST API enabled until SIGINT/SIGTERM.
//!
//! Environment:
//! - `RUST_LOG` - log filter (default `media_dl=info,tower_http=info`)
//! - `FRONTEND_URL` - restrict CORS to this origin
//! - `MEDIA_DL_BIND` - bind address (default `127.0.0.1:5001`)
//!
//! After starting, you can:
//! - Submit a job: `curl -X POST localhost:5001/api/download -H 'Content-Type: application/json' -d '{"url": "https://...", "format": "video", "quality": "720p"}'`
//! - Poll it: `curl localhost:5001/api/status/<task_id>`
//! - Fetch the file once: `curl -OJ localhost:5001/api/download-file/<task_id>`

use media_dl::{Config, MediaDownloader, run_with_shutdown};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("media_dl=info,tower_http=info")),
        )
        .init();

    let mut config = Config::default().apply_env_overrides()?;
    config.server.api.swagger_ui = true;

    let downloader = MediaDownloader::new(config.clone()).await?;

    println!("media-dl listening on http://{}", config.server.api.bind_address);
    println!("Extraction engine: {}", downloader.engine_name());
    println!("Swagger UI: http://{}/swagger-ui", config.server.api.bind_address);

    run_with_shutdown(downloader).await?;
    Ok(())
}
