//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the media-dl REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the media-dl REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation (when enabled)
#[derive(OpenApi)]
#[openapi(
    info(
        title = "media-dl REST API",
        version = "0.1.0",
        description = "Submit media download jobs, poll their progress, and fetch each finished file once",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:5001", description = "Local development server")
    ),
    paths(
        // Tasks
        crate::api::routes::submit_download,
        crate::api::routes::get_status,
        crate::api::routes::download_file,

        // Preview
        crate::api::routes::preview,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::queue_stats,
    ),
    components(schemas(
        crate::types::TaskId,
        crate::types::TaskStatus,
        crate::types::MediaFormat,
        crate::types::TaskInfo,
        crate::types::QueueStats,
        crate::preview::PreviewFormat,

        crate::api::routes::SubmitRequest,
        crate::api::routes::SubmitResponse,
        crate::api::routes::PreviewRequest,
        crate::api::routes::PreviewResponse,

        crate::error::ApiError,
    )),
    tags(
        (name = "tasks", description = "Download jobs - Submit, poll status, fetch the finished file"),
        (name = "preview", description = "Metadata preview - Title, duration and qualities before downloading"),
        (name = "system", description = "System endpoints - Health check, OpenAPI spec, queue statistics"),
    )
)]
pub struct ApiDoc;
