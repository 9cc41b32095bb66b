//! Preview handler: report title and available qualities before downloading.

use super::{PreviewRequest, PreviewResponse};
use crate::api::AppState;
use crate::api::error_response::bad_request;
use crate::classify::classify;
use crate::error::{ApiError, Error, ToHttpStatus};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// POST /api/preview - Probe a URL without downloading
#[utoipa::path(
    post,
    path = "/api/preview",
    tag = "preview",
    request_body = PreviewRequest,
    responses(
        (status = 200, description = "Title, duration and selectable qualities", body = PreviewResponse),
        (status = 400, description = "Missing URL or playlist URL", body = ApiError),
        (status = 500, description = "Metadata lookup failed", body = ApiError)
    )
)]
pub async fn preview(
    State(state): State<AppState>,
    payload: Result<Json<PreviewRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    let Some(url) = request.url.filter(|url| !url.trim().is_empty()) else {
        return bad_request("URL is required");
    };

    match state.downloader.preview(&url).await {
        Ok(preview) => (StatusCode::OK, Json(PreviewResponse::from(preview))).into_response(),
        Err(Error::Validation(message)) => bad_request(message),
        Err(e @ Error::Engine(_)) => {
            let classified = classify(&e.raw_diagnostics());
            tracing::warn!(
                url = %url,
                category = ?classified.category,
                "Preview failed"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::new(e.error_code(), classified.message)),
            )
                .into_response()
        }
        Err(e) => e.into_response(),
    }
}
