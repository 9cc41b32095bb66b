//! Task handlers: submit, poll status, fetch the finished file.

use super::{SubmitRequest, SubmitResponse};
use crate::api::AppState;
use crate::api::error_response::{bad_request, not_found};
use crate::types::{MediaFormat, TaskId};
use axum::{
    Json,
    body::Body,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::path::Path as FsPath;

/// POST /api/download - Submit a download job
#[utoipa::path(
    post,
    path = "/api/download",
    tag = "tasks",
    request_body = SubmitRequest,
    responses(
        (status = 202, description = "Job accepted", body = SubmitResponse),
        (status = 400, description = "Missing URL or invalid format", body = crate::error::ApiError),
        (status = 503, description = "Queue full or shutting down", body = crate::error::ApiError)
    )
)]
pub async fn submit_download(
    State(state): State<AppState>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    let Some(url) = request.url.filter(|url| !url.trim().is_empty()) else {
        return bad_request("URL is required");
    };

    let format = match request.format.as_deref() {
        None => state.config.download.default_format,
        Some(raw) => match raw.parse::<MediaFormat>() {
            Ok(format) => format,
            Err(message) => return bad_request(message),
        },
    };

    let quality = request
        .quality
        .filter(|quality| !quality.trim().is_empty())
        .unwrap_or_else(|| state.config.download.default_quality.clone());

    match state.downloader.submit(url, format, quality).await {
        Ok(task_id) => (
            StatusCode::ACCEPTED,
            Json(SubmitResponse {
                status: "accepted".to_string(),
                task_id,
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /api/status/:task_id - Poll a task
#[utoipa::path(
    get,
    path = "/api/status/{task_id}",
    tag = "tasks",
    params(
        ("task_id" = String, Path, description = "Task ID returned by submission")
    ),
    responses(
        (status = 200, description = "Current task state", body = crate::types::TaskInfo),
        (status = 404, description = "Task not found", body = crate::error::ApiError)
    )
)]
pub async fn get_status(State(state): State<AppState>, Path(task_id): Path<String>) -> Response {
    let Ok(id) = task_id.parse::<TaskId>() else {
        return not_found("task_not_found", "Task not found");
    };

    match state.downloader.status(id).await {
        Ok(info) => (StatusCode::OK, Json(info)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /api/download-file/:task_id - Fetch the finished file (once)
///
/// The task is forgotten as soon as the transfer starts; a second request
/// returns 404.
#[utoipa::path(
    get,
    path = "/api/download-file/{task_id}",
    tag = "tasks",
    params(
        ("task_id" = String, Path, description = "Task ID returned by submission")
    ),
    responses(
        (status = 200, description = "File contents as an attachment", content_type = "application/octet-stream"),
        (status = 404, description = "File not ready or task not found", body = crate::error::ApiError)
    )
)]
pub async fn download_file(State(state): State<AppState>, Path(task_id): Path<String>) -> Response {
    let Ok(id) = task_id.parse::<TaskId>() else {
        return not_found("task_not_found", "File not ready or task not found");
    };

    let copy = match state.downloader.take_delivery(id).await {
        Ok(copy) => copy,
        Err(e) => return e.into_response(),
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(copy.path())),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(copy.len()));
    headers.insert(
        header::CONTENT_DISPOSITION,
        content_disposition(copy.filename()),
    );

    tracing::info!(
        task_id = %id,
        filename = %copy.filename(),
        bytes = copy.len(),
        "Delivering file"
    );

    match copy.into_stream().await {
        Ok(stream) => (StatusCode::OK, headers, Body::from_stream(stream)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// MIME type guessed from the file extension
pub(crate) fn content_type_for(path: &FsPath) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match ext.as_deref() {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("mov") => "video/quicktime",
        Some("mp3") => "audio/mpeg",
        Some("m4a") | Some("aac") => "audio/mp4",
        Some("opus") | Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("wav") => "audio/wav",
        _ => "application/octet-stream",
    }
}

/// `attachment` disposition carrying both an ASCII fallback and the exact UTF-8 name
pub(crate) fn content_disposition(filename: &str) -> HeaderValue {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let value = format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        urlencoding::encode(filename)
    );

    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
