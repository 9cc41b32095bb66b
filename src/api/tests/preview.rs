use super::*;
use crate::engine::{FormatInfo, MediaInfo, VideoInfo};
use serde_json::json as body;

fn format(id: &str, height: Option<u32>, vcodec: &str, acodec: &str, size: u64) -> FormatInfo {
    FormatInfo {
        format_id: Some(id.to_string()),
        ext: Some("webm".to_string()),
        height,
        vcodec: Some(vcodec.to_string()),
        acodec: Some(acodec.to_string()),
        filesize: Some(size),
    }
}

async fn preview(engine: ScriptedEngine, payload: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let (downloader, _temp_dir) = create_test_downloader(engine).await;
    let app = test_router(&downloader);
    let (status, _, bytes) = send(&app, post_json("/api/preview", payload)).await;
    (status, json(&bytes))
}

#[tokio::test]
async fn test_preview_lists_qualities_high_to_low() {
    let engine = ScriptedEngine::producing("a.mp4", "a.mp4").with_probe(Ok(MediaInfo::Video(
        VideoInfo {
            title: "Test Video".to_string(),
            duration: Some(212.0),
            formats: vec![
                format("18", Some(360), "avc1", "mp4a", 1_000),
                format("137", Some(1080), "avc1", "none", 9_000),
                format("136", Some(720), "avc1", "none", 4_000),
                format("247", Some(720), "vp9", "none", 5_000),
                format("251", None, "none", "opus", 300),
            ],
        },
    )));

    let (status, response) = preview(engine, body!({"url": "https://x/watch?v=1"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], "success");
    assert_eq!(response["type"], "video");
    assert_eq!(response["title"], "Test Video");
    assert_eq!(response["duration"], 212.0);

    let qualities: Vec<&str> = response["formats"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["quality"].as_str().unwrap())
        .collect();
    assert_eq!(qualities, vec!["1080p", "720p", "360p", "audio"]);
    assert_eq!(response["formats"][1]["format_id"], "247");
    assert_eq!(response["formats"][3]["type"], "audio");
    assert_eq!(response["formats"][3]["ext"], "mp3");
}

#[tokio::test]
async fn test_preview_requires_url() {
    let (status, response) =
        preview(ScriptedEngine::producing("a.mp4", "a.mp4"), body!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["message"], "URL is required");
}

#[tokio::test]
async fn test_preview_rejects_playlists() {
    let engine = ScriptedEngine::producing("a.mp4", "a.mp4").with_probe(Ok(MediaInfo::Playlist {
        title: Some("Mix".to_string()),
        count: Some(12),
    }));

    let (status, response) =
        preview(engine, body!({"url": "https://x/playlist?list=PL1"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["status"], "error");
    assert_eq!(response["message"], "Playlists are not supported");
}

#[tokio::test]
async fn test_preview_engine_failure_is_classified_500() {
    let engine = ScriptedEngine::producing("a.mp4", "a.mp4").with_probe(Err(
        "ERROR: [youtube] x: Sign in to confirm you're not a bot".to_string(),
    ));

    let (status, response) = preview(engine, body!({"url": "https://x/watch?v=1"})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response["status"], "error");
    let expected = crate::classify::classify("Sign in to confirm you're not a bot").message;
    assert_eq!(response["message"], expected);
}
