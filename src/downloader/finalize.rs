//! Output filename reconciliation after a successful extraction.

use std::path::{Path, PathBuf};

use crate::types::{MediaFormat, Quality};

/// Source extensions the audio post-processor is known to replace
const AUDIO_SOURCE_EXTENSIONS: &[&str] = &["webm", "m4a", "opus", "ogg", "aac", "mp4"];

/// Resolve the path of the job's final artifact
///
/// Never fails: the returned path may not exist, which the caller reports as
/// a missing artifact.
pub(crate) async fn reconcile_output(
    format: MediaFormat,
    quality: Option<Quality>,
    reported: &Path,
    audio_codec: &str,
) -> PathBuf {
    match (format, quality) {
        (MediaFormat::Audio, _) => resolve_audio_path(reported, audio_codec).await,
        (MediaFormat::Video, Some(quality)) => label_video(reported, &quality.label()).await,
        (MediaFormat::Video, None) => reported.to_path_buf(),
    }
}

/// Find the transcoded audio file next to the path the engine reported
///
/// Tries the reported stem with the target codec first, then known extension
/// substitutions. The unconverted source never counts as the result.
async fn resolve_audio_path(reported: &Path, codec: &str) -> PathBuf {
    let expected = reported.with_extension(codec);

    for candidate in audio_candidates(reported, codec) {
        if exists(&candidate).await {
            if candidate != expected {
                tracing::debug!(
                    expected = %expected.display(),
                    found = %candidate.display(),
                    "audio output found under substituted name"
                );
            }
            return candidate;
        }
    }

    expected
}

fn audio_candidates(reported: &Path, codec: &str) -> Vec<PathBuf> {
    let mut candidates = vec![reported.with_extension(codec)];

    if let Some(name) = reported.file_name().map(|n| n.to_string_lossy().into_owned()) {
        let target = format!(".{codec}");
        for ext in AUDIO_SOURCE_EXTENSIONS {
            let source = format!(".{ext}");
            if name.contains(&source) {
                let candidate = reported.with_file_name(name.replace(&source, &target));
                if !candidates.contains(&candidate) {
                    candidates.push(candidate);
                }
            }
        }
    }

    candidates
}

/// `Title.mp4` with label `720p` becomes `Title_720p.mp4`
pub(crate) fn with_quality_label(path: &Path, label: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_{label}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{label}"),
    };
    path.with_file_name(name)
}

/// Rename a video to carry its quality label, keeping the original name on
/// any obstacle
async fn label_video(reported: &Path, label: &str) -> PathBuf {
    let target = with_quality_label(reported, label);

    if !exists(reported).await {
        return reported.to_path_buf();
    }
    if exists(&target).await {
        tracing::debug!(target = %target.display(), "labelled name taken, keeping original");
        return reported.to_path_buf();
    }

    match tokio::fs::rename(reported, &target).await {
        Ok(()) => target,
        Err(e) => {
            tracing::warn!(
                from = %reported.display(),
                to = %target.display(),
                error = %e,
                "rename failed, keeping original filename"
            );
            reported.to_path_buf()
        }
    }
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
