//! Parser for yt-dlp command output

use super::traits::{EngineEvent, FormatInfo, MediaInfo, VideoInfo};
use crate::error::EngineError;
use serde::Deserialize;
use std::path::PathBuf;

/// Marker prefixed to lines produced by `--progress-template`
pub(crate) const PROGRESS_MARKER: &str = "[media-dl:progress]";

/// Marker prefixed to the final file path printed after post-processing
pub(crate) const FILE_MARKER: &str = "[media-dl:file]";

/// Marker prefixed to the media title printed before download
pub(crate) const TITLE_MARKER: &str = "[media-dl:title]";

/// Post-processor banners that follow a finished fetch
const POST_PROCESSOR_BANNERS: &[&str] = &["[Merger]", "[ExtractAudio]", "[VideoConvertor]"];

/// Number of trailing stderr lines used when no `ERROR:` line was printed
const DIAGNOSTIC_TAIL_LINES: usize = 5;

/// Interpretation of one stdout line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    /// Download progress
    Progress(EngineEvent),
    /// A post-processor started; the raw fetch is finished
    PostProcessing,
    /// Final path of the produced file
    File(PathBuf),
    /// Media title
    Title(String),
    /// Anything else
    Other,
}

/// Parse one line of yt-dlp stdout
pub fn parse_output_line(line: &str) -> OutputLine {
    let line = line.trim_end_matches(['\r', '\n']);

    if let Some(rest) = line.strip_prefix(PROGRESS_MARKER) {
        let rest = rest.trim();
        let (status, percent) = match rest.split_once(char::is_whitespace) {
            Some((status, percent)) => (status, Some(percent.trim())),
            None => (rest, None),
        };
        if status.is_empty() {
            return OutputLine::Other;
        }
        return OutputLine::Progress(EngineEvent::new(
            status,
            percent.filter(|p| !p.is_empty()),
        ));
    }

    if let Some(path) = line.strip_prefix(FILE_MARKER) {
        let path = path.trim();
        return if path.is_empty() || path == "NA" {
            OutputLine::Other
        } else {
            OutputLine::File(PathBuf::from(path))
        };
    }

    if let Some(title) = line.strip_prefix(TITLE_MARKER) {
        return OutputLine::Title(title.trim().to_string());
    }

    if POST_PROCESSOR_BANNERS.iter().any(|b| line.starts_with(b)) {
        return OutputLine::PostProcessing;
    }

    OutputLine::Other
}

/// Build failure diagnostics from captured stderr lines
///
/// `ERROR:` lines are preferred; otherwise the last few non-empty lines are
/// used, and if stderr was silent the exit code is reported.
pub fn collect_diagnostics(stderr_lines: &[String], exit_code: Option<i32>) -> String {
    let errors: Vec<&str> = stderr_lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| l.starts_with("ERROR:"))
        .collect();
    if !errors.is_empty() {
        return errors.join("\n");
    }

    let non_empty: Vec<&str> = stderr_lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();
    if !non_empty.is_empty() {
        let start = non_empty.len().saturating_sub(DIAGNOSTIC_TAIL_LINES);
        return non_empty[start..].join("\n");
    }

    match exit_code {
        Some(code) => format!("yt-dlp exited with status {code}"),
        None => "yt-dlp was terminated by a signal".to_string(),
    }
}

#[derive(Deserialize)]
struct RawInfo {
    #[serde(rename = "_type")]
    kind: Option<String>,
    title: Option<String>,
    duration: Option<f64>,
    #[serde(default)]
    formats: Vec<RawFormat>,
    entries: Option<Vec<serde_json::Value>>,
    playlist_count: Option<usize>,
}

#[derive(Deserialize)]
struct RawFormat {
    format_id: Option<String>,
    ext: Option<String>,
    height: Option<f64>,
    vcodec: Option<String>,
    acodec: Option<String>,
    filesize: Option<f64>,
    filesize_approx: Option<f64>,
}

impl From<RawFormat> for FormatInfo {
    fn from(raw: RawFormat) -> Self {
        FormatInfo {
            format_id: raw.format_id,
            ext: raw.ext,
            height: raw.height.filter(|h| *h > 0.0).map(|h| h as u32),
            vcodec: raw.vcodec,
            acodec: raw.acodec,
            filesize: raw
                .filesize
                .or(raw.filesize_approx)
                .filter(|s| *s >= 0.0)
                .map(|s| s as u64),
        }
    }
}

/// Parse the JSON document printed by `yt-dlp -J`
pub fn parse_probe_json(stdout: &[u8]) -> Result<MediaInfo, EngineError> {
    let raw: RawInfo = serde_json::from_slice(stdout)
        .map_err(|e| EngineError::MalformedOutput(format!("invalid probe JSON: {e}")))?;

    let is_playlist = matches!(raw.kind.as_deref(), Some("playlist" | "multi_video"))
        || raw.entries.is_some();
    if is_playlist {
        let count = raw
            .playlist_count
            .or_else(|| raw.entries.as_ref().map(Vec::len));
        return Ok(MediaInfo::Playlist {
            title: raw.title,
            count,
        });
    }

    Ok(MediaInfo::Video(VideoInfo {
        title: raw.title.unwrap_or_else(|| "Unknown".to_string()),
        duration: raw.duration,
        formats: raw.formats.into_iter().map(FormatInfo::from).collect(),
    }))
}
