//! CLI-based extraction engine using the external yt-dlp binary

use super::options::EngineOptions;
use super::parser::{
    FILE_MARKER, OutputLine, PROGRESS_MARKER, TITLE_MARKER, collect_diagnostics,
    parse_output_line, parse_probe_json,
};
use super::traits::{
    EngineEvent, ExtractRequest, Extraction, ExtractionEngine, MediaInfo, ProgressSink,
};
use crate::error::EngineError;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Maximum stderr lines retained for diagnostics
const STDERR_RETAINED_LINES: usize = 200;

/// CLI-based extraction engine using the external yt-dlp binary
///
/// Runs `yt-dlp` as a child process per job, reads progress from its
/// stdout line by line, and keeps stderr for failure diagnostics.
///
/// # Examples
///
/// ```no_run
/// use media_dl::engine::YtDlpEngine;
/// use std::path::PathBuf;
///
/// // Create with explicit path
/// let engine = YtDlpEngine::new(PathBuf::from("/usr/local/bin/yt-dlp"));
///
/// // Or auto-discover from PATH
/// let engine = YtDlpEngine::from_path().expect("yt-dlp not found in PATH");
/// ```
pub struct YtDlpEngine {
    binary_path: PathBuf,
    probe_timeout: Duration,
}

impl YtDlpEngine {
    /// Create a new engine with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self {
            binary_path,
            probe_timeout: Duration::from_secs(120),
        }
    }

    /// Attempt to find yt-dlp in PATH
    pub fn from_path() -> Option<Self> {
        which::which("yt-dlp").ok().map(Self::new)
    }

    /// Socket timeout used for metadata probes
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Path of the binary this engine runs
    pub fn binary_path(&self) -> &std::path::Path {
        &self.binary_path
    }

    fn tool_name(&self) -> String {
        self.binary_path.display().to_string()
    }

    /// Command-line arguments for one extraction
    pub(crate) fn extract_args(request: &ExtractRequest) -> Vec<OsString> {
        let options: &EngineOptions = &request.options;
        let mut args: Vec<OsString> = vec![
            "--newline".into(),
            "--no-playlist".into(),
            "--no-colors".into(),
            "--progress".into(),
            "--progress-template".into(),
            format!(
                "download:{PROGRESS_MARKER} %(progress.status)s %(progress._percent_str)s"
            )
            .into(),
            "--print".into(),
            format!("before_dl:{TITLE_MARKER} %(title)s").into(),
            "--print".into(),
            format!("after_move:{FILE_MARKER} %(filepath)s").into(),
            "--socket-timeout".into(),
            options.socket_timeout.as_secs().to_string().into(),
            "-f".into(),
            options.format_selector.clone().into(),
        ];

        if let Some(merge) = &options.merge_format {
            args.push("--merge-output-format".into());
            args.push(merge.clone().into());
        }

        if let Some(audio) = &options.extract_audio {
            args.push("-x".into());
            args.push("--audio-format".into());
            args.push(audio.codec.clone().into());
            args.push("--audio-quality".into());
            args.push(format!("{}K", audio.quality).into());
        }

        args.push("-o".into());
        args.push(request.output_dir.join(&options.output_template).into_os_string());
        args.push("--".into());
        args.push(request.url.clone().into());
        args
    }
}

#[async_trait]
impl ExtractionEngine for YtDlpEngine {
    async fn extract(
        &self,
        request: ExtractRequest,
        progress: ProgressSink,
    ) -> Result<Extraction, EngineError> {
        let mut child = Command::new(&self.binary_path)
            .args(Self::extract_args(&request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::Spawn {
                tool: self.tool_name(),
                reason: e.to_string(),
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::MalformedOutput("stdout was not captured".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::MalformedOutput("stderr was not captured".into()))?;

        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut kept: Vec<String> = Vec::new();
            while let Ok(Some(line)) = lines.next_line().await {
                if kept.len() == STDERR_RETAINED_LINES {
                    kept.remove(0);
                }
                kept.push(line);
            }
            kept
        });

        let mut title = None;
        let mut output_path = None;
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| EngineError::MalformedOutput(format!("reading stdout: {e}")))?
        {
            match parse_output_line(&line) {
                OutputLine::Progress(event) => progress.report(event).await,
                OutputLine::PostProcessing => {
                    progress.report(EngineEvent::new("finished", None)).await
                }
                OutputLine::File(path) => output_path = Some(path),
                OutputLine::Title(t) => title = Some(t),
                OutputLine::Other => tracing::trace!(line = %line, "yt-dlp"),
            }
        }

        let status = child.wait().await.map_err(|e| EngineError::Spawn {
            tool: self.tool_name(),
            reason: e.to_string(),
        })?;
        let stderr_lines = stderr_task.await.unwrap_or_default();

        if !status.success() {
            return Err(EngineError::Failed {
                diagnostics: collect_diagnostics(&stderr_lines, status.code()),
            });
        }

        let output_path = output_path.ok_or_else(|| {
            EngineError::MalformedOutput("yt-dlp did not report an output file".into())
        })?;

        Ok(Extraction { title, output_path })
    }

    async fn probe(&self, url: &str) -> Result<MediaInfo, EngineError> {
        let output = Command::new(&self.binary_path)
            .arg("-J")
            .arg("--flat-playlist")
            .arg("--no-warnings")
            .arg("--socket-timeout")
            .arg(self.probe_timeout.as_secs().to_string())
            .arg("--")
            .arg(url)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| EngineError::Spawn {
                tool: self.tool_name(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lines: Vec<String> = stderr.lines().map(str::to_string).collect();
            return Err(EngineError::Failed {
                diagnostics: collect_diagnostics(&lines, output.status.code()),
            });
        }

        parse_probe_json(&output.stdout)
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}
