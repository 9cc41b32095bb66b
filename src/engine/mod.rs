//! Extraction engine seam
//!
//! The engine resolves a URL to retrievable media and performs the
//! fetch/transcode. The job runner only sees the [`ExtractionEngine`] trait:
//! - [`YtDlpEngine`] drives an external `yt-dlp` binary
//! - [`UnavailableEngine`] stands in when no binary is installed

mod cli;
mod options;
mod parser;
mod traits;
mod unavailable;

pub use cli::YtDlpEngine;
pub use options::{AudioTarget, EngineOptions};
pub use parser::{OutputLine, collect_diagnostics, parse_output_line, parse_probe_json};
pub use traits::{
    EngineEvent, ExtractRequest, Extraction, ExtractionEngine, FormatInfo, MediaInfo, ProgressSink,
    VideoInfo,
};
pub use unavailable::UnavailableEngine;
