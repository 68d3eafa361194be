//! Shared helpers for the external-tool-backed processors.
//!
//! Every processor in this module shells out to a CLI rather than linking a codec
//! library directly.

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::processors::traits::ProgressSink;

pub const VIDEO_EXTENSIONS: &[&str] =
    &["mp4", "mkv", "webm", "mov", "flv", "avi", "wmv", "m4v", "ts", "mts", "m2ts", "3gp", "ogv"];
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "aac", "m4a", "ogg", "opus", "flac", "wav"];
pub const IMAGE_EXTENSIONS: &[&str] =
    &["jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "tif", "ico", "avif"];

pub fn extension_with_dot(path: &Path) -> Option<String> {
    path.extension().and_then(|s| s.to_str()).map(|s| format!(".{}", s.to_lowercase()))
}

pub fn ffmpeg_path() -> String {
    std::env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string())
}

fn ffprobe_path() -> String {
    std::env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string())
}

pub fn qpdf_path() -> String {
    std::env::var("QPDF_PATH").unwrap_or_else(|_| "qpdf".to_string())
}

/// Read a dimension option (`{"original"} | integer`) and turn it into an ffmpeg
/// `scale=-2:H` filter, or `None` when the caller asked to keep the original size.
pub fn dimension_scale_filter(options: &serde_json::Value, field: &str) -> Option<String> {
    match options.get(field) {
        Some(serde_json::Value::Number(n)) => n.as_i64().map(|h| format!("scale=-2:{h}")),
        _ => None,
    }
}

/// Probe a media file's duration via `ffprobe`. Returns `None` if the tool is missing,
/// the file has no discoverable duration, or the probe fails for any reason; callers
/// fall back to an indeterminate progress estimate in that case.
pub async fn probe_duration_ms(input: &Path) -> Option<u64> {
    let output = Command::new(ffprobe_path())
        .args(["-v", "error", "-show_entries", "format=duration", "-of", "default=noprint_wrappers=1:nokey=1"])
        .arg(input)
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout);
    let seconds: f64 = text.trim().parse().ok()?;
    Some((seconds * 1000.0) as u64)
}

/// Run an ffmpeg invocation built with `-progress pipe:1 -nostats`, translating
/// `out_time_ms=`/`progress=` key-value lines on stdout into `ProgressSink` calls.
/// `total_duration_ms` is used to turn elapsed output time into a percentage; when
/// unknown, progress is reported as an indeterminate midpoint until completion.
pub async fn run_ffmpeg_with_progress(
    cmd: &mut Command,
    total_duration_ms: Option<u64>,
    progress: &dyn ProgressSink,
) -> Result<()> {
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    let mut child = cmd.spawn().map_err(|e| Error::ProcessingFailure(format!("failed to spawn ffmpeg: {e}")))?;

    let stdout = child.stdout.take().expect("stdout piped");
    let stderr = child.stderr.take().expect("stderr piped");

    let stderr_task = tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        let mut last = String::new();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!("ffmpeg: {line}");
            last = line;
        }
        last
    });

    let mut lines = BufReader::new(stdout).lines();
    let mut out_time_ms: Option<u64> = None;
    while let Ok(Some(line)) = lines.next_line().await {
        let Some((key, value)) = line.split_once('=') else { continue };
        let value = value.trim();
        match key.trim() {
            "out_time_ms" => out_time_ms = value.parse::<u64>().ok(),
            "progress" if value == "end" => {
                progress.on_progress(100.0, "Finishing up").await;
            }
            "progress" => {
                let percent = match (out_time_ms, total_duration_ms) {
                    (Some(done), Some(total)) if total > 0 => (done as f64 / total as f64 * 100.0).clamp(1.0, 99.0),
                    _ => 50.0,
                };
                progress.on_progress(percent, "Encoding").await;
            }
            _ => {}
        }
    }

    let status = child.wait().await.map_err(|e| Error::ProcessingFailure(format!("ffmpeg wait failed: {e}")))?;
    let last_stderr_line = stderr_task.await.unwrap_or_default();

    if !status.success() {
        return Err(Error::ProcessingFailure(format!(
            "ffmpeg exited with {}: {}",
            status.code().map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string()),
            if last_stderr_line.is_empty() { "no output" } else { &last_stderr_line }
        )));
    }
    Ok(())
}

/// Run a non-ffmpeg subprocess to completion, surfacing its last stderr line on failure.
pub async fn run_to_completion(cmd: &mut Command, tool: &str) -> Result<()> {
    cmd.stdout(Stdio::null()).stderr(Stdio::piped());
    let mut child = cmd.spawn().map_err(|e| Error::ProcessingFailure(format!("failed to spawn {tool}: {e}")))?;
    let stderr = child.stderr.take().expect("stderr piped");

    let mut lines = BufReader::new(stderr).lines();
    let mut last = String::new();
    while let Ok(Some(line)) = lines.next_line().await {
        warn!("{tool}: {line}");
        last = line;
    }

    let status = child.wait().await.map_err(|e| Error::ProcessingFailure(format!("{tool} wait failed: {e}")))?;
    if !status.success() {
        return Err(Error::ProcessingFailure(format!(
            "{tool} exited with {}: {}",
            status.code().map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string()),
            if last.is_empty() { "no output" } else { &last }
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scale_filter_for_integer_dimension() {
        let opts = json!({"resolution": 720});
        assert_eq!(dimension_scale_filter(&opts, "resolution"), Some("scale=-2:720".to_string()));
    }

    #[test]
    fn no_scale_filter_for_original() {
        let opts = json!({"resolution": "original"});
        assert_eq!(dimension_scale_filter(&opts, "resolution"), None);
    }

    #[test]
    fn no_scale_filter_when_absent() {
        assert_eq!(dimension_scale_filter(&json!({}), "resolution"), None);
    }

    #[test]
    fn extension_with_dot_lowercases() {
        assert_eq!(extension_with_dot(Path::new("Photo.PNG")), Some(".png".to_string()));
        assert_eq!(extension_with_dot(Path::new("noext")), None);
    }
}
