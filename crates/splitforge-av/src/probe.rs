//! Source probing with `ffprobe -show_format`.
//!
//! Only the container-level facts a split session needs are extracted: the
//! file name and size the state cache keys on, and the duration the timeline
//! is opened with.

use std::path::Path;

use serde::{Deserialize, Serialize};
use splitforge_core::{Error, Result};

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// Container-level facts about a source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub file_name: String,
    /// Size in bytes, from the filesystem.
    pub file_size: u64,
    /// Duration in seconds.
    pub duration: f64,
    /// Container name as reported by ffprobe (e.g. `mov,mp4,m4a,3gp,3g2,mj2`).
    pub format_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    duration: Option<String>,
}

/// Probe `path` with ffprobe.
///
/// # Errors
///
/// [`Error::FileNotFound`] when the path does not exist, [`Error::Tool`]
/// when ffprobe is missing or fails, and [`Error::Validation`] when the
/// source has no positive duration.
pub async fn probe(tools: &ToolRegistry, path: &Path) -> Result<MediaInfo> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::file_not_found(path));
        }
        Err(e) => return Err(e.into()),
    };

    let ffprobe = tools.require("ffprobe")?;
    let output = ToolCommand::for_tool(ffprobe)
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path.to_string_lossy().as_ref())
        .execute()
        .await?;

    let info = parse_ffprobe_output(path, metadata.len(), &output.stdout)?;
    tracing::info!(
        file = %info.file_name,
        size = info.file_size,
        duration = info.duration,
        "probed source"
    );
    Ok(info)
}

/// Map ffprobe's JSON output to [`MediaInfo`].
pub fn parse_ffprobe_output(path: &Path, file_size: u64, json: &str) -> Result<MediaInfo> {
    let ff: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| Error::tool("ffprobe", format!("JSON parse error: {e}")))?;

    let duration = ff
        .format
        .duration
        .as_deref()
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| {
            Error::Validation(format!("{} has no usable duration", path.display()))
        })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(MediaInfo {
        file_name,
        file_size,
        duration,
        format_name: ff.format.format_name,
    })
}
