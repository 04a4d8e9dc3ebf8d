//! Ordered, lossless concatenation of several ranges.

use std::path::{Path, PathBuf};

use splitforge_core::{Error, Result};
use splitforge_timeline::Segment;

use super::cut::{check_range, run_cut};
use super::{
    merged_file_name, output_extension, ExportOptions, ExportProgress, ExportedFile,
    ProgressParser,
};
use crate::command::ToolCommand;
use crate::tools::ToolRegistry;
use crate::workspace::Workspace;

/// Share of the overall progress spent cutting; the rest is the concat pass.
const CUT_SHARE: f64 = 90.0;

/// Contents of an ffmpeg concat-demuxer list for `parts`, in order.
pub fn concat_list(parts: &[PathBuf]) -> String {
    parts
        .iter()
        .map(|p| format!("file '{}'\n", p.to_string_lossy().replace('\'', r"'\''")))
        .collect()
}

/// Cut each of `segments` from `source` and join them, in the order given,
/// into `<output_dir>/<stem>_merged.<ext>`.
///
/// Returns the finished file and its file name.
pub async fn merge_segments(
    tools: &ToolRegistry,
    source: &Path,
    segments: &[Segment],
    output_dir: &Path,
    options: &ExportOptions,
    mut on_progress: impl FnMut(ExportProgress),
) -> Result<(ExportedFile, String)> {
    if segments.is_empty() {
        return Err(Error::Validation("no segments to merge".into()));
    }
    for seg in segments {
        check_range(seg.start_time, seg.end_time)?;
    }
    if !source.exists() {
        return Err(Error::file_not_found(source));
    }

    let ext = output_extension(source);
    let file_name = merged_file_name(source);
    let dest = output_dir.join(&file_name);
    let workspace = Workspace::new_in(output_dir)?;
    let total: f64 = segments.iter().map(Segment::duration).sum();

    tracing::info!(
        source = %source.display(),
        segments = segments.len(),
        total,
        dest = %dest.display(),
        "merging segments"
    );

    let mut parts = Vec::with_capacity(segments.len());
    let mut done = 0.0;
    for (index, seg) in segments.iter().enumerate() {
        let part = workspace.temp_file(&format!("part_{index:04}.{ext}"));
        let from = CUT_SHARE * done / total;
        let to = CUT_SHARE * (done + seg.duration()) / total;
        tracing::debug!(index, name = %seg.name, start = seg.start_time, end = seg.end_time, "cutting part");

        run_cut(
            tools,
            source,
            seg.start_time,
            seg.end_time,
            &part,
            options,
            |p| on_progress(p.scaled(from, to)),
        )
        .await
        .map_err(|e| match e {
            Error::Tool { message, .. } => {
                Error::export(format!("cut {}", seg.name), message)
            }
            other => other,
        })?;

        done += seg.duration();
        parts.push(part);
    }

    let list = workspace.temp_file("concat.txt");
    std::fs::write(&list, concat_list(&parts))?;
    let joined = workspace.temp_file(&format!("merged.{ext}"));

    let ffmpeg = tools.require("ffmpeg")?;
    let mut parser = ProgressParser::new(total);
    ToolCommand::for_tool(ffmpeg)
        .args(["-y", "-progress", "pipe:2", "-nostats", "-f", "concat", "-safe", "0", "-i"])
        .arg(list.to_string_lossy())
        .args(["-c", "copy"])
        .arg(joined.to_string_lossy())
        .execute_with_stderr_callback(
            |line| {
                if let Some(p) = parser.feed(line) {
                    on_progress(p.scaled(CUT_SHARE, 100.0));
                }
            },
            options.cancel.clone(),
        )
        .await
        .map_err(|e| match e {
            Error::Tool { message, .. } => Error::export("concat", message),
            other => other,
        })?;

    let file = workspace.finalize(&joined, &dest, options.overwrite)?;
    on_progress(ExportProgress {
        percent: 100.0,
        speed: None,
    });
    tracing::info!(path = %file.path.display(), size = file.size, "merge complete");
    Ok((file, file_name))
}
