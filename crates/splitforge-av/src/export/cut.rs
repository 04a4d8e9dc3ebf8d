//! Single-range extraction.

use std::path::Path;

use splitforge_core::{Error, Result};

use super::{output_extension, ExportOptions, ExportProgress, ExportedFile, ProgressParser};
use crate::command::ToolCommand;
use crate::tools::ToolRegistry;
use crate::workspace::Workspace;

/// ffmpeg arguments for a stream-copy cut of `start..end` into `output`.
///
/// The seek goes before `-i` so ffmpeg jumps straight to the nearest
/// keyframe instead of decoding from the start.
pub fn cut_args(source: &Path, start: f64, end: f64, output: &Path) -> Vec<String> {
    vec![
        "-y".into(),
        "-progress".into(),
        "pipe:2".into(),
        "-nostats".into(),
        "-ss".into(),
        format!("{start:.3}"),
        "-i".into(),
        source.to_string_lossy().to_string(),
        "-t".into(),
        format!("{:.3}", end - start),
        "-c".into(),
        "copy".into(),
        "-avoid_negative_ts".into(),
        "make_zero".into(),
        output.to_string_lossy().to_string(),
    ]
}

pub(super) fn check_range(start: f64, end: f64) -> Result<()> {
    if !(start >= 0.0 && end > start) {
        return Err(Error::Validation(format!(
            "invalid export range {start:.3}s..{end:.3}s"
        )));
    }
    Ok(())
}

/// Run one stream-copy cut into `output`, reporting progress of that run.
pub(super) async fn run_cut(
    tools: &ToolRegistry,
    source: &Path,
    start: f64,
    end: f64,
    output: &Path,
    options: &ExportOptions,
    mut on_progress: impl FnMut(ExportProgress),
) -> Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;
    let mut parser = ProgressParser::new(end - start);

    ToolCommand::for_tool(ffmpeg)
        .args(cut_args(source, start, end, output))
        .execute_with_stderr_callback(
            |line| {
                if let Some(p) = parser.feed(line) {
                    on_progress(p);
                }
            },
            options.cancel.clone(),
        )
        .await?;
    Ok(())
}

/// Losslessly extract `start..end` of `source` into `dest`.
///
/// The cut is written inside a [`Workspace`] next to `dest` and moved into
/// place when ffmpeg succeeds, so a failed or cancelled export never leaves a
/// partial file at `dest`.
pub async fn cut_segment(
    tools: &ToolRegistry,
    source: &Path,
    start: f64,
    end: f64,
    dest: &Path,
    options: &ExportOptions,
    mut on_progress: impl FnMut(ExportProgress),
) -> Result<ExportedFile> {
    check_range(start, end)?;
    if !source.exists() {
        return Err(Error::file_not_found(source));
    }

    let dir = dest.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let workspace = Workspace::new_in(dir)?;
    let produced = workspace.temp_file(&format!("cut.{}", output_extension(source)));

    tracing::info!(
        source = %source.display(),
        start,
        end,
        dest = %dest.display(),
        "cutting segment"
    );

    run_cut(tools, source, start, end, &produced, options, &mut on_progress).await?;
    let file = workspace.finalize(&produced, dest, options.overwrite)?;
    on_progress(ExportProgress {
        percent: 100.0,
        speed: None,
    });
    Ok(file)
}
