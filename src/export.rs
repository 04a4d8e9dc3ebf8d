//! Export orchestration over a timeline snapshot.
//!
//! Chooses destinations and file names, then delegates the media work to
//! `splitforge_av`. The timeline is only read.

use std::path::{Path, PathBuf};
use std::time::Duration;

use splitforge_av::{
    cut_segment, merge_segments, ExportOptions, ExportProgress, ExportedFile, ToolRegistry,
};
use splitforge_core::{Error, Result, SegmentId};
use splitforge_timeline::{Segment, Timeline};
use tokio_util::sync::CancellationToken;

use crate::config::{Config, ExportConfig};

/// Export tooling and settings bundled for one run.
pub struct Exporter {
    tools: ToolRegistry,
    config: ExportConfig,
}

impl Exporter {
    pub fn new(tools: ToolRegistry, config: ExportConfig) -> Self {
        Self { tools, config }
    }

    /// Discover tools with the configured overrides and timeout.
    pub fn from_config(config: &Config) -> Self {
        let tools = ToolRegistry::discover_with_timeout(
            &config.tools,
            Duration::from_secs(config.export.timeout_secs),
        );
        Self::new(tools, config.export.clone())
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Directory exports of `source` go to.
    pub fn output_dir(&self, source: &Path) -> PathBuf {
        self.config.resolved_output_dir().unwrap_or_else(|| {
            source
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
        })
    }

    fn options(&self, cancel: Option<CancellationToken>) -> ExportOptions {
        ExportOptions {
            overwrite: self.config.overwrite,
            cancel,
        }
    }

    /// Cut one segment into its own file.
    ///
    /// `dest` defaults to [`segment_file_name`] inside [`Exporter::output_dir`].
    pub async fn export_segment(
        &self,
        source: &Path,
        timeline: &Timeline,
        id: SegmentId,
        dest: Option<PathBuf>,
        on_progress: impl FnMut(ExportProgress),
        cancel: Option<CancellationToken>,
    ) -> Result<ExportedFile> {
        let index = timeline
            .segment_index(id)
            .ok_or_else(|| Error::not_found("segment", id))?;
        let segment = &timeline.segments()[index];
        let dest = dest.unwrap_or_else(|| {
            self.output_dir(source)
                .join(segment_file_name(source, index, segment))
        });

        cut_segment(
            &self.tools,
            source,
            segment.start_time,
            segment.end_time,
            &dest,
            &self.options(cancel),
            on_progress,
        )
        .await
    }

    /// Export every selected segment, either as separate files or merged
    /// into one. Segments keep timeline order.
    pub async fn export_selected(
        &self,
        source: &Path,
        timeline: &Timeline,
        merge: bool,
        mut on_progress: impl FnMut(ExportProgress),
        cancel: Option<CancellationToken>,
    ) -> Result<Vec<ExportedFile>> {
        let selected: Vec<&Segment> = timeline.selected_segments().collect();
        if selected.is_empty() {
            return Err(Error::Validation("no segments are selected".into()));
        }

        let dir = self.output_dir(source);
        let options = self.options(cancel);

        if merge {
            let segments: Vec<Segment> = selected.into_iter().cloned().collect();
            let (file, name) =
                merge_segments(&self.tools, source, &segments, &dir, &options, on_progress).await?;
            tracing::info!("Merged {} segments into {name}", segments.len());
            return Ok(vec![file]);
        }

        let total: f64 = selected.iter().map(|s| s.duration()).sum();
        let mut done = 0.0;
        let mut files = Vec::with_capacity(selected.len());
        for segment in selected {
            // Files are numbered by timeline position, not by selection order.
            let index = timeline.segment_index(segment.id).unwrap_or_default();
            let from = 100.0 * done / total;
            let to = 100.0 * (done + segment.duration()) / total;
            let dest = dir.join(segment_file_name(source, index, segment));
            let file = cut_segment(
                &self.tools,
                source,
                segment.start_time,
                segment.end_time,
                &dest,
                &options,
                |p| on_progress(p.scaled(from, to)),
            )
            .await?;
            tracing::info!("Exported {} to {:?}", segment.name, file.path);
            done += segment.duration();
            files.push(file);
        }
        Ok(files)
    }
}

/// File name for a single-segment export:
/// `<stem>_<NN>_<segment name>.<ext>`, with the name reduced to characters
/// safe on every filesystem.
pub fn segment_file_name(source: &Path, index: usize, segment: &Segment) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "export".to_string());
    let ext = splitforge_av::export::output_extension(source);
    format!("{stem}_{:02}_{}.{ext}", index + 1, sanitize(&segment.name))
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "segment".to_string()
    } else {
        cleaned
    }
}
