//! Lossless export of timeline ranges.
//!
//! [`cut_segment`] stream-copies one range of the source into its own file.
//! [`merge_segments`] cuts several ranges and joins them, in the order given,
//! with ffmpeg's concat demuxer. Neither re-encodes. Both report progress in
//! percent through a callback and stop early when their
//! [`CancellationToken`] fires.

mod cut;
mod merge;
pub mod progress;

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

pub use cut::{cut_args, cut_segment};
pub use merge::{concat_list, merge_segments};
pub use progress::{ExportProgress, ProgressParser};

/// A finished export on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedFile {
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
}

/// Options shared by both export operations.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Replace an existing file at the destination.
    pub overwrite: bool,
    pub cancel: Option<CancellationToken>,
}

/// Extension used for exported files: the source's own, or `mp4`.
pub fn output_extension(source: &Path) -> String {
    source
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| "mp4".to_string())
}

/// File name of a merged export: `<stem>_merged.<ext>`.
pub fn merged_file_name(source: &Path) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "export".to_string());
    format!("{stem}_merged.{}", output_extension(source))
}
