//! # splitforge-av
//!
//! The media side of splitforge: everything that touches actual bytes.
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- locate ffmpeg and ffprobe,
//!   honouring configured overrides.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout,
//!   streamed stderr and cancellation.
//! - **Probing** ([`probe()`]) -- file name, size and duration of a source.
//! - **Export** ([`export`]) -- lossless single-range cuts and ordered merges,
//!   finalised through a [`Workspace`] next to the destination.
//!
//! Nothing here reads or changes the timeline model; export takes the
//! segments it is given.

pub mod command;
pub mod export;
pub mod probe;
pub mod tools;
pub mod workspace;

pub use command::{ToolCommand, ToolOutput};
pub use export::{
    cut_segment, merge_segments, merged_file_name, ExportOptions, ExportProgress, ExportedFile,
};
pub use probe::{probe, MediaInfo};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry, ToolsConfig};
pub use workspace::Workspace;
