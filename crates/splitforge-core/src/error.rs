//! Unified error type for splitforge.
//!
//! Timeline edits never fail with an [`Error`]; rejected edits are modelled
//! as values by the timeline crate. This type covers the fallible edges:
//! external tools, the state cache and user input that cannot be parsed.

use std::fmt;
use std::path::PathBuf;

/// Unified error type covering all failure modes in splitforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "segment", "marker").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Input data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A file that an operation needs does not exist.
    #[error("File not found: {}", path.display())]
    FileNotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Stored state could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An external tool (ffmpeg, ffprobe) returned an error.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// An export step failed.
    #[error("Export error [{step}]: {message}")]
    Export {
        /// The export step that failed.
        step: String,
        /// Human-readable error description.
        message: String,
    },

    /// The operation was cancelled by the caller.
    #[error("Cancelled: {0}")]
    Cancelled(String),
}

impl Error {
    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::FileNotFound`].
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Error::FileNotFound { path: path.into() }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Export`].
    pub fn export(step: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Export {
            step: step.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Serialization`].
    pub fn serialization(message: impl fmt::Display) -> Self {
        Error::Serialization(message.to_string())
    }

    /// Whether this error is the result of a caller-requested cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled(_))
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
