//! Persistence of the single editing session.
//!
//! The cache holds one slot: the file the session belongs to and the
//! timeline that was last committed for it. Every commit overwrites the
//! slot. A file is recognised by name and size alone, so two different
//! files with the same name and byte length are treated as the same source.

mod json;

pub use json::JsonFileCache;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use splitforge_core::Result;
use splitforge_timeline::{InvariantViolation, Segment, SplitMarker, Timeline};

/// The identity a session is keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    /// Size in bytes.
    pub size: u64,
}

impl FileDescriptor {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

impl From<&splitforge_av::MediaInfo> for FileDescriptor {
    fn from(info: &splitforge_av::MediaInfo) -> Self {
        Self::new(info.file_name.clone(), info.file_size)
    }
}

/// The contents of the cache slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredState {
    pub file_name: String,
    pub file_size: u64,
    pub duration: f64,
    pub markers: Vec<SplitMarker>,
    pub segments: Vec<Segment>,
    pub timestamp: DateTime<Utc>,
}

impl StoredState {
    pub fn new(
        file: &FileDescriptor,
        duration: f64,
        markers: &[SplitMarker],
        segments: &[Segment],
    ) -> Self {
        Self {
            file_name: file.name.clone(),
            file_size: file.size,
            duration,
            markers: markers.to_vec(),
            segments: segments.to_vec(),
            timestamp: Utc::now(),
        }
    }

    pub fn file(&self) -> FileDescriptor {
        FileDescriptor::new(self.file_name.clone(), self.file_size)
    }

    /// Name and size match. Content is not compared.
    pub fn matches(&self, file: &FileDescriptor) -> bool {
        self.file_name == file.name && self.file_size == file.size
    }

    /// Rebuild the timeline, refusing a slot that breaks its invariants.
    pub fn to_timeline(&self) -> std::result::Result<Timeline, InvariantViolation> {
        Timeline::from_parts(self.duration, self.markers.clone(), self.segments.clone())
    }
}

/// Storage for the single session slot.
pub trait StateCache: Send + Sync {
    /// Overwrite the slot.
    fn save_state(
        &self,
        file: &FileDescriptor,
        duration: f64,
        markers: &[SplitMarker],
        segments: &[Segment],
    ) -> Result<()>;

    /// Read the slot, `None` when it is empty.
    fn load_state(&self) -> Result<Option<StoredState>>;

    fn clear_state(&self) -> Result<()>;

    fn has_stored_state(&self) -> bool;

    /// Whether the slot belongs to `file`, by name and size.
    fn is_file_match(&self, file: &FileDescriptor) -> bool {
        match self.load_state() {
            Ok(Some(state)) => state.matches(file),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!("Failed to read state cache: {e}");
                false
            }
        }
    }
}

/// A cache that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCache;

impl StateCache for NullCache {
    fn save_state(&self, _: &FileDescriptor, _: f64, _: &[SplitMarker], _: &[Segment]) -> Result<()> {
        Ok(())
    }

    fn load_state(&self) -> Result<Option<StoredState>> {
        Ok(None)
    }

    fn clear_state(&self) -> Result<()> {
        Ok(())
    }

    fn has_stored_state(&self) -> bool {
        false
    }
}
