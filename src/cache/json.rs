//! JSON file backend for the session cache.

use std::path::{Path, PathBuf};

use splitforge_core::{Error, Result};
use splitforge_timeline::{Segment, SplitMarker};

use super::{FileDescriptor, StateCache, StoredState};

/// Keeps the session slot in one pretty-printed JSON file.
///
/// Writes go to a sibling temp file which is then renamed over the slot, so
/// a crash mid-write leaves the previous state intact.
#[derive(Debug, Clone)]
pub struct JsonFileCache {
    path: PathBuf,
}

impl JsonFileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StateCache for JsonFileCache {
    fn save_state(
        &self,
        file: &FileDescriptor,
        duration: f64,
        markers: &[SplitMarker],
        segments: &[Segment],
    ) -> Result<()> {
        let state = StoredState::new(file, duration, markers, segments);
        let json = serde_json::to_string_pretty(&state).map_err(Error::serialization)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = self.temp_path();
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::debug!(
            "Saved session for {} ({} markers) to {:?}",
            file.name,
            markers.len(),
            self.path
        );
        Ok(())
    }

    fn load_state(&self) -> Result<Option<StoredState>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let state = serde_json::from_str(&content).map_err(Error::serialization)?;
        Ok(Some(state))
    }

    fn clear_state(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn has_stored_state(&self) -> bool {
        self.path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splitforge_timeline::Timeline;

    fn sample() -> (FileDescriptor, Timeline) {
        let t = Timeline::new(100.0)
            .add_marker(30.0)
            .and_then(|t| t.add_marker(70.0))
            .unwrap();
        (FileDescriptor::new("holiday.mp4", 2048), t)
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonFileCache::new(dir.path().join("state.json"));
        let (file, t) = sample();

        assert!(!cache.has_stored_state());
        cache
            .save_state(&file, t.duration(), t.markers(), t.segments())
            .unwrap();
        assert!(cache.has_stored_state());

        let state = cache.load_state().unwrap().unwrap();
        assert_eq!(state.file(), file);
        assert_eq!(state.to_timeline().unwrap(), t);
        assert!(cache.is_file_match(&file));
        assert!(!dir.path().join("state.json.tmp").exists());
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonFileCache::new(dir.path().join("a/b/state.json"));
        let (file, t) = sample();
        cache
            .save_state(&file, t.duration(), t.markers(), t.segments())
            .unwrap();
        assert!(cache.path().is_file());
    }

    #[test]
    fn save_overwrites_the_slot() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonFileCache::new(dir.path().join("state.json"));
        let (file, t) = sample();
        cache
            .save_state(&file, t.duration(), t.markers(), t.segments())
            .unwrap();

        let other = FileDescriptor::new("other.mov", 7);
        let fresh = Timeline::new(12.0);
        cache
            .save_state(&other, 12.0, fresh.markers(), fresh.segments())
            .unwrap();

        assert!(!cache.is_file_match(&file));
        assert!(cache.is_file_match(&other));
    }

    #[test]
    fn corrupt_slot_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();
        let cache = JsonFileCache::new(&path);
        assert!(matches!(cache.load_state(), Err(Error::Serialization(_))));
        assert!(!cache.is_file_match(&FileDescriptor::new("holiday.mp4", 2048)));
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonFileCache::new(dir.path().join("state.json"));
        let (file, t) = sample();
        cache
            .save_state(&file, t.duration(), t.markers(), t.segments())
            .unwrap();
        cache.clear_state().unwrap();
        assert!(!cache.has_stored_state());
        cache.clear_state().unwrap();
        assert!(cache.load_state().unwrap().is_none());
    }

    #[test]
    fn stored_json_uses_snake_case_and_rfc3339() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonFileCache::new(dir.path().join("state.json"));
        let (file, t) = sample();
        cache
            .save_state(&file, t.duration(), t.markers(), t.segments())
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(cache.path()).unwrap()).unwrap();
        assert_eq!(raw["file_name"], "holiday.mp4");
        assert_eq!(raw["file_size"], 2048);
        assert_eq!(raw["markers"].as_array().unwrap().len(), 2);
        assert_eq!(raw["segments"][1]["start_time"], 30.0);
        let ts = raw["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
    }
}
