//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], an isolated session directory with its own
//! config file and state cache, plus helpers to seed a session without
//! needing ffprobe.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use splitforge::cache::{FileDescriptor, JsonFileCache, StateCache};
use splitforge_timeline::{SplitMarker, Timeline};
use tempfile::TempDir;

/// An isolated splitforge environment in a temp directory.
pub struct TestHarness {
    pub dir: TempDir,
}

impl TestHarness {
    /// Create a harness with a config file pointing the state cache and the
    /// export directory into the temp directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let config = format!(
            "[state]\ncache_path = {:?}\n\n[export]\noutput_dir = {:?}\n",
            dir.path().join("state.json"),
            dir.path().join("exports"),
        );
        std::fs::write(dir.path().join("splitforge.toml"), config)
            .expect("failed to write config");
        Self { dir }
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("splitforge.toml")
    }

    pub fn cache_path(&self) -> PathBuf {
        self.dir.path().join("state.json")
    }

    pub fn cache(&self) -> JsonFileCache {
        JsonFileCache::new(self.cache_path())
    }

    /// Write a fake source file of `size` bytes and return its path.
    pub fn source(&self, name: &str, size: usize) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, vec![0u8; size]).expect("failed to write source");
        path
    }

    /// Seed the cache with a session for `file` split at `markers`.
    pub fn seed(&self, file: &FileDescriptor, duration: f64, markers: &[f64]) -> Timeline {
        let timeline = timeline(duration, markers);
        self.cache()
            .save_state(file, duration, timeline.markers(), timeline.segments())
            .expect("failed to seed cache");
        timeline
    }

    /// Read back the committed timeline.
    pub fn stored(&self) -> Timeline {
        self.cache()
            .load_state()
            .expect("failed to read cache")
            .expect("cache is empty")
            .to_timeline()
            .expect("cached timeline is inconsistent")
    }

    /// A `splitforge` command bound to this harness's config.
    pub fn cmd(&self) -> Command {
        let mut cmd = splitforge_cmd();
        cmd.arg("--config").arg(self.config_path());
        cmd.env_remove("RUST_LOG");
        cmd
    }
}

/// Get a command for the splitforge binary
#[allow(deprecated)]
pub fn splitforge_cmd() -> Command {
    Command::cargo_bin("splitforge").expect("binary not built")
}

pub fn timeline(duration: f64, markers: &[f64]) -> Timeline {
    Timeline::from_markers(
        duration,
        markers.iter().map(|&t| SplitMarker::new(t)).collect(),
    )
}

pub fn spans(t: &Timeline) -> Vec<(f64, f64)> {
    t.segments()
        .iter()
        .map(|s| (s.start_time, s.end_time))
        .collect()
}

/// Whether ffmpeg and ffprobe are both on PATH.
pub fn have_ffmpeg() -> bool {
    which_exists("ffmpeg") && which_exists("ffprobe")
}

fn which_exists(tool: &str) -> bool {
    Command::new(tool)
        .arg("-version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Generate a short test video with ffmpeg's lavfi test source.
pub fn generate_video(path: &Path, seconds: u32) -> bool {
    Command::new("ffmpeg")
        .args(["-y", "-v", "error", "-f", "lavfi", "-i"])
        .arg(format!("testsrc=duration={seconds}:size=160x120:rate=10"))
        .args(["-g", "10", "-c:v", "mpeg4"])
        .arg(path)
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
