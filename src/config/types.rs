use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use splitforge_av::ToolsConfig;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub state: StateConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StateConfig {
    /// Persist the session after every edit
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// JSON file holding the single cached session. `~` is expanded.
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cache_path: default_cache_path(),
        }
    }
}

impl StateConfig {
    /// `cache_path` with a leading `~` expanded.
    pub fn resolved_cache_path(&self) -> PathBuf {
        let raw = self.cache_path.to_string_lossy();
        PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
    }
}

fn default_true() -> bool {
    true
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("~/.local/share/splitforge/state.json")
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExportConfig {
    /// Where exports are written. Defaults to the source file's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Per-invocation ffmpeg/ffprobe timeout, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Replace existing files in the output directory
    #[serde(default)]
    pub overwrite: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            timeout_secs: default_timeout_secs(),
            overwrite: false,
        }
    }
}

impl ExportConfig {
    /// `output_dir` with a leading `~` expanded, if set.
    pub fn resolved_output_dir(&self) -> Option<PathBuf> {
        self.output_dir.as_ref().map(|dir| {
            let raw = dir.to_string_lossy();
            PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
        })
    }
}

fn default_timeout_secs() -> u64 {
    3600
}
