//! External tool detection.
//!
//! The [`ToolRegistry`] locates ffmpeg and ffprobe once, honouring path
//! overrides from [`ToolsConfig`], and hands out their configurations to the
//! probe and export functions.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use splitforge_core::{Error, Result};

/// Default tool timeout: 1 hour. Stream copies of long sources are I/O bound.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3600);

/// Known tool names that the registry manages.
const KNOWN_TOOLS: &[&str] = &["ffmpeg", "ffprobe"];

/// The `[tools]` configuration section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Explicit ffmpeg binary. Falls back to `PATH` when unset or missing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ffmpeg_path: Option<PathBuf>,
    /// Explicit ffprobe binary. Falls back to `PATH` when unset or missing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ffprobe_path: Option<PathBuf>,
}

impl ToolsConfig {
    fn override_for(&self, name: &str) -> Option<&Path> {
        match name {
            "ffmpeg" => self.ffmpeg_path.as_deref(),
            "ffprobe" => self.ffprobe_path.as_deref(),
            _ => None,
        }
    }
}

/// A discovered tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    pub name: String,
    /// Resolved path to the executable.
    pub path: PathBuf,
    /// Maximum execution time before the tool is killed.
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

/// Availability information for a tool, returned by [`ToolRegistry::check_all`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub available: bool,
    /// First line of `-version` output, if the tool ran.
    pub version: Option<String>,
    pub path: Option<PathBuf>,
}

/// Registry holding discovered tool configurations.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolConfig>,
}

impl ToolRegistry {
    /// Discover ffmpeg and ffprobe.
    ///
    /// A configured path is used when it exists; otherwise the tool is looked
    /// up on `PATH` with [`which::which`]. Tools that are not found are left
    /// out of the registry and reported by [`ToolRegistry::require`].
    pub fn discover(config: &ToolsConfig) -> Self {
        Self::discover_with_timeout(config, DEFAULT_TIMEOUT)
    }

    /// Like [`ToolRegistry::discover`] with an explicit per-invocation timeout.
    pub fn discover_with_timeout(config: &ToolsConfig, timeout: Duration) -> Self {
        let mut tools = HashMap::new();

        for &name in KNOWN_TOOLS {
            let resolved = match config.override_for(name) {
                Some(p) if p.exists() => Some(p.to_path_buf()),
                Some(p) => {
                    tracing::warn!(tool = name, path = %p.display(), "configured tool path does not exist; searching PATH");
                    which::which(name).ok()
                }
                None => which::which(name).ok(),
            };

            match resolved {
                Some(path) => {
                    tracing::debug!(tool = name, path = %path.display(), "tool found");
                    tools.insert(
                        name.to_string(),
                        ToolConfig {
                            name: name.to_string(),
                            path,
                            timeout,
                        },
                    );
                }
                None => tracing::debug!(tool = name, "tool not found"),
            }
        }

        Self { tools }
    }

    /// The configuration for `name`, or [`Error::Tool`] if it was not found.
    pub fn require(&self, name: &str) -> Result<&ToolConfig> {
        self.tools
            .get(name)
            .ok_or_else(|| Error::tool(name, format!("{name} not found; is it installed and in PATH?")))
    }

    /// Check all known tools and return availability information.
    pub fn check_all(&self) -> Vec<ToolInfo> {
        KNOWN_TOOLS
            .iter()
            .map(|&name| match self.tools.get(name) {
                Some(cfg) => ToolInfo {
                    name: name.to_string(),
                    available: true,
                    version: detect_version(&cfg.path),
                    path: Some(cfg.path.clone()),
                },
                None => ToolInfo {
                    name: name.to_string(),
                    available: false,
                    version: None,
                    path: None,
                },
            })
            .collect()
    }
}

/// Run `<tool> -version` and return the first line of stdout.
fn detect_version(path: &Path) -> Option<String> {
    let output = std::process::Command::new(path)
        .arg("-version")
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_with_default_config() {
        let registry = ToolRegistry::discover(&ToolsConfig::default());
        // Nothing guarantees ffmpeg in CI; discovery itself must not panic.
        let _ = registry.check_all();
    }

    #[test]
    fn require_unknown_tool_fails() {
        let registry = ToolRegistry::discover(&ToolsConfig::default());
        let err = registry.require("nonexistent_tool_xyz").unwrap_err();
        assert!(err.to_string().contains("nonexistent_tool_xyz not found"));
    }

    #[test]
    fn check_all_reports_both_tools() {
        let infos = ToolRegistry::default().check_all();
        let names: Vec<&str> = infos.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["ffmpeg", "ffprobe"]);
        assert!(infos.iter().all(|i| !i.available && i.path.is_none()));
    }

    #[test]
    fn missing_override_falls_back_to_path() {
        let config = ToolsConfig {
            ffmpeg_path: Some(PathBuf::from("/definitely/not/here/ffmpeg")),
            ffprobe_path: None,
        };
        let registry = ToolRegistry::discover(&config);
        if let Ok(ffmpeg) = registry.require("ffmpeg") {
            assert_ne!(ffmpeg.path, PathBuf::from("/definitely/not/here/ffmpeg"));
        }
    }

    #[test]
    fn existing_override_is_used() {
        let fake = tempfile::NamedTempFile::new().unwrap();
        let config = ToolsConfig {
            ffmpeg_path: None,
            ffprobe_path: Some(fake.path().to_path_buf()),
        };
        let registry = ToolRegistry::discover_with_timeout(&config, Duration::from_secs(5));
        let probe = registry.require("ffprobe").unwrap();
        assert_eq!(probe.path, fake.path());
        assert_eq!(probe.timeout, Duration::from_secs(5));
    }

    #[test]
    fn tool_config_serializes_timeout_as_seconds() {
        let cfg = ToolConfig {
            name: "ffmpeg".to_string(),
            path: PathBuf::from("/usr/bin/ffmpeg"),
            timeout: DEFAULT_TIMEOUT,
        };
        let json = serde_json::to_value(&cfg).unwrap();
        assert_eq!(json["timeout"], 3600);
        let back: ToolConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back.timeout, DEFAULT_TIMEOUT);
    }
}
