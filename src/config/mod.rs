pub mod persist;
mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Default config locations, searched in order
pub const DEFAULT_PATHS: &[&str] = &["./splitforge.toml", "~/.config/splitforge/config.toml"];

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    for warning in validate_config(&config)? {
        tracing::warn!("{}", warning);
    }

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    for path_str in DEFAULT_PATHS {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration, returning non-fatal warnings.
pub fn validate_config(config: &Config) -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    if config.export.timeout_secs == 0 {
        anyhow::bail!("export.timeout_secs cannot be 0");
    }

    if let Some(dir) = config.export.resolved_output_dir() {
        if dir.exists() && !dir.is_dir() {
            anyhow::bail!("export.output_dir is not a directory: {:?}", dir);
        }
        if !dir.exists() {
            warnings.push(format!(
                "export.output_dir does not exist yet and will be created: {:?}",
                dir
            ));
        }
    }

    for (name, path) in [
        ("ffmpeg_path", &config.tools.ffmpeg_path),
        ("ffprobe_path", &config.tools.ffprobe_path),
    ] {
        if let Some(p) = path {
            if !p.exists() {
                warnings.push(format!(
                    "tools.{name} does not exist, falling back to PATH: {:?}",
                    p
                ));
            }
        }
    }

    if !config.state.enabled {
        warnings.push("state.enabled = false: edits will not survive between runs".into());
    }

    Ok(warnings)
}
