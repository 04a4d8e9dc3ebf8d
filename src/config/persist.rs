//! Configuration persistence using toml_edit to preserve formatting and comments.

use super::Config;
use anyhow::{Context, Result};
use std::path::Path;
use toml_edit::{DocumentMut, Item};

const SECTION_COMMENTS: &[(&str, &str)] = &[
    ("state", "# Session cache: the last opened file and its markers.\n"),
    (
        "tools",
        "# Explicit tool locations. Unset or missing paths fall back to PATH.\n",
    ),
    ("export", "# Lossless export settings.\n"),
];

/// Render `config` as a TOML document with a comment above each section.
pub fn render_config(config: &Config) -> Result<DocumentMut> {
    let content = toml::to_string_pretty(config).with_context(|| "Failed to serialize config")?;
    let mut doc: DocumentMut = content
        .parse()
        .with_context(|| "Failed to parse serialized config")?;

    // An all-default [tools] section serializes to nothing; keep it visible.
    if doc.get("tools").is_none() {
        doc["tools"] = toml_edit::table();
    }

    for (section, comment) in SECTION_COMMENTS {
        if let Some(Item::Table(table)) = doc.get_mut(section) {
            table.decor_mut().set_prefix(format!("\n{comment}"));
        }
    }

    Ok(doc)
}

/// Save the entire config to a TOML file
pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    let doc = render_config(config)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    std::fs::write(path, doc.to_string())
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    Ok(())
}
