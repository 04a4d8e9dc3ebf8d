//! Scratch space for export operations.
//!
//! A [`Workspace`] is a temporary directory created next to the export
//! destination, so that the finished file can be moved into place with a
//! rename. Intermediate cuts and concat lists live in it and disappear with
//! it.

use std::path::{Path, PathBuf};

use splitforge_core::{Error, Result};
use tempfile::TempDir;

use crate::export::ExportedFile;

pub struct Workspace {
    temp_dir: TempDir,
}

impl Workspace {
    /// Create a workspace inside `dir`, creating `dir` if needed.
    pub fn new_in(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let temp_dir = tempfile::Builder::new()
            .prefix(".splitforge-")
            .tempdir_in(dir)
            .map_err(|e| Error::export("workspace", format!("failed to create temp dir: {e}")))?;
        Ok(Self { temp_dir })
    }

    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path for a named temporary file inside the workspace.
    pub fn temp_file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Move `produced` to `dest`.
    ///
    /// An existing `dest` is replaced only when `overwrite` is set. Rename is
    /// tried first, falling back to copy and remove across filesystems.
    pub fn finalize(&self, produced: &Path, dest: &Path, overwrite: bool) -> Result<ExportedFile> {
        if !produced.exists() {
            return Err(Error::export(
                "finalize",
                format!("output file does not exist: {}", produced.display()),
            ));
        }
        if dest.exists() && !overwrite {
            return Err(Error::export(
                "finalize",
                format!("{} already exists", dest.display()),
            ));
        }

        if std::fs::rename(produced, dest).is_err() {
            std::fs::copy(produced, dest).map_err(|e| {
                Error::export("finalize", format!("failed to copy output to destination: {e}"))
            })?;
            let _ = std::fs::remove_file(produced);
        }

        let size = std::fs::metadata(dest)?.len();
        Ok(ExportedFile {
            path: dest.to_path_buf(),
            size,
        })
    }
}
