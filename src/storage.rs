//! Storage abstraction for input and artifact I/O.
//!
//! The pipeline reads inputs and writes artifacts through this trait so it
//! never assumes a concrete backend; a blob store can slot in behind the same
//! surface. The local implementation writes atomically (same-directory temp
//! file plus rename) so a failed run never leaves a partially written
//! artifact behind.

use crate::error::{DashboardError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Minimal storage surface consumed by the pipeline.
pub trait Storage: Send + Sync {
    /// Read a file's full contents
    fn read(&self, path: &Path) -> Result<Vec<u8>>;
    /// Write a file's full contents, replacing any previous version atomically
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()>;
    /// List the files directly under a directory, sorted by path
    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>>;
}

/// Local filesystem storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Storage for LocalStorage {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        if !path.exists() {
            return Err(DashboardError::InputNotFound(path.to_path_buf()));
        }
        Ok(fs::read(path)?)
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Temp file lives next to the target so the rename stays on one filesystem
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DashboardError::Config(format!("Unwritable path: {}", path.display())))?;
        let tmp = path.with_file_name(format!("{file_name}.tmp"));

        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), bytes = bytes.len(), "Wrote file");
        Ok(())
    }

    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        paths.sort();
        Ok(paths)
    }
}
