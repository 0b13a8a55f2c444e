//! Per-request temporary file lifecycle.
//!
//! Every request gets its own [`RequestWorkspace`]: uploads are written into
//! it, generated documents are produced inside it, and the whole directory is
//! removed when the workspace is dropped. Early returns and errors therefore
//! cannot leak temp files.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tokio::fs;

use crate::core::filename::secure_filename;
use crate::{PdfToolsError, Result};

/// Temporary directory owned by a single request.
#[derive(Debug)]
pub struct RequestWorkspace {
    dir: TempDir,
    counter: usize,
}

impl RequestWorkspace {
    /// Create a workspace under `root`, or the OS temp dir when `None`.
    pub fn new(root: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("pdftools-");

        let dir = match root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };

        tracing::debug!("Created request workspace at {}", dir.path().display());

        Ok(Self { dir, counter: 0 })
    }

    /// Directory backing this workspace.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Persist an upload and return its path.
    ///
    /// Names are prefixed with a sequence number so two uploads called
    /// `scan.pdf` do not collide; the original extension is preserved because
    /// downstream steps classify files by it.
    pub async fn write_upload(&mut self, original_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        self.counter += 1;
        let name = format!("input_{:02}_{}", self.counter, secure_filename(original_name));

        let path = self.dir.path().join(name);
        fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// Path for a generated file inside the workspace.
    pub fn output_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(secure_filename(name))
    }

    /// Remove the workspace now, reporting failures instead of ignoring them.
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| {
            PdfToolsError::Other(format!("Failed to remove workspace {}: {}", path.display(), e))
        })
    }
}

/// Size of a file in bytes.
pub async fn file_size(path: impl AsRef<Path>) -> Result<u64> {
    Ok(fs::metadata(path.as_ref()).await?.len())
}

/// Validate that a file exists.
///
/// # Errors
///
/// Returns `PdfToolsError::Validation` if the file doesn't exist.
pub fn validate_file_exists(path: impl AsRef<Path>) -> Result<()> {
    if !path.as_ref().exists() {
        let name = path
            .as_ref()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.as_ref().display().to_string());
        return Err(PdfToolsError::validation(format!("File not found: {}", name)));
    }
    Ok(())
}

/// Display name of a path (its file name), for messages and stats.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
