//! File kind detection and upload validation.
//!
//! Uploads are classified by extension first (the contract the HTTP API
//! advertises) and then confirmed by sniffing the leading bytes, so a
//! renamed `.exe` never reaches lopdf or the image decoders.

use crate::core::filename::extension_of;
use crate::{PdfToolsError, Result};

pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const PNG_MIME_TYPE: &str = "image/png";
pub const JPEG_MIME_TYPE: &str = "image/jpeg";

/// Extensions accepted by the compression endpoint.
pub const COMPRESS_EXTENSIONS: &[&str] = &["pdf"];

/// Extensions accepted by the merge endpoint.
pub const MERGE_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg"];

/// What an input file is, as far as merging and compression care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Image,
}

impl FileKind {
    /// Classify a file by its extension.
    pub fn from_filename(name: &str) -> Option<Self> {
        match extension_of(name)?.as_str() {
            "pdf" => Some(FileKind::Pdf),
            "png" | "jpg" | "jpeg" => Some(FileKind::Image),
            _ => None,
        }
    }

    /// Label used in merge statistics.
    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Pdf => "PDF",
            FileKind::Image => "Image (converted)",
        }
    }
}

/// Whether `name` has an extension from `allowed` (case-insensitive).
pub fn is_allowed(name: &str, allowed: &[&str]) -> bool {
    extension_of(name).is_some_and(|ext| allowed.contains(&ext.as_str()))
}

/// Check that the content of an upload matches the kind its name claims.
///
/// PDFs may carry junk before the `%PDF-` header, so the first kilobyte is
/// searched rather than only the first bytes.
pub fn sniff_matches(kind: FileKind, bytes: &[u8]) -> bool {
    match kind {
        FileKind::Pdf => {
            let head = &bytes[..bytes.len().min(1024)];
            infer::is(bytes, "pdf") || head.windows(5).any(|w| w == b"%PDF-")
        }
        FileKind::Image => infer::get(bytes).is_some_and(|t| matches!(t.mime_type(), PNG_MIME_TYPE | JPEG_MIME_TYPE)),
    }
}

/// Validate an upload's name and content against an allowed extension set.
///
/// # Errors
///
/// Returns `PdfToolsError::Validation` naming the file when the extension is
/// not allowed or the bytes do not look like the claimed type.
pub fn validate_upload(name: &str, bytes: &[u8], allowed: &[&str]) -> Result<FileKind> {
    if !is_allowed(name, allowed) {
        return Err(PdfToolsError::validation(format!(
            "File '{}' is not a supported type (allowed: {})",
            name,
            allowed.join(", ")
        )));
    }

    let kind = FileKind::from_filename(name)
        .ok_or_else(|| PdfToolsError::validation(format!("File '{}' is not a supported type", name)))?;

    if !sniff_matches(kind, bytes) {
        return Err(PdfToolsError::validation(format!(
            "File '{}' content does not match its extension",
            name
        )));
    }

    Ok(kind)
}
