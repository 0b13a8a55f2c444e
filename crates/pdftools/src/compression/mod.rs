//! PDF compression.
//!
//! Ghostscript is tried first when enabled. Any failure there (missing
//! binary, non-zero exit, timeout, no output) is logged and the lopdf
//! fallback runs instead, so callers only see an error when both paths fail.

pub mod fallback;
pub mod ghostscript;

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::core::config::ServiceConfig;
use crate::core::io::{display_name, file_size, validate_file_exists};
use crate::types::{CompressionLevel, CompressionMethod, CompressionOutcome, CompressionStats};
use crate::{PdfToolsError, Result};

pub use fallback::compress_with_lopdf;
pub use ghostscript::{check_ghostscript_available, compress_with_ghostscript, locate_ghostscript};

/// Description of one compression level, served by the info endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionTypeInfo {
    pub name: String,
    pub description: String,
    pub recommended_for: String,
}

static COMPRESSION_TYPES: Lazy<Vec<(CompressionLevel, CompressionTypeInfo)>> = Lazy::new(|| {
    vec![
        (
            CompressionLevel::Optimized,
            CompressionTypeInfo {
                name: CompressionLevel::Optimized.label().to_string(),
                description: "Advanced compression with a significant size reduction. Keeps excellent visual quality."
                    .to_string(),
                recommended_for: "General use and important documents where both quality and size matter".to_string(),
            },
        ),
        (
            CompressionLevel::Maximum,
            CompressionTypeInfo {
                name: CompressionLevel::Maximum.label().to_string(),
                description: "Aggressive compression that lowers image quality. Maximum space savings.".to_string(),
                recommended_for: "Files where size matters more than visual quality".to_string(),
            },
        ),
    ]
});

/// Catalog of supported compression levels, in form-value order.
pub fn compression_types() -> &'static [(CompressionLevel, CompressionTypeInfo)] {
    &COMPRESSION_TYPES
}

async fn run_fallback(input: &Path, output: &Path, level: CompressionLevel) -> Result<()> {
    let input_path = input.to_path_buf();
    let output_path = output.to_path_buf();

    tokio::task::spawn_blocking(move || compress_with_lopdf(&input_path, &output_path, level))
        .await?
        .map_err(|e| match e {
            PdfToolsError::Validation { .. } => e,
            other => PdfToolsError::compression_with_source(
                format!("Failed to compress {}: {}", display_name(input), other),
                other,
            ),
        })?;
    Ok(())
}

async fn try_ghostscript(input: &Path, output: &Path, level: CompressionLevel, config: &ServiceConfig) -> bool {
    if !config.ghostscript.enabled {
        tracing::debug!("Ghostscript disabled, using lopdf compression");
        return false;
    }

    match compress_with_ghostscript(input, output, level, &config.ghostscript).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Ghostscript compression failed, falling back to lopdf: {}", e);
            if output.exists()
                && let Err(remove_err) = tokio::fs::remove_file(output).await
            {
                tracing::warn!("Failed to remove partial Ghostscript output: {}", remove_err);
            }
            false
        }
    }
}

/// Compress `input` into `output`.
///
/// # Errors
///
/// - `Validation` when `input` does not exist or is not a readable PDF
/// - `Compression` when both Ghostscript and the lopdf fallback fail
pub async fn compress_pdf(
    input: &Path,
    output: &Path,
    level: CompressionLevel,
    config: &ServiceConfig,
) -> Result<CompressionOutcome> {
    validate_file_exists(input)?;
    let original_size = file_size(input).await?;

    tracing::info!(
        file = %display_name(input),
        size = original_size,
        level = %level,
        "Compressing PDF"
    );

    let method = if try_ghostscript(input, output, level, config).await {
        CompressionMethod::Ghostscript
    } else {
        run_fallback(input, output, level).await?;
        CompressionMethod::Fallback
    };

    let compressed_size = file_size(output).await?;
    let stats = CompressionStats::new(original_size, compressed_size, level, method);

    tracing::info!(
        method = method.as_str(),
        original = %stats.original_size_formatted,
        compressed = %stats.compressed_size_formatted,
        reduction_percent = stats.reduction_percent,
        "Compression finished"
    );

    Ok(CompressionOutcome {
        output_path: PathBuf::from(output),
        message: format!("PDF compressed successfully using {} compression", level.label()),
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GhostscriptConfig;
    use crate::pdf::document::test_support::{text_document, to_bytes};

    fn config_without_ghostscript() -> ServiceConfig {
        ServiceConfig {
            ghostscript: GhostscriptConfig::disabled(),
            ..ServiceConfig::default()
        }
    }

    #[tokio::test]
    async fn test_compress_pdf_with_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("report.pdf");
        std::fs::write(&input, to_bytes(&mut text_document(5))).unwrap();
        let output = dir.path().join("compressed.pdf");

        let outcome = compress_pdf(&input, &output, CompressionLevel::Optimized, &config_without_ghostscript())
            .await
            .unwrap();

        assert_eq!(outcome.stats.method, CompressionMethod::Fallback);
        assert_eq!(outcome.stats.compression_type, "Optimized");
        assert!(outcome.output_path.exists());
        assert_eq!(outcome.stats.compressed_size, std::fs::metadata(&output).unwrap().len());
        assert_eq!(crate::pdf::load_document(&output).unwrap().get_pages().len(), 5);
    }

    #[tokio::test]
    async fn test_missing_input_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = compress_pdf(
            &dir.path().join("missing.pdf"),
            &dir.path().join("out.pdf"),
            CompressionLevel::Maximum,
            &config_without_ghostscript(),
        )
        .await
        .unwrap_err();

        assert!(err.is_client_error());
        assert!(err.to_string().contains("missing.pdf"));
    }

    /// A stand-in for `gs` that copies the input PDF to `-sOutputFile`.
    #[cfg(unix)]
    fn copying_ghostscript(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("fake-gs");
        std::fs::write(
            &script,
            "#!/bin/sh\nfor arg in \"$@\"; do\n  case \"$arg\" in\n    -sOutputFile=*) out=\"${arg#-sOutputFile=}\" ;;\n    -*) ;;\n    *) in=\"$arg\" ;;\n  esac\ndone\ncp \"$in\" \"$out\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[cfg(unix)]
    fn config_with_ghostscript(binary: PathBuf) -> ServiceConfig {
        ServiceConfig {
            ghostscript: GhostscriptConfig {
                binary: Some(binary),
                ..GhostscriptConfig::default()
            },
            ..ServiceConfig::default()
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_ghostscript_success_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        std::fs::write(&input, to_bytes(&mut text_document(2))).unwrap();
        let output = dir.path().join("out.pdf");

        let config = config_with_ghostscript(copying_ghostscript(dir.path()));
        let outcome = compress_pdf(&input, &output, CompressionLevel::Optimized, &config)
            .await
            .unwrap();

        assert_eq!(outcome.stats.method, CompressionMethod::Ghostscript);
        assert_eq!(std::fs::read(&output).unwrap(), std::fs::read(&input).unwrap());
        assert_eq!(outcome.stats.reduction_percent, 0.0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_ghostscript_falls_back() {
        let Some(failing) = ["/bin/false", "/usr/bin/false"]
            .iter()
            .map(PathBuf::from)
            .find(|path| path.is_file())
        else {
            return;
        };

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        std::fs::write(&input, to_bytes(&mut text_document(1))).unwrap();
        let output = dir.path().join("out.pdf");

        let outcome = compress_pdf(&input, &output, CompressionLevel::Maximum, &config_with_ghostscript(failing))
            .await
            .unwrap();

        assert_eq!(outcome.stats.method, CompressionMethod::Fallback);
        assert_eq!(outcome.stats.compression_type, "Maximum");
        assert_eq!(crate::pdf::load_document(&output).unwrap().get_pages().len(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_pdf_fails() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("junk.pdf");
        std::fs::write(&input, b"plain text, not a document").unwrap();

        let err = compress_pdf(
            &input,
            &dir.path().join("out.pdf"),
            CompressionLevel::Optimized,
            &config_without_ghostscript(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PdfToolsError::Compression { .. }));
        assert!(err.to_string().contains("junk.pdf"));
    }

    #[test]
    fn test_compression_types_catalog() {
        let types = compression_types();
        assert_eq!(types.len(), 2);
        assert_eq!(types[0].0, CompressionLevel::Optimized);
        assert_eq!(types[1].1.name, "Maximum");
    }
}
