//! Ghostscript invocation.
//!
//! Compression through Ghostscript's `pdfwrite` device re-renders the whole
//! document, downsampling images to the resolution of the chosen profile.
//!
//! # System Requirement
//!
//! Ghostscript must be installed and `gs` must be in PATH:
//! - **macOS**: `brew install ghostscript`
//! - **Linux**: `apt install ghostscript` or `dnf install ghostscript`
//! - **Windows**: install from ghostscript.com (`gswin64c.exe`)
//!
//! A custom location can be given with `PDFTOOLS_GHOSTSCRIPT_PATH` or the
//! `ghostscript.binary` config key.

use crate::core::config::GhostscriptConfig;
use crate::error::{PdfToolsError, Result};
use crate::types::CompressionLevel;
use std::collections::HashSet;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{Duration, timeout};

fn ghostscript_install_message() -> String {
    "Ghostscript (gs) is required for full PDF compression. \
Install: macOS: 'brew install ghostscript', \
Linux: 'apt install ghostscript', \
Windows: download from https://ghostscript.com. \
If Ghostscript is installed in a custom location, set the PDFTOOLS_GHOSTSCRIPT_PATH environment variable to the executable."
        .to_string()
}

fn ghostscript_candidates(config: &GhostscriptConfig) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    let mut push_candidate = |path: PathBuf| {
        if seen.insert(path.clone()) {
            candidates.push(path);
        }
    };

    if let Some(binary) = &config.binary {
        push_candidate(binary.clone());
    }

    for var in ["PDFTOOLS_GHOSTSCRIPT_PATH", "GHOSTSCRIPT_PATH"] {
        if let Some(value) = env::var_os(var).filter(|v| !v.is_empty()) {
            push_candidate(PathBuf::from(value));
        }
    }

    if let Some(prefix) = env::var_os("HOMEBREW_PREFIX") {
        push_candidate(PathBuf::from(prefix).join("bin/gs"));
    }

    if let Some(path_env) = env::var_os("PATH") {
        for dir in env::split_paths(&path_env) {
            push_candidate(dir.join("gs"));
            push_candidate(dir.join("gswin64c.exe"));
            push_candidate(dir.join("gswin32c.exe"));
        }
    }

    candidates
}

/// Find a usable Ghostscript executable.
///
/// # Errors
///
/// Returns `PdfToolsError::MissingDependency` when no candidate exists.
pub fn locate_ghostscript(config: &GhostscriptConfig) -> Result<PathBuf> {
    for candidate in ghostscript_candidates(config) {
        if let Ok(metadata) = std::fs::metadata(&candidate)
            && metadata.is_file()
        {
            return Ok(candidate);
        }
    }

    Err(PdfToolsError::MissingDependency(ghostscript_install_message()))
}

/// Check that Ghostscript is present and answers `--version`.
pub async fn check_ghostscript_available(config: &GhostscriptConfig) -> Result<PathBuf> {
    let gs_path = locate_ghostscript(config)?;

    let result = Command::new(&gs_path).arg("--version").output().await;

    match result {
        Ok(output) if output.status.success() => Ok(gs_path),
        Ok(_) => Err(PdfToolsError::MissingDependency(format!(
            "Ghostscript executable '{}' responded with a failure when checking '--version'.",
            gs_path.display()
        ))),
        Err(err) => Err(PdfToolsError::MissingDependency(format!(
            "Ghostscript executable '{}' could not be executed: {}. {help}",
            gs_path.display(),
            err,
            help = ghostscript_install_message()
        ))),
    }
}

/// Resolution profile for one compression level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GhostscriptProfile {
    pub pdf_settings: &'static str,
    pub color_dpi: u32,
    pub gray_dpi: u32,
    pub mono_dpi: u32,
}

impl GhostscriptProfile {
    pub fn for_level(level: CompressionLevel) -> Self {
        match level {
            CompressionLevel::Optimized => Self {
                pdf_settings: "/ebook",
                color_dpi: 150,
                gray_dpi: 150,
                mono_dpi: 300,
            },
            CompressionLevel::Maximum => Self {
                pdf_settings: "/screen",
                color_dpi: 36,
                gray_dpi: 36,
                mono_dpi: 36,
            },
        }
    }
}

/// Command-line arguments for compressing `input` into `output`.
pub fn ghostscript_args(level: CompressionLevel, input: &Path, output: &Path) -> Vec<OsString> {
    let profile = GhostscriptProfile::for_level(level);

    let mut args: Vec<OsString> = [
        "-sDEVICE=pdfwrite".to_string(),
        "-dCompatibilityLevel=1.4".to_string(),
        format!("-dPDFSETTINGS={}", profile.pdf_settings),
        "-dNOPAUSE".to_string(),
        "-dQUIET".to_string(),
        "-dBATCH".to_string(),
        "-dSAFER".to_string(),
        format!("-dColorImageResolution={}", profile.color_dpi),
        format!("-dGrayImageResolution={}", profile.gray_dpi),
        format!("-dMonoImageResolution={}", profile.mono_dpi),
        "-dColorImageDownsampleType=/Bicubic".to_string(),
        "-dGrayImageDownsampleType=/Bicubic".to_string(),
        "-dMonoImageDownsampleType=/Bicubic".to_string(),
        "-dCompressPages=true".to_string(),
        "-dUseFlateCompression=true".to_string(),
        "-dOptimize=true".to_string(),
    ]
    .into_iter()
    .map(OsString::from)
    .collect();

    let mut output_arg = OsString::from("-sOutputFile=");
    output_arg.push(output.as_os_str());
    args.push(output_arg);
    args.push(input.as_os_str().to_os_string());

    args
}

/// Compress `input` into `output` with Ghostscript.
///
/// Succeeds only if Ghostscript exits with status 0 and `output` exists.
///
/// # Errors
///
/// - `MissingDependency` when Ghostscript cannot be found
/// - `Compression` on non-zero exit, timeout or missing output
pub async fn compress_with_ghostscript(
    input: &Path,
    output: &Path,
    level: CompressionLevel,
    config: &GhostscriptConfig,
) -> Result<()> {
    let gs_path = locate_ghostscript(config)?;

    let child = Command::new(&gs_path)
        .args(ghostscript_args(level, input, output))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            PdfToolsError::compression(format!(
                "Failed to execute Ghostscript at '{}': {}",
                gs_path.display(),
                e
            ))
        })?;

    let child_id = child.id();
    tracing::debug!(pid = ?child_id, level = %level, "Ghostscript started");

    let output_result = match timeout(Duration::from_secs(config.timeout_secs), child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(PdfToolsError::compression(format!("Failed to wait for Ghostscript: {}", e)));
        }
        Err(_) => {
            // wait_with_output was cancelled; kill_on_drop reaps the child
            return Err(PdfToolsError::compression(format!(
                "Ghostscript timed out after {} seconds (PID: {:?})",
                config.timeout_secs, child_id
            )));
        }
    };

    if !output_result.status.success() {
        let stderr = String::from_utf8_lossy(&output_result.stderr);
        let stdout = String::from_utf8_lossy(&output_result.stdout);
        return Err(PdfToolsError::compression(format!(
            "Ghostscript failed with return code {}: {}",
            output_result.status.code().unwrap_or(-1),
            if !stderr.trim().is_empty() { stderr.trim() } else { stdout.trim() }
        )));
    }

    if !output.exists() {
        return Err(PdfToolsError::compression(
            "Ghostscript reported success but produced no output file",
        ));
    }

    Ok(())
}
