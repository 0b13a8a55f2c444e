//! Shared result and option types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::core::filename::format_file_size;

/// How hard to squeeze a PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// Balanced: lossless stream compression, moderate image downsampling.
    #[default]
    Optimized,
    /// Aggressive: low-resolution images and stripped metadata.
    Maximum,
}

impl CompressionLevel {
    /// Parse the `compression_type` form value.
    ///
    /// Matching is case-insensitive and anything unrecognised falls back to
    /// [`CompressionLevel::Optimized`].
    pub fn from_form_value(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionLevel::Optimized => "optimized",
            CompressionLevel::Maximum => "maximum",
        }
    }

    /// Human-readable label reported in statistics.
    pub fn label(&self) -> &'static str {
        match self {
            CompressionLevel::Optimized => "Optimized",
            CompressionLevel::Maximum => "Maximum",
        }
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "optimized" => Ok(CompressionLevel::Optimized),
            "maximum" => Ok(CompressionLevel::Maximum),
            other => Err(format!("Unknown compression type '{}'", other)),
        }
    }
}

/// Which path produced a compressed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionMethod {
    Ghostscript,
    Fallback,
}

impl CompressionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionMethod::Ghostscript => "ghostscript",
            CompressionMethod::Fallback => "fallback",
        }
    }
}

/// Size statistics for a compression run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionStats {
    pub original_size: u64,
    pub compressed_size: u64,
    /// Negative when the output grew.
    pub reduction_percent: f64,
    pub original_size_formatted: String,
    pub compressed_size_formatted: String,
    pub compression_type: String,
    pub method: CompressionMethod,
}

impl CompressionStats {
    pub fn new(original_size: u64, compressed_size: u64, level: CompressionLevel, method: CompressionMethod) -> Self {
        Self {
            original_size,
            compressed_size,
            reduction_percent: percent_saved(original_size, compressed_size),
            original_size_formatted: format_file_size(original_size),
            compressed_size_formatted: format_file_size(compressed_size),
            compression_type: level.label().to_string(),
            method,
        }
    }
}

/// Result of a successful compression.
#[derive(Debug, Clone)]
pub struct CompressionOutcome {
    pub output_path: PathBuf,
    pub stats: CompressionStats,
    pub message: String,
}

/// Per-input details reported after a merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedFileInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub size: u64,
    pub pages: usize,
}

/// Statistics for a merge run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeStats {
    pub total_files: usize,
    pub total_input_size: u64,
    pub output_size: u64,
    pub total_pages: usize,
    pub total_input_size_formatted: String,
    pub output_size_formatted: String,
    pub file_info: Vec<MergedFileInfo>,
    pub compression_ratio: f64,
}

/// `(before - after) / before * 100`, or 0 when there was nothing to begin with.
pub fn percent_saved(before: u64, after: u64) -> f64 {
    if before == 0 {
        return 0.0;
    }
    (before as f64 - after as f64) / before as f64 * 100.0
}
