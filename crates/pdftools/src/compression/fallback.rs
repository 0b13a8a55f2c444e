//! In-process compression with lopdf.
//!
//! Used when Ghostscript is disabled, missing or fails. Gains come from
//! Flate-compressing uncompressed streams, merging duplicate streams,
//! re-encoding embedded JPEGs and dropping metadata.

use std::path::Path;

use crate::Result;
use crate::pdf::images::{ImageRecompression, ImageReport, recompress_images};
use crate::pdf::{load_document, optimize, save_document};
use crate::types::CompressionLevel;

/// What happens to the document Info dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoPolicy {
    KeepEssential,
    Remove,
}

/// Fallback settings for one compression level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackProfile {
    pub images: ImageRecompression,
    pub strip_non_essential: bool,
    pub info: InfoPolicy,
}

impl FallbackProfile {
    pub fn for_level(level: CompressionLevel) -> Self {
        match level {
            CompressionLevel::Optimized => Self {
                images: ImageRecompression {
                    quality: 85,
                    max_dimension: None,
                },
                strip_non_essential: false,
                info: InfoPolicy::KeepEssential,
            },
            CompressionLevel::Maximum => Self {
                images: ImageRecompression {
                    quality: 60,
                    max_dimension: Some(1600),
                },
                strip_non_essential: true,
                info: InfoPolicy::Remove,
            },
        }
    }
}

/// Counters from a fallback run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FallbackReport {
    pub images: ImageReport,
    pub duplicate_streams: usize,
}

/// Compress `input` into `output` with the lopdf profile for `level`.
///
/// This is blocking; async callers run it on the blocking pool.
pub fn compress_with_lopdf(input: &Path, output: &Path, level: CompressionLevel) -> Result<FallbackReport> {
    let profile = FallbackProfile::for_level(level);
    let mut doc = load_document(input)?;

    let images = recompress_images(&mut doc, profile.images);

    if profile.strip_non_essential {
        optimize::strip_non_essential(&mut doc);
    }
    match profile.info {
        InfoPolicy::KeepEssential => optimize::keep_essential_info(&mut doc),
        InfoPolicy::Remove => optimize::remove_info(&mut doc),
    }

    let duplicate_streams = optimize::finalize(&mut doc);
    save_document(&mut doc, output)?;

    tracing::debug!(
        recompressed = images.recompressed,
        skipped = images.skipped,
        duplicate_streams,
        "lopdf compression finished"
    );

    Ok(FallbackReport {
        images,
        duplicate_streams,
    })
}
