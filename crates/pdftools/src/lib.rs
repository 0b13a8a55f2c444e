//! pdftools - PDF compression and merging
//!
//! A small document-processing library with an optional REST API. It
//! compresses PDFs through Ghostscript (falling back to lopdf when
//! Ghostscript is unavailable or fails) and merges PDFs and PNG/JPEG images
//! into a single document.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pdftools::{CompressionLevel, ServiceConfig, compress_pdf};
//! use std::path::Path;
//!
//! # #[tokio::main]
//! # async fn main() -> pdftools::Result<()> {
//! let config = ServiceConfig::default();
//! let outcome = compress_pdf(
//!     Path::new("report.pdf"),
//!     Path::new("report.small.pdf"),
//!     CompressionLevel::Maximum,
//!     &config,
//! )
//! .await?;
//! println!("Saved {:.1}%", outcome.stats.reduction_percent);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core Module** (`core`): config loading, upload validation, temp workspaces
//! - **Compression** (`compression`): Ghostscript profiles and the lopdf fallback
//! - **Merge** (`merge`): page concatenation and image-to-PDF conversion
//! - **PDF** (`pdf`): lopdf helpers shared by both
//! - **API** (`api`, feature `api`): axum router and server

#![deny(unsafe_code)]

pub mod compression;
pub mod core;
pub mod error;
pub mod merge;
pub mod pdf;
pub mod types;

#[cfg(feature = "api")]
pub mod api;

pub use error::{PdfToolsError, Result};

pub use core::config::ServiceConfig;
pub use core::io::RequestWorkspace;

pub use compression::compress_pdf;
pub use merge::{MergeInput, image_to_pdf, merge_files, validate_files};

pub use types::{CompressionLevel, CompressionMethod, CompressionOutcome, CompressionStats, MergeStats, MergedFileInfo};
