//! Error types for pdftools.
//!
//! All fallible operations return [`PdfToolsError`]:
//!
//! - Use `thiserror` for automatic `Error` trait implementation
//! - Preserve error chains with `#[source]` attributes
//! - Include context in error messages (file names, config values, etc.)
//!
//! # Error Handling Philosophy
//!
//! **System errors bubble up unchanged:**
//! - `PdfToolsError::Io` (from `std::io::Error`) - file system and permission errors
//!
//! **Application errors are wrapped with context:**
//! - `Validation` - rejected uploads, bad parameters, unreadable inputs
//! - `Compression` - both the Ghostscript and the lopdf path failed
//! - `Merge` - page copying or image conversion failed
//! - `MissingDependency` - Ghostscript not installed (only surfaced when asked for explicitly)
//!
//! # Example
//!
//! ```rust
//! use pdftools::{PdfToolsError, Result};
//!
//! fn read_upload(path: &str) -> Result<Vec<u8>> {
//!     let bytes = std::fs::read(path)?;
//!
//!     if bytes.is_empty() {
//!         return Err(PdfToolsError::validation(format!("File is empty: {}", path)));
//!     }
//!
//!     Ok(bytes)
//! }
//! ```
use thiserror::Error;

/// Result type alias using `PdfToolsError`.
pub type Result<T> = std::result::Result<T, PdfToolsError>;

/// Main error type for all pdftools operations.
#[derive(Debug, Error)]
pub enum PdfToolsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Compression error: {message}")]
    Compression {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Merge error: {message}")]
    Merge {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("PDF error: {message}")]
    Pdf {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Image processing error: {message}")]
    ImageProcessing {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for PdfToolsError {
    fn from(err: serde_json::Error) -> Self {
        PdfToolsError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

// IO errors inside lopdf stay IO errors; everything else is a malformed document.
impl From<lopdf::Error> for PdfToolsError {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(io_err) => PdfToolsError::Io(io_err),
            other => PdfToolsError::Pdf {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}

impl From<image::ImageError> for PdfToolsError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(io_err) => PdfToolsError::Io(io_err),
            other => PdfToolsError::ImageProcessing {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}

impl From<tokio::task::JoinError> for PdfToolsError {
    fn from(err: tokio::task::JoinError) -> Self {
        PdfToolsError::Other(format!("Blocking task failed: {}", err))
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl PdfToolsError {
    error_constructor!(validation, Validation);
    error_constructor!(compression, Compression);
    error_constructor!(merge, Merge);
    error_constructor!(pdf, Pdf);
    error_constructor!(image_processing, ImageProcessing);
    error_constructor!(serialization, Serialization);

    /// Whether this error was caused by the caller's input rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, PdfToolsError::Validation { .. })
    }

    /// Stable name of the variant, used as `error_type` in API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            PdfToolsError::Io(_) => "IoError",
            PdfToolsError::Validation { .. } => "ValidationError",
            PdfToolsError::Compression { .. } => "CompressionError",
            PdfToolsError::Merge { .. } => "MergeError",
            PdfToolsError::Pdf { .. } => "PdfError",
            PdfToolsError::ImageProcessing { .. } => "ImageProcessingError",
            PdfToolsError::Serialization { .. } => "SerializationError",
            PdfToolsError::MissingDependency(_) => "MissingDependencyError",
            PdfToolsError::Other(_) => "InternalError",
        }
    }
}
