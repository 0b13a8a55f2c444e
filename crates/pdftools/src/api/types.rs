//! API request and response types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::compression::CompressionTypeInfo;
use crate::core::config::ServiceConfig;

/// API server size limit configuration.
///
/// Controls maximum sizes for request bodies and multipart uploads. The
/// per-file limits of the compress and merge endpoints are enforced by the
/// handlers; these limits cap the whole request.
///
/// # Default Values
///
/// - `max_request_body_bytes`: 512 MB (ten 50 MB files plus form overhead)
/// - `max_multipart_field_bytes`: 512 MB
///
/// # Configuration via Environment Variables
///
/// ```bash
/// # In bytes:
/// export PDFTOOLS_MAX_REQUEST_BODY_BYTES=536870912      # 512 MB
/// export PDFTOOLS_MAX_MULTIPART_FIELD_BYTES=104857600   # 100 MB
///
/// # In MB (applies to both limits):
/// export PDFTOOLS_MAX_UPLOAD_SIZE_MB=512
/// ```
///
/// # Examples
///
/// ```
/// use pdftools::api::ApiSizeLimits;
///
/// let limits = ApiSizeLimits::default();
/// assert_eq!(limits.max_request_body_bytes, 512 * 1024 * 1024);
///
/// let small = ApiSizeLimits::from_mb(20, 20);
/// assert_eq!(small.max_multipart_field_bytes, 20 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ApiSizeLimits {
    /// Maximum size of the entire request body in bytes.
    pub max_request_body_bytes: usize,

    /// Maximum size of a single multipart field in bytes.
    pub max_multipart_field_bytes: usize,
}

/// Default request limit, in megabytes.
pub const DEFAULT_MAX_UPLOAD_SIZE_MB: usize = 512;

impl Default for ApiSizeLimits {
    fn default() -> Self {
        Self::from_mb(DEFAULT_MAX_UPLOAD_SIZE_MB, DEFAULT_MAX_UPLOAD_SIZE_MB)
    }
}

impl ApiSizeLimits {
    /// Create new size limits with custom values, in bytes.
    pub fn new(max_request_body_bytes: usize, max_multipart_field_bytes: usize) -> Self {
        Self {
            max_request_body_bytes,
            max_multipart_field_bytes,
        }
    }

    /// Create size limits from MB values.
    pub fn from_mb(max_request_body_mb: usize, max_multipart_field_mb: usize) -> Self {
        Self {
            max_request_body_bytes: max_request_body_mb * 1024 * 1024,
            max_multipart_field_bytes: max_multipart_field_mb * 1024 * 1024,
        }
    }
}

/// Global health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Health status
    pub status: String,
    /// Crate version
    pub version: String,
}

/// Per-service health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceHealthResponse {
    pub success: bool,
    pub message: String,
    pub service: String,
}

/// `GET /api/compress/info` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressInfoResponse {
    pub success: bool,
    /// Keyed by the `compression_type` form value
    pub compression_types: BTreeMap<String, CompressionTypeInfo>,
    /// Per-file limit, e.g. `"50MB"`
    pub max_file_size: String,
    pub allowed_extensions: Vec<String>,
}

/// `GET /api/merge/info` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeInfoResponse {
    pub success: bool,
    pub service: String,
    pub max_files: usize,
    /// Per-file limit, e.g. `"50MB"`
    pub max_file_size: String,
    pub supported_formats: Vec<String>,
    pub description: String,
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    /// Error type name
    pub error_type: String,
    /// Error message
    pub message: String,
    /// HTTP status code
    pub status_code: u16,
}

/// API server state.
///
/// Holds the service configuration loaded from a config file (via discovery
/// or explicit path). Nothing in it changes after startup.
#[derive(Debug, Clone)]
pub struct ApiState {
    pub config: Arc<ServiceConfig>,
}
