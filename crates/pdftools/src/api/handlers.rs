//! API request handlers.
//!
//! Every upload request owns a [`RequestWorkspace`]; the generated PDF is
//! read back into memory before the handler returns, so the workspace (and
//! every temp file in it) is gone by the time the response is sent.

use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Multipart, State},
    http::{HeaderMap, HeaderName, HeaderValue, header},
    response::{IntoResponse, Response},
};
use std::collections::BTreeMap;

use crate::PdfToolsError;
use crate::compression::{compress_pdf, compression_types};
use crate::core::filename::secure_filename;
use crate::core::io::RequestWorkspace;
use crate::core::mime::{COMPRESS_EXTENSIONS, MERGE_EXTENSIONS, PDF_MIME_TYPE, is_allowed, validate_upload};
use crate::merge::{MergeInput, merge_files};
use crate::types::CompressionLevel;

use super::{
    error::ApiError,
    types::{ApiState, CompressInfoResponse, HealthResponse, MergeInfoResponse, ServiceHealthResponse},
};

const COMPRESS_SERVICE: &str = "pdftools - PDF Compress";
const MERGE_SERVICE: &str = "pdftools - PDF Merge";

/// An uploaded file taken out of a multipart body.
struct Upload {
    file_name: String,
    data: Bytes,
}

fn new_workspace(state: &ApiState) -> Result<RequestWorkspace, ApiError> {
    RequestWorkspace::new(state.config.temp_dir.as_deref()).map_err(ApiError::internal)
}

fn header_value(value: impl AsRef<str>) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(value.as_ref())
        .map_err(|e| ApiError::internal(PdfToolsError::Other(format!("Invalid header value: {}", e))))
}

/// Build a PDF attachment response with extra statistic headers.
fn pdf_attachment(data: Vec<u8>, download_name: &str, stats: &[(&'static str, String)]) -> Result<Response, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(PDF_MIME_TYPE));
    headers.insert(
        header::CONTENT_DISPOSITION,
        header_value(format!("attachment; filename=\"{}\"", download_name))?,
    );
    for (name, value) in stats {
        headers.insert(HeaderName::from_static(*name), header_value(value)?);
    }

    Ok((headers, Body::from(data)).into_response())
}

/// Compress endpoint handler.
///
/// POST /api/compress
///
/// Accepts multipart form data with:
/// - `file`: the PDF to compress
/// - `compression_type` (optional): `optimized` or `maximum`; anything else
///   means `optimized`
///
/// Returns the compressed PDF as an attachment named `compressed_<name>`,
/// with size statistics in `X-*` headers.
pub async fn compress_handler(State(state): State<ApiState>, mut multipart: Multipart) -> Result<Response, ApiError> {
    let mut upload: Option<Upload> = None;
    let mut level = state.config.compression.default_level;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let data = field.bytes().await?;
                upload = Some(Upload { file_name, data });
            }
            "compression_type" => {
                let value = field.text().await?;
                level = CompressionLevel::from_form_value(&value);
            }
            _ => {}
        }
    }

    let Some(upload) = upload else {
        return Err(ApiError::bad_request("No file was sent"));
    };
    if upload.file_name.is_empty() {
        return Err(ApiError::bad_request("No file was selected"));
    }
    if !is_allowed(&upload.file_name, COMPRESS_EXTENSIONS) {
        return Err(ApiError::bad_request("Only PDF files are allowed"));
    }
    let max_size = state.config.compression.max_file_size_bytes();
    if upload.data.len() as u64 > max_size {
        return Err(ApiError::bad_request(format!(
            "File too large. Maximum size: {}MB",
            state.config.compression.max_file_size_mb
        )));
    }
    validate_upload(&upload.file_name, &upload.data, COMPRESS_EXTENSIONS)?;

    let download_name = format!("compressed_{}", secure_filename(&upload.file_name));

    let mut workspace = new_workspace(&state)?;
    let input = workspace.write_upload(&upload.file_name, &upload.data).await?;
    let output = workspace.output_path(&download_name);

    let outcome = compress_pdf(&input, &output, level, &state.config).await?;
    let data = tokio::fs::read(&outcome.output_path).await.map_err(PdfToolsError::Io)?;
    if let Err(e) = workspace.close() {
        tracing::warn!("{}", e);
    }

    let stats = &outcome.stats;
    pdf_attachment(
        data,
        &download_name,
        &[
            ("x-original-size", stats.original_size.to_string()),
            ("x-compressed-size", stats.compressed_size.to_string()),
            ("x-reduction-percent", format!("{:.1}", stats.reduction_percent)),
            ("x-compression-method", stats.method.as_str().to_string()),
        ],
    )
}

/// Merge endpoint handler.
///
/// POST /api/merge
///
/// Accepts multipart form data with one `files` field per input (PDF, PNG,
/// JPG or JPEG). Pages are merged in upload order.
///
/// Returns the merged PDF as an attachment named `merged_pdf_<id>.pdf`.
pub async fn merge_handler(State(state): State<ApiState>, mut multipart: Multipart) -> Result<Response, ApiError> {
    let mut uploads: Vec<Upload> = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("files") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("").to_string();
        let data = field.bytes().await?;
        uploads.push(Upload { file_name, data });
    }

    let merge_config = &state.config.merge;
    if uploads.is_empty() {
        return Err(ApiError::bad_request("No files were sent"));
    }
    if uploads.len() < merge_config.min_files {
        return Err(ApiError::bad_request(format!(
            "At least {} files are required to merge",
            merge_config.min_files
        )));
    }
    if uploads.len() > merge_config.max_files {
        return Err(ApiError::bad_request(format!(
            "A maximum of {} files is allowed",
            merge_config.max_files
        )));
    }

    let max_size = merge_config.max_file_size_bytes();
    for (index, upload) in uploads.iter().enumerate() {
        if upload.file_name.is_empty() {
            return Err(ApiError::bad_request(format!("File {} was not selected", index + 1)));
        }
        if !is_allowed(&upload.file_name, MERGE_EXTENSIONS) {
            return Err(ApiError::bad_request(format!(
                "File '{}' is not a supported type. Allowed: PDF, PNG, JPG, JPEG",
                upload.file_name
            )));
        }
        if upload.data.len() as u64 > max_size {
            return Err(ApiError::bad_request(format!(
                "File '{}' is too large. Maximum size: {}MB",
                upload.file_name, merge_config.max_file_size_mb
            )));
        }
        validate_upload(&upload.file_name, &upload.data, MERGE_EXTENSIONS)?;
    }

    let mut workspace = new_workspace(&state)?;
    let mut inputs = Vec::with_capacity(uploads.len());
    for upload in &uploads {
        let path = workspace.write_upload(&upload.file_name, &upload.data).await?;
        inputs.push(MergeInput::with_name(path, upload.file_name.clone()));
    }

    let id = uuid::Uuid::new_v4().simple().to_string();
    let download_name = format!("merged_pdf_{}.pdf", &id[..8]);
    let output = workspace.output_path(&download_name);

    let stats = merge_files(&inputs, &output).await?;
    let data = tokio::fs::read(&output).await.map_err(PdfToolsError::Io)?;
    if let Err(e) = workspace.close() {
        tracing::warn!("{}", e);
    }

    tracing::info!(
        "Merged {} files into {} pages ({})",
        stats.total_files,
        stats.total_pages,
        stats.output_size_formatted
    );

    pdf_attachment(
        data,
        &download_name,
        &[
            ("x-total-files", stats.total_files.to_string()),
            ("x-total-pages", stats.total_pages.to_string()),
        ],
    )
}

/// Health check endpoint handler.
///
/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/compress/health
pub async fn compress_health_handler() -> Json<ServiceHealthResponse> {
    Json(ServiceHealthResponse {
        success: true,
        message: "PDF compression service is running".to_string(),
        service: COMPRESS_SERVICE.to_string(),
    })
}

/// GET /api/merge/health
pub async fn merge_health_handler() -> Json<ServiceHealthResponse> {
    Json(ServiceHealthResponse {
        success: true,
        message: "PDF merge service is running".to_string(),
        service: MERGE_SERVICE.to_string(),
    })
}

/// Compression info endpoint handler.
///
/// GET /api/compress/info
pub async fn compress_info_handler(State(state): State<ApiState>) -> Json<CompressInfoResponse> {
    let compression_types: BTreeMap<String, _> = compression_types()
        .iter()
        .map(|(level, info)| (level.as_str().to_string(), info.clone()))
        .collect();

    Json(CompressInfoResponse {
        success: true,
        compression_types,
        max_file_size: format!("{}MB", state.config.compression.max_file_size_mb),
        allowed_extensions: COMPRESS_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
    })
}

/// Merge info endpoint handler.
///
/// GET /api/merge/info
pub async fn merge_info_handler(State(state): State<ApiState>) -> Json<MergeInfoResponse> {
    Json(MergeInfoResponse {
        success: true,
        service: MERGE_SERVICE.to_string(),
        max_files: state.config.merge.max_files,
        max_file_size: format!("{}MB", state.config.merge.max_file_size_mb),
        supported_formats: MERGE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        description: "Merges multiple PDF files and PNG/JPG images into a single PDF document".to_string(),
    })
}
