//! API server setup and configuration.

use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::{PdfToolsError, Result, ServiceConfig};

use super::{
    handlers::{
        compress_handler, compress_health_handler, compress_info_handler, health_handler, merge_handler,
        merge_health_handler, merge_info_handler,
    },
    types::{ApiSizeLimits, ApiState},
};

/// Parse size limits from environment variables.
///
/// Reads environment variables in the following order of preference:
/// 1. `PDFTOOLS_MAX_REQUEST_BODY_BYTES` - Maximum total request body size (in bytes)
/// 2. `PDFTOOLS_MAX_MULTIPART_FIELD_BYTES` - Maximum individual multipart field size (in bytes)
/// 3. `PDFTOOLS_MAX_UPLOAD_SIZE_MB` - Maximum upload size in MB (applies to both limits)
///
/// Falls back to the default (512 MB) if not set or invalid.
pub fn parse_size_limits_from_env() -> ApiSizeLimits {
    if let Ok(value) = std::env::var("PDFTOOLS_MAX_REQUEST_BODY_BYTES") {
        match value.parse::<usize>() {
            Ok(bytes) if bytes > 0 => {
                let multipart_bytes = std::env::var("PDFTOOLS_MAX_MULTIPART_FIELD_BYTES")
                    .ok()
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(bytes);

                tracing::info!(
                    "Upload size limits configured from environment: request_body={} bytes, multipart_field={} bytes",
                    bytes,
                    multipart_bytes
                );

                return ApiSizeLimits::new(bytes, multipart_bytes);
            }
            Ok(_) => tracing::warn!("Invalid PDFTOOLS_MAX_REQUEST_BODY_BYTES value (must be > 0)"),
            Err(_) => tracing::warn!(
                "Failed to parse PDFTOOLS_MAX_REQUEST_BODY_BYTES='{}', must be a valid usize",
                value
            ),
        }
    }

    if let Ok(value) = std::env::var("PDFTOOLS_MAX_UPLOAD_SIZE_MB") {
        match value.parse::<usize>() {
            Ok(mb) if mb > 0 => {
                tracing::info!("Upload size limit configured from environment: {} MB", mb);
                return ApiSizeLimits::from_mb(mb, mb);
            }
            Ok(_) => tracing::warn!("Invalid PDFTOOLS_MAX_UPLOAD_SIZE_MB value (must be > 0)"),
            Err(_) => tracing::warn!(
                "Failed to parse PDFTOOLS_MAX_UPLOAD_SIZE_MB='{}', must be a valid usize",
                value
            ),
        }
    }

    let limits = ApiSizeLimits::default();
    tracing::info!(
        "Upload size limit: {} bytes (default) - Configure with PDFTOOLS_MAX_REQUEST_BODY_BYTES or PDFTOOLS_MAX_UPLOAD_SIZE_MB",
        limits.max_request_body_bytes
    );
    limits
}

fn cors_layer_from_env() -> CorsLayer {
    let Ok(origins_str) = std::env::var("PDFTOOLS_CORS_ORIGINS") else {
        tracing::warn!(
            "CORS configured to allow all origins (default). For production, set PDFTOOLS_CORS_ORIGINS \
             to a comma-separated list of allowed origins"
        );
        return CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    };

    let origins: Vec<_> = origins_str
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("PDFTOOLS_CORS_ORIGINS set but empty/invalid - falling back to permissive CORS");
        return CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    }

    tracing::info!("CORS configured with {} explicit allowed origin(s)", origins.len());
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Create the API router with all routes configured.
///
/// This is public to allow users to embed the router in their own applications.
///
/// # Examples
///
/// ```no_run
/// use pdftools::{ServiceConfig, api::create_router};
///
/// # #[tokio::main]
/// # async fn main() {
/// let router = create_router(ServiceConfig::default());
/// # }
/// ```
pub fn create_router(config: ServiceConfig) -> Router {
    create_router_with_limits(config, ApiSizeLimits::default())
}

/// Create the API router with custom size limits.
///
/// Requests whose body exceeds `limits.max_request_body_bytes` are rejected
/// with 413 before any handler runs.
pub fn create_router_with_limits(config: ServiceConfig, limits: ApiSizeLimits) -> Router {
    let state = ApiState {
        config: Arc::new(config),
    };

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/compress", post(compress_handler))
        .route("/api/compress/info", get(compress_info_handler))
        .route("/api/compress/health", get(compress_health_handler))
        .route("/api/merge", post(merge_handler))
        .route("/api/merge/info", get(merge_info_handler))
        .route("/api/merge/health", get(merge_health_handler))
        .layer(DefaultBodyLimit::max(limits.max_multipart_field_bytes))
        .layer(RequestBodyLimitLayer::new(limits.max_request_body_bytes))
        .layer(cors_layer_from_env())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the API server with config file discovery.
///
/// Searches for `pdftools.toml` in current and parent directories. If no
/// config file is found, uses default configuration.
///
/// # Environment Variables
///
/// ```bash
/// # CORS (default: allow all origins)
/// export PDFTOOLS_CORS_ORIGINS="https://app.example.com,https://admin.example.com"
///
/// # Upload size limits (default: 512 MB)
/// export PDFTOOLS_MAX_REQUEST_BODY_BYTES=536870912
/// export PDFTOOLS_MAX_UPLOAD_SIZE_MB=512
/// ```
pub async fn serve(host: impl AsRef<str>, port: u16) -> Result<()> {
    let config = match ServiceConfig::discover()? {
        Some(config) => {
            tracing::info!("Loaded service config from discovered file");
            config
        }
        None => {
            tracing::info!("No config file found, using default configuration");
            ServiceConfig::default()
        }
    };

    serve_with_config_and_limits(host, port, config, parse_size_limits_from_env()).await
}

/// Start the API server with explicit config and environment-derived limits.
pub async fn serve_with_config(host: impl AsRef<str>, port: u16, config: ServiceConfig) -> Result<()> {
    serve_with_config_and_limits(host, port, config, parse_size_limits_from_env()).await
}

/// Start the API server with explicit config and size limits.
pub async fn serve_with_config_and_limits(
    host: impl AsRef<str>,
    port: u16,
    config: ServiceConfig,
    limits: ApiSizeLimits,
) -> Result<()> {
    let ip: IpAddr = host
        .as_ref()
        .parse()
        .map_err(|e| PdfToolsError::validation(format!("Invalid host address: {}", e)))?;

    let addr = SocketAddr::new(ip, port);
    let app = create_router_with_limits(config, limits);

    tracing::info!("Starting pdftools API server on http://{}:{}", ip, port);

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(PdfToolsError::Io)?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| PdfToolsError::Other(e.to_string()))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
