//! REST API server for PDF compression and merging.
//!
//! This module provides an Axum-based HTTP server with multipart upload
//! endpoints for both operations.
//!
//! # Endpoints
//!
//! - `POST /api/compress` - Compress one PDF (`file`, optional `compression_type`)
//! - `GET /api/compress/info` - Compression levels and upload limits
//! - `GET /api/compress/health` - Compression service health
//! - `POST /api/merge` - Merge 2 to 10 PDFs/images (`files`)
//! - `GET /api/merge/info` - Merge limits and supported formats
//! - `GET /api/merge/health` - Merge service health
//! - `GET /health` - Global health check
//!
//! # Examples
//!
//! ## Starting the server
//!
//! ```no_run
//! use pdftools::api::serve;
//!
//! #[tokio::main]
//! async fn main() -> pdftools::Result<()> {
//!     serve("127.0.0.1", 3000).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Embedding the router in your app
//!
//! ```no_run
//! use pdftools::{ServiceConfig, api::create_router};
//! use axum::Router;
//!
//! let pdf_router = create_router(ServiceConfig::default());
//! let app: Router = Router::new().nest("/pdf", pdf_router);
//! ```
//!
//! # cURL Examples
//!
//! ```bash
//! # Compress with the aggressive profile
//! curl -F "file=@report.pdf" -F "compression_type=maximum" \
//!      -o compressed.pdf http://localhost:3000/api/compress
//!
//! # Merge two PDFs and a scan
//! curl -F "files=@a.pdf" -F "files=@b.pdf" -F "files=@scan.jpg" \
//!      -o merged.pdf http://localhost:3000/api/merge
//! ```

mod error;
mod handlers;
mod server;
mod types;

pub use error::ApiError;
pub use server::{
    create_router, create_router_with_limits, parse_size_limits_from_env, serve, serve_with_config,
    serve_with_config_and_limits,
};
pub use types::{
    ApiSizeLimits, ApiState, CompressInfoResponse, ErrorResponse, HealthResponse, MergeInfoResponse,
    ServiceHealthResponse,
};
