//! HTTP error mapping.

use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::PdfToolsError;
use crate::core::filename::sanitize_text;

use super::types::ErrorResponse;

/// Error returned by API handlers.
///
/// Client mistakes become 400, oversized bodies 413, everything else 500.
#[derive(Debug)]
pub enum ApiError {
    Validation(PdfToolsError),
    PayloadTooLarge(String),
    Internal(PdfToolsError),
}

impl ApiError {
    pub fn internal(error: PdfToolsError) -> Self {
        ApiError::Internal(error)
    }

    /// Shorthand for a 400 with `message`.
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::Validation(PdfToolsError::validation(message))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::Validation(e) | ApiError::Internal(e) => e.kind(),
            ApiError::PayloadTooLarge(_) => "PayloadTooLarge",
        }
    }

    fn message(&self) -> String {
        match self {
            // Validation messages are shown to the user as-is, without the variant prefix.
            ApiError::Validation(PdfToolsError::Validation { message, .. }) => message.clone(),
            ApiError::Validation(e) => e.to_string(),
            ApiError::PayloadTooLarge(message) => message.clone(),
            ApiError::Internal(e) => format!("Internal server error: {}", e),
        }
    }
}

impl From<PdfToolsError> for ApiError {
    fn from(error: PdfToolsError) -> Self {
        if error.is_client_error() {
            ApiError::Validation(error)
        } else {
            ApiError::Internal(error)
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(error: MultipartError) -> Self {
        if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(error.body_text())
        } else {
            ApiError::bad_request(format!("Invalid multipart request: {}", error.body_text()))
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error_type = self.error_type(), "Request failed: {}", self.message());
        } else {
            tracing::debug!(error_type = self.error_type(), "Request rejected: {}", self.message());
        }

        let body = ErrorResponse {
            success: false,
            error_type: self.error_type().to_string(),
            message: sanitize_text(&self.message()),
            status_code: status.as_u16(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_response() {
        let response = ApiError::bad_request("No file was sent").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error_type"], "ValidationError");
        assert_eq!(json["message"], "No file was sent");
        assert_eq!(json["status_code"], 400);
    }

    #[tokio::test]
    async fn test_internal_error_response() {
        let response = ApiError::from(PdfToolsError::compression("gs and lopdf failed")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["error_type"], "CompressionError");
        assert!(json["message"].as_str().unwrap().starts_with("Internal server error"));
    }

    #[tokio::test]
    async fn test_messages_are_sanitized() {
        let response = ApiError::bad_request("bad\u{0}name\u{7}.pdf").into_response();
        let json = body_json(response).await;
        assert_eq!(json["message"], "badname.pdf");
    }

    #[test]
    fn test_client_errors_map_to_400() {
        let error: ApiError = PdfToolsError::validation("nope").into();
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);

        let error: ApiError = PdfToolsError::Other("boom".to_string()).into();
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
