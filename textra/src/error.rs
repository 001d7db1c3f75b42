use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TextraError {
    /// The uploaded image failed validation (missing, wrong type, too
    /// large, undecodable, or too many items in a batch).
    #[error("{0}")]
    InvalidImage(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// The OCR provider failed after all retry attempts were exhausted.
    #[error("OCR processing failed: {0}")]
    Provider(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for TextraError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            TextraError::InvalidImage(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            TextraError::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            // Provider exhaustion is reported as a request-level failure,
            // not a server fault.
            TextraError::Provider(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            TextraError::Internal(detail) => {
                tracing::error!(error = %detail, "unhandled error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "status_code": status.as_u16(),
            "data": serde_json::Value::Null,
            "error": message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, TextraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_display_includes_prefix() {
        let err = TextraError::Provider("connection reset".to_string());
        assert_eq!(err.to_string(), "OCR processing failed: connection reset");
    }

    #[test]
    fn test_invalid_image_display_is_bare_message() {
        let err = TextraError::InvalidImage("File exceeds size limit.".to_string());
        assert_eq!(err.to_string(), "File exceeds size limit.");
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let err = TextraError::Internal("secret detail".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal server error");
        assert_eq!(json["success"], false);
        assert!(json["data"].is_null());
    }

    #[tokio::test]
    async fn test_rate_limited_maps_to_429() {
        let err = TextraError::RateLimited("10 per 60s".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
