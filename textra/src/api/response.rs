//! Response envelope shared by every endpoint.
//!
//! All four fields are always present on the wire:
//!
//! ```json
//! { "success": true, "status_code": 200, "data": { ... }, "error": "" }
//! ```
//!
//! On failure `data` is `null` and `error` carries the message. The HTTP
//! status code always matches `status_code`. Error responses are produced by
//! the [`crate::error::TextraError`] `IntoResponse` impl in the same shape.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub status_code: u16,
    pub data: Option<T>,
    pub error: String,
}

impl<T: Serialize> ApiResponse<T> {
    /// Success envelope with data (HTTP 200).
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            status_code: StatusCode::OK.as_u16(),
            data: Some(data),
            error: String::new(),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
