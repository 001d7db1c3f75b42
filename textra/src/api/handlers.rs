use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;

use crate::error::{Result, TextraError};
use crate::models::{BatchItem, PipelineOutcome, UploadedImage};

use super::response::ApiResponse;
use super::state::AppState;

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct HealthData {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct BatchData {
    pub results: Vec<BatchItem>,
}

/// `GET /health`
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is up", body = HealthData),
    )
)]
pub async fn health() -> Json<HealthData> {
    Json(HealthData {
        status: "healthy".to_string(),
    })
}

/// `POST /extract-text`
///
/// Accepts a multipart form with a single `image` file field and returns the
/// extracted text, aggregate confidence, processing time, and image
/// metadata.
#[utoipa::path(
    post,
    path = "/extract-text",
    tag = "extraction",
    request_body(content_type = "multipart/form-data", content = String, description = "Image file in the `image` field"),
    responses(
        (status = 200, description = "Successful OCR extraction", body = PipelineOutcome),
        (status = 422, description = "Validation or provider failure"),
        (status = 429, description = "Rate limit exceeded"),
    )
)]
pub async fn extract_text(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<ApiResponse<PipelineOutcome>> {
    let mut upload: Option<UploadedImage> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| TextraError::InvalidImage(format!("Malformed upload: {e}")))?
    {
        if field.name() == Some("image") {
            upload = Some(read_image_field(field).await?);
        }
    }

    let upload =
        upload.ok_or_else(|| TextraError::InvalidImage("No image uploaded.".to_string()))?;

    let outcome = state.pipeline.process(upload).await?;
    Ok(ApiResponse::success(outcome))
}

/// `POST /batch-extract`
///
/// Accepts up to the configured maximum of files in repeated `images`
/// fields. Items are processed concurrently; each response slot is either a
/// full extraction result or `{"error": ...}` for that item, in submission
/// order.
#[utoipa::path(
    post,
    path = "/batch-extract",
    tag = "extraction",
    request_body(content_type = "multipart/form-data", content = String, description = "Image files in repeated `images` fields"),
    responses(
        (status = 200, description = "Per-item extraction results", body = BatchData),
        (status = 422, description = "Batch too large or malformed upload"),
        (status = 429, description = "Rate limit exceeded"),
    )
)]
pub async fn batch_extract(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<ApiResponse<BatchData>> {
    let mut uploads: Vec<UploadedImage> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| TextraError::InvalidImage(format!("Malformed upload: {e}")))?
    {
        if field.name() == Some("images") {
            uploads.push(read_image_field(field).await?);
        }
    }

    if uploads.is_empty() {
        return Err(TextraError::InvalidImage("No image uploaded.".to_string()));
    }

    let results = state.batch.process_batch(uploads).await?;
    Ok(ApiResponse::success(BatchData { results }))
}

async fn read_image_field(field: Field<'_>) -> Result<UploadedImage> {
    let filename = field.file_name().map(String::from);
    let content_type = field.content_type().map(String::from);

    let bytes = field
        .bytes()
        .await
        .map_err(|e| TextraError::InvalidImage(format!("Failed to read file: {e}")))?;

    Ok(UploadedImage {
        bytes: bytes.to_vec(),
        content_type,
        filename,
    })
}
