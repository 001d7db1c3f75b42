use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// An image as received from the HTTP boundary. Owned by the request and
/// never persisted.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub filename: Option<String>,
}

/// Metadata derived once during validation.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ImageMetadata {
    /// Decoded image format, e.g. "JPEG" or "PNG".
    pub format: String,
    pub width: u32,
    pub height: u32,
    /// Pixel layout of the decoded image, e.g. "RGB" or "L".
    pub color_mode: String,
    /// EXIF tag name to rendered value. Empty when the image carries no EXIF.
    pub exif: HashMap<String, String>,
}

/// What the OCR provider produced for one image. Immutable once created and
/// shared between the result cache and every pipeline invocation that hits
/// the same content hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrOutcome {
    pub text: String,
    /// Mean per-symbol confidence in [0.0, 1.0], rounded to 2 decimals.
    pub confidence: f64,
}

/// Fully assembled result for one image.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PipelineOutcome {
    pub text: String,
    pub confidence: f64,
    pub processing_time_ms: u64,
    pub metadata: ImageMetadata,
}

/// One slot of a batch response: either a full outcome or the error that
/// stopped that item. Slots appear in submission order.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum BatchItem {
    Success(PipelineOutcome),
    Failure { error: String },
}
