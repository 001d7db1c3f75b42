use axum::Json;
use utoipa::OpenApi;

use crate::models;

use super::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Textra OCR API",
        version = "1.0.0",
        description = "Extracts text from uploaded images via a cloud vision OCR provider.",
    ),
    paths(
        handlers::health,
        handlers::extract_text,
        handlers::batch_extract,
    ),
    components(schemas(
        handlers::HealthData,
        handlers::BatchData,
        models::PipelineOutcome,
        models::ImageMetadata,
        models::BatchItem,
    ))
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
