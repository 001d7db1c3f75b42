use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{middleware as axum_middleware, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::middleware::rate_limit_middleware;
use super::openapi::{self, ApiDoc};
use super::{handlers, AppState};

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Large enough for a full batch of max-size files plus multipart
    // framing; the validator still enforces the per-file bound.
    let body_limit = DefaultBodyLimit::max(
        state.config.upload.max_file_size * state.config.upload.max_batch_size + 1024 * 1024,
    );

    Router::new()
        .route("/health", get(handlers::health))
        .route("/extract-text", post(handlers::extract_text))
        .route("/batch-extract", post(handlers::batch_extract))
        .route("/openapi.json", get(openapi::openapi_json))
        .merge(Redoc::with_url("/docs", ApiDoc::openapi()))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(body_limit)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
