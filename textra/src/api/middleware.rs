//! Per-route rate limiting middleware.
//!
//! Gates `/extract-text` and `/batch-extract` by client identity before any
//! body bytes are read, so over-quota requests incur no validation or
//! provider cost. Other routes pass through untouched. Rejections use the
//! standard envelope with HTTP 429.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::state::AppState;

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path();
    let quota = match path {
        "/extract-text" => state.config.rate_limit.extract_per_window,
        "/batch-extract" => state.config.rate_limit.batch_per_window,
        _ => return next.run(request).await,
    };

    let client = client_key(&request);
    let route = path.to_string();

    if let Err(err) = state.limiter.check(&client, &route, quota) {
        tracing::warn!(client = %client, route = %route, "rate limit exceeded");
        return err.into_response();
    }

    next.run(request).await
}

/// Client identity for quota accounting: the first `X-Forwarded-For` hop
/// when present (deployments behind a proxy), otherwise the peer address.
fn client_key(request: &Request<Body>) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
