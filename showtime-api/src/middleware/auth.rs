use axum::{
    extract::{Query, Request, State},
    http::Uri,
    middleware::Next,
    response::Response,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Deserialize)]
struct ApiKeyQuery {
    api_dev_key: Option<String>,
}

// ============================================================================
// API Key Middleware
// ============================================================================

/// Rejects `/v1` requests that carry no accepted key, either in the
/// `x-api-key` header or as the `api_dev_key` query parameter.
pub async fn api_key_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if state.auth.is_open() {
        return Ok(next.run(req).await);
    }

    let key = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| key_from_query(req.uri()));

    match key {
        Some(key) if state.auth.accepts(&key) => Ok(next.run(req).await),
        Some(_) => {
            tracing::warn!("Rejected request to {}: unknown API key", req.uri().path());
            Err(AppError::AuthenticationError("Invalid API key".to_string()))
        }
        None => Err(AppError::AuthenticationError("Missing API key".to_string())),
    }
}

// malformed query strings count as no key
fn key_from_query(uri: &Uri) -> Option<String> {
    Query::<ApiKeyQuery>::try_from_uri(uri)
        .ok()
        .and_then(|Query(query)| query.api_dev_key)
}
