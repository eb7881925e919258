use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ServerError;
use crate::state::AppState;

pub static GATEWAY_TOKEN_HEADER: &str = "x-gateway-token";

/// Only let requests through that came via the auth gateway.
///
/// A no-op unless `TODO_GATEWAY_TOKEN` is configured; without it the `uid`
/// header is trusted as-is.
pub async fn require_gateway(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(expected) = state.config.gateway_token.as_deref() {
        let provided = req
            .headers()
            .get(GATEWAY_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected) {
            return ServerError::Unauthorized.into_response();
        }
    }
    next.run(req).await
}
