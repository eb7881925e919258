pub mod records;

use crate::models::Variant;
use crate::state::AppState;

use axum::Router;
use std::sync::Arc;

/// Routes nested under `/v1`.
pub fn router(variant: Variant) -> Router<Arc<AppState>> {
    Router::new().merge(records::router(variant))
}

pub fn api_docs(variant: Variant) -> utoipa::openapi::OpenApi {
    records::api_docs(variant)
}
