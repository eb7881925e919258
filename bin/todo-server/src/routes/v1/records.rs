//! Record endpoints: create, update, list and remove.
//!
//! Mounted under the variant's prefix (`/v1/task` or `/v1/record`). The
//! OpenAPI paths below are declared under `/v1/task` and rewritten for the
//! log variant in [`api_docs`].

use std::sync::Arc;

use axum::extract::rejection::{BytesRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post, put};
use axum::Router;
use bytes::Bytes;
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::handlers::records::{self, DELETED, UPDATED};
use crate::middleware::identity::Identity;
use crate::models::Variant;
use crate::schemas::envelope::Envelope;
use crate::schemas::record::ListQuery;
use crate::state::AppState;

const DOC_PREFIX: &str = "/v1/task";

#[derive(OpenApi)]
#[openapi(
    paths(create_record, update_record, list_records, remove_record),
    components(schemas(Envelope))
)]
pub struct RecordsApi;

pub fn api_docs(variant: Variant) -> utoipa::openapi::OpenApi {
    let mut doc = RecordsApi::openapi();
    let prefix = variant.route_prefix();
    if prefix != DOC_PREFIX {
        doc.paths.paths = std::mem::take(&mut doc.paths.paths)
            .into_iter()
            .map(|(path, item)| (path.replacen(DOC_PREFIX, prefix, 1), item))
            .collect();
    }
    doc
}

/// Register the record routes for `variant`.
pub fn router(variant: Variant) -> Router<Arc<AppState>> {
    let prefix = variant.route_prefix();
    Router::new()
        .route(&format!("{prefix}/create"), post(create_record))
        .route(&format!("{prefix}/update"), put(update_record).patch(update_record))
        .route(&format!("{prefix}/list"), get(list_records))
        .route(&format!("{prefix}/{{id}}"), delete(remove_record))
}

#[utoipa::path(
    post,
    path = "/v1/task/create",
    tag = "records",
    params(("uid" = String, Header, description = "Caller id set by the auth gateway")),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Record created; `data` is the new id", body = Envelope),
        (status = 400, description = "Bad identity, empty/malformed body or missing field", body = Envelope),
        (status = 413, description = "Body over the size cap", body = Envelope),
        (status = 500, description = "Store error", body = Envelope),
    )
)]
pub async fn create_record(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    body: Result<Bytes, BytesRejection>,
) -> Result<Envelope, ServerError> {
    let body = body?;
    let id = records::create(state.store.as_ref(), state.config.variant, identity, &body).await?;
    Ok(Envelope::ok(id.to_hex()))
}

#[utoipa::path(
    put,
    path = "/v1/task/update",
    tag = "records",
    params(("uid" = String, Header, description = "Caller id set by the auth gateway")),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Record updated", body = Envelope),
        (status = 400, description = "Bad identity, empty/malformed body or missing field", body = Envelope),
        (status = 404, description = "No such record for this caller", body = Envelope),
        (status = 413, description = "Body over the size cap", body = Envelope),
        (status = 500, description = "Store error", body = Envelope),
    )
)]
pub async fn update_record(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    body: Result<Bytes, BytesRejection>,
) -> Result<Envelope, ServerError> {
    let body = body?;
    records::update(state.store.as_ref(), state.config.variant, identity, &body).await?;
    Ok(Envelope::ok(UPDATED))
}

#[utoipa::path(
    get,
    path = "/v1/task/list",
    tag = "records",
    params(
        ("uid" = String, Header, description = "Caller id set by the auth gateway"),
        ListQuery,
    ),
    responses(
        (status = 200, description = "One page of the caller's records plus their total", body = Envelope),
        (status = 400, description = "Bad identity or undecodable query", body = Envelope),
        (status = 500, description = "Store error", body = Envelope),
    )
)]
pub async fn list_records(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Envelope, ServerError> {
    let Query(q) = query?;
    let listing =
        records::list(state.store.as_ref(), state.config.variant, identity, q.page()).await?;
    let total = listing.total;
    Ok(Envelope::ok_with_total(listing.into_value(), total))
}

#[utoipa::path(
    delete,
    path = "/v1/task/{id}",
    tag = "records",
    params(
        ("uid" = String, Header, description = "Caller id set by the auth gateway"),
        ("id" = String, Path, description = "Id of the record to delete"),
    ),
    responses(
        (status = 200, description = "Record deleted", body = Envelope),
        (status = 400, description = "Bad identity or record id", body = Envelope),
        (status = 404, description = "No such record for this caller", body = Envelope),
        (status = 500, description = "Store error", body = Envelope),
    )
)]
pub async fn remove_record(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    path: Result<Path<String>, PathRejection>,
) -> Result<Envelope, ServerError> {
    let Path(id) =
        path.map_err(|e| ServerError::InvalidIdentity(format!("invalid record id: {}", e.body_text())))?;
    records::remove(state.store.as_ref(), identity, &id).await?;
    Ok(Envelope::ok(DELETED))
}
