//! Record pipelines behind the HTTP routes.
//!
//! Each operation is a short chain that stops at the first failing step.
//! Everything before the store call is pure, so nothing needs undoing.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info};

use crate::entities::{Document, Filter, Page, RecordStore, Sort};
use crate::error::ServerError;
use crate::middleware::identity::Identity;
use crate::models::payload::{self, KEY_CREATE_AT, KEY_DERATION, KEY_ID, KEY_UPDATE_AT};
use crate::models::rules::check_required;
use crate::models::{ObjectId, Payload, Variant};

pub const UPDATED: &str = "updated successfully";
pub const DELETED: &str = "deleted successfully";

fn not_found(id: ObjectId) -> ServerError {
    ServerError::NotFound(format!("record {id} not found"))
}

/// Nanoseconds between the caller's latest record and `now`.
///
/// Zero when there is no earlier record or its `createAt` is unreadable.
async fn elapsed_since_previous<S: RecordStore>(
    store: &S,
    uid: ObjectId,
    now: DateTime<Utc>,
) -> Result<i64, ServerError> {
    let previous = store
        .find_one(Filter::owner(uid), Sort::descending(KEY_CREATE_AT))
        .await?;
    let Some(created) = previous.as_ref().and_then(payload::create_at_of) else {
        return Ok(0);
    };
    Ok((now - created).num_nanoseconds().unwrap_or(i64::MAX).max(0))
}

/// Validate and insert a new record owned by the caller; returns its id.
pub async fn create<S: RecordStore>(
    store: &S,
    variant: Variant,
    identity: Identity,
    body: &[u8],
) -> Result<ObjectId, ServerError> {
    let mut payload = Payload::parse(body)?;
    check_required(&payload, variant.create_rules())?;

    let uid = identity.uid();
    let now = Utc::now();
    payload.remove(KEY_ID);
    payload.remove(KEY_UPDATE_AT);
    if variant.tracks_duration() {
        let nanos = elapsed_since_previous(store, uid, now).await?;
        payload.set_deration(nanos);
    }
    payload.set_uid(uid);
    payload.set_create_at(now);

    let id = store.insert_one(payload.into_map()).await?;
    info!(record_id = %id, %uid, "record created");
    Ok(id)
}

/// Merge the payload's fields into one of the caller's records.
///
/// The target is the body's `id`; `id`, `uid`, `createAt` and `deration`
/// can't be changed this way.
pub async fn update<S: RecordStore>(
    store: &S,
    variant: Variant,
    identity: Identity,
    body: &[u8],
) -> Result<Document, ServerError> {
    let mut payload = Payload::parse(body)?;
    check_required(&payload, variant.update_rules())?;

    let uid = identity.uid();
    let id = payload
        .take_id()?
        .ok_or_else(|| ServerError::InvalidIdentity("record id must not be empty".into()))?;
    payload.remove(KEY_CREATE_AT);
    payload.remove(KEY_DERATION);
    payload.set_uid(uid);
    payload.set_update_at(Utc::now());

    let updated = store
        .update_one_and_return(Filter::id(id).owned_by(uid), payload.into_map())
        .await?
        .ok_or_else(|| not_found(id))?;
    info!(record_id = %id, %uid, "record updated");
    Ok(updated)
}

/// Hard-delete one of the caller's records by its path id.
pub async fn remove<S: RecordStore>(
    store: &S,
    identity: Identity,
    raw_id: &str,
) -> Result<Document, ServerError> {
    let uid = identity.uid();
    let id: ObjectId = raw_id
        .parse()
        .map_err(|e| ServerError::InvalidIdentity(format!("invalid record id: {e}")))?;

    let removed = store
        .delete_one_and_return(Filter::id(id).owned_by(uid))
        .await?
        .ok_or_else(|| not_found(id))?;
    info!(record_id = %id, %uid, "record deleted");
    Ok(removed)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub records: Vec<Document>,
    /// Every record the caller owns, regardless of paging.
    pub total: u64,
}

impl Listing {
    pub fn into_value(self) -> Value {
        Value::Array(self.records.into_iter().map(Value::Object).collect())
    }
}

pub async fn list<S: RecordStore>(
    store: &S,
    variant: Variant,
    identity: Identity,
    page: Page,
) -> Result<Listing, ServerError> {
    let filter = Filter::owner(identity.uid());
    let records = store
        .find_many(filter, Sort::descending(variant.list_sort_field()), page)
        .await?;
    let total = store.count(filter).await?;
    debug!(uid = %identity.uid(), returned = records.len(), total, "records listed");
    Ok(Listing { records, total })
}
