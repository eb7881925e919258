//! Schema-free request payloads.
//!
//! A [`Payload`] is an order-preserving `String -> serde_json::Value` map
//! (the `preserve_order` feature keeps client key order on the way to the
//! store). Client keys pass through untouched; the handful of keys the
//! server owns get typed accessors below.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::error::ServerError;
use crate::models::object_id::ObjectId;

pub const KEY_ID: &str = "id";
pub const KEY_UID: &str = "uid";
pub const KEY_CREATE_AT: &str = "createAt";
pub const KEY_UPDATE_AT: &str = "updateAt";
pub const KEY_DERATION: &str = "deration";

/// Render a timestamp the way every stored record carries it.
///
/// Fixed-width UTC with microseconds, so string order is time order.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload(Map<String, Value>);

impl Payload {
    /// Decode a raw request body.
    ///
    /// Zero bytes is [`ServerError::EmptyBody`]; anything that is not a JSON
    /// object is [`ServerError::MalformedPayload`].
    pub fn parse(body: &[u8]) -> Result<Self, ServerError> {
        if body.is_empty() {
            return Err(ServerError::EmptyBody);
        }
        serde_json::from_slice::<Map<String, Value>>(body)
            .map(Self)
            .map_err(|e| ServerError::MalformedPayload(e.to_string()))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn set_uid(&mut self, uid: ObjectId) {
        self.insert(KEY_UID, Value::String(uid.to_hex()));
    }

    pub fn set_create_at(&mut self, at: DateTime<Utc>) {
        self.insert(KEY_CREATE_AT, Value::String(format_timestamp(at)));
    }

    pub fn set_update_at(&mut self, at: DateTime<Utc>) {
        self.insert(KEY_UPDATE_AT, Value::String(format_timestamp(at)));
    }

    /// Elapsed time in nanoseconds.
    pub fn set_deration(&mut self, nanos: i64) {
        self.insert(KEY_DERATION, Value::from(nanos));
    }

    /// Remove the client `id` and interpret it as the target record.
    ///
    /// `Ok(None)` when the key was absent.
    pub fn take_id(&mut self) -> Result<Option<ObjectId>, ServerError> {
        match self.remove(KEY_ID) {
            None => Ok(None),
            Some(Value::String(s)) => s
                .parse()
                .map(Some)
                .map_err(|e| ServerError::InvalidIdentity(format!("invalid record id: {e}"))),
            Some(other) => Err(ServerError::InvalidIdentity(format!(
                "invalid record id: expected a string, got {other}"
            ))),
        }
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

/// Read the creation time of a stored document, if it has a decodable one.
pub fn create_at_of(doc: &Map<String, Value>) -> Option<DateTime<Utc>> {
    doc.get(KEY_CREATE_AT)
        .and_then(Value::as_str)
        .and_then(parse_timestamp)
}
