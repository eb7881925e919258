//! Uniform result envelope returned by every record route.
//!
//! Shape: `{ok: bool, data?: any, total?: integer, msg?: string}`. Field
//! names are part of the wire contract with existing clients.

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Envelope {
    pub ok: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl Envelope {
    pub fn ok(data: impl Into<Value>) -> Self {
        Self {
            ok: true,
            data: Some(data.into()),
            total: None,
            msg: None,
        }
    }

    pub fn ok_with_total(data: impl Into<Value>, total: u64) -> Self {
        Self {
            total: Some(total),
            ..Self::ok(data)
        }
    }

    pub fn fail(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            total: None,
            msg: Some(msg.into()),
        }
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
