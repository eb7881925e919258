//! Caller identity, as resolved by the auth gateway.
//!
//! The gateway validates the session token against the user center and
//! forwards the user id in the `uid` header. Handlers only ever see the
//! parsed [`Identity`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::error::ServerError;
use crate::models::ObjectId;

pub static UID_HEADER: &str = "uid";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity(pub ObjectId);

impl Identity {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ServerError> {
        let raw = headers
            .get(UID_HEADER)
            .ok_or_else(|| ServerError::InvalidIdentity("missing uid header".into()))?
            .to_str()
            .map_err(|_| ServerError::InvalidIdentity("uid header is not valid text".into()))?;
        raw.trim()
            .parse()
            .map(Identity)
            .map_err(|e| ServerError::InvalidIdentity(format!("invalid uid: {e}")))
    }

    pub fn uid(&self) -> ObjectId {
        self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Identity::from_headers(&parts.headers)
    }
}
