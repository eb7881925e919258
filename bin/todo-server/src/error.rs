//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors are converted to the failure
//! envelope `{ok: false, msg}` with an accompanying HTTP status code.

use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::schemas::envelope::Envelope;

/// All errors that can occur while handling a record request.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Missing or malformed caller identity, path id or body id.
    #[error("{0}")]
    InvalidIdentity(String),

    #[error("request body is empty")]
    EmptyBody,

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("request body is too large")]
    PayloadTooLarge,

    /// The query string could not be decoded at all (e.g. a repeated key).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Carries the message of the first unmet required-field rule.
    #[error("{0}")]
    ValidationFailed(String),

    /// Propagated from the SQLite store; the message is passed through.
    #[error("{0}")]
    Database(#[from] sqlx::Error),

    /// Update/delete target absent, or owned by someone else.
    #[error("{0}")]
    NotFound(String),

    /// The gateway token was missing or wrong.
    #[error("unauthorised")]
    Unauthorized,
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::InvalidIdentity(_)
            | ServerError::EmptyBody
            | ServerError::MalformedPayload(_)
            | ServerError::InvalidQuery(_)
            | ServerError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            ServerError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if let ServerError::Database(e) = &self {
            error!(error = %e, "database error");
        }
        (self.status(), Envelope::fail(self.to_string())).into_response()
    }
}

impl From<BytesRejection> for ServerError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServerError::PayloadTooLarge
        } else {
            ServerError::MalformedPayload(rejection.body_text())
        }
    }
}

impl From<QueryRejection> for ServerError {
    fn from(rejection: QueryRejection) -> Self {
        ServerError::InvalidQuery(rejection.body_text())
    }
}
